//! Browser host for [`readaloud`].
//!
//! Binds the playback core to `window.speechSynthesis`, `setTimeout`,
//! `requestAnimationFrame`, DOM selection events, `localStorage` and the
//! [pdf.js](https://mozilla.github.io/pdf.js/) text extraction library,
//! and renders the reader and the player as plain DOM elements.
//!
//! Load the wasm, then from JavaScript:
//!
//! ```js
//! const handle = new WebHandle();
//! await handle.start("app", "books/moby-dick.pdf", "pdf-frame");
//! // The user selects text in the frame or on the page, then presses play.
//! ```
//!
//! pdf.js must be loaded first, so that `pdfjsLib` is a global.

#![allow(clippy::missing_errors_doc)] // So many `-> Result<_, JsValue>`

mod events;
mod extract;
mod panic_handler;
mod reader_runner;
mod speech;
mod storage;
mod timeouts;
mod view;
mod web_logger;
mod web_options;
mod web_runner;

pub use panic_handler::{PanicHandler, PanicSummary};
pub use web_logger::WebLogger;
pub use web_options::WebOptions;
pub use web_runner::WebRunner;

pub(crate) use reader_runner::{EventSink, ReaderEvent, ReaderRunner};

use wasm_bindgen::prelude::*;

// ----------------------------------------------------------------------------

/// The page's handle to the reader.
#[wasm_bindgen]
pub struct WebHandle {
    runner: WebRunner,
}

#[wasm_bindgen]
impl WebHandle {
    /// Installs the logger and the panic handler. Call [`Self::start`] next.
    #[wasm_bindgen(constructor)]
    #[expect(clippy::new_without_default)]
    pub fn new() -> Self {
        // Redirect `log` to the browser console:
        WebLogger::init(log::LevelFilter::Debug).ok();

        Self {
            runner: WebRunner::new(),
        }
    }

    /// Build the reader inside the element with id `root_id` and start listening for selections.
    ///
    /// If `frame_id` names an `<iframe>`, selections made in it are read too, and
    /// `document_url` is shown in it. The text of `document_url` is also extracted
    /// into the reader pane.
    pub async fn start(
        &self,
        root_id: String,
        document_url: Option<String>,
        frame_id: Option<String>,
    ) -> Result<(), JsValue> {
        let web_options = WebOptions {
            frame_id,
            ..Default::default()
        };
        self.runner
            .start(&root_id, web_options, document_url.as_deref())?;

        if let Some(url) = document_url {
            self.runner.open_document(url).await;
        }
        Ok(())
    }

    /// Extract the text of another PDF into the reader pane.
    pub async fn open_document(&self, url: String) {
        self.runner.open_document(url).await;
    }

    /// Use `text` as the new passage, as if the user had selected it.
    pub fn select_text(&self, text: &str) {
        if let Some(mut runner) = self.runner.try_lock() {
            runner.on_selection(readaloud::SelectionSource::Document, text);
        }
        self.runner.repaint();
    }

    /// Play, pause or resume.
    pub fn toggle(&self) {
        if let Some(mut runner) = self.runner.try_lock() {
            runner.toggle();
        }
        self.runner.repaint();
    }

    /// Stop and rewind to the start of the passage.
    pub fn stop(&self) {
        if let Some(mut runner) = self.runner.try_lock() {
            runner.stop();
        }
        self.runner.repaint();
    }

    pub fn is_playing(&self) -> bool {
        self.runner
            .try_lock()
            .is_some_and(|runner| runner.is_playing())
    }

    /// Fill of the progress bar, in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        self.runner
            .try_lock()
            .map_or(0.0, |runner| runner.progress())
    }

    /// Replace the playback options with the given RON, e.g. `(rate: 1.5, max_words: 40)`.
    ///
    /// Fields left out keep their defaults. The options are remembered in `localStorage`.
    pub fn set_playback_options(&self, ron: &str) -> Result<(), JsValue> {
        let options =
            storage::parse_playback_options(ron).map_err(|err| JsValue::from_str(&err.to_string()))?;
        if let Some(mut runner) = self.runner.try_lock() {
            runner.set_options(options);
        }
        self.runner.repaint();
        Ok(())
    }

    /// Stop speaking, remove the reader from the page and release every callback.
    pub fn destroy(&self) {
        self.runner.destroy();
    }

    /// Has there been a panic?
    pub fn has_panicked(&self) -> bool {
        self.runner.has_panicked()
    }

    pub fn panic_message(&self) -> Option<String> {
        self.runner.panic_summary().map(|s| s.message())
    }

    pub fn panic_callstack(&self) -> Option<String> {
        self.runner.panic_summary().map(|s| s.callstack())
    }
}

// ----------------------------------------------------------------------------

pub(crate) fn string_from_js_value(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:#?}"))
}

pub(crate) fn window() -> Result<web_sys::Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("no global `window`"))
}

pub(crate) fn document() -> Result<web_sys::Document, JsValue> {
    window()?
        .document()
        .ok_or_else(|| JsValue::from_str("window has no document"))
}
