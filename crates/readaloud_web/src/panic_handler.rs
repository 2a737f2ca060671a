use std::{panic::PanicHookInfo, sync::Arc};

use parking_lot::Mutex;
use wasm_bindgen::prelude::*;

/// Remembers the first panic of the reader, for the page to show.
///
/// Every panic is written to the browser console as it happens. Once one has
/// happened the reader state can't be trusted, and the [`crate::WebRunner`]
/// ignores all further events (see [`Self::has_panicked`]).
#[derive(Clone)]
pub struct PanicHandler {
    first_panic: Arc<Mutex<Option<PanicSummary>>>,
}

impl PanicHandler {
    /// Wraps the current panic hook, which still runs afterwards.
    pub fn install() -> Self {
        let first_panic = Arc::new(Mutex::new(None));

        let hook_slot = Arc::clone(&first_panic);
        let next_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let summary = PanicSummary::from_hook_info(info);
            summary.report();

            // Later panics are usually fallout of the first.
            hook_slot.lock().get_or_insert(summary);

            next_hook(info);
        }));

        Self { first_panic }
    }

    pub fn has_panicked(&self) -> bool {
        self.first_panic.lock().is_some()
    }

    /// The first panic, if there was one.
    pub fn panic_summary(&self) -> Option<PanicSummary> {
        self.first_panic.lock().clone()
    }
}

/// Panic message plus the JavaScript stack at the point of the panic.
#[derive(Clone, Debug)]
pub struct PanicSummary {
    message: String,
    callstack: String,
}

impl PanicSummary {
    fn from_hook_info(info: &PanicHookInfo<'_>) -> Self {
        Self {
            message: info.to_string(),
            callstack: JsError::new().stack(),
        }
    }

    fn report(&self) {
        console_error(&format!(
            "readaloud panicked: {}\n\nStack:\n\n{}",
            self.message, self.callstack
        ));
    }

    pub fn message(&self) -> String {
        self.message.clone()
    }

    pub fn callstack(&self) -> String {
        self.callstack.clone()
    }
}

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console, js_name = error)]
    fn console_error(msg: &str);

    /// Only constructed for its `stack`.
    #[wasm_bindgen(js_name = Error)]
    type JsError;

    #[wasm_bindgen(constructor, js_class = "Error")]
    fn new() -> JsError;

    #[wasm_bindgen(structural, method, getter)]
    fn stack(this: &JsError) -> String;
}
