use readaloud::Reader;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlButtonElement, HtmlElement};

/// The buttons, for installing click handlers.
#[derive(Clone)]
pub(crate) struct Controls {
    pub prev: HtmlButtonElement,
    pub next: HtmlButtonElement,
    pub toggle: HtmlButtonElement,
    pub stop: HtmlButtonElement,
}

/// The reader pane and the player, as DOM elements.
///
/// ```text
/// div.readaloud
/// ├── div.reader
/// │   ├── nav: [Previous] "Page 2 of 10" [Next]
/// │   └── div.page: p.title, p.header, p.body, …
/// └── div.player
///     ├── p.selection  "Select text to read"
///     ├── [Play] [Stop]
///     └── div.progress-track > div.progress-fill
/// ```
///
/// Styling is left to the page's CSS, except for the page font and the progress fill.
pub(crate) struct View {
    container: Element,
    page_label: Element,
    page: HtmlElement,
    selection: Element,
    fill: HtmlElement,
    controls: Controls,

    /// What is on screen, to skip redundant DOM writes on every animation frame.
    shown_playback: Option<(bool, bool)>,
    shown_fraction: Option<f32>,
}

impl View {
    /// Build the view as the last child of `root`.
    pub fn mount(root: &Element) -> Result<Self, JsValue> {
        let document = crate::document()?;

        let container: Element = create(&document, "div", "readaloud")?;

        let reader: Element = create(&document, "div", "reader")?;
        let nav: Element = create(&document, "nav", "reader-nav")?;
        let prev: HtmlButtonElement = create(&document, "button", "prev")?;
        prev.set_text_content(Some("Previous"));
        let page_label: Element = create(&document, "span", "page-label")?;
        let next: HtmlButtonElement = create(&document, "button", "next")?;
        next.set_text_content(Some("Next"));
        nav.append_child(&prev)?;
        nav.append_child(&page_label)?;
        nav.append_child(&next)?;
        let page: HtmlElement = create(&document, "div", "page")?;
        reader.append_child(&nav)?;
        reader.append_child(&page)?;

        let player: Element = create(&document, "div", "player")?;
        let selection: Element = create(&document, "p", "selection")?;
        let toggle: HtmlButtonElement = create(&document, "button", "toggle")?;
        let stop: HtmlButtonElement = create(&document, "button", "stop")?;
        stop.set_text_content(Some("Stop"));
        let track: Element = create(&document, "div", "progress-track")?;
        let fill: HtmlElement = create(&document, "div", "progress-fill")?;
        fill.style().set_property("transform-origin", "left")?;
        track.append_child(&fill)?;
        player.append_child(&selection)?;
        player.append_child(&toggle)?;
        player.append_child(&stop)?;
        player.append_child(&track)?;

        container.append_child(&reader)?;
        container.append_child(&player)?;
        root.append_child(&container)?;

        let mut view = Self {
            container,
            page_label,
            page,
            selection,
            fill,
            controls: Controls {
                prev,
                next,
                toggle,
                stop,
            },
            shown_playback: None,
            shown_fraction: None,
        };
        view.show_page(&Reader::default());
        view.show_selection(None);
        view.show_playback(false, false);
        view.set_progress(0.0);
        Ok(view)
    }

    pub fn controls(&self) -> Controls {
        self.controls.clone()
    }

    pub fn show_loading(&self) {
        self.page.set_text_content(Some("Loading…"));
        self.page_label.set_text_content(None);
        self.controls.prev.set_disabled(true);
        self.controls.next.set_disabled(true);
    }

    /// Show the current page of `reader`, or "No text available".
    pub fn show_page(&self, reader: &Reader) {
        if let Err(err) = self.try_show_page(reader) {
            log::warn!("Failed to show page: {}", crate::string_from_js_value(&err));
        }
    }

    fn try_show_page(&self, reader: &Reader) -> Result<(), JsValue> {
        self.page.set_text_content(None);
        self.page_label.set_text_content(Some(&reader.page_label()));
        self.controls.prev.set_disabled(!reader.has_prev());
        self.controls.next.set_disabled(!reader.has_next());

        let Some(page) = reader.current_page() else {
            self.page.set_text_content(Some("No text available"));
            return Ok(());
        };

        let style = self.page.style();
        style.set_property("font-size", &format!("{}px", page.style.font_size))?;
        style.set_property("font-family", &page.style.font_family)?;

        let document = crate::document()?;
        for line in reader.current_lines() {
            let paragraph: Element =
                create(&document, "p", &format!("line {}", line.kind.css_class()))?;
            paragraph.set_text_content(Some(&line.text));
            self.page.append_child(&paragraph)?;
        }
        Ok(())
    }

    /// Preview the passage that will be read.
    pub fn show_selection(&self, passage: Option<&str>) {
        self.selection
            .set_text_content(Some(passage.unwrap_or("Select text to read")));
    }

    pub fn show_playback(&mut self, is_playing: bool, has_text: bool) {
        if self.shown_playback == Some((is_playing, has_text)) {
            return;
        }
        self.shown_playback = Some((is_playing, has_text));

        let label = if is_playing { "Pause" } else { "Play" };
        self.controls.toggle.set_text_content(Some(label));
        self.controls.toggle.set_disabled(!has_text);
        self.controls.stop.set_disabled(!has_text);
    }

    /// Fill the progress bar to `fraction` of its width.
    pub fn set_progress(&mut self, fraction: f32) {
        if self.shown_fraction == Some(fraction) {
            return;
        }
        self.shown_fraction = Some(fraction);

        let transform = format!("scaleX({fraction})");
        if let Err(err) = self.fill.style().set_property("transform", &transform) {
            log::warn!("Failed to set progress: {}", crate::string_from_js_value(&err));
        }
    }

    pub fn unmount(&self) {
        self.container.remove();
    }
}

fn create<T: JsCast>(document: &Document, tag: &str, class: &str) -> Result<T, JsValue> {
    let element = document.create_element(tag)?;
    element.set_class_name(class);
    element.dyn_into::<T>().map_err(JsValue::from)
}
