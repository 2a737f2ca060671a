use std::rc::Rc;

use readaloud::{
    EngineEvent, FrameId, Page, PlaybackOptions, ProgressIndicator, Reader, SelectionBridge,
    SelectionSource, Sequencer, TimerTicket,
};

use crate::{WebOptions, speech::WebSpeechEngine, storage, timeouts::TimeoutScheduler, view::View};

/// Something the browser told us, on its way to the [`ReaderRunner`].
#[derive(Debug)]
pub(crate) enum ReaderEvent {
    /// Progress of an utterance.
    Engine(EngineEvent),

    /// `speechSynthesis` fired `voiceschanged`.
    VoicesChanged,

    /// A `setTimeout` requested by the sequencer fired.
    Timer(TimerTicket),

    /// The selection settled after a `mouseup` or `touchend`.
    Selection {
        source: SelectionSource,
        text: String,
    },
}

/// Where browser callbacks deliver their [`ReaderEvent`]s.
pub(crate) type EventSink = Rc<dyn Fn(ReaderEvent)>;

/// Everything the reader owns while it runs: playback, selection, document and view.
pub(crate) struct ReaderRunner {
    web_options: WebOptions,
    sequencer: Sequencer<WebSpeechEngine, TimeoutScheduler>,
    progress: ProgressIndicator,
    selection: SelectionBridge,

    /// The current document of the embedded frame, if selections can be read from it.
    frame: Option<FrameId>,

    reader: Reader,

    /// Extraction in flight, if any. Later loads supersede earlier ones.
    loading: Option<u64>,
    next_load: u64,

    view: View,
}

impl ReaderRunner {
    pub fn new(view: View, web_options: WebOptions, sink: &EventSink) -> Self {
        let options = storage::load_playback_options(&web_options.storage_key);
        let engine = WebSpeechEngine::new(Rc::clone(sink));
        let scheduler = TimeoutScheduler::new(Rc::clone(sink));

        Self {
            web_options,
            sequencer: Sequencer::new(engine, scheduler, options),
            progress: ProgressIndicator::default(),
            selection: SelectionBridge::default(),
            frame: None,
            reader: Reader::default(),
            loading: None,
            next_load: 0,
            view,
        }
    }

    pub fn web_options(&self) -> &WebOptions {
        &self.web_options
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn handle(&mut self, event: ReaderEvent) {
        match event {
            ReaderEvent::Engine(event) => self.sequencer.on_engine_event(event),
            ReaderEvent::VoicesChanged => self.sequencer.on_voices_changed(),
            ReaderEvent::Timer(ticket) => self.sequencer.on_timer(ticket),
            ReaderEvent::Selection { source, text } => self.on_selection(source, &text),
        }
    }

    /// New selected text replaces the passage and stops playback. Playback starts on toggle.
    pub fn on_selection(&mut self, source: SelectionSource, raw: &str) {
        if let Some(passage) = self.selection.on_selection(source, raw) {
            self.sequencer.set_text(&passage);
            self.view.show_selection(Some(&passage));
        }
    }

    pub fn toggle(&mut self) {
        self.sequencer.toggle();
    }

    pub fn stop(&mut self) {
        self.sequencer.stop();
    }

    pub fn is_playing(&self) -> bool {
        self.sequencer.is_playing()
    }

    /// Fill of the progress bar as last painted.
    pub fn progress(&self) -> f32 {
        self.progress.fraction()
    }

    /// Apply and remember new playback options.
    pub fn set_options(&mut self, options: PlaybackOptions) {
        storage::save_playback_options(&self.web_options.storage_key, &options);
        self.sequencer.set_options(options);
    }

    // ------------------------------------------------------------------------
    // Embedded frame:

    /// The frame loaded a new document. Selections from the previous one are ignored from now on.
    pub fn attach_frame(&mut self) -> FrameId {
        self.detach_frame();
        let id = self.selection.attach_frame();
        self.frame = Some(id);
        log::debug!("Reading selections from frame document {id:?}");
        id
    }

    pub fn detach_frame(&mut self) {
        if let Some(id) = self.frame.take() {
            self.selection.detach_frame(id);
        }
    }

    // ------------------------------------------------------------------------
    // Document:

    /// Show "Loading…" and return a token for [`Self::finish_loading`].
    pub fn begin_loading(&mut self) -> u64 {
        let load = self.next_load;
        self.next_load += 1;
        self.loading = Some(load);
        self.view.show_loading();
        load
    }

    pub fn finish_loading(&mut self, load: u64, pages: Vec<Page>) {
        if self.loading != Some(load) {
            log::debug!("Dropping extracted text of a superseded document");
            return;
        }
        self.loading = None;
        log::info!("Extracted {} pages", pages.len());
        self.reader = Reader::new(pages);
        self.view.show_page(&self.reader);
    }

    pub fn next_page(&mut self) {
        if self.reader.next_page() {
            self.view.show_page(&self.reader);
        }
    }

    pub fn prev_page(&mut self) {
        if self.reader.prev_page() {
            self.view.show_page(&self.reader);
        }
    }

    // ------------------------------------------------------------------------

    /// Bring the player up to date. Returns `true` while another frame is wanted.
    pub fn paint(&mut self) -> bool {
        let state = self.sequencer.state();
        let fraction = self.progress.update(state, self.sequencer.position());
        self.view.set_progress(fraction);
        self.view
            .show_playback(state.is_playing(), !self.sequencer.chunks().is_empty());
        ProgressIndicator::wants_animation_frame(state)
    }

    /// Silence the engine and take the reader off the page.
    pub fn destroy(mut self) {
        self.sequencer.stop();
        self.view.unmount();
    }
}
