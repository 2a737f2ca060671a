use std::time::Duration;

/// Options for the browser host.
///
/// Playback itself is tuned with [`readaloud::PlaybackOptions`], which are kept in `localStorage`.
#[derive(Clone, Debug)]
pub struct WebOptions {
    /// How long to wait after `mouseup`/`touchend` before reading the selection.
    ///
    /// Browsers update the selection after the event has been dispatched.
    pub selection_settle_delay: Duration,

    /// `localStorage` key of the persisted [`readaloud::PlaybackOptions`].
    pub storage_key: String,

    /// Id of an `<iframe>` showing the document, whose selections should be read too.
    pub frame_id: Option<String>,
}

impl Default for WebOptions {
    fn default() -> Self {
        Self {
            selection_settle_delay: Duration::from_millis(100),
            storage_key: "readaloud_playback_options".to_owned(),
            frame_id: None,
        }
    }
}
