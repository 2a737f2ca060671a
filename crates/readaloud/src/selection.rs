/// One load of an embedded document frame.
///
/// A frame gets a fresh id every time its document loads, so listeners left
/// over from an earlier document can be recognized.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameId(u32);

/// Where a selection was made.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SelectionSource {
    /// The host page itself.
    Document,

    /// A separately rendered document inside a frame.
    Frame(FrameId),
}

/// Turns raw selection strings into new playback input.
///
/// Only non-empty, trimmed passages from attached sources get through, and
/// the same passage is not emitted twice in a row: a click that leaves the
/// selection as it was should not restart playback.
#[derive(Debug, Default)]
pub struct SelectionBridge {
    frames: Vec<FrameId>,
    next_frame: u32,
    last: Option<String>,
}

impl SelectionBridge {
    /// A frame finished loading a document. Selections from it are now accepted.
    pub fn attach_frame(&mut self) -> FrameId {
        let id = FrameId(self.next_frame);
        self.next_frame += 1;
        self.frames.push(id);
        id
    }

    /// The frame's document is gone.
    pub fn detach_frame(&mut self, id: FrameId) {
        self.frames.retain(|frame| *frame != id);
    }

    pub fn is_attached(&self, source: SelectionSource) -> bool {
        match source {
            SelectionSource::Document => true,
            SelectionSource::Frame(id) => self.frames.contains(&id),
        }
    }

    /// The user finished selecting. Returns the passage to play, if any.
    pub fn on_selection(&mut self, source: SelectionSource, raw: &str) -> Option<String> {
        if !self.is_attached(source) {
            log::trace!("Ignoring selection from detached {source:?}");
            return None;
        }

        let passage = raw.trim();
        if passage.is_empty() || self.last.as_deref() == Some(passage) {
            return None;
        }

        log::debug!("Selected {} characters from {source:?}", passage.len());
        self.last = Some(passage.to_owned());
        self.last.clone()
    }

    /// Forget the last passage, so that selecting it again plays it again.
    pub fn forget(&mut self) {
        self.last = None;
    }

    /// The passage most recently emitted.
    pub fn last(&self) -> Option<&str> {
        self.last.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_skips_empty() {
        let mut bridge = SelectionBridge::default();
        assert_eq!(bridge.on_selection(SelectionSource::Document, "   \n"), None);
        assert_eq!(
            bridge.on_selection(SelectionSource::Document, "  Call me Ishmael. "),
            Some("Call me Ishmael.".to_owned())
        );
    }

    #[test]
    fn unchanged_selection_is_not_emitted_again() {
        let mut bridge = SelectionBridge::default();
        assert!(bridge.on_selection(SelectionSource::Document, "passage").is_some());
        assert_eq!(bridge.on_selection(SelectionSource::Document, " passage "), None);
        assert!(bridge.on_selection(SelectionSource::Document, "another").is_some());

        bridge.forget();
        assert!(bridge.on_selection(SelectionSource::Document, "another").is_some());
    }

    #[test]
    fn frames_have_their_own_lifecycle() {
        let mut bridge = SelectionBridge::default();
        let first_load = bridge.attach_frame();
        assert!(bridge.on_selection(SelectionSource::Frame(first_load), "one").is_some());

        bridge.detach_frame(first_load);
        let second_load = bridge.attach_frame();
        assert_ne!(first_load, second_load);
        assert_eq!(bridge.on_selection(SelectionSource::Frame(first_load), "two"), None);
        assert!(bridge.on_selection(SelectionSource::Frame(second_load), "two").is_some());
    }
}
