use crate::{EngineError, EngineEvent, EngineEventKind, SpeechEngine, UtteranceId, UtteranceRequest, Voice};

#[derive(Clone, Copy, Debug)]
struct ActiveUtterance {
    id: UtteranceId,
    started: bool,
}

/// Sole owner of the shared [`SpeechEngine`].
///
/// Guarantees at most one utterance in flight: every [`Self::speak`] cancels
/// first. Events for anything but the current utterance are dropped by
/// [`Self::filter_event`], and each utterance produces at most one terminal
/// event (ended *or* failed).
pub struct PlaybackEngine<E> {
    engine: E,
    voices: Vec<Voice>,
    voice_marker: String,
    active: Option<ActiveUtterance>,

    /// The engine's pause outlives the utterance it was applied to.
    engine_paused: bool,
    next_id: u64,
}

impl<E: SpeechEngine> PlaybackEngine<E> {
    /// `voice_marker` selects the preferred voice, see [`Self::preferred_voice`].
    pub fn new(mut engine: E, voice_marker: impl Into<String>) -> Self {
        let voices = engine.voices();
        log::debug!("Speech engine offers {} voices", voices.len());
        Self {
            engine,
            voices,
            voice_marker: voice_marker.into(),
            active: None,
            engine_paused: false,
            next_id: 1,
        }
    }

    /// Cancel anything in flight, then submit `request`.
    ///
    /// # Errors
    /// If the engine rejected the request. Nothing is in flight afterwards.
    pub fn speak(&mut self, request: &UtteranceRequest) -> Result<UtteranceId, EngineError> {
        self.stop();

        let id = UtteranceId::from_u64(self.next_id);
        self.next_id += 1;

        self.engine.submit(id, request)?;
        self.active = Some(ActiveUtterance { id, started: false });
        Ok(id)
    }

    /// No-op unless an utterance is in flight.
    pub fn pause(&mut self) {
        if self.active.is_some() && !self.engine_paused {
            self.engine_paused = true;
            self.engine.pause();
        }
    }

    /// No-op unless the engine is paused.
    pub fn resume(&mut self) {
        if self.engine_paused {
            self.engine_paused = false;
            self.engine.resume();
        }
    }

    /// Cancel unconditionally. Always safe, also when idle.
    ///
    /// A paused engine is resumed after the cancel, so the next submission is heard.
    pub fn stop(&mut self) {
        self.active = None;
        self.engine.cancel();
        self.resume();
    }

    /// Is the engine paused, with or without an utterance in flight?
    pub fn is_paused(&self) -> bool {
        self.engine_paused
    }

    /// Is an utterance submitted and not yet ended or failed?
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// The utterance currently in flight, if any.
    pub fn active_utterance(&self) -> Option<UtteranceId> {
        self.active.map(|active| active.id)
    }

    /// Pass through the events that belong to the current utterance, drop the rest.
    ///
    /// A terminal event (ended or failed) retires the utterance, so a late
    /// `Ended` after a `Failed` (or vice versa) never gets through.
    pub fn filter_event(&mut self, event: EngineEvent) -> Option<EngineEvent> {
        let Some(active) = &mut self.active else {
            log::trace!("Ignoring {:?}: nothing in flight", event.kind);
            return None;
        };
        if active.id != event.utterance {
            log::trace!(
                "Ignoring {:?} for stale utterance {}",
                event.kind,
                event.utterance.as_u64()
            );
            return None;
        }

        match &event.kind {
            EngineEventKind::Started => {
                if active.started {
                    return None;
                }
                active.started = true;
            }
            EngineEventKind::Ended | EngineEventKind::Failed(_) => {
                self.active = None;
            }
        }
        Some(event)
    }

    /// Re-read the voice catalog, e.g. when the engine says it changed.
    pub fn refresh_voices(&mut self) {
        self.voices = self.engine.voices();
        log::debug!("Voice catalog now has {} voices", self.voices.len());
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn set_voice_marker(&mut self, voice_marker: impl Into<String>) {
        self.voice_marker = voice_marker.into();
    }

    /// The first voice whose name contains the marker (ignoring case),
    /// else the first voice, else `None` for the engine default.
    pub fn preferred_voice(&self) -> Option<&Voice> {
        let marker = self.voice_marker.to_lowercase();
        let marked = (!marker.is_empty())
            .then(|| {
                self.voices
                    .iter()
                    .find(|voice| voice.name.to_lowercase().contains(&marker))
            })
            .flatten();
        marked.or_else(|| self.voices.first())
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum Call {
        Cancel,
        Pause,
        Resume,
        Submit,
    }

    #[derive(Default)]
    struct CountingEngine {
        calls: Vec<Call>,
        submitted: Vec<(UtteranceId, String)>,
        cancels: usize,
        pauses: usize,
        resumes: usize,
        voices: Vec<Voice>,
        reject: bool,
    }

    impl SpeechEngine for CountingEngine {
        fn submit(&mut self, id: UtteranceId, request: &UtteranceRequest) -> Result<(), EngineError> {
            if self.reject {
                return Err(EngineError::Unavailable);
            }
            self.submitted.push((id, request.text.clone()));
            self.calls.push(Call::Submit);
            Ok(())
        }

        fn cancel(&mut self) {
            self.cancels += 1;
            self.calls.push(Call::Cancel);
        }

        fn pause(&mut self) {
            self.pauses += 1;
            self.calls.push(Call::Pause);
        }

        fn resume(&mut self) {
            self.resumes += 1;
            self.calls.push(Call::Resume);
        }

        fn voices(&mut self) -> Vec<Voice> {
            self.voices.clone()
        }
    }

    fn voice(name: &str) -> Voice {
        Voice {
            name: name.to_owned(),
            lang: "en-US".to_owned(),
            uri: name.to_owned(),
            is_default: false,
        }
    }

    #[test]
    fn speak_cancels_before_submitting() {
        let mut adapter = PlaybackEngine::new(CountingEngine::default(), "female");
        let first = adapter.speak(&UtteranceRequest::new("one")).unwrap();
        let second = adapter.speak(&UtteranceRequest::new("two")).unwrap();
        assert_ne!(first, second);
        assert_eq!(adapter.engine().cancels, 2);
        assert_eq!(adapter.engine().submitted.len(), 2);
        assert_eq!(adapter.active_utterance(), Some(second));
    }

    #[test]
    fn stale_events_are_dropped() {
        let mut adapter = PlaybackEngine::new(CountingEngine::default(), "female");
        let first = adapter.speak(&UtteranceRequest::new("one")).unwrap();
        let second = adapter.speak(&UtteranceRequest::new("two")).unwrap();

        let interrupted = EngineEvent::failed(first, EngineError::Interrupted);
        assert_eq!(adapter.filter_event(interrupted), None);
        assert!(adapter.filter_event(EngineEvent::started(second)).is_some());
        assert_eq!(adapter.filter_event(EngineEvent::started(second)), None);
    }

    #[test]
    fn error_suppresses_later_end() {
        let mut adapter = PlaybackEngine::new(CountingEngine::default(), "female");
        let id = adapter.speak(&UtteranceRequest::new("one")).unwrap();
        let failed = EngineEvent::failed(id, EngineError::SynthesisFailed("boom".to_owned()));
        assert!(adapter.filter_event(failed).is_some());
        assert_eq!(adapter.filter_event(EngineEvent::ended(id)), None);
        assert!(!adapter.is_active());
    }

    #[test]
    fn pause_and_resume_are_noops_when_idle() {
        let mut adapter = PlaybackEngine::new(CountingEngine::default(), "female");
        adapter.pause();
        adapter.resume();
        adapter.stop();
        adapter.stop();
        assert_eq!(adapter.engine().pauses, 0);
        assert_eq!(adapter.engine().resumes, 0);
        assert_eq!(adapter.engine().cancels, 2);

        adapter.speak(&UtteranceRequest::new("one")).unwrap();
        adapter.pause();
        adapter.pause();
        adapter.resume();
        assert_eq!(adapter.engine().pauses, 1);
        assert_eq!(adapter.engine().resumes, 1);
    }

    #[test]
    fn stopping_a_paused_utterance_unpauses_the_engine() {
        let mut adapter = PlaybackEngine::new(CountingEngine::default(), "female");
        adapter.speak(&UtteranceRequest::new("one")).unwrap();
        adapter.pause();
        adapter.stop();
        assert!(!adapter.is_paused());
        adapter.speak(&UtteranceRequest::new("two")).unwrap();

        assert_eq!(
            adapter.engine().calls,
            [
                Call::Cancel,
                Call::Submit,
                Call::Pause,
                Call::Cancel,
                Call::Resume,
                Call::Cancel,
                Call::Submit,
            ]
        );
    }

    #[test]
    fn pause_survives_the_end_of_its_utterance() {
        let mut adapter = PlaybackEngine::new(CountingEngine::default(), "female");
        let id = adapter.speak(&UtteranceRequest::new("one")).unwrap();
        adapter.pause();
        assert!(adapter.filter_event(EngineEvent::ended(id)).is_some());
        assert!(!adapter.is_active());
        assert!(adapter.is_paused());

        adapter.speak(&UtteranceRequest::new("two")).unwrap();
        assert!(!adapter.is_paused());
        assert_eq!(
            adapter.engine().calls[2..],
            [Call::Pause, Call::Cancel, Call::Resume, Call::Submit]
        );
    }

    #[test]
    fn rejected_submit_leaves_nothing_in_flight() {
        let engine = CountingEngine {
            reject: true,
            ..Default::default()
        };
        let mut adapter = PlaybackEngine::new(engine, "female");
        assert_eq!(
            adapter.speak(&UtteranceRequest::new("one")),
            Err(EngineError::Unavailable)
        );
        assert!(!adapter.is_active());
    }

    #[test]
    fn voice_policy() {
        let mut adapter = PlaybackEngine::new(CountingEngine::default(), "female");
        assert_eq!(adapter.preferred_voice(), None);

        adapter.engine_mut().voices = vec![voice("Daniel"), voice("Google UK English Female")];
        assert_eq!(adapter.preferred_voice(), None, "catalog not refreshed yet");

        adapter.refresh_voices();
        assert_eq!(
            adapter.preferred_voice().map(|v| v.name.as_str()),
            Some("Google UK English Female")
        );

        adapter.set_voice_marker("nobody");
        assert_eq!(adapter.preferred_voice().map(|v| v.name.as_str()), Some("Daniel"));
    }
}
