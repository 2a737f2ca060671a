/// Identity of one submitted utterance.
///
/// Allocated by [`crate::PlaybackEngine`] and echoed back in every [`EngineEvent`]
/// so that events belonging to a cancelled utterance can be told apart from
/// events of the current one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UtteranceId(u64);

impl UtteranceId {
    #[inline]
    pub const fn from_u64(id: u64) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

/// A voice offered by the speech engine.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Voice {
    /// Human readable name, e.g. `"Microsoft Zira - English (United States)"`.
    pub name: String,

    /// BCP 47 language tag, e.g. `"en-US"`.
    pub lang: String,

    /// Engine specific identifier.
    pub uri: String,

    /// Is this the engine's default voice?
    pub is_default: bool,
}

/// One request to vocalize one chunk.
///
/// Built by the [`crate::Sequencer`], consumed by the [`crate::PlaybackEngine`].
#[derive(Clone, Debug, PartialEq)]
pub struct UtteranceRequest {
    pub text: String,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,

    /// `None` means the engine's default voice.
    pub voice: Option<Voice>,
}

impl UtteranceRequest {
    /// A request with neutral rate, pitch and volume and the default voice.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
            voice: None,
        }
    }

    #[inline]
    pub fn with_voice(mut self, voice: Option<Voice>) -> Self {
        self.voice = voice;
        self
    }
}

/// Why the speech engine could not speak an utterance.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("speech synthesis is unavailable")]
    Unavailable,

    #[error("speech synthesis is not allowed yet (needs a user gesture)")]
    NotAllowed,

    #[error("the requested voice or language is unavailable")]
    VoiceUnavailable,

    #[error("audio output is busy or unavailable")]
    AudioOutput,

    #[error("the utterance was interrupted")]
    Interrupted,

    #[error("synthesis failed: {0}")]
    SynthesisFailed(String),
}

/// What happened to an utterance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineEventKind {
    /// The engine began speaking.
    Started,

    /// The engine finished speaking naturally.
    Ended,

    /// The engine gave up on the utterance.
    Failed(EngineError),
}

/// Completion notification from the speech engine, delivered by the host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineEvent {
    pub utterance: UtteranceId,
    pub kind: EngineEventKind,
}

impl EngineEvent {
    pub fn started(utterance: UtteranceId) -> Self {
        Self {
            utterance,
            kind: EngineEventKind::Started,
        }
    }

    pub fn ended(utterance: UtteranceId) -> Self {
        Self {
            utterance,
            kind: EngineEventKind::Ended,
        }
    }

    pub fn failed(utterance: UtteranceId, error: EngineError) -> Self {
        Self {
            utterance,
            kind: EngineEventKind::Failed(error),
        }
    }
}

/// The raw speech resource: one per process, shared by everything that talks.
///
/// Only [`crate::PlaybackEngine`] should call these methods.
/// Implementations report progress of a submitted utterance later, by handing an
/// [`EngineEvent`] with the same [`UtteranceId`] to the host, which forwards it to
/// [`crate::Sequencer::on_engine_event`].
pub trait SpeechEngine {
    /// Start speaking `request`.
    ///
    /// # Errors
    /// If the engine rejects the request outright. No event will follow for `id`.
    fn submit(&mut self, id: UtteranceId, request: &UtteranceRequest) -> Result<(), EngineError>;

    /// Drop whatever is being spoken or queued.
    fn cancel(&mut self);

    fn pause(&mut self);

    fn resume(&mut self);

    /// The current voice catalog. May be empty until the engine has loaded its voices.
    fn voices(&mut self) -> Vec<Voice>;
}
