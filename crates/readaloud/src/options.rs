use std::time::Duration;

/// Longest delay we accept for [`PlaybackOptions::advance_delay`] and [`PlaybackOptions::retry_backoff`].
const MAX_DELAY: Duration = Duration::from_secs(10);

/// Tuning of chunked playback.
///
/// The delays and the retry cap are empirical: speech engines tend to drop a
/// request that is submitted right after the previous one finished, and
/// transient synthesis errors are common. Keep both delays in the hundreds of
/// milliseconds.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PlaybackOptions {
    /// Most words in one chunk.
    pub max_words: usize,

    /// How often a failing chunk is retried before it is skipped.
    pub max_retries: u32,

    /// Pause between the end of one chunk and the start of the next.
    pub advance_delay: Duration,

    /// Pause before retrying a failed chunk.
    pub retry_backoff: Duration,

    /// Speaking rate, 1 is normal.
    pub rate: f32,

    /// 1 is normal.
    pub pitch: f32,

    /// 0 to 1.
    pub volume: f32,

    /// Prefer a voice whose name contains this (ignoring case).
    pub preferred_voice: String,
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        Self {
            max_words: 25,
            max_retries: 3,
            advance_delay: Duration::from_millis(200),
            retry_backoff: Duration::from_millis(500),
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
            preferred_voice: "female".to_owned(),
        }
    }
}

/// A [`PlaybackOptions`] value that makes no sense.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum OptionsError {
    #[error("max_words must be at least 1")]
    ZeroWordBudget,

    #[error("rate must be in 0.1..=10, got {0}")]
    Rate(f32),

    #[error("pitch must be in 0..=2, got {0}")]
    Pitch(f32),

    #[error("volume must be in 0..=1, got {0}")]
    Volume(f32),

    #[error("{name} of {delay:?} is longer than the allowed 10s")]
    Delay { name: &'static str, delay: Duration },
}

impl PlaybackOptions {
    /// Check that every field is within range.
    ///
    /// # Errors
    /// The first field found out of range.
    pub fn validate(&self) -> Result<(), OptionsError> {
        let Self {
            max_words,
            max_retries: _,
            advance_delay,
            retry_backoff,
            rate,
            pitch,
            volume,
            preferred_voice: _,
        } = self;

        if *max_words == 0 {
            return Err(OptionsError::ZeroWordBudget);
        }
        if !(0.1..=10.0).contains(rate) {
            return Err(OptionsError::Rate(*rate));
        }
        if !(0.0..=2.0).contains(pitch) {
            return Err(OptionsError::Pitch(*pitch));
        }
        if !(0.0..=1.0).contains(volume) {
            return Err(OptionsError::Volume(*volume));
        }
        for (name, delay) in [("advance_delay", advance_delay), ("retry_backoff", retry_backoff)] {
            if *delay > MAX_DELAY {
                return Err(OptionsError::Delay {
                    name,
                    delay: *delay,
                });
            }
        }
        Ok(())
    }
}
