use crate::{PlaybackPosition, PlaybackState};

/// How much of the progress bar to fill for the given position, in `[0, 1]`.
///
/// We don't know how far into a chunk the engine is, so a chunk in progress
/// counts as half spoken: `(chunk_index + 0.5) / total_chunks`.
pub fn fill_fraction(position: PlaybackPosition) -> f32 {
    if position.total_chunks == 0 {
        return 0.0;
    }
    let fraction = (position.chunk_index as f32 + 0.5) / position.total_chunks as f32;
    fraction.clamp(0.0, 1.0)
}

/// The displayed fill of the progress bar.
///
/// Call [`Self::update`] once per display frame while
/// [`Self::wants_animation_frame`] says so, and once more after any state change.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ProgressIndicator {
    fraction: f32,
}

impl ProgressIndicator {
    /// Follows the position while playing, holds still while paused, drops to zero when idle.
    pub fn update(&mut self, state: PlaybackState, position: PlaybackPosition) -> f32 {
        match state {
            PlaybackState::Idle => self.fraction = 0.0,
            PlaybackState::Paused => {}
            PlaybackState::Speaking | PlaybackState::Advancing | PlaybackState::Retrying => {
                self.fraction = fill_fraction(position);
            }
        }
        self.fraction
    }

    /// The last value returned by [`Self::update`].
    pub fn fraction(&self) -> f32 {
        self.fraction
    }

    /// Should the host keep its per-frame loop running?
    pub fn wants_animation_frame(state: PlaybackState) -> bool {
        state.is_playing()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(chunk_index: usize, total_chunks: usize) -> PlaybackPosition {
        PlaybackPosition {
            chunk_index,
            total_chunks,
        }
    }

    #[test]
    fn half_chunk_offset() {
        assert_eq!(fill_fraction(at(0, 2)), 0.25);
        assert_eq!(fill_fraction(at(1, 2)), 0.75);
        assert_eq!(fill_fraction(at(0, 1)), 0.5);
    }

    #[test]
    fn fraction_is_clamped() {
        assert_eq!(fill_fraction(at(0, 0)), 0.0);
        assert_eq!(fill_fraction(at(2, 2)), 1.0);
        assert_eq!(fill_fraction(at(7, 2)), 1.0);
    }

    #[test]
    fn freezes_while_paused_and_resets_when_idle() {
        let mut progress = ProgressIndicator::default();
        assert_eq!(progress.update(PlaybackState::Speaking, at(1, 4)), 0.375);
        assert_eq!(progress.update(PlaybackState::Paused, at(2, 4)), 0.375);
        assert_eq!(progress.update(PlaybackState::Advancing, at(2, 4)), 0.625);
        assert_eq!(progress.update(PlaybackState::Idle, at(4, 4)), 0.0);
        assert_eq!(progress.fraction(), 0.0);
    }

    #[test]
    fn animates_only_while_playing() {
        assert!(ProgressIndicator::wants_animation_frame(PlaybackState::Speaking));
        assert!(ProgressIndicator::wants_animation_frame(PlaybackState::Retrying));
        assert!(!ProgressIndicator::wants_animation_frame(PlaybackState::Paused));
        assert!(!ProgressIndicator::wants_animation_frame(PlaybackState::Idle));
    }
}
