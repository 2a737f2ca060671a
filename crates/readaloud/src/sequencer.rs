use web_time::Instant;

use crate::{
    EngineError, EngineEvent, EngineEventKind, PlaybackEngine, PlaybackOptions, Scheduler,
    SpeechEngine, TimerTicket, UtteranceRequest, chunk,
};

/// Where playback is in the current chunk sequence.
///
/// `chunk_index` is the chunk being (or about to be) spoken.
/// `chunk_index == total_chunks` means the whole passage has been spoken.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlaybackPosition {
    pub chunk_index: usize,
    pub total_chunks: usize,
}

impl PlaybackPosition {
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.chunk_index >= self.total_chunks
    }
}

/// The playback state machine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlaybackState {
    /// Nothing is spoken and nothing is scheduled.
    #[default]
    Idle,

    /// An utterance has been handed to the engine.
    Speaking,

    /// Stopped mid-passage, waiting for a toggle.
    Paused,

    /// Between two chunks, waiting out the advance delay.
    Advancing,

    /// A chunk failed, waiting out the retry backoff.
    Retrying,
}

impl PlaybackState {
    /// Playing as far as the user is concerned: speaking or about to speak the next chunk.
    #[inline]
    pub fn is_playing(self) -> bool {
        matches!(self, Self::Speaking | Self::Advancing | Self::Retrying)
    }
}

/// What a toggle out of [`PlaybackState::Paused`] has to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Resume {
    /// The engine holds a paused utterance.
    Engine,

    /// Nothing is in flight; submit the current chunk.
    Submit,
}

/// Drives a [`PlaybackEngine`] through a passage, one chunk at a time.
///
/// The sequencer is the only writer of the playback state and position.
/// It never waits: completion arrives through [`Self::on_engine_event`] and the
/// inter-chunk and retry delays arrive through [`Self::on_timer`].
pub struct Sequencer<E, S> {
    options: PlaybackOptions,
    engine: PlaybackEngine<E>,
    scheduler: S,

    text: String,
    chunks: Vec<String>,
    position: PlaybackPosition,
    state: PlaybackState,
    resume: Resume,
    retries: u32,

    pending_timer: Option<TimerTicket>,
    next_ticket: u64,
    chunk_started_at: Option<Instant>,
}

impl<E: SpeechEngine, S: Scheduler> Sequencer<E, S> {
    pub fn new(engine: E, scheduler: S, options: PlaybackOptions) -> Self {
        let engine = PlaybackEngine::new(engine, options.preferred_voice.clone());
        Self {
            options,
            engine,
            scheduler,
            text: String::new(),
            chunks: Vec::new(),
            position: PlaybackPosition::default(),
            state: PlaybackState::Idle,
            resume: Resume::Submit,
            retries: 0,
            pending_timer: None,
            next_ticket: 1,
            chunk_started_at: None,
        }
    }

    // ------------------------------------------------------------------------
    // Control surface:

    /// Install a new passage. Stops whatever was playing; does not start playback.
    pub fn set_text(&mut self, text: &str) {
        self.stop();
        self.text = text.to_owned();
        self.rechunk();
    }

    /// Play, pause or resume, depending on the current state.
    pub fn toggle(&mut self) {
        match self.state {
            PlaybackState::Idle => self.start(),
            PlaybackState::Speaking => {
                self.engine.pause();
                self.resume = Resume::Engine;
                self.state = PlaybackState::Paused;
                log::debug!("Paused at chunk {}", self.position.chunk_index + 1);
            }
            PlaybackState::Advancing | PlaybackState::Retrying => {
                self.cancel_timer();
                self.resume = Resume::Submit;
                self.state = PlaybackState::Paused;
                log::debug!("Paused before chunk {}", self.position.chunk_index + 1);
            }
            PlaybackState::Paused => match self.resume {
                Resume::Engine => {
                    self.engine.resume();
                    self.state = PlaybackState::Speaking;
                }
                Resume::Submit => self.speak_current(),
            },
        }
    }

    /// Full stop: cancel the engine and any scheduled step, rewind to the first chunk.
    ///
    /// Safe to call in any state, any number of times.
    pub fn stop(&mut self) {
        self.engine.stop();
        self.cancel_timer();
        self.state = PlaybackState::Idle;
        self.resume = Resume::Submit;
        self.retries = 0;
        self.position.chunk_index = 0;
        self.chunk_started_at = None;
    }

    /// Replace the options. A new word budget re-chunks the passage, which stops playback.
    pub fn set_options(&mut self, options: PlaybackOptions) {
        let rechunk = options.max_words != self.options.max_words;
        self.engine.set_voice_marker(options.preferred_voice.clone());
        self.options = options;
        if rechunk {
            self.stop();
            self.rechunk();
        }
    }

    // ------------------------------------------------------------------------
    // Notifications from the host:

    /// The engine reported progress on an utterance.
    pub fn on_engine_event(&mut self, event: EngineEvent) {
        let Some(event) = self.engine.filter_event(event) else {
            return;
        };
        match event.kind {
            EngineEventKind::Started => self.on_chunk_started(),
            EngineEventKind::Ended => {
                if let Some(started) = self.chunk_started_at.take() {
                    log::debug!(
                        "Completed chunk {}/{} in {:.1}s",
                        self.position.chunk_index + 1,
                        self.position.total_chunks,
                        started.elapsed().as_secs_f32()
                    );
                }
                self.finish_chunk();
            }
            EngineEventKind::Failed(err) => self.on_chunk_failed(&err),
        }
    }

    /// A ticket handed to the [`Scheduler`] has come due.
    pub fn on_timer(&mut self, ticket: TimerTicket) {
        if self.pending_timer != Some(ticket) {
            log::trace!("Ignoring stale timer {}", ticket.as_u64());
            return;
        }
        self.pending_timer = None;
        self.scheduler.cancel(ticket);

        if matches!(self.state, PlaybackState::Advancing | PlaybackState::Retrying) {
            self.speak_current();
        }
    }

    /// The engine's voice catalog changed.
    pub fn on_voices_changed(&mut self) {
        self.engine.refresh_voices();
    }

    // ------------------------------------------------------------------------
    // Accessors:

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    pub fn position(&self) -> PlaybackPosition {
        self.position
    }

    /// Failed attempts of the current chunk.
    pub fn retry_count(&self) -> u32 {
        self.retries
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }

    pub fn current_chunk(&self) -> Option<&str> {
        self.chunks.get(self.position.chunk_index).map(String::as_str)
    }

    /// When the engine confirmed the current chunk had started.
    pub fn chunk_started_at(&self) -> Option<Instant> {
        self.chunk_started_at
    }

    pub fn options(&self) -> &PlaybackOptions {
        &self.options
    }

    pub fn engine(&self) -> &PlaybackEngine<E> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut PlaybackEngine<E> {
        &mut self.engine
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    // ------------------------------------------------------------------------
    // Transitions:

    fn rechunk(&mut self) {
        self.chunks = chunk(&self.text, self.options.max_words);
        self.position = PlaybackPosition {
            chunk_index: 0,
            total_chunks: self.chunks.len(),
        };
        log::debug!("Split text into {} chunks", self.chunks.len());
    }

    fn start(&mut self) {
        if self.chunks.is_empty() {
            log::debug!("Nothing to play");
            return;
        }
        if self.position.is_finished() {
            self.position.chunk_index = 0;
        }
        self.retries = 0;
        self.speak_current();
    }

    fn speak_current(&mut self) {
        let Some(text) = self.current_chunk() else {
            self.complete();
            return;
        };
        let request = UtteranceRequest {
            rate: self.options.rate,
            pitch: self.options.pitch,
            volume: self.options.volume,
            ..UtteranceRequest::new(text)
        }
        .with_voice(self.engine.preferred_voice().cloned());

        log::debug!(
            "Speaking chunk {}/{}",
            self.position.chunk_index + 1,
            self.position.total_chunks
        );
        self.state = PlaybackState::Speaking;
        self.resume = Resume::Submit;
        if let Err(err) = self.engine.speak(&request) {
            self.on_chunk_failed(&err);
        }
    }

    fn on_chunk_started(&mut self) {
        log::debug!("Started chunk {}", self.position.chunk_index + 1);
        self.chunk_started_at = Some(Instant::now());
        self.retries = 0;
    }

    fn on_chunk_failed(&mut self, err: &EngineError) {
        self.chunk_started_at = None;
        let chunk_number = self.position.chunk_index + 1;

        if self.retries < self.options.max_retries {
            self.retries += 1;
            log::warn!(
                "Speech failed on chunk {chunk_number}: {err}. Retrying (attempt {})",
                self.retries
            );
            if self.state == PlaybackState::Paused {
                self.resume = Resume::Submit;
            } else {
                self.state = PlaybackState::Retrying;
                self.schedule(self.options.retry_backoff);
            }
        } else {
            log::warn!(
                "Speech failed on chunk {chunk_number}: {err}. Max retries reached, moving to next chunk"
            );
            self.finish_chunk();
        }
    }

    /// The current chunk is done, spoken or abandoned.
    fn finish_chunk(&mut self) {
        self.position.chunk_index += 1;
        self.retries = 0;

        if self.position.is_finished() {
            self.complete();
        } else if self.state == PlaybackState::Paused {
            self.resume = Resume::Submit;
        } else {
            self.state = PlaybackState::Advancing;
            self.schedule(self.options.advance_delay);
        }
    }

    /// Every chunk has been handled.
    fn complete(&mut self) {
        log::debug!("Finished all chunks");
        self.engine.stop();
        self.cancel_timer();
        self.state = PlaybackState::Idle;
        self.resume = Resume::Submit;
        self.retries = 0;
        self.chunk_started_at = None;
        self.position.chunk_index = self.position.total_chunks;
    }

    fn schedule(&mut self, delay: std::time::Duration) {
        self.cancel_timer();
        let ticket = TimerTicket::from_u64(self.next_ticket);
        self.next_ticket += 1;
        self.pending_timer = Some(ticket);
        self.scheduler.schedule(ticket, delay);
    }

    fn cancel_timer(&mut self) {
        if let Some(ticket) = self.pending_timer.take() {
            self.scheduler.cancel(ticket);
        }
    }
}
