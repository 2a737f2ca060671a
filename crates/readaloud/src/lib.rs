//! `readaloud`: chunked speech playback for a selected passage of a document.
//!
//! The crate is the platform-independent core of a reader application.
//! A host (e.g. `readaloud_web` in a browser) supplies two seams:
//!
//! * a [`SpeechEngine`]: the single, process-wide speech resource,
//! * a [`Scheduler`]: something that can call back after a delay.
//!
//! Everything else lives here:
//!
//! * [`chunk`] splits a passage into speakable segments,
//! * [`PlaybackEngine`] owns all access to the speech engine,
//! * [`Sequencer`] drives the engine chunk by chunk and owns the playback state,
//! * [`ProgressIndicator`] derives the progress bar fill,
//! * [`SelectionBridge`] turns raw text selections into new playback input,
//! * [`Reader`] and [`layout_lines`] turn extracted pages into styled lines.
//!
//! All of it is single-threaded and event driven: the host feeds
//! [`EngineEvent`]s and fired [`TimerTicket`]s back into the [`Sequencer`].
//!
//! ```
//! use readaloud::{chunk, PlaybackOptions};
//!
//! let chunks = chunk("one two three four five", 2);
//! assert_eq!(chunks, ["one two", "three four", "five"]);
//! assert_eq!(PlaybackOptions::default().max_words, 25);
//! ```

mod adapter;
mod chunker;
mod document;
mod engine;
mod options;
mod progress;
mod reader;
mod scheduler;
mod selection;
mod sequencer;

pub use adapter::PlaybackEngine;
pub use chunker::chunk;
pub use document::{Line, LineKind, Page, PageStyle, TextItem, layout_lines};
pub use engine::{
    EngineError, EngineEvent, EngineEventKind, SpeechEngine, UtteranceId, UtteranceRequest, Voice,
};
pub use options::{OptionsError, PlaybackOptions};
pub use progress::{ProgressIndicator, fill_fraction};
pub use reader::Reader;
pub use scheduler::{Scheduler, TimerTicket};
pub use selection::{FrameId, SelectionBridge, SelectionSource};
pub use sequencer::{PlaybackPosition, PlaybackState, Sequencer};
