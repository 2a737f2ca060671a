use std::time::Duration;

/// Names one scheduled callback of the [`crate::Sequencer`].
///
/// Tickets are never reused, so a late callback carrying an old ticket can be recognized and ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerTicket(u64);

impl TimerTicket {
    #[inline]
    pub const fn from_u64(ticket: u64) -> Self {
        Self(ticket)
    }

    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

/// Deferred callbacks, e.g. `setTimeout` in a browser.
///
/// When the delay has passed, the host hands the ticket to
/// [`crate::Sequencer::on_timer`]. Nothing may block: scheduling only records the request.
pub trait Scheduler {
    fn schedule(&mut self, ticket: TimerTicket, delay: Duration);

    /// The ticket is no longer wanted.
    ///
    /// Delivering it anyway is harmless; the sequencer ignores stale tickets.
    fn cancel(&mut self, ticket: TimerTicket);
}
