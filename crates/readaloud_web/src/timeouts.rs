use std::{collections::HashMap, rc::Rc, time::Duration};

use readaloud::{Scheduler, TimerTicket};
use wasm_bindgen::prelude::*;

use crate::{EventSink, ReaderEvent, string_from_js_value};

/// [`Scheduler`] over `setTimeout`.
///
/// A fired ticket is delivered as [`ReaderEvent::Timer`].
pub(crate) struct TimeoutScheduler {
    sink: EventSink,
    pending: HashMap<TimerTicket, Timeout>,
}

struct Timeout {
    handle: i32,

    /// Freed when the ticket is cancelled, which the sequencer also does once it fired.
    _closure: Closure<dyn FnMut()>,
}

impl TimeoutScheduler {
    pub fn new(sink: EventSink) -> Self {
        Self {
            sink,
            pending: HashMap::new(),
        }
    }

    fn set_timeout(&self, ticket: TimerTicket, delay: Duration) -> Result<Timeout, JsValue> {
        let sink = Rc::clone(&self.sink);
        let closure: Closure<dyn FnMut()> = Closure::once(move || sink(ReaderEvent::Timer(ticket)));
        let handle = crate::window()?.set_timeout_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            timeout_millis(delay),
        )?;
        Ok(Timeout {
            handle,
            _closure: closure,
        })
    }
}

impl Scheduler for TimeoutScheduler {
    fn schedule(&mut self, ticket: TimerTicket, delay: Duration) {
        match self.set_timeout(ticket, delay) {
            Ok(timeout) => {
                self.pending.insert(ticket, timeout);
            }
            Err(err) => {
                log::error!("setTimeout failed: {}", string_from_js_value(&err));
            }
        }
    }

    fn cancel(&mut self, ticket: TimerTicket) {
        if let Some(timeout) = self.pending.remove(&ticket) {
            if let Some(window) = web_sys::window() {
                window.clear_timeout_with_handle(timeout.handle);
            }
        }
    }
}

impl Drop for TimeoutScheduler {
    fn drop(&mut self) {
        let tickets: Vec<TimerTicket> = self.pending.keys().copied().collect();
        for ticket in tickets {
            self.cancel(ticket);
        }
    }
}

/// Milliseconds as `setTimeout` wants them.
pub(crate) fn timeout_millis(delay: Duration) -> i32 {
    i32::try_from(delay.as_millis()).unwrap_or(i32::MAX)
}

#[test]
fn test_timeout_millis() {
    assert_eq!(timeout_millis(Duration::from_millis(200)), 200);
    assert_eq!(timeout_millis(Duration::from_micros(1500)), 1);
    assert_eq!(timeout_millis(Duration::from_secs(u64::MAX)), i32::MAX);
}
