use std::{cell::RefCell, rc::Rc};

use wasm_bindgen::prelude::*;

use crate::{
    EventSink, PanicHandler, PanicSummary, ReaderEvent, ReaderRunner, WebOptions, events, extract,
    string_from_js_value, view::View,
};

/// This is how the reader runs in a web page.
///
/// This is cheap to clone.
#[derive(Clone)]
pub struct WebRunner {
    /// Have we ever panicked?
    panic_handler: PanicHandler,

    /// If we ever panic during running, this `RefCell` is poisoned.
    /// So before we use it, we need to check [`Self::panic_handler`].
    runner: Rc<RefCell<Option<ReaderRunner>>>,

    /// Listeners on the page itself. Removed on panic or [`Self::destroy`].
    page_events: Rc<RefCell<Vec<EventToUnsubscribe>>>,

    /// Listeners on the document inside the embedded frame.
    /// Replaced every time the frame loads a new document.
    frame_events: Rc<RefCell<Vec<EventToUnsubscribe>>>,

    /// Current animation frame in flight.
    frame: Rc<RefCell<Option<AnimationFrameRequest>>>,
}

/// Which set of listeners a new listener joins.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Listeners {
    Page,
    Frame,
}

impl WebRunner {
    /// Will install a panic handler that will catch and log any panics.
    #[expect(clippy::new_without_default)]
    pub fn new() -> Self {
        let panic_handler = PanicHandler::install();

        Self {
            panic_handler,
            runner: Rc::new(RefCell::new(None)),
            page_events: Default::default(),
            frame_events: Default::default(),
            frame: Default::default(),
        }
    }

    /// Build the view inside the element with id `root_id`, and install callbacks.
    ///
    /// `document_url` is shown in the embedded frame, if [`WebOptions::frame_id`] names one.
    pub fn start(
        &self,
        root_id: &str,
        web_options: WebOptions,
        document_url: Option<&str>,
    ) -> Result<(), JsValue> {
        self.destroy();

        let root = crate::document()?
            .get_element_by_id(root_id)
            .ok_or_else(|| JsValue::from_str(&format!("Failed to find element with id {root_id:?}")))?;

        {
            let view = View::mount(&root)?;
            let runner = ReaderRunner::new(view, web_options.clone(), &self.event_sink());
            self.runner.replace(Some(runner));
        }

        events::install_event_handlers(self, &web_options, document_url)?;

        log::info!("Reader started, event handlers installed.");
        self.repaint();

        Ok(())
    }

    /// Extract the text of the PDF at `url` into the reader pane.
    ///
    /// The runner is not borrowed while pdf.js works, so playback carries on meanwhile.
    pub async fn open_document(&self, url: String) {
        let Some(load) = self.try_lock().map(|mut runner| runner.begin_loading()) else {
            return;
        };
        log::debug!("Extracting text from {url:?}");

        let pages = extract::extract_pages(&url).await;

        if let Some(mut runner) = self.try_lock() {
            runner.finish_loading(load, pages);
        }
    }

    /// Has there been a panic?
    pub fn has_panicked(&self) -> bool {
        self.panic_handler.has_panicked()
    }

    /// What was the panic message and callstack?
    pub fn panic_summary(&self) -> Option<PanicSummary> {
        self.panic_handler.panic_summary()
    }

    fn unsubscribe(listeners: &RefCell<Vec<EventToUnsubscribe>>) {
        let events_to_unsubscribe: Vec<_> = std::mem::take(&mut *listeners.borrow_mut());

        if !events_to_unsubscribe.is_empty() {
            log::debug!("Unsubscribing from {} events", events_to_unsubscribe.len());
            for x in events_to_unsubscribe {
                if let Err(err) = x.unsubscribe() {
                    log::warn!(
                        "Failed to unsubscribe from event: {}",
                        string_from_js_value(&err)
                    );
                }
            }
        }
    }

    fn unsubscribe_from_all_events(&self) {
        Self::unsubscribe(&self.frame_events);
        Self::unsubscribe(&self.page_events);
    }

    /// Stop listening to the document the embedded frame showed until now.
    pub(crate) fn unsubscribe_frame_events(&self) {
        Self::unsubscribe(&self.frame_events);
    }

    /// Stop speaking, remove the view, and release every callback.
    pub fn destroy(&self) {
        self.unsubscribe_from_all_events();

        if let Some(frame) = self.frame.take() {
            if let Some(window) = web_sys::window() {
                window.cancel_animation_frame(frame.id).ok();
            }
        }

        if let Some(runner) = self.runner.replace(None) {
            runner.destroy();
        }
    }

    /// Returns `None` if there has been a panic, if we have been destroyed,
    /// or if the runner is already borrowed further up the stack.
    /// In that case, just return to JS.
    pub(crate) fn try_lock(&self) -> Option<std::cell::RefMut<'_, ReaderRunner>> {
        if self.panic_handler.has_panicked() {
            // Unsubscribe from all events so that we don't get any more callbacks
            // that will try to access the poisoned runner.
            self.unsubscribe_from_all_events();
            None
        } else {
            let lock = self.runner.try_borrow_mut().ok()?;
            std::cell::RefMut::filter_map(lock, |lock| -> Option<&mut ReaderRunner> { lock.as_mut() })
                .ok()
        }
    }

    /// Where the speech engine and the timers deliver their events.
    pub(crate) fn event_sink(&self) -> EventSink {
        let web_runner = self.clone();
        Rc::new(move |event| web_runner.dispatch(event))
    }

    /// Hand `event` to the runner, then repaint.
    ///
    /// Some browsers report speech events synchronously, from inside our own call
    /// to `speechSynthesis`. The runner is borrowed then, so the event is
    /// delivered again from a zero-delay timeout.
    pub(crate) fn dispatch(&self, event: ReaderEvent) {
        if self.panic_handler.has_panicked() {
            self.unsubscribe_from_all_events();
            return;
        }

        let Ok(mut lock) = self.runner.try_borrow_mut() else {
            self.defer(event);
            return;
        };
        let Some(runner) = lock.as_mut() else {
            log::trace!("Dropping {event:?}: the reader is gone");
            return;
        };
        runner.handle(event);
        drop(lock);

        self.repaint();
    }

    fn defer(&self, event: ReaderEvent) {
        log::trace!("Runner busy, deferring {event:?}");
        let web_runner = self.clone();
        let callback = Closure::once_into_js(move || web_runner.dispatch(event));
        let result = crate::window().and_then(|window| {
            window.set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.unchecked_ref(),
                0,
            )
        });
        if let Err(err) = result {
            log::error!("Failed to defer event: {}", string_from_js_value(&err));
        }
    }

    /// Convenience function to reduce boilerplate and ensure that all event handlers
    /// are dealt with in the same way.
    ///
    /// The listener joins [`Listeners::Page`], and the view is repainted after every call.
    pub(crate) fn add_event_listener<E: wasm_bindgen::JsCast>(
        &self,
        target: &web_sys::EventTarget,
        event_name: &'static str,
        mut closure: impl FnMut(E, &mut ReaderRunner) + 'static,
    ) -> Result<(), JsValue> {
        self.add_event_listener_ex(
            target,
            event_name,
            Listeners::Page,
            move |event, runner, _web_runner| closure(event, runner),
        )
    }

    /// Like [`Self::add_event_listener`], but with a choice of [`Listeners`]
    /// and access to the [`WebRunner`] itself.
    ///
    /// Listeners are passive: none of ours ever calls `preventDefault`.
    pub(crate) fn add_event_listener_ex<E: wasm_bindgen::JsCast>(
        &self,
        target: &web_sys::EventTarget,
        event_name: &'static str,
        listeners: Listeners,
        mut closure: impl FnMut(E, &mut ReaderRunner, &Self) + 'static,
    ) -> Result<(), JsValue> {
        let web_runner = self.clone();

        let closure = Closure::wrap(Box::new(move |event: web_sys::Event| {
            // Only call the wrapped closure if we have not panicked
            if let Some(mut runner_lock) = web_runner.try_lock() {
                let event = event.unchecked_into::<E>();
                closure(event, &mut runner_lock, &web_runner);
                drop(runner_lock);
                web_runner.repaint();
            }
        }) as Box<dyn FnMut(web_sys::Event)>);

        let options = web_sys::AddEventListenerOptions::new();
        options.set_passive(true);
        target.add_event_listener_with_callback_and_add_event_listener_options(
            event_name,
            closure.as_ref().unchecked_ref(),
            &options,
        )?;

        let handle = EventToUnsubscribe {
            target: target.clone(),
            event_name,
            closure,
        };

        // Remember it so we unsubscribe on panic.
        // Otherwise we get calls into `self.runner` after it has been poisoned by a panic.
        let bucket = match listeners {
            Listeners::Page => &self.page_events,
            Listeners::Frame => &self.frame_events,
        };
        bucket.borrow_mut().push(handle);

        Ok(())
    }

    /// Paint on the next animation frame, logging failure.
    pub(crate) fn repaint(&self) {
        if let Err(err) = self.request_animation_frame() {
            log::warn!(
                "Failed to request an animation frame: {}",
                string_from_js_value(&err)
            );
        }
    }

    /// Request an animation frame from the browser in which we can paint.
    ///
    /// It is safe to call `request_animation_frame` multiple times in quick succession,
    /// this function guarantees that only one animation frame is scheduled at a time.
    pub(crate) fn request_animation_frame(&self) -> Result<(), JsValue> {
        if self.frame.borrow().is_some() {
            // there is already an animation frame in flight
            return Ok(());
        }

        let window = crate::window()?;
        let closure = Closure::once({
            let web_runner = self.clone();
            move || {
                // We can paint now, so clear the animation frame.
                // This drops the `closure` and allows another
                // animation frame to be scheduled
                let _ = web_runner.frame.take();
                events::paint_and_schedule(&web_runner)
            }
        });

        let id = window.request_animation_frame(closure.as_ref().unchecked_ref())?;
        self.frame.borrow_mut().replace(AnimationFrameRequest {
            id,
            _closure: closure,
        });

        Ok(())
    }
}

// ----------------------------------------------------------------------------

// https://rustwasm.github.io/wasm-bindgen/api/wasm_bindgen/closure/struct.Closure.html#using-fnonce-and-closureonce-with-requestanimationframe
struct AnimationFrameRequest {
    /// Represents the ID of a frame in flight.
    id: i32,

    /// The callback given to `request_animation_frame`, stored here both to prevent it
    /// from being canceled, and from having to `.forget()` it.
    _closure: Closure<dyn FnMut() -> Result<(), JsValue>>,
}

struct EventToUnsubscribe {
    target: web_sys::EventTarget,
    event_name: &'static str,
    closure: Closure<dyn FnMut(web_sys::Event)>,
}

impl EventToUnsubscribe {
    fn unsubscribe(self) -> Result<(), JsValue> {
        self.target
            .remove_event_listener_with_callback(self.event_name, self.closure.as_ref().unchecked_ref())
    }
}
