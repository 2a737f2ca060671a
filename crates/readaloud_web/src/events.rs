use std::time::Duration;

use readaloud::SelectionSource;
use wasm_bindgen::prelude::*;
use web_sys::HtmlIFrameElement;

use crate::{
    ReaderEvent, ReaderRunner, WebOptions, string_from_js_value,
    timeouts::timeout_millis,
    web_runner::{Listeners, WebRunner},
};

// ------------------------------------------------------------------------

/// Paints, and keeps requesting animation frames for as long as the progress bar moves.
pub(crate) fn paint_and_schedule(runner_ref: &WebRunner) -> Result<(), JsValue> {
    // Only paint and schedule if there has been no panic
    if let Some(mut runner_lock) = runner_ref.try_lock() {
        let animating = runner_lock.paint();
        drop(runner_lock);
        if animating {
            runner_ref.request_animation_frame()?;
        }
    }
    Ok(())
}

// ------------------------------------------------------------------------

pub(crate) fn install_event_handlers(
    runner_ref: &WebRunner,
    web_options: &WebOptions,
    document_url: Option<&str>,
) -> Result<(), JsValue> {
    install_control_events(runner_ref)?;
    install_voice_events(runner_ref)?;
    let document = crate::document()?;
    install_selection_events(
        runner_ref,
        &document,
        &crate::window()?,
        SelectionSource::Document,
        Listeners::Page,
    )?;
    if let Some(frame_id) = &web_options.frame_id {
        install_frame_events(runner_ref, frame_id, document_url)?;
    }
    Ok(())
}

fn install_control_events(runner_ref: &WebRunner) -> Result<(), JsValue> {
    let Some(controls) = runner_ref.try_lock().map(|runner| runner.view().controls()) else {
        return Ok(());
    };

    runner_ref.add_event_listener(&controls.toggle, "click", |_: web_sys::MouseEvent, runner| {
        runner.toggle();
    })?;
    runner_ref.add_event_listener(&controls.stop, "click", |_: web_sys::MouseEvent, runner| {
        runner.stop();
    })?;
    runner_ref.add_event_listener(&controls.prev, "click", |_: web_sys::MouseEvent, runner| {
        runner.prev_page();
    })?;
    runner_ref.add_event_listener(&controls.next, "click", |_: web_sys::MouseEvent, runner| {
        runner.next_page();
    })?;

    Ok(())
}

/// Voices load asynchronously; the catalog is empty until `voiceschanged`.
fn install_voice_events(runner_ref: &WebRunner) -> Result<(), JsValue> {
    let Ok(synth) = crate::window()?.speech_synthesis() else {
        return Ok(());
    };
    runner_ref.add_event_listener(&synth, "voiceschanged", |_: web_sys::Event, runner| {
        runner.handle(ReaderEvent::VoicesChanged);
    })
}

/// Read the selection of `selection_window` shortly after the user lets go of it.
fn install_selection_events(
    runner_ref: &WebRunner,
    target: &web_sys::EventTarget,
    selection_window: &web_sys::Window,
    source: SelectionSource,
    listeners: Listeners,
) -> Result<(), JsValue> {
    for event_name in ["mouseup", "touchend"] {
        let selection_window = selection_window.clone();
        runner_ref.add_event_listener_ex(
            target,
            event_name,
            listeners,
            move |_: web_sys::Event, runner: &mut ReaderRunner, web_runner: &WebRunner| {
                let delay = runner.web_options().selection_settle_delay;
                read_selection_later(web_runner, selection_window.clone(), source, delay);
            },
        )?;
    }
    Ok(())
}

fn read_selection_later(
    runner_ref: &WebRunner,
    selection_window: web_sys::Window,
    source: SelectionSource,
    delay: Duration,
) {
    let web_runner = runner_ref.clone();
    let callback = Closure::once_into_js(move || {
        let text = selected_text(&selection_window);
        web_runner.dispatch(ReaderEvent::Selection { source, text });
    });
    let result = crate::window().and_then(|window| {
        window.set_timeout_with_callback_and_timeout_and_arguments_0(
            callback.unchecked_ref(),
            timeout_millis(delay),
        )
    });
    if let Err(err) = result {
        log::warn!("Failed to read the selection: {}", string_from_js_value(&err));
    }
}

fn selected_text(window: &web_sys::Window) -> String {
    window
        .get_selection()
        .ok()
        .flatten()
        .map(|selection| String::from(selection.to_string()))
        .unwrap_or_default()
}

// ------------------------------------------------------------------------

/// Selections inside the `<iframe>` with id `frame_id`.
///
/// Every document the frame loads gets its own listeners, replacing those of
/// the previous document.
fn install_frame_events(
    runner_ref: &WebRunner,
    frame_id: &str,
    document_url: Option<&str>,
) -> Result<(), JsValue> {
    let Some(element) = crate::document()?.get_element_by_id(frame_id) else {
        log::warn!("Found no element with id {frame_id:?}; only selections on the page will be read");
        return Ok(());
    };
    let frame: HtmlIFrameElement = element.dyn_into().map_err(|element| {
        JsValue::from_str(&format!("{:?} is a <{}>, not an <iframe>", frame_id, element.tag_name()))
    })?;

    runner_ref.add_event_listener_ex(&frame, "load", Listeners::Page, {
        let frame = frame.clone();
        move |_: web_sys::Event, runner: &mut ReaderRunner, web_runner: &WebRunner| {
            attach_frame_document(web_runner, runner, &frame);
        }
    })?;

    if let Some(url) = document_url {
        // Attached on `load`.
        frame.set_src(url);
    } else if frame
        .content_document()
        .is_some_and(|document| document.ready_state() == "complete")
    {
        if let Some(mut runner) = runner_ref.try_lock() {
            attach_frame_document(runner_ref, &mut runner, &frame);
        }
    }

    Ok(())
}

fn attach_frame_document(runner_ref: &WebRunner, runner: &mut ReaderRunner, frame: &HtmlIFrameElement) {
    runner_ref.unsubscribe_frame_events();

    let (Some(frame_window), Some(frame_document)) = (frame.content_window(), frame.content_document())
    else {
        log::warn!("Can't read selections in the frame; is its document from another origin?");
        runner.detach_frame();
        return;
    };

    let id = runner.attach_frame();
    if let Err(err) = install_selection_events(
        runner_ref,
        &frame_document,
        &frame_window,
        SelectionSource::Frame(id),
        Listeners::Frame,
    ) {
        log::warn!(
            "Failed to listen to selections in the frame: {}",
            string_from_js_value(&err)
        );
    }
}
