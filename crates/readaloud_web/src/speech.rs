use std::rc::Rc;

use readaloud::{EngineError, EngineEvent, SpeechEngine, UtteranceId, UtteranceRequest, Voice};
use wasm_bindgen::prelude::*;
use web_sys::{
    SpeechSynthesis, SpeechSynthesisErrorCode, SpeechSynthesisErrorEvent, SpeechSynthesisEvent,
    SpeechSynthesisUtterance, SpeechSynthesisVoice,
};

use crate::{EventSink, ReaderEvent, string_from_js_value};

/// [`SpeechEngine`] over `window.speechSynthesis`.
///
/// Completion is reported through the [`EventSink`] as [`ReaderEvent::Engine`].
pub(crate) struct WebSpeechEngine {
    /// `None` if the browser has no speech synthesis.
    synth: Option<SpeechSynthesis>,
    sink: EventSink,
    in_flight: Option<InFlight>,
}

impl WebSpeechEngine {
    pub fn new(sink: EventSink) -> Self {
        let synth = web_sys::window().and_then(|window| window.speech_synthesis().ok());
        if synth.is_none() {
            log::warn!("This browser has no speech synthesis");
        }
        Self {
            synth,
            sink,
            in_flight: None,
        }
    }

    fn voice_for(synth: &SpeechSynthesis, voice: &Voice) -> Option<SpeechSynthesisVoice> {
        synth
            .get_voices()
            .iter()
            .filter_map(|value| value.dyn_into::<SpeechSynthesisVoice>().ok())
            .find(|candidate| candidate.voice_uri() == voice.uri)
    }
}

impl SpeechEngine for WebSpeechEngine {
    fn submit(&mut self, id: UtteranceId, request: &UtteranceRequest) -> Result<(), EngineError> {
        let Some(synth) = &self.synth else {
            return Err(EngineError::Unavailable);
        };

        let utterance = SpeechSynthesisUtterance::new_with_text(&request.text)
            .map_err(|err| EngineError::SynthesisFailed(string_from_js_value(&err)))?;
        utterance.set_rate(request.rate);
        utterance.set_pitch(request.pitch);
        utterance.set_volume(request.volume);
        if let Some(voice) = &request.voice {
            match Self::voice_for(synth, voice) {
                Some(voice) => utterance.set_voice(Some(&voice)),
                None => log::debug!("Voice {:?} is gone, using the default", voice.name),
            }
        }

        let in_flight = InFlight::new(utterance, id, &self.sink);
        synth.speak(&in_flight.utterance);
        self.in_flight = Some(in_flight);
        Ok(())
    }

    fn cancel(&mut self) {
        // Detach first: the interruption of a cancelled utterance is not news.
        self.in_flight = None;
        if let Some(synth) = &self.synth {
            synth.cancel();
        }
    }

    fn pause(&mut self) {
        if let Some(synth) = &self.synth {
            synth.pause();
        }
    }

    fn resume(&mut self) {
        if let Some(synth) = &self.synth {
            synth.resume();
        }
    }

    fn voices(&mut self) -> Vec<Voice> {
        let Some(synth) = &self.synth else {
            return Vec::new();
        };
        synth
            .get_voices()
            .iter()
            .filter_map(|value| value.dyn_into::<SpeechSynthesisVoice>().ok())
            .map(|voice| Voice {
                name: voice.name(),
                lang: voice.lang(),
                uri: voice.voice_uri(),
                is_default: voice.default(),
            })
            .collect()
    }
}

impl Drop for WebSpeechEngine {
    fn drop(&mut self) {
        self.cancel();
    }
}

// ----------------------------------------------------------------------------

/// The utterance being spoken, with the handlers that report on it.
///
/// The browser only holds the utterance weakly in some engines, so we keep it
/// (and the closures it calls) alive until it is retired.
struct InFlight {
    utterance: SpeechSynthesisUtterance,
    _on_start: Closure<dyn FnMut(SpeechSynthesisEvent)>,
    _on_end: Closure<dyn FnMut(SpeechSynthesisEvent)>,
    _on_error: Closure<dyn FnMut(SpeechSynthesisErrorEvent)>,
}

impl InFlight {
    fn new(utterance: SpeechSynthesisUtterance, id: UtteranceId, sink: &EventSink) -> Self {
        let on_start = {
            let sink = Rc::clone(sink);
            Closure::wrap(Box::new(move |_: SpeechSynthesisEvent| {
                sink(ReaderEvent::Engine(EngineEvent::started(id)));
            }) as Box<dyn FnMut(SpeechSynthesisEvent)>)
        };
        let on_end = {
            let sink = Rc::clone(sink);
            Closure::wrap(Box::new(move |_: SpeechSynthesisEvent| {
                sink(ReaderEvent::Engine(EngineEvent::ended(id)));
            }) as Box<dyn FnMut(SpeechSynthesisEvent)>)
        };
        let on_error = {
            let sink = Rc::clone(sink);
            Closure::wrap(Box::new(move |event: SpeechSynthesisErrorEvent| {
                let error = engine_error(event.error());
                sink(ReaderEvent::Engine(EngineEvent::failed(id, error)));
            }) as Box<dyn FnMut(SpeechSynthesisErrorEvent)>)
        };

        utterance.set_onstart(Some(on_start.as_ref().unchecked_ref()));
        utterance.set_onend(Some(on_end.as_ref().unchecked_ref()));
        utterance.set_onerror(Some(on_error.as_ref().unchecked_ref()));

        Self {
            utterance,
            _on_start: on_start,
            _on_end: on_end,
            _on_error: on_error,
        }
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        // The closures are about to be freed; the browser must not call them anymore.
        self.utterance.set_onstart(None);
        self.utterance.set_onend(None);
        self.utterance.set_onerror(None);
    }
}

fn engine_error(code: SpeechSynthesisErrorCode) -> EngineError {
    match code {
        SpeechSynthesisErrorCode::Canceled | SpeechSynthesisErrorCode::Interrupted => {
            EngineError::Interrupted
        }
        SpeechSynthesisErrorCode::AudioBusy | SpeechSynthesisErrorCode::AudioHardware => {
            EngineError::AudioOutput
        }
        SpeechSynthesisErrorCode::SynthesisUnavailable => EngineError::Unavailable,
        SpeechSynthesisErrorCode::LanguageUnavailable
        | SpeechSynthesisErrorCode::VoiceUnavailable => EngineError::VoiceUnavailable,
        SpeechSynthesisErrorCode::NotAllowed => EngineError::NotAllowed,
        SpeechSynthesisErrorCode::Network => EngineError::SynthesisFailed("network".to_owned()),
        SpeechSynthesisErrorCode::SynthesisFailed => {
            EngineError::SynthesisFailed("synthesis-failed".to_owned())
        }
        SpeechSynthesisErrorCode::TextTooLong => {
            EngineError::SynthesisFailed("text-too-long".to_owned())
        }
        SpeechSynthesisErrorCode::InvalidArgument => {
            EngineError::SynthesisFailed("invalid-argument".to_owned())
        }
        _ => EngineError::SynthesisFailed("unknown".to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes() {
        assert_eq!(
            engine_error(SpeechSynthesisErrorCode::Interrupted),
            EngineError::Interrupted
        );
        assert_eq!(
            engine_error(SpeechSynthesisErrorCode::AudioHardware),
            EngineError::AudioOutput
        );
        assert_eq!(
            engine_error(SpeechSynthesisErrorCode::NotAllowed),
            EngineError::NotAllowed
        );
        assert_eq!(
            engine_error(SpeechSynthesisErrorCode::TextTooLong),
            EngineError::SynthesisFailed("text-too-long".to_owned())
        );
    }
}
