//! Playback options persisted in `localStorage`, as RON.

use readaloud::{OptionsError, PlaybackOptions};

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok()?
}

fn local_storage_get(key: &str) -> Option<String> {
    local_storage().map(|storage| storage.get_item(key).ok())??
}

fn local_storage_set(key: &str, value: &str) {
    let Some(storage) = local_storage() else {
        return;
    };
    if let Err(err) = storage.set_item(key, value) {
        log::warn!(
            "Failed to write {key:?} to local storage: {}",
            crate::string_from_js_value(&err)
        );
    }
}

/// Stored or user supplied options that could not be used.
#[derive(Debug, thiserror::Error)]
pub(crate) enum StoredOptionsError {
    #[error("failed to parse playback options: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("invalid playback options: {0}")]
    Invalid(#[from] OptionsError),
}

/// Parse and validate options. Missing fields take their defaults.
pub(crate) fn parse_playback_options(ron: &str) -> Result<PlaybackOptions, StoredOptionsError> {
    let options: PlaybackOptions = ron::from_str(ron)?;
    options.validate()?;
    Ok(options)
}

/// The stored options, or the defaults if there are none or they can't be used.
pub(crate) fn load_playback_options(key: &str) -> PlaybackOptions {
    let Some(stored) = local_storage_get(key) else {
        return PlaybackOptions::default();
    };
    match parse_playback_options(&stored) {
        Ok(options) => {
            log::debug!("Loaded playback options from local storage");
            options
        }
        Err(err) => {
            log::warn!("Ignoring stored playback options: {err}");
            PlaybackOptions::default()
        }
    }
}

pub(crate) fn save_playback_options(key: &str, options: &PlaybackOptions) {
    match ron::ser::to_string_pretty(options, ron::ser::PrettyConfig::default()) {
        Ok(ron) => local_storage_set(key, &ron),
        Err(err) => log::warn!("Failed to serialize playback options: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let options = parse_playback_options("(rate: 1.5, max_words: 40)").unwrap();
        assert_eq!(options.rate, 1.5);
        assert_eq!(options.max_words, 40);
        assert_eq!(options.max_retries, 3);
        assert_eq!(options.advance_delay, Duration::from_millis(200));
        assert_eq!(options.preferred_voice, "female");
    }

    #[test]
    fn saved_options_read_back() {
        let options = PlaybackOptions {
            volume: 0.25,
            preferred_voice: "Samantha".to_owned(),
            ..Default::default()
        };
        let ron = ron::ser::to_string_pretty(&options, ron::ser::PrettyConfig::default()).unwrap();
        assert_eq!(parse_playback_options(&ron).unwrap(), options);
    }

    #[test]
    fn rejects_garbage_and_out_of_range_values() {
        assert!(matches!(
            parse_playback_options("{not ron"),
            Err(StoredOptionsError::Parse(_))
        ));
        assert!(matches!(
            parse_playback_options("(volume: 3.0)"),
            Err(StoredOptionsError::Invalid(OptionsError::Volume(_)))
        ));
        assert!(matches!(
            parse_playback_options("(max_words: 0)"),
            Err(StoredOptionsError::Invalid(OptionsError::ZeroWordBudget))
        ));
    }
}
