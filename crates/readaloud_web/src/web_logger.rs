/// Implements [`log::Log`] to log messages to `console.debug`, `console.warn`, etc.
///
/// Our own crates log at the level given to [`Self::init`].
/// Everything else is capped at `INFO`.
pub struct WebLogger {
    filter: log::LevelFilter,
}

impl WebLogger {
    /// Install a new `WebLogger`, piping all [`log`] events to the web console.
    pub fn init(filter: log::LevelFilter) -> Result<(), log::SetLoggerError> {
        log::set_max_level(filter);
        log::set_boxed_logger(Box::new(Self::new(filter)))
    }

    /// Create a new [`WebLogger`] with the given filter, but don't install it.
    pub fn new(filter: log::LevelFilter) -> Self {
        Self { filter }
    }
}

impl log::Log for WebLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= level_for_target(metadata.target(), self.filter)
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let msg = if let (Some(file), Some(line)) = (record.file(), record.line()) {
            let file = shorten_file_path(file);
            format!("[{}] {file}:{line}: {}", record.target(), record.args())
        } else {
            format!("[{}] {}", record.target(), record.args())
        };

        match record.level() {
            log::Level::Trace | log::Level::Debug => console::debug(&msg),
            log::Level::Info => console::info(&msg),
            log::Level::Warn => console::warn(&msg),

            // Errors are not fatal here; the page decides what a panic looks like.
            log::Level::Error => console::warn(&format!("ERROR: {msg}")),
        }
    }

    fn flush(&self) {}
}

/// Most verbose level to log for `target`.
fn level_for_target(target: &str, filter: log::LevelFilter) -> log::LevelFilter {
    const OWN_CRATES: &[&str] = &["readaloud"];

    if OWN_CRATES.iter().any(|name| target.starts_with(name)) {
        filter
    } else {
        filter.min(log::LevelFilter::Info)
    }
}

/// js-bindings for the console
mod console {
    use wasm_bindgen::prelude::*;

    #[wasm_bindgen]
    extern "C" {
        /// `console.debug`
        #[wasm_bindgen(js_namespace = console)]
        pub fn debug(s: &str);

        /// `console.info`
        #[wasm_bindgen(js_namespace = console)]
        pub fn info(s: &str);

        /// `console.warn`
        #[wasm_bindgen(js_namespace = console)]
        pub fn warn(s: &str);
    }
}

/// Shorten a path to a Rust source file, keeping the crate directory.
///
/// * `/home/ci/.cargo/registry/src/index.crates.io-6f17d22bba15001f/wasm-bindgen-futures-0.4.58/src/queue.rs`
///   becomes `wasm-bindgen-futures-0.4.58/src/queue.rs`
/// * `crates/readaloud/src/sequencer.rs` becomes `readaloud/src/sequencer.rs`
fn shorten_file_path(file_path: &str) -> &str {
    let Some(i) = file_path.rfind("/src/") else {
        return file_path;
    };
    match file_path[..i].rfind('/') {
        Some(prev_slash) => &file_path[prev_slash + 1..],
        None => file_path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortens_paths_to_the_crate() {
        for (before, after) in [
            (
                "/home/ci/.cargo/registry/src/index.crates.io-6f17d22bba15001f/wasm-bindgen-futures-0.4.58/src/queue.rs",
                "wasm-bindgen-futures-0.4.58/src/queue.rs",
            ),
            ("crates/readaloud/src/sequencer.rs", "readaloud/src/sequencer.rs"),
            ("readaloud_web/src/lib.rs", "readaloud_web/src/lib.rs"),
            ("src/lib.rs", "src/lib.rs"),
            ("/weird/path/file.rs", "/weird/path/file.rs"),
        ] {
            assert_eq!(shorten_file_path(before), after);
        }
    }

    #[test]
    fn foreign_crates_are_capped_at_info() {
        use log::LevelFilter;

        let filter = LevelFilter::Trace;
        assert_eq!(level_for_target("readaloud::sequencer", filter), LevelFilter::Trace);
        assert_eq!(level_for_target("readaloud_web::speech", filter), LevelFilter::Trace);
        assert_eq!(level_for_target("wasm_bindgen_futures", filter), LevelFilter::Info);
        assert_eq!(
            level_for_target("wasm_bindgen_futures", LevelFilter::Warn),
            LevelFilter::Warn
        );
    }
}
