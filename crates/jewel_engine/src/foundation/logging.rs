//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system with the default `info` filter
///
/// `RUST_LOG` still takes precedence when it is set.
pub fn init() {
    init_with_level("info");
}

/// Initialize the logging system with a fallback filter
///
/// Returns `false` if a logger was already installed (tests, embedding apps).
pub fn init_with_level(level: &str) -> bool {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_millis()
        .try_init()
        .is_ok()
}
