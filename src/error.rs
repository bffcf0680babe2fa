//! Error types.
//!
//! Nothing in here ever reaches the host's poll call: `TurboError` is caught
//! at the interceptor boundary, `NotifyError` is logged and dropped, and
//! `ConfigError` only surfaces from settings load/save.

use std::path::PathBuf;

use crate::buttons::ExtensionShape;

/// Fault while rewriting a single poll sample.
#[derive(Debug, thiserror::Error)]
pub enum TurboError {
    /// The hardware reported an extension type with no known button layout.
    #[error("unknown extension type {0:#04x}")]
    UnknownExtension(u8),

    /// The edge tracker produced levels for a different extension than the
    /// one the channel state is tagged with.
    #[error("edge tracker reported {reported} levels for a channel holding {expected} state")]
    ShapeMismatch {
        expected: ExtensionShape,
        reported: ExtensionShape,
    },

    /// The live configuration carries a zero period.
    #[error("turbo period must be at least 1 tick")]
    InvalidPeriod,
}

/// Settings file and validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unknown {family} button \"{name}\"")]
    UnknownButton { family: &'static str, name: String },

    #[error("too many toggle combos: {0} (max {max})", max = crate::config::MAX_TOGGLE_COMBOS)]
    TooManyCombos(usize),

    #[error("turbo period must be at least 1 tick")]
    InvalidPeriod,
}

/// Best-effort notification delivery failure.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification sink unavailable: {0}")]
    Unavailable(String),
}
