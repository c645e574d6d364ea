//! Error types for configuration and stamping.

use std::path::PathBuf;

use thiserror::Error;

/// A caller's own error, as returned from a fallback prefix function.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Invalid setup. Raised once, before any payload is stamped.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Prefix table is absent, an array, or not a plain name → string map.
    ///
    /// `reason` is for debugging; the message is fixed so callers can match it.
    #[error("A valid prefixMap must be provided.")]
    InvalidPrefixMap { reason: String },

    /// Settings file could not be read.
    #[error("failed to read settings {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Settings text is not valid TOML for the expected layout.
    #[error("failed to parse settings: {0}")]
    Toml(#[from] toml::de::Error),

    /// Settings text is not valid JSON for the expected layout.
    #[error("failed to parse settings: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    pub(crate) fn invalid_prefix_map(reason: impl Into<String>) -> Self {
        Self::InvalidPrefixMap {
            reason: reason.into(),
        }
    }
}

/// Failure while stamping a payload. Aborts the whole rewrite.
#[derive(Error, Debug)]
pub enum StampError {
    /// No usable prefix for this entity type: no table entry, or an empty one,
    /// and the fallback was absent or returned nothing usable.
    #[error("Prefix not defined or invalid for model \"{entity_type}\"")]
    PrefixNotDefined { entity_type: String },

    /// The caller's fallback function failed. Its error passes through as-is:
    /// `Display` and `source()` are the original's, and `downcast_ref` on the
    /// inner box recovers the concrete type.
    #[error(transparent)]
    Fallback(BoxError),
}

impl StampError {
    /// The entity type that had no prefix, if that is what went wrong.
    pub fn entity_type(&self) -> Option<&str> {
        match self {
            Self::PrefixNotDefined { entity_type } => Some(entity_type),
            Self::Fallback(_) => None,
        }
    }
}
