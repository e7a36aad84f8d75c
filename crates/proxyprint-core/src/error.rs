//! Crate-level error type.
//!
//! Errors fall into four classes that decide how callers react:
//!
//! - **Config**: bad or missing configuration, malformed LUT. Fatal at startup.
//! - **Input**: a source image or user-entered value could not be used. The
//!   offending file or field is skipped and batches continue.
//! - **Geometry**: the requested crop or grid cannot exist. The operation is
//!   rejected and nothing is written for it.
//! - **Persistence**: a cache, project or document could not be written.

use std::path::PathBuf;

use thiserror::Error;

use crate::decode::DecodeError;
use crate::encode::EncodeError;
use crate::lut::LutError;

/// Main error type for proxyprint operations.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// A configuration value is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The color lookup table could not be loaded.
    #[error("failed to load color table {path}: {source}")]
    Lut {
        path: PathBuf,
        #[source]
        source: LutError,
    },

    /// A source image could not be read or decoded.
    #[error("failed to read image {path}: {source}")]
    Input {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },

    /// A user-provided value failed validation.
    #[error("invalid value for {field}: {value:?}")]
    InvalidValue { field: &'static str, value: String },

    /// The requested crop or grid does not fit.
    #[error("geometry error: {0}")]
    Geometry(String),

    /// An image could not be encoded for output.
    #[error("failed to encode {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: EncodeError,
    },

    /// A cache, project or document could not be written.
    #[error("failed to write {path}: {reason}")]
    Persistence { path: PathBuf, reason: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProxyError {
    /// Build a persistence error from any displayable cause.
    pub fn persistence(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        ProxyError::Persistence {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Returns true for errors that must stop the process before any work starts.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ProxyError::Config(_) | ProxyError::Lut { .. })
    }
}

/// Result type alias for proxyprint operations.
pub type Result<T> = std::result::Result<T, ProxyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_fatal() {
        assert!(ProxyError::Config("Max.DPI missing".into()).is_fatal());
        assert!(!ProxyError::Geometry("0 columns".into()).is_fatal());
        assert!(!ProxyError::persistence("img.cache", "disk full").is_fatal());
    }

    #[test]
    fn test_invalid_value_display() {
        let err = ProxyError::InvalidValue {
            field: "bleed_edge",
            value: "abc".into(),
        };
        assert_eq!(err.to_string(), "invalid value for bleed_edge: \"abc\"");
    }
}
