//! Error and warning types.
//!
//! Probing itself never fails: unreadable input resolves to the Unknown
//! type. These errors only surface from configuration loading, building
//! custom signatures from text, and walking directories.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub type ProbeResult<T> = Result<T, ProbeError>;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Configuration validation failed with {} warning(s)", .0.len())]
    ConfigValidation(Vec<ConfigWarning>),

    #[error("Invalid magic '{magic}': {reason}")]
    InvalidMagic { magic: String, reason: String },

    #[error("Signature '{name}' has no magic patterns")]
    MissingMagic { name: String },

    #[error("File type name must not be blank")]
    BlankName,

    #[error("Invalid exclude pattern '{pattern}': {source}")]
    ExcludePattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("Not a directory: {path}")]
    NotADirectory { path: PathBuf },
}

/// A non-fatal configuration problem.
///
/// Returned by [`ProbeConfig::validate`](crate::ProbeConfig::validate) and
/// [`ProbeConfig::apply`](crate::ProbeConfig::apply). Entries that produce a
/// warning are skipped rather than applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigWarning {
    /// Dotted location of the offending value (e.g. `custom_types[2].magic`).
    pub field: String,
    pub message: String,
}

impl ConfigWarning {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}
