//! Centralized error types for docmail.

use std::path::PathBuf;
use thiserror::Error;

use crate::host::HostError;

/// All errors produced by the docmail library.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// The header block is not valid key/value syntax.
    #[error("Malformed header{}: {reason}", line.map(|l| format!(" at line {l}")).unwrap_or_default())]
    HeaderSyntax { line: Option<usize>, reason: String },

    /// A header value cannot be coerced to the type its property requires.
    #[error("Property '{name}' expects {expected}, got '{raw}'")]
    PropertyType {
        name: String,
        raw: String,
        expected: &'static str,
    },

    /// The mail host rejected a coerced value.
    #[error("Failed to set property '{name}': {source}")]
    PropertyApply { name: String, source: HostError },

    /// A segment of a shorthand folder path does not exist.
    #[error("Folder '{segment}' not found while resolving '{path}'")]
    FolderResolution { path: String, segment: String },

    /// An attachment was missing when the message was populated.
    #[error("Attachment not found: {0}")]
    AttachmentNotFound(PathBuf),

    /// A host application call outside property application failed.
    #[error("{action} failed: {source}")]
    Host {
        action: &'static str,
        source: HostError,
    },

    /// Template rendering failed.
    #[error("Template rendering failed: {0}")]
    Template(HostError),

    /// The source document does not exist.
    #[error("Document not found: {0}")]
    FileNotFound(PathBuf),

    /// I/O error with the associated file path.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A configuration value is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Convenience alias for `Result<T, ConvertError>`.
pub type Result<T> = std::result::Result<T, ConvertError>;

impl ConvertError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a `Host` variant naming the lifecycle step that failed.
    pub fn host(action: &'static str, source: HostError) -> Self {
        Self::Host { action, source }
    }

    /// Name of the offending property, for errors tied to one.
    pub fn property_name(&self) -> Option<&str> {
        match self {
            Self::PropertyType { name, .. } | Self::PropertyApply { name, .. } => Some(name),
            Self::FolderResolution { .. } => Some("SaveSentMessageFolder"),
            Self::AttachmentNotFound(_) => Some("Attachments"),
            _ => None,
        }
    }
}
