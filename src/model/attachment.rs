//! Attachment declarations.
//!
//! A declared path is only checked against the filesystem when the message
//! is populated, so files produced earlier in the same run are accepted.

use std::path::{Path, PathBuf};

use crate::error::{ConvertError, Result};

/// One entry of the `Attachments` header property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentSpec {
    /// Path as written in the header (absolute or relative).
    pub path: PathBuf,
}

impl AttachmentSpec {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Resolve a relative path against `base`. Absolute paths are returned as-is.
    pub fn resolve(&self, base: Option<&Path>) -> PathBuf {
        match base {
            Some(dir) if self.path.is_relative() => dir.join(&self.path),
            _ => self.path.clone(),
        }
    }

    /// Resolve and verify the file exists right now.
    pub fn locate(&self, base: Option<&Path>) -> Result<PathBuf> {
        let resolved = self.resolve(base);
        if resolved.is_file() {
            Ok(resolved)
        } else {
            Err(ConvertError::AttachmentNotFound(resolved))
        }
    }
}
