//! Source document snapshot.

use std::path::{Path, PathBuf};

/// An opened source document: its location and its paragraphs in order.
///
/// Handles are obtained from a [`DocumentHost`](crate::host::DocumentHost)
/// and returned to it when the conversion session ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    path: PathBuf,
    paragraphs: Vec<String>,
}

impl RawDocument {
    pub fn new(path: impl Into<PathBuf>, paragraphs: Vec<String>) -> Self {
        Self {
            path: path.into(),
            paragraphs,
        }
    }

    /// Build a document by splitting `text` into one paragraph per line.
    pub fn from_text(path: impl Into<PathBuf>, text: &str) -> Self {
        let paragraphs = text.lines().map(str::to_string).collect();
        Self::new(path, paragraphs)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn paragraphs(&self) -> &[String] {
        &self.paragraphs
    }

    /// Remove the first `count` paragraphs (the header region).
    pub fn strip_header(&mut self, count: usize) {
        let count = count.min(self.paragraphs.len());
        self.paragraphs.drain(..count);
    }

    /// Paragraphs joined with newlines.
    pub fn text(&self) -> String {
        self.paragraphs.join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }
}
