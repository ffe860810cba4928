//! Plain-text document host: one paragraph per line.

use std::path::Path;

use tracing::debug;

use super::{DocumentHost, HostError, HostResult};
use crate::model::document::RawDocument;

/// Opens UTF-8 (or Windows-1252) text files as documents.
///
/// Keeps a count of handles that have been opened and not yet closed.
#[derive(Debug, Default)]
pub struct TextDocumentHost {
    open_handles: usize,
}

impl TextDocumentHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_handles(&self) -> usize {
        self.open_handles
    }
}

impl DocumentHost for TextDocumentHost {
    fn open_document(&mut self, path: &Path) -> HostResult<RawDocument> {
        let bytes = std::fs::read(path)
            .map_err(|e| HostError::new(format!("cannot open '{}': {e}", path.display())))?;
        let text = decode_text(&bytes);
        self.open_handles += 1;
        debug!(path = %path.display(), "Opened document");
        Ok(RawDocument::from_text(path, &text))
    }

    fn save_document(&mut self, document: &RawDocument, path: &Path) -> HostResult<()> {
        let mut text = document.text();
        text.push('\n');
        std::fs::write(path, text)
            .map_err(|e| HostError::new(format!("cannot save '{}': {e}", path.display())))?;
        debug!(path = %path.display(), "Saved document");
        Ok(())
    }

    fn close_document(&mut self, document: RawDocument) {
        self.open_handles = self.open_handles.saturating_sub(1);
        debug!(path = %document.path().display(), "Closed document");
    }
}

/// Decode file bytes to a string.
///
/// Tries UTF-8 first, then falls back to Windows-1252 (which accepts every byte).
fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}
