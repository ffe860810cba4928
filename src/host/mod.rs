//! Capabilities consumed from the host applications.
//!
//! The conversion core never talks to a word processor or a mail client
//! directly. It sees them through these traits, implemented by adapters for
//! whatever automation mechanism the platform offers. The crate ships
//! file-backed and in-memory adapters ([`text`], [`memory`]) and a
//! Jinja-style template renderer ([`template`]).
//!
//! All calls are blocking and take `&mut self`: hosts are single-session
//! and are never shared across conversions.

pub mod memory;
pub mod template;
pub mod text;

use std::path::Path;

use crate::model::document::RawDocument;
use crate::model::message::MessageBody;
use crate::model::property::PropertyValue;

/// Failure reported by a host application or collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct HostError {
    message: String,
}

impl HostError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Convenience alias for `Result<T, HostError>`.
pub type HostResult<T> = std::result::Result<T, HostError>;

/// Variables available to a template.
pub type RenderContext = serde_json::Map<String, serde_json::Value>;

/// Word-processing host: opens, saves and releases documents.
pub trait DocumentHost {
    fn open_document(&mut self, path: &Path) -> HostResult<RawDocument>;

    fn save_document(&mut self, document: &RawDocument, path: &Path) -> HostResult<()>;

    /// Release a handle obtained from [`open_document`](Self::open_document).
    fn close_document(&mut self, document: RawDocument);
}

/// Template engine that fills placeholders in a document.
///
/// Rendering covers the header as well as the body, so property values
/// may come from the context.
pub trait TemplateRenderer {
    fn render(&self, document: &RawDocument, context: &RenderContext) -> HostResult<RawDocument>;
}

/// A folder of the mail session's hierarchy.
pub trait MailFolder: Sized {
    fn name(&self) -> &str;

    /// Direct child with exactly this name.
    fn subfolder(&self, name: &str) -> Option<Self>;
}

/// Access to the top-level folder collection (one entry per store).
pub trait FolderSource {
    type Folder: MailFolder;

    /// Top-level folder at a zero-based `position`.
    fn top_level_folder(&self, position: usize) -> Option<Self::Folder>;
}

/// The outgoing message being populated. Owned by the mail host.
pub trait MessageTarget {
    type Folder;

    fn set_property(&mut self, name: &str, value: &PropertyValue) -> HostResult<()>;

    fn add_attachment(&mut self, path: &Path) -> HostResult<()>;

    fn set_save_sent_folder(&mut self, folder: &Self::Folder) -> HostResult<()>;

    fn set_body(&mut self, body: &MessageBody) -> HostResult<()>;

    fn display(&mut self) -> HostResult<()>;

    /// Save into the default drafts folder.
    fn save(&mut self) -> HostResult<()>;

    fn save_as(&mut self, path: &Path) -> HostResult<()>;
}

/// Mail host session: creates messages and exposes the folder tree.
pub trait MailHost: FolderSource {
    type Message: MessageTarget<Folder = Self::Folder>;

    fn create_message(&mut self) -> HostResult<Self::Message>;
}
