//! Conversion session: drives a document through the header pipeline into a message.
//!
//! A session borrows the caller's host objects for its lifetime and owns a
//! scratch directory for intermediates (the rendered document, companion
//! files). The scratch directory is removed, and every opened document
//! handle released, on all exit paths.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::TempDir;
use tracing::{debug, info, warn};

use super::apply::{self, ApplyOptions, IndexBase};
use crate::error::{ConvertError, Result};
use crate::host::{DocumentHost, MailHost, MessageTarget, RenderContext, TemplateRenderer};
use crate::model::document::RawDocument;
use crate::model::message::MessageBody;
use crate::model::property::TypedPropertyMap;
use crate::parser;

/// Property name reported when the host rejects the body.
const BODY_PROPERTY: &str = "HTMLBody";

/// Directory that relative attachment paths are resolved against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttachmentBase {
    /// Directory of the source document.
    #[default]
    Document,
    /// Process working directory.
    WorkingDir,
}

/// Per-conversion settings.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub index_base: IndexBase,
    pub attachment_base: AttachmentBase,
    pub warn_unknown: bool,
    /// Show the message in the mail client once populated.
    pub display: bool,
    /// Save to drafts so the client renders the HTML body.
    pub save: bool,
    /// Also save the message to this path.
    pub save_as: Option<PathBuf>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            index_base: IndexBase::One,
            attachment_base: AttachmentBase::Document,
            warn_unknown: true,
            display: false,
            save: false,
            save_as: None,
        }
    }
}

/// A scoped conversion of one source document.
pub struct ConversionSession<'h, D: DocumentHost, M: MailHost> {
    source: PathBuf,
    /// Document the pipeline reads: the source, or its rendered copy.
    current: PathBuf,
    documents: &'h mut D,
    mail: &'h mut M,
    options: ConvertOptions,
    scratch: TempDir,
}

impl<'h, D: DocumentHost, M: MailHost> ConversionSession<'h, D, M> {
    /// Start a session for `source`.
    pub fn open(
        source: impl AsRef<Path>,
        documents: &'h mut D,
        mail: &'h mut M,
        options: ConvertOptions,
    ) -> Result<Self> {
        let source = source.as_ref().to_path_buf();
        if !source.is_file() {
            return Err(ConvertError::FileNotFound(source));
        }

        let scratch = tempfile::Builder::new()
            .prefix("docmail-")
            .tempdir()
            .map_err(|e| ConvertError::io(std::env::temp_dir(), e))?;
        debug!(source = %source.display(), scratch = %scratch.path().display(), "Opened conversion session");

        Ok(Self {
            current: source.clone(),
            source,
            documents,
            mail,
            options,
            scratch,
        })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Scratch directory; files placed here live until the session ends.
    pub fn temp_dir(&self) -> &Path {
        self.scratch.path()
    }

    /// Render the document with `context` before conversion.
    ///
    /// The rendered copy is saved in the scratch directory and read by all
    /// later steps, so header values may come from the context.
    pub fn render<R: TemplateRenderer + ?Sized>(
        &mut self,
        renderer: &R,
        context: &RenderContext,
    ) -> Result<()> {
        let target = self.scratch.path().join(rendered_name(&self.source));

        let mut doc = OpenDocument::open(&mut *self.documents, &self.current)?;
        let rendered = renderer
            .render(doc.document(), context)
            .map_err(ConvertError::Template)?;
        doc.host()
            .save_document(&rendered, &target)
            .map_err(|e| ConvertError::host("Saving rendered document", e))?;
        drop(doc);

        debug!(path = %target.display(), "Rendered template");
        self.current = target;
        Ok(())
    }

    /// Typed header properties, without creating a message.
    pub fn headers(&mut self) -> Result<TypedPropertyMap> {
        let doc = OpenDocument::open(&mut *self.documents, &self.current)?;
        let (_, typed) = parser::extract_properties(doc.document().paragraphs())?;
        Ok(typed)
    }

    /// Convert the document into a new message.
    ///
    /// The header is parsed and every value coerced before the message is
    /// created. Failures while applying leave the partially populated
    /// message with the host.
    pub fn convert(&mut self) -> Result<M::Message> {
        let apply_options = apply_options(&self.options, &self.source);

        let mut doc = OpenDocument::open(&mut *self.documents, &self.current)?;
        let (block, typed) = parser::extract_properties(doc.document().paragraphs())?;

        let mut message = self
            .mail
            .create_message()
            .map_err(|e| ConvertError::host("Creating message", e))?;
        apply::apply(&mut message, &*self.mail, &typed, &apply_options)?;

        doc.document_mut().strip_header(block.consumed);
        let body = MessageBody::from_paragraphs(doc.document().paragraphs());
        message
            .set_body(&body)
            .map_err(|source| ConvertError::PropertyApply {
                name: BODY_PROPERTY.to_string(),
                source,
            })?;
        drop(doc);

        if self.options.display {
            message
                .display()
                .map_err(|e| ConvertError::host("Displaying message", e))?;
        }
        if self.options.save {
            message
                .save()
                .map_err(|e| ConvertError::host("Saving message", e))?;
            warn!("The message has been saved to the default drafts folder so its body renders");
        }
        if let Some(path) = &self.options.save_as {
            message
                .save_as(path)
                .map_err(|e| ConvertError::host("Saving message to file", e))?;
        }

        info!(
            source = %self.source.display(),
            properties = typed.len(),
            "Converted document"
        );
        Ok(message)
    }
}

fn apply_options(options: &ConvertOptions, source: &Path) -> ApplyOptions {
    let attachment_dir = match options.attachment_base {
        AttachmentBase::Document => source.parent().map(Path::to_path_buf),
        AttachmentBase::WorkingDir => None,
    };
    ApplyOptions {
        index_base: options.index_base,
        attachment_dir,
        warn_unknown: options.warn_unknown,
    }
}

/// File name for the rendered copy, keeping the source's extension.
fn rendered_name(source: &Path) -> String {
    match source.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("rendered.{ext}"),
        None => "rendered".to_string(),
    }
}

/// An open document handle, closed through its host when dropped.
struct OpenDocument<'a, D: DocumentHost> {
    host: &'a mut D,
    document: RawDocument,
}

impl<'a, D: DocumentHost> OpenDocument<'a, D> {
    fn open(host: &'a mut D, path: &Path) -> Result<Self> {
        let document = host
            .open_document(path)
            .map_err(|e| ConvertError::host("Opening document", e))?;
        Ok(Self { host, document })
    }

    fn document(&self) -> &RawDocument {
        &self.document
    }

    fn document_mut(&mut self) -> &mut RawDocument {
        &mut self.document
    }

    fn host(&mut self) -> &mut D {
        &mut *self.host
    }
}

impl<D: DocumentHost> Drop for OpenDocument<'_, D> {
    fn drop(&mut self) {
        let document = std::mem::replace(&mut self.document, RawDocument::new("", Vec::new()));
        self.host.close_document(document);
    }
}
