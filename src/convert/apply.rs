//! Writing typed properties onto a message.
//!
//! Properties are applied in header order, except `SaveSentMessageFolder`,
//! which walks the live folder tree and is always applied last. Errors here
//! may leave the message partially populated; there is no rollback.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ConvertError, Result};
use crate::host::{FolderSource, HostError, MailFolder, MessageTarget};
use crate::model::attachment::AttachmentSpec;
use crate::model::property::{FolderPath, Property, PropertyKey, PropertyValue, TypedPropertyMap};

/// How the leading index of a shorthand folder path is counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum IndexBase {
    Zero,
    /// The mail host's collections start at 1.
    #[default]
    One,
}

impl IndexBase {
    /// Zero-based position for `index`, or `None` if it is below the base.
    pub fn position(self, index: usize) -> Option<usize> {
        match self {
            Self::Zero => Some(index),
            Self::One => index.checked_sub(1),
        }
    }
}

impl TryFrom<u8> for IndexBase {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Zero),
            1 => Ok(Self::One),
            other => Err(format!("folder index base must be 0 or 1, got {other}")),
        }
    }
}

impl From<IndexBase> for u8 {
    fn from(base: IndexBase) -> Self {
        match base {
            IndexBase::Zero => 0,
            IndexBase::One => 1,
        }
    }
}

/// Settings for [`apply`].
#[derive(Debug, Clone)]
pub struct ApplyOptions {
    pub index_base: IndexBase,
    /// Base for relative attachment paths; `None` uses the working directory.
    pub attachment_dir: Option<PathBuf>,
    /// Log a warning for every key outside the property table.
    pub warn_unknown: bool,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            index_base: IndexBase::One,
            attachment_dir: None,
            warn_unknown: true,
        }
    }
}

/// Apply every entry of `typed` to `message`.
pub fn apply<M, F>(
    message: &mut M,
    folders: &F,
    typed: &TypedPropertyMap,
    options: &ApplyOptions,
) -> Result<()>
where
    M: MessageTarget<Folder = F::Folder>,
    F: FolderSource,
{
    let mut save_folder: Option<&FolderPath> = None;

    for (key, value) in typed.iter() {
        match (key, value) {
            (PropertyKey::Known(Property::SaveSentMessageFolder), PropertyValue::Folder(path)) => {
                save_folder = Some(path);
            }
            (PropertyKey::Known(Property::Attachments), PropertyValue::Attachments(specs)) => {
                attach(message, specs, options)?;
            }
            (PropertyKey::Unknown(name), value) => {
                if options.warn_unknown {
                    warn!(
                        property = %name,
                        "Property is not in the supported list and may not be set correctly; check the message before sending"
                    );
                }
                set(message, name, value)?;
            }
            (key, value) => set(message, key.name(), value)?,
        }
    }

    if let Some(path) = save_folder {
        let folder = resolve_folder(folders, path, options.index_base)?;
        message
            .set_save_sent_folder(&folder)
            .map_err(|source| apply_error(Property::SaveSentMessageFolder.name(), source))?;
        debug!(path = %path, "Applied save-sent folder");
    }

    Ok(())
}

/// Walk a shorthand folder path from the session's top-level collection.
pub fn resolve_folder<F: FolderSource>(
    folders: &F,
    path: &FolderPath,
    base: IndexBase,
) -> Result<F::Folder> {
    let not_found = |segment: String| ConvertError::FolderResolution {
        path: path.to_string(),
        segment,
    };

    let mut folder = base
        .position(path.index)
        .and_then(|position| folders.top_level_folder(position))
        .ok_or_else(|| not_found(path.index.to_string()))?;

    for name in &path.names {
        folder = folder
            .subfolder(name)
            .ok_or_else(|| not_found(name.clone()))?;
    }
    Ok(folder)
}

/// Check each attachment exists now, then attach it.
fn attach<M: MessageTarget>(
    message: &mut M,
    specs: &[AttachmentSpec],
    options: &ApplyOptions,
) -> Result<()> {
    for spec in specs {
        let path = spec.locate(options.attachment_dir.as_deref())?;
        message
            .add_attachment(&path)
            .map_err(|source| apply_error(Property::Attachments.name(), source))?;
        debug!(path = %path.display(), "Attached file");
    }
    Ok(())
}

fn set<M: MessageTarget>(message: &mut M, name: &str, value: &PropertyValue) -> Result<()> {
    message
        .set_property(name, value)
        .map_err(|source| apply_error(name, source))?;
    debug!(property = name, "Applied property");
    Ok(())
}

fn apply_error(name: &str, source: HostError) -> ConvertError {
    ConvertError::PropertyApply {
        name: name.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::host::memory::{FolderNode, MemoryMailHost, MemoryMessage};
    use crate::host::MailHost;
    use crate::parser::coerce::coerce_all;
    use crate::parser::header::parse_header;

    fn host() -> MemoryMailHost {
        MemoryMailHost::new(vec![
            FolderNode::new("Personal").with_child(FolderNode::new("Inbox")),
            FolderNode::new("Team")
                .with_child(FolderNode::new("Auto").with_child(FolderNode::new("New"))),
        ])
    }

    fn typed(header: &str) -> TypedPropertyMap {
        coerce_all(&parse_header(header).unwrap()).unwrap()
    }

    fn apply_header(
        host: &mut MemoryMailHost,
        header: &str,
        options: &ApplyOptions,
    ) -> (MemoryMessage, Result<()>) {
        let mut message = host.create_message().unwrap();
        let result = apply(&mut message, &*host, &typed(header), options);
        (message, result)
    }

    #[test]
    fn test_index_base_positions() {
        assert_eq!(IndexBase::One.position(1), Some(0));
        assert_eq!(IndexBase::One.position(0), None);
        assert_eq!(IndexBase::Zero.position(0), Some(0));
        assert_eq!(
            IndexBase::try_from(2u8),
            Err("folder index base must be 0 or 1, got 2".to_string())
        );
    }

    #[test]
    fn test_resolve_one_based() {
        let host = host();
        let path = FolderPath {
            index: 2,
            names: vec!["Auto".into(), "New".into()],
        };
        let folder = resolve_folder(&host, &path, IndexBase::One).unwrap();
        assert_eq!(folder.path(), "Team/Auto/New");
    }

    #[test]
    fn test_resolve_zero_based() {
        let host = host();
        let path = FolderPath {
            index: 1,
            names: vec!["Auto".into()],
        };
        let folder = resolve_folder(&host, &path, IndexBase::Zero).unwrap();
        assert_eq!(folder.path(), "Team/Auto");
    }

    #[test]
    fn test_resolve_missing_segment() {
        let host = host();
        let path = FolderPath {
            index: 1,
            names: vec!["Auto".into(), "New".into()],
        };
        match resolve_folder(&host, &path, IndexBase::One) {
            Err(ConvertError::FolderResolution { path, segment }) => {
                assert_eq!(path, "1/Auto/New");
                assert_eq!(segment, "Auto");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_resolve_index_out_of_range() {
        let host = host();
        for (index, base) in [(0, IndexBase::One), (3, IndexBase::One), (2, IndexBase::Zero)] {
            let path = FolderPath {
                index,
                names: Vec::new(),
            };
            assert!(matches!(
                resolve_folder(&host, &path, base),
                Err(ConvertError::FolderResolution { .. })
            ));
        }
    }

    #[test]
    fn test_apply_sets_properties() {
        let mut host = host();
        let (message, result) = apply_header(
            &mut host,
            "To: a@x.com;b@y.com\nSubject: Hi\nImportance: High\nReadReceiptRequested: True\nFlagDueBy: 2024-03-01 09:30:00\nSaveSentMessageFolder: 2/Auto",
            &ApplyOptions::default(),
        );
        result.unwrap();
        assert_eq!(message.property("To"), Some(&serde_json::json!("a@x.com;b@y.com")));
        assert_eq!(message.property("Subject"), Some(&serde_json::json!("Hi")));
        assert_eq!(message.property("Importance"), Some(&serde_json::json!(2)));
        assert_eq!(
            message.property("ReadReceiptRequested"),
            Some(&serde_json::json!(true))
        );
        assert_eq!(
            message.property("FlagDueBy"),
            Some(&serde_json::json!("2024-03-01 09:30:00"))
        );
        assert_eq!(message.save_sent_folder.as_deref(), Some("Team/Auto"));
    }

    #[test]
    fn test_folder_failure_after_other_properties() {
        let mut host = host();
        let (message, result) = apply_header(
            &mut host,
            "SaveSentMessageFolder: 1/Auto/New\nSubject: Hi",
            &ApplyOptions::default(),
        );
        assert!(matches!(result, Err(ConvertError::FolderResolution { .. })));
        // Folder is resolved last, so the subject was already written.
        assert_eq!(message.property("Subject"), Some(&serde_json::json!("Hi")));
        assert!(message.save_sent_folder.is_none());
    }

    #[test]
    fn test_attachments_checked_at_apply_time() {
        let dir = tempfile::tempdir().unwrap();
        let options = ApplyOptions {
            attachment_dir: Some(dir.path().to_path_buf()),
            ..ApplyOptions::default()
        };
        let props = typed("Attachments: report.pdf;data.csv");

        let mut host = host();
        let mut message = host.create_message().unwrap();
        let err = apply(&mut message, &host, &props, &options).unwrap_err();
        assert!(matches!(err, ConvertError::AttachmentNotFound(ref p) if p.ends_with("report.pdf")));

        std::fs::write(dir.path().join("report.pdf"), b"%PDF").unwrap();
        std::fs::write(dir.path().join("data.csv"), b"a,b").unwrap();
        let mut message = host.create_message().unwrap();
        apply(&mut message, &host, &props, &options).unwrap();
        assert_eq!(
            message.attachments,
            vec![dir.path().join("report.pdf"), dir.path().join("data.csv")]
        );
    }

    #[test]
    fn test_unknown_property_passed_to_host() {
        let mut host = host();
        let (message, result) =
            apply_header(&mut host, "BillingInformation: ACME-7", &ApplyOptions::default());
        result.unwrap();
        assert_eq!(
            message.property("BillingInformation"),
            Some(&serde_json::json!("ACME-7"))
        );
    }

    #[test]
    fn test_host_rejection_names_property() {
        let mut host = host().strict(true);
        let (_, result) = apply_header(&mut host, "Subject: Hi\nX-Tracking: 1", &ApplyOptions::default());
        match result {
            Err(ConvertError::PropertyApply { name, .. }) => assert_eq!(name, "X-Tracking"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Run `f` under a subscriber that records warnings as text.
    fn capture_warnings(f: impl FnOnce()) -> String {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let writer = buf.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || LogBuffer(writer.clone()))
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = buf.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_unknown_property_warning() {
        let props = typed("Subject: Hi\nX-Tracking: 1");

        let logs = capture_warnings(|| {
            let mut message = host().create_message().unwrap();
            apply(&mut message, &host(), &props, &ApplyOptions::default()).unwrap();
            assert_eq!(message.property("X-Tracking"), Some(&serde_json::json!(1)));
        });
        assert!(logs.contains("WARN"));
        assert!(logs.contains("X-Tracking"));
        assert!(!logs.contains("Subject"));

        let quiet = ApplyOptions {
            warn_unknown: false,
            ..ApplyOptions::default()
        };
        let logs = capture_warnings(|| {
            let mut message = host().create_message().unwrap();
            apply(&mut message, &host(), &props, &quiet).unwrap();
            assert_eq!(message.property("X-Tracking"), Some(&serde_json::json!(1)));
        });
        assert!(logs.is_empty(), "unexpected output: {logs}");
    }
}
