//! In-memory mail host.
//!
//! Messages are plain property bags that serialize to JSON, and the folder
//! tree is a static [`FolderNode`] hierarchy. Used by the CLI as the hand-off
//! format and by tests as the mail host.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{FolderSource, HostError, HostResult, MailFolder, MailHost, MessageTarget};
use crate::error::{ConvertError, Result};
use crate::model::message::MessageBody;
use crate::model::property::{Property, PropertyValue};

/// Writable MailItem properties accepted in strict mode besides the typed table.
const EXTRA_MAIL_ITEM_PROPERTIES: &[&str] = &[
    "AlternateRecipientAllowed",
    "AutoForwarded",
    "BillingInformation",
    "BodyFormat",
    "Companies",
    "DeleteAfterSubmit",
    "FlagStatus",
    "InternetCodepage",
    "Mileage",
    "NoAging",
    "ReminderOverrideDefault",
    "ReminderPlaySound",
    "ReminderSet",
    "ReminderSoundFile",
    "SentOnBehalfOfName",
    "UnRead",
];

/// MailItem properties the host never lets callers write.
const READ_ONLY_PROPERTIES: &[&str] = &[
    "ConversationID",
    "CreationTime",
    "EntryID",
    "LastModificationTime",
    "ReceivedTime",
    "Sent",
    "SentOn",
    "Size",
];

/// A node of the folder hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderNode {
    pub name: String,
    #[serde(default)]
    pub children: Vec<FolderNode>,
}

impl FolderNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: FolderNode) -> Self {
        self.children.push(child);
        self
    }
}

/// Handle to a folder, remembering the path it was reached by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryFolder {
    path: String,
    node: FolderNode,
}

impl MemoryFolder {
    /// Names from the store down to this folder, joined with `/`.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl MailFolder for MemoryFolder {
    fn name(&self) -> &str {
        &self.node.name
    }

    fn subfolder(&self, name: &str) -> Option<Self> {
        self.node
            .children
            .iter()
            .find(|c| c.name == name)
            .map(|child| MemoryFolder {
                path: format!("{}/{}", self.path, child.name),
                node: child.clone(),
            })
    }
}

/// An outgoing message held in memory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryMessage {
    /// Property name → value as the host stores it.
    pub properties: serde_json::Map<String, serde_json::Value>,
    pub attachments: Vec<PathBuf>,
    pub save_sent_folder: Option<String>,
    pub body: Option<MessageBody>,
    pub displayed: bool,
    pub saved: bool,
    #[serde(skip)]
    strict: bool,
}

impl MemoryMessage {
    pub fn property(&self, name: &str) -> Option<&serde_json::Value> {
        self.properties.get(name)
    }

    pub fn to_json_pretty(&self) -> HostResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| HostError::new(e.to_string()))
    }
}

impl MessageTarget for MemoryMessage {
    type Folder = MemoryFolder;

    fn set_property(&mut self, name: &str, value: &PropertyValue) -> HostResult<()> {
        if READ_ONLY_PROPERTIES.contains(&name) {
            return Err(HostError::new(format!("property '{name}' is read-only")));
        }
        if self.strict && !is_mail_item_property(name) {
            return Err(HostError::new(format!(
                "the mail item has no property '{name}'"
            )));
        }
        self.properties.insert(name.to_string(), value.to_json());
        Ok(())
    }

    fn add_attachment(&mut self, path: &Path) -> HostResult<()> {
        self.attachments.push(path.to_path_buf());
        Ok(())
    }

    fn set_save_sent_folder(&mut self, folder: &MemoryFolder) -> HostResult<()> {
        self.save_sent_folder = Some(folder.path().to_string());
        Ok(())
    }

    fn set_body(&mut self, body: &MessageBody) -> HostResult<()> {
        self.body = Some(body.clone());
        Ok(())
    }

    fn display(&mut self) -> HostResult<()> {
        self.displayed = true;
        info!("Message displayed");
        Ok(())
    }

    fn save(&mut self) -> HostResult<()> {
        self.saved = true;
        info!("Message saved to drafts");
        Ok(())
    }

    fn save_as(&mut self, path: &Path) -> HostResult<()> {
        let json = self.to_json_pretty()?;
        std::fs::write(path, json)
            .map_err(|e| HostError::new(format!("cannot write '{}': {e}", path.display())))?;
        info!(path = %path.display(), "Message saved");
        Ok(())
    }
}

fn is_mail_item_property(name: &str) -> bool {
    Property::from_name(name).is_some() || EXTRA_MAIL_ITEM_PROPERTIES.contains(&name)
}

/// Mail host session backed by memory.
#[derive(Debug, Clone)]
pub struct MemoryMailHost {
    stores: Vec<FolderNode>,
    strict: bool,
    created: usize,
}

impl Default for MemoryMailHost {
    fn default() -> Self {
        Self::new(vec![default_store()])
    }
}

impl MemoryMailHost {
    pub fn new(stores: Vec<FolderNode>) -> Self {
        Self {
            stores,
            strict: false,
            created: 0,
        }
    }

    /// Reject property names a mail item does not have.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Load the top-level folder list from a JSON file.
    pub fn load_stores(path: &Path) -> Result<Vec<FolderNode>> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConvertError::io(path, e))?;
        serde_json::from_str(&contents).map_err(|e| {
            ConvertError::InvalidConfig(format!("folder tree '{}': {e}", path.display()))
        })
    }

    pub fn stores(&self) -> &[FolderNode] {
        &self.stores
    }

    pub fn messages_created(&self) -> usize {
        self.created
    }
}

impl FolderSource for MemoryMailHost {
    type Folder = MemoryFolder;

    fn top_level_folder(&self, position: usize) -> Option<MemoryFolder> {
        self.stores.get(position).map(|node| MemoryFolder {
            path: node.name.clone(),
            node: node.clone(),
        })
    }
}

impl MailHost for MemoryMailHost {
    type Message = MemoryMessage;

    fn create_message(&mut self) -> HostResult<MemoryMessage> {
        self.created += 1;
        debug!(count = self.created, "Created message");
        Ok(MemoryMessage {
            strict: self.strict,
            ..MemoryMessage::default()
        })
    }
}

/// A single store with the standard default folders.
fn default_store() -> FolderNode {
    ["Inbox", "Drafts", "Sent Items", "Outbox", "Deleted Items"]
        .into_iter()
        .fold(FolderNode::new("Mailbox"), |store, name| {
            store.with_child(FolderNode::new(name))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_store_layout() {
        let host = MemoryMailHost::default();
        let store = host.top_level_folder(0).unwrap();
        assert_eq!(store.name(), "Mailbox");
        let sent = store.subfolder("Sent Items").unwrap();
        assert_eq!(sent.path(), "Mailbox/Sent Items");
        assert!(store.subfolder("sent items").is_none());
        assert!(host.top_level_folder(1).is_none());
    }

    #[test]
    fn test_set_property_lenient_and_strict() {
        let mut lenient = MemoryMailHost::default().create_message().unwrap();
        lenient
            .set_property("X-Anything", &PropertyValue::Text("v".into()))
            .unwrap();
        assert_eq!(lenient.property("X-Anything"), Some(&serde_json::json!("v")));

        let mut strict = MemoryMailHost::default()
            .strict(true)
            .create_message()
            .unwrap();
        assert!(strict
            .set_property("X-Anything", &PropertyValue::Text("v".into()))
            .is_err());
        strict
            .set_property("BillingInformation", &PropertyValue::Text("ACME".into()))
            .unwrap();
    }

    #[test]
    fn test_read_only_rejected() {
        let mut msg = MemoryMailHost::default().create_message().unwrap();
        let err = msg
            .set_property("EntryID", &PropertyValue::Text("x".into()))
            .unwrap_err();
        assert!(err.message().contains("read-only"));
    }

    #[test]
    fn test_save_as_writes_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("msg.json");
        let mut msg = MemoryMailHost::default().create_message().unwrap();
        msg.set_property("Subject", &PropertyValue::Text("Hi".into()))
            .unwrap();
        msg.save_as(&path).unwrap();

        let loaded: MemoryMessage =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.property("Subject"), Some(&serde_json::json!("Hi")));
    }

    #[test]
    fn test_load_stores() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("folders.json");
        std::fs::write(
            &path,
            r#"[{"name": "Archive", "children": [{"name": "2024"}]}]"#,
        )
        .unwrap();
        let stores = MemoryMailHost::load_stores(&path).unwrap();
        assert_eq!(
            stores,
            vec![FolderNode::new("Archive").with_child(FolderNode::new("2024"))]
        );
    }
}
