//! Message property table, raw header values, and their typed counterparts.

use std::fmt;

use chrono::NaiveDateTime;

use super::attachment::AttachmentSpec;

/// Layout used for every date-time header value.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Separator for multi-value properties (recipients, attachments).
pub const LIST_SEPARATOR: char = ';';

/// Separator between segments of a shorthand folder path.
pub const FOLDER_SEPARATOR: char = '/';

/// An untyped header value as decoded from the header block.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum RawValue {
    /// Key present without a value (`CC:`).
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    /// A YAML sequence of scalars, each rendered as text.
    List(Vec<String>),
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
            Self::List(items) => write!(f, "[{}]", items.join(", ")),
        }
    }
}

/// Header keys and raw values, in header order.
///
/// Keys are case-sensitive. Keys outside [`Property`] are kept as-is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPropertyMap {
    entries: Vec<(String, RawValue)>,
}

impl RawPropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. The header parser guarantees keys are unique.
    pub fn insert(&mut self, key: impl Into<String>, value: RawValue) {
        self.entries.push((key.into(), value));
    }

    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Coercion rule applied to a recognized property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    RecipientList,
    PlainString,
    AttachmentList,
    Importance,
    Sensitivity,
    Boolean,
    DateTime,
    FolderPath,
    Categories,
}

impl PropertyKind {
    /// Human-readable description used in type errors.
    pub fn expected(self) -> &'static str {
        match self {
            Self::RecipientList => "a ';'-separated address list or a list of addresses",
            Self::PlainString => "a string",
            Self::AttachmentList => "a ';'-separated path list or a list of paths",
            Self::Importance => "one of Low, Normal, High or their codes 0-2",
            Self::Sensitivity => {
                "one of Normal, Personal, Private, Confidential or their codes 0-3"
            }
            Self::Boolean => "a boolean (True/False)",
            Self::DateTime => "a date-time formatted as YYYY-MM-DD HH:MM:SS",
            Self::FolderPath => "a folder path of the form index/name/...",
            Self::Categories => "a comma-separated category string",
        }
    }
}

/// Every message property the header may set with a checked type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    To,
    Cc,
    Bcc,
    ReplyRecipients,
    Subject,
    FlagRequest,
    VotingOptions,
    Attachments,
    Importance,
    Sensitivity,
    ReadReceiptRequested,
    OriginatorDeliveryReportRequested,
    ReminderTime,
    DeferredDeliveryTime,
    ExpiryTime,
    FlagDueBy,
    SaveSentMessageFolder,
    Categories,
}

impl Property {
    pub const ALL: [Property; 18] = [
        Self::To,
        Self::Cc,
        Self::Bcc,
        Self::ReplyRecipients,
        Self::Subject,
        Self::FlagRequest,
        Self::VotingOptions,
        Self::Attachments,
        Self::Importance,
        Self::Sensitivity,
        Self::ReadReceiptRequested,
        Self::OriginatorDeliveryReportRequested,
        Self::ReminderTime,
        Self::DeferredDeliveryTime,
        Self::ExpiryTime,
        Self::FlagDueBy,
        Self::SaveSentMessageFolder,
        Self::Categories,
    ];

    /// The header key, which is also the host's property name.
    pub fn name(self) -> &'static str {
        match self {
            Self::To => "To",
            Self::Cc => "CC",
            Self::Bcc => "BCC",
            Self::ReplyRecipients => "ReplyRecipients",
            Self::Subject => "Subject",
            Self::FlagRequest => "FlagRequest",
            Self::VotingOptions => "VotingOptions",
            Self::Attachments => "Attachments",
            Self::Importance => "Importance",
            Self::Sensitivity => "Sensitivity",
            Self::ReadReceiptRequested => "ReadReceiptRequested",
            Self::OriginatorDeliveryReportRequested => "OriginatorDeliveryReportRequested",
            Self::ReminderTime => "ReminderTime",
            Self::DeferredDeliveryTime => "DeferredDeliveryTime",
            Self::ExpiryTime => "ExpiryTime",
            Self::FlagDueBy => "FlagDueBy",
            Self::SaveSentMessageFolder => "SaveSentMessageFolder",
            Self::Categories => "Categories",
        }
    }

    /// Case-sensitive lookup of a header key.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    pub fn kind(self) -> PropertyKind {
        match self {
            Self::To | Self::Cc | Self::Bcc | Self::ReplyRecipients => PropertyKind::RecipientList,
            Self::Subject | Self::FlagRequest | Self::VotingOptions => PropertyKind::PlainString,
            Self::Attachments => PropertyKind::AttachmentList,
            Self::Importance => PropertyKind::Importance,
            Self::Sensitivity => PropertyKind::Sensitivity,
            Self::ReadReceiptRequested | Self::OriginatorDeliveryReportRequested => {
                PropertyKind::Boolean
            }
            Self::ReminderTime | Self::DeferredDeliveryTime | Self::ExpiryTime | Self::FlagDueBy => {
                PropertyKind::DateTime
            }
            Self::SaveSentMessageFolder => PropertyKind::FolderPath,
            Self::Categories => PropertyKind::Categories,
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Message importance, with the host's numeric codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Importance {
    Low = 0,
    Normal = 1,
    High = 2,
}

impl Importance {
    const VARIANTS: [(&'static str, Self); 3] = [
        ("low", Self::Low),
        ("normal", Self::Normal),
        ("high", Self::High),
    ];

    /// Case-insensitive name lookup.
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.trim().to_lowercase();
        Self::VARIANTS
            .iter()
            .find(|(n, _)| *n == lower)
            .map(|(_, v)| *v)
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Self::VARIANTS
            .iter()
            .find(|(_, v)| v.code() == code)
            .map(|(_, v)| *v)
    }

    pub fn code(self) -> i64 {
        self as i64
    }
}

/// Message sensitivity, with the host's numeric codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sensitivity {
    Normal = 0,
    Personal = 1,
    Private = 2,
    Confidential = 3,
}

impl Sensitivity {
    const VARIANTS: [(&'static str, Self); 4] = [
        ("normal", Self::Normal),
        ("personal", Self::Personal),
        ("private", Self::Private),
        ("confidential", Self::Confidential),
    ];

    /// Case-insensitive name lookup.
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.trim().to_lowercase();
        Self::VARIANTS
            .iter()
            .find(|(n, _)| *n == lower)
            .map(|(_, v)| *v)
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Self::VARIANTS
            .iter()
            .find(|(_, v)| v.code() == code)
            .map(|(_, v)| *v)
    }

    pub fn code(self) -> i64 {
        self as i64
    }
}

/// Shorthand folder path: `index/name/name...`.
///
/// `index` selects a top-level folder (store) of the mail session; each
/// name descends one level. How `index` is based is decided at apply time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderPath {
    pub index: usize,
    pub names: Vec<String>,
}

impl fmt::Display for FolderPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index)?;
        for name in &self.names {
            write!(f, "{FOLDER_SEPARATOR}{name}")?;
        }
        Ok(())
    }
}

/// A validated property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Text(String),
    Recipients(Vec<String>),
    Attachments(Vec<AttachmentSpec>),
    Importance(Importance),
    Sensitivity(Sensitivity),
    Bool(bool),
    DateTime(NaiveDateTime),
    Folder(FolderPath),
    /// Value of a key outside the property table, passed through untouched.
    Opaque(RawValue),
}

impl PropertyValue {
    /// JSON form, as handed to hosts that take loosely-typed values.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            Self::Text(s) => Value::String(s.clone()),
            Self::Recipients(addrs) => Value::String(addrs.join(&LIST_SEPARATOR.to_string())),
            Self::Attachments(specs) => Value::Array(
                specs
                    .iter()
                    .map(|a| Value::String(a.path.display().to_string()))
                    .collect(),
            ),
            Self::Importance(i) => Value::from(i.code()),
            Self::Sensitivity(s) => Value::from(s.code()),
            Self::Bool(b) => Value::Bool(*b),
            Self::DateTime(dt) => Value::String(dt.format(DATETIME_FORMAT).to_string()),
            Self::Folder(path) => Value::String(path.to_string()),
            Self::Opaque(raw) => serde_json::to_value(raw).unwrap_or(Value::Null),
        }
    }
}

/// Key of a typed entry: a table property or a passed-through unknown key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    Known(Property),
    Unknown(String),
}

impl PropertyKey {
    pub fn name(&self) -> &str {
        match self {
            Self::Known(p) => p.name(),
            Self::Unknown(name) => name,
        }
    }
}

/// Fully coerced header, in header order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypedPropertyMap {
    entries: Vec<(PropertyKey, PropertyValue)>,
}

impl TypedPropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: PropertyKey, value: PropertyValue) {
        self.entries.push((key, value));
    }

    pub fn get(&self, property: Property) -> Option<&PropertyValue> {
        self.entries
            .iter()
            .find(|(k, _)| *k == PropertyKey::Known(property))
            .map(|(_, v)| v)
    }

    /// Look up any entry by its header key.
    pub fn get_by_name(&self, name: &str) -> Option<&PropertyValue> {
        self.entries
            .iter()
            .find(|(k, _)| k.name() == name)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PropertyKey, &PropertyValue)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// JSON object keyed by header key, in header order.
    pub fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .entries
            .iter()
            .map(|(k, v)| (k.name().to_string(), v.to_json()))
            .collect();
        serde_json::Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_names_roundtrip() {
        for p in Property::ALL {
            assert_eq!(Property::from_name(p.name()), Some(p));
        }
    }

    #[test]
    fn test_property_lookup_is_case_sensitive() {
        assert_eq!(Property::from_name("CC"), Some(Property::Cc));
        assert_eq!(Property::from_name("cc"), None);
        assert_eq!(Property::from_name("subject"), None);
    }

    #[test]
    fn test_importance_codes() {
        assert_eq!(Importance::from_name("HIGH"), Some(Importance::High));
        assert_eq!(Importance::High.code(), 2);
        assert_eq!(Importance::from_code(0), Some(Importance::Low));
        assert_eq!(Importance::from_code(3), None);
        assert_eq!(Importance::from_name("Urgent"), None);
    }

    #[test]
    fn test_sensitivity_codes() {
        assert_eq!(
            Sensitivity::from_name("confidential"),
            Some(Sensitivity::Confidential)
        );
        assert_eq!(Sensitivity::Confidential.code(), 3);
        assert_eq!(Sensitivity::from_code(4), None);
    }

    #[test]
    fn test_folder_path_display() {
        let path = FolderPath {
            index: 1,
            names: vec!["Auto".to_string(), "New".to_string()],
        };
        assert_eq!(path.to_string(), "1/Auto/New");
    }

    #[test]
    fn test_recipients_json_rejoins() {
        let value = PropertyValue::Recipients(vec!["a@x.com".into(), "b@y.com".into()]);
        assert_eq!(value.to_json(), serde_json::json!("a@x.com;b@y.com"));
    }

    #[test]
    fn test_typed_map_keeps_order() {
        let mut map = TypedPropertyMap::new();
        map.insert(
            PropertyKey::Known(Property::Subject),
            PropertyValue::Text("Hi".into()),
        );
        map.insert(
            PropertyKey::Unknown("X-Custom".into()),
            PropertyValue::Opaque(RawValue::Integer(7)),
        );
        let names: Vec<&str> = map.iter().map(|(k, _)| k.name()).collect();
        assert_eq!(names, ["Subject", "X-Custom"]);
        assert_eq!(
            map.get(Property::Subject),
            Some(&PropertyValue::Text("Hi".into()))
        );
        assert_eq!(
            map.get_by_name("X-Custom"),
            Some(&PropertyValue::Opaque(RawValue::Integer(7)))
        );
    }
}
