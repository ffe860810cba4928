//! Raw header values to typed message properties.
//!
//! Every recognized key has one coercion rule, chosen by its
//! [`PropertyKind`]. Keys outside the property table pass through as
//! [`PropertyValue::Opaque`]. [`coerce_all`] is all-or-nothing.

use chrono::NaiveDateTime;
use tracing::debug;

use crate::error::{ConvertError, Result};
use crate::model::attachment::AttachmentSpec;
use crate::model::property::{
    FolderPath, Importance, Property, PropertyKey, PropertyKind, PropertyValue, RawPropertyMap,
    RawValue, Sensitivity, TypedPropertyMap, DATETIME_FORMAT, FOLDER_SEPARATOR, LIST_SEPARATOR,
};

/// Coerce every entry of `raw`. The first failure aborts the whole map.
pub fn coerce_all(raw: &RawPropertyMap) -> Result<TypedPropertyMap> {
    let mut typed = TypedPropertyMap::new();
    for (name, value) in raw.iter() {
        let key = match Property::from_name(name) {
            Some(p) => PropertyKey::Known(p),
            None => PropertyKey::Unknown(name.to_string()),
        };
        typed.insert(key, coerce(name, value)?);
    }
    debug!(properties = typed.len(), "Coerced header properties");
    Ok(typed)
}

/// Coerce one header entry. Unknown names are passed through untouched.
pub fn coerce(name: &str, raw: &RawValue) -> Result<PropertyValue> {
    match Property::from_name(name) {
        Some(property) => coerce_property(property, raw),
        None => Ok(PropertyValue::Opaque(raw.clone())),
    }
}

/// Coerce a value for a property of the table.
pub fn coerce_property(property: Property, raw: &RawValue) -> Result<PropertyValue> {
    let fail = || type_error(property, raw);

    let value = match property.kind() {
        PropertyKind::RecipientList => match raw {
            RawValue::Text(s) => PropertyValue::Recipients(split_list(s)),
            RawValue::List(items) => PropertyValue::Recipients(items.clone()),
            RawValue::Null => PropertyValue::Recipients(Vec::new()),
            _ => return Err(fail()),
        },
        // Numbers and booleans would lose their source spelling; they must be quoted.
        PropertyKind::PlainString => match raw {
            RawValue::Text(s) => PropertyValue::Text(s.clone()),
            RawValue::Null => PropertyValue::Text(String::new()),
            _ => return Err(fail()),
        },
        PropertyKind::AttachmentList => {
            let paths = match raw {
                RawValue::Text(s) => split_list(s),
                RawValue::List(items) => items.clone(),
                RawValue::Null => Vec::new(),
                _ => return Err(fail()),
            };
            PropertyValue::Attachments(paths.into_iter().map(AttachmentSpec::new).collect())
        }
        PropertyKind::Importance => PropertyValue::Importance(
            enum_or_code(raw, Importance::from_name, Importance::from_code).ok_or_else(fail)?,
        ),
        PropertyKind::Sensitivity => PropertyValue::Sensitivity(
            enum_or_code(raw, Sensitivity::from_name, Sensitivity::from_code)
                .ok_or_else(fail)?,
        ),
        PropertyKind::Boolean => PropertyValue::Bool(parse_bool(raw).ok_or_else(fail)?),
        PropertyKind::DateTime => match raw {
            RawValue::Text(s) => PropertyValue::DateTime(
                NaiveDateTime::parse_from_str(s.trim(), DATETIME_FORMAT).map_err(|_| fail())?,
            ),
            _ => return Err(fail()),
        },
        PropertyKind::FolderPath => PropertyValue::Folder(match raw {
            RawValue::Text(s) => parse_folder_path(s).ok_or_else(fail)?,
            RawValue::Integer(i) => FolderPath {
                index: usize::try_from(*i).map_err(|_| fail())?,
                names: Vec::new(),
            },
            _ => return Err(fail()),
        }),
        PropertyKind::Categories => match raw {
            RawValue::Text(s) => PropertyValue::Text(s.clone()),
            RawValue::List(items) => PropertyValue::Text(items.join(", ")),
            RawValue::Null => PropertyValue::Text(String::new()),
            _ => return Err(fail()),
        },
    };
    Ok(value)
}

fn type_error(property: Property, raw: &RawValue) -> ConvertError {
    ConvertError::PropertyType {
        name: property.name().to_string(),
        raw: raw.to_string(),
        expected: property.kind().expected(),
    }
}

/// Split a `;`-separated value into trimmed, non-empty items.
pub fn split_list(s: &str) -> Vec<String> {
    s.split(LIST_SEPARATOR)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Resolve a name (case-insensitive) or a documented numeric code.
fn enum_or_code<T>(
    raw: &RawValue,
    from_name: fn(&str) -> Option<T>,
    from_code: fn(i64) -> Option<T>,
) -> Option<T> {
    match raw {
        RawValue::Integer(code) => from_code(*code),
        RawValue::Text(s) => {
            from_name(s).or_else(|| s.trim().parse::<i64>().ok().and_then(from_code))
        }
        _ => None,
    }
}

fn parse_bool(raw: &RawValue) -> Option<bool> {
    match raw {
        RawValue::Bool(b) => Some(*b),
        RawValue::Integer(1) => Some(true),
        RawValue::Integer(0) => Some(false),
        RawValue::Text(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Parse `index/name/name...`. Every name must be non-empty.
fn parse_folder_path(s: &str) -> Option<FolderPath> {
    let mut segments = s.trim().split(FOLDER_SEPARATOR);
    let index = segments.next()?.trim().parse::<usize>().ok()?;
    let names = segments
        .map(|seg| {
            let seg = seg.trim();
            (!seg.is_empty()).then(|| seg.to_string())
        })
        .collect::<Option<Vec<_>>>()?;
    Some(FolderPath { index, names })
}
