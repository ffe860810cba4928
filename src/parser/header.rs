//! Header text parsing: YAML key/value pairs into a [`RawPropertyMap`].
//!
//! Only the shapes a message header needs are accepted: a top-level mapping
//! with string keys whose values are scalars or sequences of scalars.

use serde_yaml::Value;
use tracing::debug;

use crate::error::{ConvertError, Result};
use crate::model::property::{RawPropertyMap, RawValue};

/// Parse header text into raw key/value pairs, preserving header order.
///
/// Empty or comment-only text yields an empty map.
pub fn parse_header(text: &str) -> Result<RawPropertyMap> {
    let mut map = RawPropertyMap::new();
    if is_blank(text) {
        return Ok(map);
    }

    let value: Value = serde_yaml::from_str(text).map_err(|e| ConvertError::HeaderSyntax {
        line: e.location().map(|l| l.line()),
        reason: e.to_string(),
    })?;

    let mapping = match value {
        Value::Null => return Ok(map),
        Value::Mapping(mapping) => mapping,
        other => {
            return Err(syntax(format!(
                "expected 'Key: value' pairs, found {}",
                describe(&other)
            )))
        }
    };

    for (key, value) in mapping {
        let key = match key {
            Value::String(s) => s,
            other => {
                return Err(syntax(format!(
                    "property names must be text, found {}",
                    describe(&other)
                )))
            }
        };
        let raw = to_raw(&key, value)?;
        map.insert(key, raw);
    }

    debug!(keys = map.len(), "Parsed header");
    Ok(map)
}

/// `true` if the text has no content besides whitespace and comments.
fn is_blank(text: &str) -> bool {
    text.lines().all(|l| {
        let t = l.trim();
        t.is_empty() || t.starts_with('#')
    })
}

fn to_raw(key: &str, value: Value) -> Result<RawValue> {
    Ok(match value {
        Value::Null => RawValue::Null,
        Value::Bool(b) => RawValue::Bool(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => RawValue::Integer(i),
            None => RawValue::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => RawValue::Text(s),
        Value::Sequence(items) => RawValue::List(
            items
                .into_iter()
                .map(|item| scalar_text(key, item))
                .collect::<Result<Vec<_>>>()?,
        ),
        Value::Mapping(_) => {
            return Err(syntax(format!(
                "value of '{key}' is a nested mapping; use a scalar or a list"
            )))
        }
        Value::Tagged(tagged) => to_raw(key, tagged.value)?,
    })
}

/// Text of a list item; items must themselves be scalars.
fn scalar_text(key: &str, value: Value) -> Result<String> {
    match value {
        Value::Null => Ok(String::new()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) => Ok(s),
        Value::Tagged(tagged) => scalar_text(key, tagged.value),
        other => Err(syntax(format!(
            "list '{key}' contains a nested {}",
            describe(&other)
        ))),
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "an empty value",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "list",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

fn syntax(reason: String) -> ConvertError {
    ConvertError::HeaderSyntax { line: None, reason }
}
