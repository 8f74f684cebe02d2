//! Grammar document adapter
//!
//! A grammar travels as a structured document with two ordered arrays:
//!
//! ```json
//! {
//!     "terminals": [ {"name": "comma", "regex": ","} ],
//!     "rules":     [ {"name": "list", "expressions": ["<integer+>"]} ]
//! }
//! ```
//!
//! This module only adapts the transport shape: it pulls the two arrays
//! out of a [`serde_json::Value`], checks the field types, and hands the
//! loader plain ordered entries. Nothing downstream of here touches the
//! document format, so other transports only need to produce a
//! [`GrammarDocument`].
//!
//! Every shape error names the offending key, including the array index
//! for per-entry problems.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// One entry of the `terminals` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalEntry {
    pub name: String,
    pub regex: String,
}

/// One entry of the `rules` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleEntry {
    pub name: String,
    pub expressions: Vec<String>,
}

/// The two ordered arrays of a grammar document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarDocument {
    pub terminals: Vec<TerminalEntry>,
    pub rules: Vec<RuleEntry>,
}

/// Shape error raised while adapting a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// A required top-level property is absent.
    MissingProperty(&'static str),
    /// A top-level property has the wrong type.
    NotAnArray(&'static str),
    /// An array entry is malformed; the message names the bad field.
    InvalidEntry {
        array: &'static str,
        index: usize,
        message: String,
    },
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentError::MissingProperty(key) => {
                write!(f, "the '{key}' property is required in the grammar document")
            }
            DocumentError::NotAnArray(key) => {
                write!(f, "the '{key}' property must be an array")
            }
            DocumentError::InvalidEntry {
                array,
                index,
                message,
            } => write!(f, "{array}[{index}]: {message}"),
        }
    }
}

impl std::error::Error for DocumentError {}

impl GrammarDocument {
    /// Adapt a parsed JSON value into ordered grammar entries.
    pub fn from_value(value: &Value) -> Result<GrammarDocument, DocumentError> {
        let terminals = required_array(value, "terminals")?
            .iter()
            .enumerate()
            .map(|(index, entry)| terminal_entry(entry, index))
            .collect::<Result<Vec<_>, _>>()?;

        let rules = required_array(value, "rules")?
            .iter()
            .enumerate()
            .map(|(index, entry)| rule_entry(entry, index))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(GrammarDocument { terminals, rules })
    }
}

fn required_array<'v>(value: &'v Value, key: &'static str) -> Result<&'v Vec<Value>, DocumentError> {
    let property = value.get(key).ok_or(DocumentError::MissingProperty(key))?;
    property.as_array().ok_or(DocumentError::NotAnArray(key))
}

fn string_field(entry: &Value, field: &str, array: &'static str, index: usize) -> Result<String, DocumentError> {
    entry
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| DocumentError::InvalidEntry {
            array,
            index,
            message: format!("'{field}' must be a string"),
        })
}

fn terminal_entry(entry: &Value, index: usize) -> Result<TerminalEntry, DocumentError> {
    Ok(TerminalEntry {
        name: string_field(entry, "name", "terminals", index)?,
        regex: string_field(entry, "regex", "terminals", index)?,
    })
}

fn rule_entry(entry: &Value, index: usize) -> Result<RuleEntry, DocumentError> {
    let name = string_field(entry, "name", "rules", index)?;
    let expressions = entry
        .get("expressions")
        .and_then(Value::as_array)
        .ok_or_else(|| DocumentError::InvalidEntry {
            array: "rules",
            index,
            message: "'expressions' must be an array".to_string(),
        })?
        .iter()
        .map(|expression| {
            expression
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| DocumentError::InvalidEntry {
                    array: "rules",
                    index,
                    message: "'expressions' entries must be strings".to_string(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RuleEntry { name, expressions })
}
