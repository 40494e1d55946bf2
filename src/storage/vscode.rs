//! Editor settings merging
//!
//! Hides managed files in `.vscode/settings.json` through its `files.exclude`
//! map. The settings file may contain comments and trailing commas; it is
//! rewritten as tab-indented JSON with sorted keys, and every key other than
//! `files.exclude` keeps its value.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use serde_json::{Map, Value};

use super::gitignore::MergeError;
use crate::domain::Record;

/// Settings key holding the exclude map
pub const FILES_EXCLUDE: &str = "files.exclude";

/// Reads a `string -> bool` map. Absent or non-object values read as empty;
/// entries whose value is not a boolean are dropped.
pub fn exclude_map(value: Option<&Value>) -> BTreeMap<String, bool> {
    value
        .and_then(Value::as_object)
        .map(|object| {
            object
                .iter()
                .filter_map(|(name, v)| v.as_bool().map(|hidden| (name.clone(), hidden)))
                .collect()
        })
        .unwrap_or_default()
}

/// Marks every record name as excluded in the settings document at `path`,
/// creating the document if needed
pub fn merge_vscode(path: &Path, records: &[Record]) -> Result<()> {
    let unwritable = |source| MergeError::Unwritable {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(unwritable)?;
    }
    if !path.exists() {
        fs::write(path, "{}").map_err(unwritable)?;
    }

    let source = fs::read_to_string(path).map_err(|source| MergeError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;

    let mut settings = parse_settings(&source).map_err(|message| MergeError::InvalidSettings {
        path: path.to_path_buf(),
        message,
    })?;

    let mut exclude = exclude_map(settings.get(FILES_EXCLUDE));
    for record in records {
        exclude.insert(record.name.clone(), true);
    }

    let exclude: Map<String, Value> = exclude
        .into_iter()
        .map(|(name, hidden)| (name, Value::Bool(hidden)))
        .collect();
    settings.insert(FILES_EXCLUDE.to_string(), Value::Object(exclude));

    let rendered = render_settings(&settings).map_err(|e| MergeError::InvalidSettings {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    fs::write(path, rendered).map_err(unwritable)?;

    Ok(())
}

/// Decodes a tolerant-JSON settings document into its top-level object
fn parse_settings(source: &str) -> std::result::Result<Map<String, Value>, String> {
    if source.trim().is_empty() {
        return Ok(Map::new());
    }

    match serde_json5::from_str::<Value>(source) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(_) => Err("top-level value is not an object".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

fn render_settings(settings: &Map<String, Value>) -> serde_json::Result<Vec<u8>> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    settings.serialize(&mut serializer)?;
    Ok(out)
}
