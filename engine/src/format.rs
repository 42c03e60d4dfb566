//! Conversion between serialized documents and the canonical value tree.
//!
//! Two formats are supported: JSON (the wire format of the remote store) and
//! YAML (the human-editable one). Parsing and serializing go through the
//! hand-written serde impls on [`Value`], so key order and the
//! integer/fractional distinction survive a round trip in either format.

use crate::{Error, Result, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// A supported serialization format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Json,
    Yaml,
}

impl Format {
    /// File extension written for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Yaml => "yaml",
        }
    }

    /// Infer the format from a file name's extension.
    pub fn from_path(path: &Path) -> Option<Format> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Format::Json),
            "yaml" | "yml" => Ok(Format::Yaml),
            other => Err(Error::Format(format!(
                "unknown format '{}': must be json or yaml",
                other
            ))),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Parse a document in the declared format.
pub fn parse(bytes: &[u8], format: Format) -> Result<Value> {
    match format {
        Format::Json => serde_json::from_slice(bytes)
            .map_err(|e| Error::Format(format!("invalid JSON: {}", e))),
        Format::Yaml => {
            if is_blank(bytes) {
                return Ok(Value::Null);
            }
            serde_yaml::from_slice(bytes).map_err(|e| Error::Format(format!("invalid YAML: {}", e)))
        }
    }
}

/// Serialize a value for humans: indented JSON or block-style YAML.
pub fn serialize(value: &Value, format: Format) -> Result<Vec<u8>> {
    match format {
        Format::Json => {
            ensure_json_representable(value)?;
            let mut out = serde_json::to_vec_pretty(value)
                .map_err(|e| Error::Format(format!("encode JSON: {}", e)))?;
            out.push(b'\n');
            Ok(out)
        }
        Format::Yaml => serde_yaml::to_string(value)
            .map(String::into_bytes)
            .map_err(|e| Error::Format(format!("encode YAML: {}", e))),
    }
}

/// Compact JSON with object keys sorted at every level.
///
/// Two trees that are equal produce the same string no matter what order
/// their keys were read in.
pub fn canonical_json(value: &Value) -> Result<String> {
    ensure_json_representable(value)?;
    let mut out = String::new();
    write_canonical(value, &mut out)?;
    Ok(out)
}

fn write_canonical(value: &Value, out: &mut String) -> Result<()> {
    match value {
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out)?;
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&encode_json(&Value::String(key.clone()))?);
                out.push(':');
                write_canonical(item, out)?;
            }
            out.push('}');
        }
        scalar => out.push_str(&encode_json(scalar)?),
    }
    Ok(())
}

fn encode_json(value: &Value) -> Result<String> {
    serde_json::to_string(value).map_err(|e| Error::Format(format!("encode JSON: {}", e)))
}

fn ensure_json_representable(value: &Value) -> Result<()> {
    match value.find_non_finite() {
        Some(path) => Err(Error::Format(format!(
            "JSON cannot represent the non-finite number at {}",
            path
        ))),
        None => Ok(()),
    }
}

fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(|b| b.is_ascii_whitespace())
}
