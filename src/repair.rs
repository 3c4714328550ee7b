//! JSON self-repair for artifacts produced by append-mode writes.
//!
//! Runners that append results without separators leave payloads such as
//! `{..}{..}` or `[..][..]`. The repairs below are textual and bounded; they
//! run only after a direct parse fails, in this order:
//! 1. strip newlines
//! 2. `}{` becomes `},{`
//! 3. `][` becomes `],[`
//! 4. wrap the payload in `[`..`]` unless already bracketed
//!
//! A repaired payload that turns out to be an array of arrays (concatenated
//! arrays) is flattened one level.

use crate::error::{AuditError, Result};
use regex::Regex;
use serde_json::Value as Json;
use std::sync::OnceLock;
use tracing::debug;

fn object_boundary() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\}\s*\{").expect("static regex"))
}

fn array_boundary() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\]\s*\[").expect("static regex"))
}

/// Parse `text` as an array of records, repairing it when needed.
///
/// A single top-level value that parses directly is returned as a
/// one-element array. `file` only labels the error.
pub fn repair_json(text: &str, file: &str) -> Result<Vec<Json>> {
    match serde_json::from_str::<Json>(text) {
        Ok(Json::Array(items)) => return Ok(items),
        Ok(other) => return Ok(vec![other]),
        Err(_) => {}
    }

    let (repaired, applied) = apply_repairs(text);
    debug!(file, repairs = ?applied, "direct parse failed, applying repairs");

    let first = serde_json::from_str::<Json>(&repaired);
    let parsed = match first {
        Ok(v) => v,
        // `[..],[..]` is already bracketed but still needs an outer array.
        Err(e) if is_bracketed(&repaired) => serde_json::from_str::<Json>(&format!("[{}]", repaired))
            .map_err(|_| AuditError::MalformedInput {
                file: file.to_string(),
                source: e,
            })?,
        Err(e) => {
            return Err(AuditError::MalformedInput {
                file: file.to_string(),
                source: e,
            })
        }
    };

    match parsed {
        Json::Array(items) => Ok(flatten_arrays(items)),
        other => Ok(vec![other]),
    }
}

/// Apply the textual repairs, returning the new text and the names of the
/// repairs that changed something.
pub fn apply_repairs(text: &str) -> (String, Vec<&'static str>) {
    let mut applied = Vec::new();

    let stripped: String = text.chars().filter(|c| *c != '\n' && *c != '\r').collect();
    if stripped.len() != text.len() {
        applied.push("strip-newlines");
    }

    let objects = object_boundary().replace_all(&stripped, "},{");
    if objects != stripped.as_str() {
        applied.push("object-commas");
    }

    let arrays = array_boundary().replace_all(&objects, "],[");
    if arrays != objects {
        applied.push("array-commas");
    }

    let trimmed = arrays.trim();
    let out = if is_bracketed(trimmed) {
        trimmed.to_string()
    } else {
        applied.push("wrap");
        format!("[{}]", trimmed)
    };
    (out, applied)
}

fn is_bracketed(s: &str) -> bool {
    let s = s.trim();
    s.starts_with('[') && s.ends_with(']')
}

fn flatten_arrays(items: Vec<Json>) -> Vec<Json> {
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Json::Array(inner) => out.extend(inner),
            other => out.push(other),
        }
    }
    out
}
