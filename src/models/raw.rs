//! Raw shapes written by the audit runners.
//!
//! Raw JSON never leaves the normalizer: `RawRecord::detect` turns a value
//! into one of the known engine shapes, reading every optional field
//! leniently, and `split_payload` flattens the three accepted artifact layouts
//! into `(group url, record)` pairs.

use crate::error::{AuditError, Result};
use serde_json::{Map, Value as Json};

/// DOM rule-engine violation (`id`, `impact`, `nodes[].target`).
#[derive(Debug, Clone, PartialEq)]
pub struct RuleViolation {
    pub id: String,
    pub impact: Option<String>,
    pub description: String,
    pub help: String,
    pub help_url: String,
    pub tags: Vec<String>,
    pub nodes: Vec<RuleNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleNode {
    /// First element of the node's target path, if any.
    pub selector: Option<String>,
    pub impact: Option<String>,
}

/// HTML-validator issue (`code`, `type`, `selector`, `message`).
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatorIssue {
    pub code: String,
    pub kind: Option<String>,
    pub type_code: Option<i64>,
    pub selector: String,
    pub message: String,
    pub context: String,
}

/// A record already in canonical form (manual findings, re-ingested output).
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRecord {
    pub rule_id: String,
    pub engine: Option<String>,
    pub impact: Option<String>,
    pub description: String,
    pub help_text: String,
    pub help_url: String,
    pub selector: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RawRecord {
    RuleEngine(RuleViolation),
    Validator(ValidatorIssue),
    Canonical(CanonicalRecord),
}

impl RawRecord {
    /// Detect the record shape by its discriminating fields.
    pub fn detect(value: &Json) -> Result<RawRecord> {
        let obj = match value.as_object() {
            Some(o) => o,
            None => {
                return Err(AuditError::UnknownShape {
                    keys: format!("<{}>", json_kind(value)),
                })
            }
        };
        if obj.contains_key("code") {
            return Ok(RawRecord::Validator(ValidatorIssue {
                code: text(obj, "code"),
                kind: opt_text(obj, "type"),
                type_code: obj.get("typeCode").and_then(Json::as_i64),
                selector: text(obj, "selector"),
                message: text(obj, "message"),
                context: text(obj, "context"),
            }));
        }
        if obj.contains_key("id") {
            let nodes = obj
                .get("nodes")
                .and_then(Json::as_array)
                .map(|ns| ns.iter().map(rule_node).collect())
                .unwrap_or_default();
            return Ok(RawRecord::RuleEngine(RuleViolation {
                id: text(obj, "id"),
                impact: opt_text(obj, "impact"),
                description: text(obj, "description"),
                help: text(obj, "help"),
                help_url: text(obj, "helpUrl"),
                tags: strings(obj, "tags"),
                nodes,
            }));
        }
        if obj.contains_key("ruleId") {
            return Ok(RawRecord::Canonical(CanonicalRecord {
                rule_id: text(obj, "ruleId"),
                engine: opt_text(obj, "engine"),
                impact: opt_text(obj, "impact"),
                description: text(obj, "description"),
                help_text: text(obj, "helpText"),
                help_url: text(obj, "helpUrl"),
                selector: text(obj, "selector"),
                tags: strings(obj, "tags"),
            }));
        }
        let mut keys: Vec<&str> = obj.keys().map(String::as_str).collect();
        keys.sort_unstable();
        Err(AuditError::UnknownShape {
            keys: if keys.is_empty() {
                "<none>".to_string()
            } else {
                keys.join(",")
            },
        })
    }

    pub fn rule_id(&self) -> &str {
        match self {
            RawRecord::RuleEngine(v) => &v.id,
            RawRecord::Validator(v) => &v.code,
            RawRecord::Canonical(v) => &v.rule_id,
        }
    }
}

/// One raw record with the url of the page group that enclosed it, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct PayloadEntry {
    pub group_url: Option<String>,
    pub record: Json,
}

/// Flatten an artifact payload into records.
///
/// Accepted layouts: a flat array of records, an array of
/// `{url, violations|issues|findings}` page groups, or a single such group.
/// Arrays may mix groups and records. `findings` groups are pages of a
/// previously written dataset.
pub fn split_payload(values: Vec<Json>) -> Vec<PayloadEntry> {
    let mut out = Vec::new();
    for value in values {
        match page_group(&value) {
            Some((url, records)) => {
                for record in records {
                    out.push(PayloadEntry {
                        group_url: url.clone(),
                        record: record.clone(),
                    });
                }
            }
            None => out.push(PayloadEntry {
                group_url: None,
                record: value,
            }),
        }
    }
    out
}

fn page_group(value: &Json) -> Option<(Option<String>, &Vec<Json>)> {
    let obj = value.as_object()?;
    let records = obj
        .get("violations")
        .or_else(|| obj.get("issues"))
        .or_else(|| obj.get("findings"))
        .and_then(Json::as_array)?;
    let url = opt_text(obj, "url").or_else(|| opt_text(obj, "pageUrl"));
    Some((url, records))
}

fn rule_node(node: &Json) -> RuleNode {
    let selector = node
        .get("target")
        .and_then(Json::as_array)
        .and_then(|t| t.first())
        .and_then(first_string);
    RuleNode {
        selector,
        impact: node
            .get("impact")
            .and_then(Json::as_str)
            .map(str::to_string),
    }
}

// Shadow-DOM and iframe targets nest: ["#host", "button"] inside an array.
fn first_string(v: &Json) -> Option<String> {
    match v {
        Json::String(s) => Some(s.clone()),
        Json::Array(items) => items.first().and_then(first_string),
        _ => None,
    }
}

pub(crate) fn text(obj: &Map<String, Json>, key: &str) -> String {
    opt_text(obj, key).unwrap_or_default()
}

pub(crate) fn opt_text(obj: &Map<String, Json>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Json::String(s) => Some(s.clone()),
        Json::Number(n) => Some(n.to_string()),
        Json::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn strings(obj: &Map<String, Json>, key: &str) -> Vec<String> {
    obj.get(key)
        .and_then(Json::as_array)
        .map(|a| {
            a.iter()
                .filter_map(Json::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn json_kind(v: &Json) -> &'static str {
    match v {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}
