//! Record normalizer: engine-specific shapes to canonical `Finding`s.
//!
//! Page url and origin always come from the audit-run context, never from
//! the finding payload, except for flat artifacts whose context has no page:
//! those fall back to a record-level `url`/`pageUrl`, then to an empty url.

use crate::error::Result;
use crate::models::artifact::ArtifactContext;
use crate::models::raw::{opt_text, RawRecord};
use crate::models::{Engine, Finding, Impact, Origin};
use serde_json::Value as Json;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Context for one record: its artifact plus the enclosing page group.
pub struct RecordContext<'a> {
    pub artifact: &'a ArtifactContext,
    pub group_url: Option<&'a str>,
}

impl<'a> RecordContext<'a> {
    pub fn new(artifact: &'a ArtifactContext, group_url: Option<&'a str>) -> Self {
        Self {
            artifact,
            group_url,
        }
    }

    fn page_url(&self, record: &Json) -> String {
        if let Some(url) = self.group_url {
            return url.to_string();
        }
        if let Some(url) = self.artifact.page_url.as_ref() {
            return url.clone();
        }
        record
            .as_object()
            .and_then(|o| opt_text(o, "pageUrl").or_else(|| opt_text(o, "url")))
            .unwrap_or_default()
    }

    fn origin(&self) -> Origin {
        self.artifact.origin
    }
}

/// Normalize one raw record.
///
/// Rule-engine violations expand to one finding per node; a violation
/// without nodes becomes one page-level finding. Fails only with
/// `UnknownShape` when the record matches no known engine shape.
pub fn normalize_record(record: &Json, ctx: &RecordContext<'_>) -> Result<Vec<Finding>> {
    let raw = RawRecord::detect(record)?;
    let page_url = ctx.page_url(record);
    let origin = ctx.origin();

    let findings = match raw {
        RawRecord::RuleEngine(v) => {
            let base = Finding {
                engine: Engine::RuleEngine,
                rule_id: v.id,
                impact: v
                    .impact
                    .as_deref()
                    .map(Impact::from_rule_engine)
                    .unwrap_or(Impact::Unknown),
                description: v.description,
                help_text: v.help,
                help_url: v.help_url,
                selector: String::new(),
                page_url,
                origin,
                tags: v.tags,
                wcag: None,
                wcag_confidence: None,
            };
            if v.nodes.is_empty() {
                vec![base]
            } else {
                v.nodes
                    .into_iter()
                    .map(|node| {
                        let mut f = base.clone();
                        f.selector = node.selector.unwrap_or_default();
                        if let Some(impact) = node.impact.as_deref() {
                            let node_impact = Impact::from_rule_engine(impact);
                            if node_impact != Impact::Unknown {
                                f.impact = node_impact;
                            }
                        }
                        f
                    })
                    .collect()
            }
        }
        RawRecord::Validator(i) => {
            let impact = match (i.kind.as_deref(), i.type_code) {
                (Some(kind), _) => Impact::from_validator(kind),
                (None, Some(code)) => Impact::from_validator_code(code),
                (None, None) => Impact::Unknown,
            };
            vec![Finding {
                engine: Engine::HtmlValidator,
                rule_id: i.code,
                impact,
                description: i.message,
                help_text: i.context,
                help_url: String::new(),
                selector: i.selector,
                page_url,
                origin,
                tags: Vec::new(),
                wcag: None,
                wcag_confidence: None,
            }]
        }
        RawRecord::Canonical(c) => {
            let engine = c
                .engine
                .as_deref()
                .and_then(Engine::parse)
                .or(ctx.artifact.engine_hint)
                .unwrap_or(Engine::Manual);
            let impact = c
                .impact
                .as_deref()
                .map(|s| match Impact::from_rule_engine(s) {
                    Impact::Unknown if s.eq_ignore_ascii_case("notice") => Impact::Notice,
                    other => other,
                })
                .unwrap_or(Impact::Unknown);
            vec![Finding {
                engine,
                rule_id: c.rule_id,
                impact,
                description: c.description,
                help_text: c.help_text,
                help_url: c.help_url,
                selector: c.selector,
                page_url,
                origin,
                tags: c.tags,
                wcag: None,
                wcag_confidence: None,
            }]
        }
    };
    Ok(findings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuditError;
    use serde_json::json;

    fn ctx() -> ArtifactContext {
        ArtifactContext::default()
    }

    #[test]
    fn test_rule_engine_expands_nodes_with_first_target() {
        let art = ctx();
        let rc = RecordContext::new(&art, Some("https://a.test/"));
        let rec = json!({
            "id": "color-contrast",
            "impact": "serious",
            "help": "Elements must meet minimum color contrast ratio thresholds",
            "helpUrl": "https://dequeuniversity.com/rules/axe/4.8/color-contrast",
            "nodes": [
                {"target": ["button", "span"]},
                {"target": [".footer a"], "impact": "critical"}
            ]
        });
        let out = normalize_record(&rec, &rc).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].selector, "button");
        assert_eq!(out[0].impact, Impact::Serious);
        assert_eq!(out[1].selector, ".footer a");
        assert_eq!(out[1].impact, Impact::Critical);
        assert!(out.iter().all(|f| f.page_url == "https://a.test/"));
        assert_eq!(out[0].help_text, "Elements must meet minimum color contrast ratio thresholds");
    }

    #[test]
    fn test_rule_engine_without_nodes_is_page_level() {
        let art = ctx();
        let rc = RecordContext::new(&art, Some("https://a.test/"));
        let out = normalize_record(&json!({"id": "region", "impact": "moderate"}), &rc).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].selector, "");
        assert_eq!(out[0].impact, Impact::Moderate);
        assert_eq!(out[0].origin, Origin::Sitemap);
    }

    #[test]
    fn test_validator_severity_and_selector() {
        let art = ArtifactContext {
            origin: Origin::Interactive,
            ..ArtifactContext::default()
        };
        let rc = RecordContext::new(&art, Some("https://a.test/menu"));
        let rec = json!({
            "code": "WCAG2AA.Principle1.Guideline1_4.1_4_3.G18.Fail",
            "type": "warning",
            "message": "This element has insufficient contrast",
            "selector": "#nav > a"
        });
        let out = normalize_record(&rec, &rc).unwrap();
        assert_eq!(out[0].engine, Engine::HtmlValidator);
        assert_eq!(out[0].impact, Impact::Moderate);
        assert_eq!(out[0].selector, "#nav > a");
        assert_eq!(out[0].origin, Origin::Interactive);
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let art = ctx();
        let rc = RecordContext::new(&art, None);
        let out = normalize_record(&json!({"code": "H37"}), &rc).unwrap();
        assert_eq!(out[0].impact, Impact::Unknown);
        assert_eq!(out[0].selector, "");
        assert_eq!(out[0].page_url, "");
        assert_eq!(out[0].description, "");
    }

    #[test]
    fn test_page_url_precedence() {
        let art = ArtifactContext {
            page_url: Some("https://ctx.test/".into()),
            ..ArtifactContext::default()
        };
        let rec = json!({"id": "label", "url": "https://payload.test/"});
        let grouped = normalize_record(&rec, &RecordContext::new(&art, Some("https://group.test/"))).unwrap();
        assert_eq!(grouped[0].page_url, "https://group.test/");
        let flat = normalize_record(&rec, &RecordContext::new(&art, None)).unwrap();
        assert_eq!(flat[0].page_url, "https://ctx.test/");
        let bare = ArtifactContext::default();
        let fallback = normalize_record(&rec, &RecordContext::new(&bare, None)).unwrap();
        assert_eq!(fallback[0].page_url, "https://payload.test/");
    }

    #[test]
    fn test_canonical_record_uses_engine_hint() {
        let art = ArtifactContext {
            origin: Origin::Manual,
            engine_hint: Some(Engine::Manual),
            page_url: None,
        };
        let rc = RecordContext::new(&art, Some("https://a.test/"));
        let rec = json!({"ruleId": "focus-trap-modal", "impact": "critical", "selector": "dialog"});
        let out = normalize_record(&rec, &rc).unwrap();
        assert_eq!(out[0].engine, Engine::Manual);
        assert_eq!(out[0].origin, Origin::Manual);
        assert_eq!(out[0].impact, Impact::Critical);
    }

    #[test]
    fn test_unknown_shape_is_an_error() {
        let art = ctx();
        let rc = RecordContext::new(&art, None);
        let err = normalize_record(&json!({"foo": "bar"}), &rc).unwrap_err();
        assert!(matches!(err, AuditError::UnknownShape { .. }));
    }
}
