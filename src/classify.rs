//! Rule classifier: engine rule ids to WCAG success criteria.
//!
//! Resolution order, first match wins:
//! 1. exact: the rule-engine equivalence table, the criterion embedded in an
//!    HTML-validator sniff code (or its technique), or a dotted id used as a
//!    manual rule id
//! 2. tag: WCAG tag hints carried by the raw record (`wcag143`, `1.4.3`)
//! 3. heuristic: keyword search over the normalized rule id
//! 4. the `unclassified` sentinel
//!
//! Tier 3 is approximate and is marked `Confidence::Heuristic` so report
//! consumers can treat it as lower confidence. Classification never fails.

use crate::models::{Confidence, Criterion, Engine, Finding, MergedDataset};
use crate::wcag::{criterion_or_generic, unclassified};
use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub criterion: Criterion,
    pub confidence: Confidence,
}

/// Rule-engine rule ids with a well-established primary criterion.
const RULE_ENGINE_TABLE: &[(&str, &str)] = &[
    ("area-alt", "1.1.1"),
    ("image-alt", "1.1.1"),
    ("input-image-alt", "1.1.1"),
    ("object-alt", "1.1.1"),
    ("role-img-alt", "1.1.1"),
    ("svg-img-alt", "1.1.1"),
    ("audio-caption", "1.2.1"),
    ("video-caption", "1.2.2"),
    ("definition-list", "1.3.1"),
    ("dlitem", "1.3.1"),
    ("list", "1.3.1"),
    ("listitem", "1.3.1"),
    ("p-as-heading", "1.3.1"),
    ("region", "1.3.1"),
    ("td-headers-attr", "1.3.1"),
    ("th-has-data-cells", "1.3.1"),
    ("autocomplete-valid", "1.3.5"),
    ("link-in-text-block", "1.4.1"),
    ("color-contrast", "1.4.3"),
    ("meta-viewport", "1.4.4"),
    ("color-contrast-enhanced", "1.4.6"),
    ("avoid-inline-spacing", "1.4.12"),
    ("frame-focusable-content", "2.1.1"),
    ("scrollable-region-focusable", "2.1.1"),
    ("server-side-image-map", "2.1.1"),
    ("meta-refresh", "2.2.1"),
    ("blink", "2.2.2"),
    ("marquee", "2.2.2"),
    ("bypass", "2.4.1"),
    ("document-title", "2.4.2"),
    ("link-name", "2.4.4"),
    ("identical-links-same-purpose", "2.4.9"),
    ("label-content-name-mismatch", "2.5.3"),
    ("target-size", "2.5.8"),
    ("html-has-lang", "3.1.1"),
    ("html-lang-valid", "3.1.1"),
    ("html-xml-lang-mismatch", "3.1.1"),
    ("valid-lang", "3.1.2"),
    ("duplicate-id", "4.1.1"),
    ("duplicate-id-active", "4.1.1"),
    ("duplicate-id-aria", "4.1.1"),
    ("aria-allowed-attr", "4.1.2"),
    ("aria-command-name", "4.1.2"),
    ("aria-hidden-body", "4.1.2"),
    ("aria-hidden-focus", "4.1.2"),
    ("aria-input-field-name", "4.1.2"),
    ("aria-required-attr", "4.1.2"),
    ("aria-required-children", "1.3.1"),
    ("aria-required-parent", "1.3.1"),
    ("aria-roles", "4.1.2"),
    ("aria-toggle-field-name", "4.1.2"),
    ("aria-valid-attr", "4.1.2"),
    ("aria-valid-attr-value", "4.1.2"),
    ("button-name", "4.1.2"),
    ("frame-title", "4.1.2"),
    ("input-button-name", "4.1.2"),
    ("label", "4.1.2"),
    ("nested-interactive", "4.1.2"),
    ("select-name", "4.1.2"),
];

/// HTML techniques used by validator sniff codes that lack a guideline path.
const TECHNIQUE_TABLE: &[(&str, &str)] = &[
    ("g18", "1.4.3"),
    ("h25", "2.4.2"),
    ("h30", "2.4.4"),
    ("h32", "3.2.2"),
    ("h37", "1.1.1"),
    ("h43", "1.3.1"),
    ("h44", "1.3.1"),
    ("h57", "3.1.1"),
    ("h64", "4.1.2"),
    ("h91", "4.1.2"),
    ("h93", "4.1.1"),
    ("f77", "4.1.1"),
];

/// Fallback keywords, searched in order against the tokens of the
/// normalized rule id.
const KEYWORD_TABLE: &[(&str, &str)] = &[
    ("contrast", "1.4.3"),
    ("focus", "2.4.7"),
    ("keyboard", "2.1.1"),
    ("lang", "3.1.1"),
    ("label", "3.3.2"),
    ("error", "3.3.1"),
    ("alt", "1.1.1"),
    ("aria", "4.1.2"),
];

const STRIP_PREFIXES: &[&str] = &["wcag2aaa.", "wcag2aa.", "wcag2a.", "axe-", "pa11y-", "htmlcs."];

fn sniff_guideline() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)guideline\d+_\d+\.(\d+)_(\d+)_(\d+)").expect("static regex")
    })
}

fn wcag_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^wcag(\d)(\d)(\d{1,2})$").expect("static regex"))
}

fn dotted_id() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:wcag[\s-]*)?(\d)\.(\d)\.(\d{1,2})$").expect("static regex")
    })
}

/// Classify a rule id from `engine`, with optional tag hints.
pub fn classify_rule(engine: Engine, rule_id: &str, tags: &[String]) -> Classification {
    if let Some(id) = exact_match(engine, rule_id) {
        return Classification {
            criterion: criterion_or_generic(&id),
            confidence: Confidence::Exact,
        };
    }
    if let Some(id) = tags.iter().find_map(|t| parse_wcag_tag(t)) {
        return Classification {
            criterion: criterion_or_generic(&id),
            confidence: Confidence::Tag,
        };
    }
    if let Some(id) = keyword_match(rule_id) {
        return Classification {
            criterion: criterion_or_generic(id),
            confidence: Confidence::Heuristic,
        };
    }
    Classification {
        criterion: unclassified(),
        confidence: Confidence::Unclassified,
    }
}

pub fn classify(finding: &Finding) -> Classification {
    classify_rule(finding.engine, &finding.rule_id, &finding.tags)
}

/// Attach a criterion and its confidence to a finding.
pub fn classify_finding(mut finding: Finding) -> Finding {
    let c = classify(&finding);
    finding.wcag = Some(c.criterion);
    finding.wcag_confidence = Some(c.confidence);
    finding
}

/// Classify every finding; ordering and membership are unchanged.
pub fn classify_dataset(mut dataset: MergedDataset) -> MergedDataset {
    for page in dataset.pages.iter_mut() {
        let findings = std::mem::take(&mut page.findings);
        page.findings = findings.into_iter().map(classify_finding).collect();
    }
    dataset
}

fn exact_match(engine: Engine, rule_id: &str) -> Option<String> {
    match engine {
        Engine::RuleEngine => RULE_ENGINE_TABLE
            .iter()
            .find(|(rule, _)| *rule == rule_id)
            .map(|(_, id)| id.to_string()),
        Engine::HtmlValidator => {
            if let Some(caps) = sniff_guideline().captures(rule_id) {
                return Some(format!("{}.{}.{}", &caps[1], &caps[2], &caps[3]));
            }
            let lower = rule_id.to_ascii_lowercase();
            lower.split(|c| c == '.' || c == ',').find_map(|segment| {
                TECHNIQUE_TABLE
                    .iter()
                    .find(|(tech, _)| *tech == segment)
                    .map(|(_, id)| id.to_string())
            })
        }
        Engine::Manual => parse_dotted(rule_id),
    }
}

/// Parse a tag hint such as `wcag143`, `wcag1410` or `1.4.3`.
pub fn parse_wcag_tag(tag: &str) -> Option<String> {
    let t = tag.trim().to_ascii_lowercase();
    if let Some(caps) = wcag_tag().captures(&t) {
        return Some(format!("{}.{}.{}", &caps[1], &caps[2], &caps[3]));
    }
    parse_dotted(&t)
}

fn parse_dotted(s: &str) -> Option<String> {
    let t = s.trim().to_ascii_lowercase();
    let caps = dotted_id().captures(&t)?;
    Some(format!("{}.{}.{}", &caps[1], &caps[2], &caps[3]))
}

/// Rule id lowercased with known engine prefixes removed.
pub fn normalize_rule_id(rule_id: &str) -> String {
    let mut id = rule_id.trim().to_ascii_lowercase();
    for prefix in STRIP_PREFIXES {
        if let Some(rest) = id.strip_prefix(prefix) {
            id = rest.to_string();
            break;
        }
    }
    id
}

// Keywords match at the start of a `-`, `.` or `_` separated token, so
// `alt` hits `alt-text` and `alternative` but not `default`.
fn keyword_match(rule_id: &str) -> Option<&'static str> {
    let id = normalize_rule_id(rule_id);
    let tokens: Vec<&str> = id
        .split(|c| c == '-' || c == '.' || c == '_')
        .filter(|t| !t.is_empty())
        .collect();
    KEYWORD_TABLE
        .iter()
        .find(|(kw, _)| tokens.iter().any(|t| t.starts_with(kw)))
        .map(|(_, crit)| *crit)
}
