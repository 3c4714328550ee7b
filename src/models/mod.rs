//! Canonical data models shared by the merge, classify, and gate passes.

pub mod artifact;
pub mod raw;

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
/// Tool that produced a finding.
pub enum Engine {
    RuleEngine,
    HtmlValidator,
    Manual,
}

impl Engine {
    pub fn as_str(&self) -> &'static str {
        match self {
            Engine::RuleEngine => "rule-engine",
            Engine::HtmlValidator => "html-validator",
            Engine::Manual => "manual",
        }
    }

    pub fn parse(s: &str) -> Option<Engine> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rule-engine" | "axe" => Some(Engine::RuleEngine),
            "html-validator" | "pa11y" | "htmlcs" => Some(Engine::HtmlValidator),
            "manual" => Some(Engine::Manual),
            _ => None,
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Canonical severity vocabulary.
pub enum Impact {
    Critical,
    Serious,
    Moderate,
    Minor,
    Notice,
    Unknown,
}

impl Impact {
    /// Sort rank: critical first, notice and unknown share the last slot.
    pub fn rank(&self) -> u8 {
        match self {
            Impact::Critical => 1,
            Impact::Serious => 2,
            Impact::Moderate => 3,
            Impact::Minor => 4,
            Impact::Notice | Impact::Unknown => 5,
        }
    }

    /// Rule-engine impacts already use the canonical words.
    pub fn from_rule_engine(s: &str) -> Impact {
        match s.trim().to_ascii_lowercase().as_str() {
            "critical" => Impact::Critical,
            "serious" => Impact::Serious,
            "moderate" => Impact::Moderate,
            "minor" => Impact::Minor,
            _ => Impact::Unknown,
        }
    }

    /// Validator severities: error -> serious, warning -> moderate, notice -> notice.
    pub fn from_validator(s: &str) -> Impact {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Impact::Serious,
            "warning" => Impact::Moderate,
            "notice" => Impact::Notice,
            _ => Impact::Unknown,
        }
    }

    /// Numeric validator `typeCode` (1 error, 2 warning, 3 notice).
    pub fn from_validator_code(code: i64) -> Impact {
        match code {
            1 => Impact::Serious,
            2 => Impact::Moderate,
            3 => Impact::Notice,
            _ => Impact::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Impact::Critical => "critical",
            Impact::Serious => "serious",
            Impact::Moderate => "moderate",
            Impact::Minor => "minor",
            Impact::Notice => "notice",
            Impact::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Audit pass that produced a finding.
pub enum Origin {
    Sitemap,
    Interactive,
    Manual,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Sitemap => write!(f, "sitemap"),
            Origin::Interactive => write!(f, "interactive"),
            Origin::Manual => write!(f, "manual"),
        }
    }
}

/// WCAG conformance level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WcagLevel {
    A,
    AA,
    AAA,
}

impl fmt::Display for WcagLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WcagLevel::A => write!(f, "A"),
            WcagLevel::AA => write!(f, "AA"),
            WcagLevel::AAA => write!(f, "AAA"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// WCAG success-criterion record attached to a finding.
pub struct Criterion {
    pub id: String,
    pub title: String,
    pub level: Option<WcagLevel>,
    pub expected_behavior: String,
    pub reference_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// How a criterion was resolved; `Heuristic` and `Unclassified` are low confidence.
pub enum Confidence {
    Exact,
    Tag,
    Heuristic,
    Unclassified,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// One normalized accessibility issue on one page.
pub struct Finding {
    pub engine: Engine,
    pub rule_id: String,
    pub impact: Impact,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub help_text: String,
    #[serde(default)]
    pub help_url: String,
    #[serde(default)]
    pub selector: String,
    pub page_url: String,
    pub origin: Origin,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wcag: Option<Criterion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wcag_confidence: Option<Confidence>,
}

/// Deduplication identity: `(engine, ruleId, pageUrl, selector)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey {
    pub engine: Engine,
    pub rule_id: String,
    pub page_url: String,
    pub selector: String,
}

impl Finding {
    pub fn identity_key(&self) -> IdentityKey {
        IdentityKey {
            engine: self.engine,
            rule_id: self.rule_id.clone(),
            page_url: self.page_url.clone(),
            selector: self.selector.clone(),
        }
    }

    /// Canonical order inside a page: rank, rule id, then selector and engine.
    pub fn canonical_cmp(&self, other: &Finding) -> Ordering {
        self.impact
            .rank()
            .cmp(&other.impact.rank())
            .then_with(|| self.rule_id.cmp(&other.rule_id))
            .then_with(|| self.selector.cmp(&other.selector))
            .then_with(|| self.engine.cmp(&other.engine))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Findings for one audited page.
pub struct PageResult {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub findings: Vec<Finding>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
/// Canonical merge output, serialized as a bare array of pages.
pub struct MergedDataset {
    pub pages: Vec<PageResult>,
}

impl MergedDataset {
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.pages.iter().flat_map(|p| p.findings.iter())
    }

    pub fn finding_count(&self) -> usize {
        self.pages.iter().map(|p| p.findings.len()).sum()
    }

    /// Severity totals, always aggregated live from the findings.
    pub fn severity_counts(&self) -> SeverityCounts {
        let mut counts = SeverityCounts::default();
        for f in self.findings() {
            counts.add(f.impact);
        }
        counts
    }

    pub fn origin_counts(&self) -> OriginCounts {
        let mut counts = OriginCounts::default();
        for f in self.findings() {
            match f.origin {
                Origin::Sitemap => counts.sitemap.add(f.impact),
                Origin::Interactive => counts.interactive.add(f.impact),
                Origin::Manual => counts.manual.add(f.impact),
            }
        }
        counts
    }

    /// Fill page titles from the crawler's page list. Pages keep their
    /// existing title when the crawler has none.
    pub fn with_titles(mut self, pages: &[CrawledPage]) -> Self {
        for page in self.pages.iter_mut() {
            if let Some(title) = pages
                .iter()
                .find(|c| c.url == page.url)
                .and_then(|c| c.title.clone())
            {
                page.title = Some(title);
            }
        }
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Count of findings per canonical severity.
pub struct SeverityCounts {
    pub critical: usize,
    pub serious: usize,
    pub moderate: usize,
    pub minor: usize,
    pub notice: usize,
    pub unknown: usize,
    pub total: usize,
}

impl SeverityCounts {
    pub fn add(&mut self, impact: Impact) {
        match impact {
            Impact::Critical => self.critical += 1,
            Impact::Serious => self.serious += 1,
            Impact::Moderate => self.moderate += 1,
            Impact::Minor => self.minor += 1,
            Impact::Notice => self.notice += 1,
            Impact::Unknown => self.unknown += 1,
        }
        self.total += 1;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Severity totals split by audit pass.
pub struct OriginCounts {
    pub sitemap: SeverityCounts,
    pub interactive: SeverityCounts,
    pub manual: SeverityCounts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Crawler output entry.
pub struct CrawledPage {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
}
