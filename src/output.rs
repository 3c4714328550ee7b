//! Output rendering for merge, gate, and classify commands.
//!
//! Supports `human` (default) and `json` outputs. The JSON forms are built by
//! pure `compose_*` functions so they can be tested without capturing stdout.

use crate::classify::Classification;
use crate::gate::GateReport;
use crate::merge::MergeOutcome;
use crate::models::{Impact, SeverityCounts};
use owo_colors::OwoColorize;
use serde_json::json;
use serde_json::Value as JsonVal;
use std::path::Path;

fn use_colors(output: &str) -> bool {
    output != "json" && std::env::var_os("NO_COLOR").is_none()
}

fn colors_on_stderr() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

pub fn error_prefix() -> String {
    if colors_on_stderr() {
        "error:".red().bold().to_string()
    } else {
        "error:".to_string()
    }
}

pub fn note_prefix() -> String {
    if colors_on_stderr() {
        "note:".cyan().bold().to_string()
    } else {
        "note:".to_string()
    }
}

fn severity_label(impact: Impact, color: bool) -> String {
    let label = format!("⟦{}⟧", impact);
    if !color {
        return label;
    }
    match impact {
        Impact::Critical => label.red().bold().to_string(),
        Impact::Serious => label.red().to_string(),
        Impact::Moderate => label.yellow().bold().to_string(),
        Impact::Minor => label.yellow().to_string(),
        Impact::Notice | Impact::Unknown => label.blue().to_string(),
    }
}

fn counts_line(c: &SeverityCounts) -> String {
    format!(
        "critical={} serious={} moderate={} minor={} notice={} unknown={} total={}",
        c.critical, c.serious, c.moderate, c.minor, c.notice, c.unknown, c.total
    )
}

fn rel(path: &Path, root: &Path) -> String {
    pathdiff::diff_paths(path, root)
        .filter(|p| !p.starts_with(".."))
        .unwrap_or_else(|| path.to_path_buf())
        .to_string_lossy()
        .to_string()
}

/// Print the result of a merge run.
pub fn print_merge(outcome: &MergeOutcome, written: &Path, root: &Path, output: &str) {
    match output {
        "json" => println!(
            "{}",
            serde_json::to_string_pretty(&compose_merge_json(outcome, written)).unwrap_or_default()
        ),
        _ => {
            let color = use_colors(output);
            for page in &outcome.dataset.pages {
                let url = if color {
                    page.url.clone().bold().to_string()
                } else {
                    page.url.clone()
                };
                match &page.title {
                    Some(t) => println!("{} ({})", url, t),
                    None => println!("{}", url),
                }
                for f in &page.findings {
                    let wcag = f
                        .wcag
                        .as_ref()
                        .map(|c| format!(" [{}]", c.id))
                        .unwrap_or_default();
                    let target = if f.selector.is_empty() {
                        "<page>".to_string()
                    } else {
                        f.selector.clone()
                    };
                    println!(
                        "  {} ❲{}❳{} {} — {}",
                        severity_label(f.impact, color),
                        f.rule_id,
                        wcag,
                        target,
                        f.engine
                    );
                }
            }
            for s in &outcome.skipped {
                let tag = if color {
                    "⏭️  skipped:".yellow().bold().to_string()
                } else {
                    "⏭️  skipped:".to_string()
                };
                println!("{} {} ({}: {})", tag, s.file, s.stage, s.reason);
            }
            let summary = format!(
                "— Summary — pages={} artifacts={} skipped={} records_skipped={} duplicates={} {}",
                outcome.dataset.pages.len(),
                outcome.artifacts_read,
                outcome.skipped.len(),
                outcome.records_skipped,
                outcome.duplicates_dropped,
                counts_line(&outcome.dataset.severity_counts())
            );
            let wrote = format!("📥 wrote: {}", rel(written, root));
            if color {
                println!("{}", summary.bold());
                println!("{}", wrote.green());
            } else {
                println!("{}", summary);
                println!("{}", wrote);
            }
        }
    }
}

/// Print a gate evaluation.
pub fn print_gate(report: &GateReport, file: &str, output: &str, date: &str) {
    match output {
        "json" => println!(
            "{}",
            serde_json::to_string_pretty(&compose_gate_json(report, file, date)).unwrap_or_default()
        ),
        _ => {
            let color = use_colors(output);
            println!("dataset: {}", file);
            println!("global:      {}", counts_line(&report.global));
            println!("sitemap:     {}", counts_line(&report.by_origin.sitemap));
            println!("interactive: {}", counts_line(&report.by_origin.interactive));
            if report.by_origin.manual.total > 0 {
                println!("manual:      {}", counts_line(&report.by_origin.manual));
            }
            let verdict = format!(
                "critical {}/{} serious {}/{}",
                report.global.critical,
                report.thresholds.critical_max,
                report.global.serious,
                report.thresholds.serious_max
            );
            match (report.passed, color) {
                (true, true) => println!("{} {}", "✔ gate passed:".green().bold(), verdict),
                (true, false) => println!("✔ gate passed: {}", verdict),
                (false, true) => println!("{} {}", "✖ gate failed:".red().bold(), verdict),
                (false, false) => println!("✖ gate failed: {}", verdict),
            }
        }
    }
}

/// Print the criterion resolved for one rule id.
pub fn print_classification(rule_id: &str, c: &Classification, output: &str) {
    match output {
        "json" => println!(
            "{}",
            serde_json::to_string_pretty(&compose_classification_json(rule_id, c)).unwrap_or_default()
        ),
        _ => {
            let level = c
                .criterion
                .level
                .map(|l| l.to_string())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "{} → {} {} (level {}, {:?})",
                rule_id, c.criterion.id, c.criterion.title, level, c.confidence
            );
            println!("  expected: {}", c.criterion.expected_behavior);
            println!("  see: {}", c.criterion.reference_url);
        }
    }
}

/// Compose merge JSON object (pure) for testing/snapshot purposes.
pub fn compose_merge_json(outcome: &MergeOutcome, written: &Path) -> JsonVal {
    json!({
        "file": written.to_string_lossy(),
        "pages": outcome.dataset.pages.len(),
        "findings": outcome.dataset.finding_count(),
        "artifactsRead": outcome.artifacts_read,
        "skipped": outcome.skipped,
        "recordsSkipped": outcome.records_skipped,
        "duplicatesDropped": outcome.duplicates_dropped,
        "global": outcome.dataset.severity_counts(),
        "byOrigin": outcome.dataset.origin_counts(),
    })
}

/// Compose the persisted gate report:
/// `{file, global, byOrigin, thresholds, passed, date}`.
pub fn compose_gate_json(report: &GateReport, file: &str, date: &str) -> JsonVal {
    json!({
        "file": file,
        "global": report.global,
        "byOrigin": report.by_origin,
        "thresholds": report.thresholds,
        "passed": report.passed,
        "date": date,
    })
}

/// Compose the single document printed by `check` in json mode.
pub fn compose_check_json(
    outcome: &MergeOutcome,
    written: &Path,
    report: &GateReport,
    file: &str,
    date: &str,
) -> JsonVal {
    json!({
        "merge": compose_merge_json(outcome, written),
        "gate": compose_gate_json(report, file, date),
    })
}

pub fn compose_classification_json(rule_id: &str, c: &Classification) -> JsonVal {
    json!({
        "ruleId": rule_id,
        "wcag": c.criterion,
        "wcagConfidence": c.confidence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify_rule;
    use crate::gate::{evaluate, Thresholds};
    use crate::merge::SkippedArtifact;
    use crate::models::tests::finding;
    use crate::models::{Engine, MergedDataset, Origin, PageResult};
    use std::path::PathBuf;

    fn dataset() -> MergedDataset {
        MergedDataset {
            pages: vec![PageResult {
                url: "https://a.test/".into(),
                title: None,
                findings: vec![
                    finding("label", Impact::Critical, Origin::Sitemap),
                    finding("region", Impact::Moderate, Origin::Interactive),
                ],
            }],
        }
    }

    #[test]
    fn test_compose_gate_json_shape() {
        let report = evaluate(&dataset(), Thresholds::default()).unwrap();
        let out = compose_gate_json(&report, "merged/latest.json", "2026-10-19T08:30:00Z");
        assert_eq!(out["file"], "merged/latest.json");
        assert_eq!(out["global"]["critical"], 1);
        assert_eq!(out["global"]["total"], 2);
        assert_eq!(out["byOrigin"]["interactive"]["moderate"], 1);
        assert_eq!(out["thresholds"]["criticalMax"], 0);
        assert_eq!(out["passed"], false);
        assert_eq!(out["date"], "2026-10-19T08:30:00Z");
    }

    #[test]
    fn test_compose_merge_json_shape() {
        let outcome = MergeOutcome {
            dataset: dataset(),
            artifacts_read: 3,
            skipped: vec![SkippedArtifact {
                file: "bad.json".into(),
                stage: "repair",
                reason: "malformed".into(),
            }],
            records_skipped: 2,
            duplicates_dropped: 4,
        };
        let out = compose_merge_json(&outcome, &PathBuf::from("merged/merged-x.json"));
        assert_eq!(out["pages"], 1);
        assert_eq!(out["findings"], 2);
        assert_eq!(out["skipped"][0]["stage"], "repair");
        assert_eq!(out["duplicatesDropped"], 4);
        assert_eq!(out["global"]["critical"], 1);
    }

    #[test]
    fn test_compose_check_json_is_one_document() {
        let outcome = MergeOutcome {
            dataset: dataset(),
            artifacts_read: 1,
            skipped: Vec::new(),
            records_skipped: 0,
            duplicates_dropped: 0,
        };
        let report = evaluate(&outcome.dataset, Thresholds::default()).unwrap();
        let written = PathBuf::from("merged/merged-x.json");
        let out = compose_check_json(&outcome, &written, &report, "merged/merged-x.json", "2026-10-19T08:30:00Z");
        assert_eq!(out.as_object().unwrap().len(), 2);
        assert_eq!(out["merge"]["findings"], 2);
        assert_eq!(out["gate"]["passed"], false);
        assert_eq!(out["gate"]["file"], "merged/merged-x.json");
    }

    #[test]
    fn test_compose_classification_json() {
        let c = classify_rule(Engine::RuleEngine, "document-title", &[]);
        let out = compose_classification_json("document-title", &c);
        assert_eq!(out["wcag"]["id"], "2.4.2");
        assert_eq!(out["wcag"]["level"], "A");
        assert_eq!(out["wcagConfidence"], "exact");
    }
}
