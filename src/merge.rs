//! Merge engine: artifact discovery, parallel load, and the dedup fold.
//!
//! Loading (read, repair, normalize) runs per artifact in parallel. The fold
//! that deduplicates and orders findings runs only after every artifact has
//! been loaded, over artifacts in path order, so the output never depends on
//! discovery order or thread scheduling.

use crate::error::{AuditError, Result};
use crate::models::artifact::Artifact;
use crate::models::raw::split_payload;
use crate::models::{Finding, IdentityKey, MergedDataset, PageResult};
use crate::normalize::{normalize_record, RecordContext};
use crate::repair::repair_json;
use glob::glob;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// An artifact that could not be read or parsed and was left out.
pub struct SkippedArtifact {
    pub file: String,
    pub stage: &'static str,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
/// Canonical dataset plus the bookkeeping of one merge run.
pub struct MergeOutcome {
    pub dataset: MergedDataset,
    pub artifacts_read: usize,
    pub skipped: Vec<SkippedArtifact>,
    pub records_skipped: usize,
    pub duplicates_dropped: usize,
}

/// Find result artifacts under `root` matching `patterns`.
///
/// Paths under any `exclude` directory (typically the merge output dir) are
/// ignored. The result is sorted and free of duplicates.
pub fn discover_artifacts(root: &Path, patterns: &[String], exclude: &[PathBuf]) -> Result<Vec<Artifact>> {
    let mut found: BTreeSet<PathBuf> = BTreeSet::new();
    for pat in patterns {
        let abs_glob = root.join(pat);
        let pattern = abs_glob.to_string_lossy().to_string();
        for entry in glob(&pattern)?.flatten() {
            if !entry.is_file() {
                continue;
            }
            if exclude.iter().any(|ex| entry.starts_with(ex)) {
                continue;
            }
            found.insert(entry);
        }
    }
    debug!(root = %root.display(), count = found.len(), "discovered artifacts");
    Ok(found
        .into_iter()
        .map(|p| Artifact::from_path(root, p))
        .collect())
}

/// Discover and merge every artifact under `root`.
pub fn merge_directory(root: &Path, patterns: &[String], exclude: &[PathBuf]) -> Result<MergeOutcome> {
    let artifacts = discover_artifacts(root, patterns, exclude)?;
    merge_artifacts(&artifacts, root)
}

/// Merge `artifacts` into one canonical dataset.
///
/// Fails with `NoArtifacts` when the list is empty. Unreadable or
/// unrepairable artifacts and unrecognized records are skipped and reported
/// in the outcome. `root` labels files and the fatal error.
pub fn merge_artifacts(artifacts: &[Artifact], root: &Path) -> Result<MergeOutcome> {
    if artifacts.is_empty() {
        return Err(AuditError::NoArtifacts {
            dir: root.to_path_buf(),
        });
    }

    let mut ordered: Vec<&Artifact> = artifacts.iter().collect();
    ordered.sort_by(|a, b| a.path.cmp(&b.path));
    ordered.dedup_by(|a, b| a.path == b.path);

    let loaded: Vec<LoadedArtifact> = ordered
        .par_iter()
        .map(|artifact| load_artifact(artifact, root))
        .collect();

    let acc = loaded
        .into_iter()
        .fold(Accumulator::default(), Accumulator::ingest);
    Ok(acc.finish())
}

enum LoadedArtifact {
    Loaded {
        findings: Vec<Finding>,
        records_skipped: usize,
    },
    Skipped(SkippedArtifact),
}

fn load_artifact(artifact: &Artifact, root: &Path) -> LoadedArtifact {
    let name = artifact.display_name(root);
    let text = match fs::read_to_string(&artifact.path) {
        Ok(s) => s,
        Err(e) => {
            let err = AuditError::io(&artifact.path, e);
            warn!(file = %name, error = %err, "skipping unreadable artifact");
            return LoadedArtifact::Skipped(SkippedArtifact {
                file: name,
                stage: err.stage(),
                reason: err.to_string(),
            });
        }
    };
    let values = match repair_json(&text, &name) {
        Ok(v) => v,
        Err(err) => {
            warn!(file = %name, error = %err, "skipping malformed artifact");
            return LoadedArtifact::Skipped(SkippedArtifact {
                file: name,
                stage: err.stage(),
                reason: err.to_string(),
            });
        }
    };

    let mut findings = Vec::new();
    let mut records_skipped = 0usize;
    for entry in split_payload(values) {
        let ctx = RecordContext::new(&artifact.context, entry.group_url.as_deref());
        match normalize_record(&entry.record, &ctx) {
            Ok(mut batch) => findings.append(&mut batch),
            Err(err) => {
                records_skipped += 1;
                warn!(file = %name, error = %err, "skipping record");
            }
        }
    }
    debug!(file = %name, findings = findings.len(), records_skipped, "loaded artifact");
    LoadedArtifact::Loaded {
        findings,
        records_skipped,
    }
}

#[derive(Default)]
struct PageBucket {
    seen: HashSet<IdentityKey>,
    findings: Vec<Finding>,
}

#[derive(Default)]
/// Fold state: findings grouped by page url, first occurrence per key.
struct Accumulator {
    pages: BTreeMap<String, PageBucket>,
    artifacts_read: usize,
    skipped: Vec<SkippedArtifact>,
    records_skipped: usize,
    duplicates_dropped: usize,
}

impl Accumulator {
    fn ingest(mut self, loaded: LoadedArtifact) -> Self {
        match loaded {
            LoadedArtifact::Skipped(s) => self.skipped.push(s),
            LoadedArtifact::Loaded {
                findings,
                records_skipped,
            } => {
                self.artifacts_read += 1;
                self.records_skipped += records_skipped;
                for finding in findings {
                    let bucket = self.pages.entry(finding.page_url.clone()).or_default();
                    if bucket.seen.insert(finding.identity_key()) {
                        bucket.findings.push(finding);
                    } else {
                        self.duplicates_dropped += 1;
                    }
                }
            }
        }
        self
    }

    fn finish(self) -> MergeOutcome {
        let pages = self
            .pages
            .into_iter()
            .filter(|(_, bucket)| !bucket.findings.is_empty())
            .map(|(url, bucket)| {
                let mut findings = bucket.findings;
                findings.sort_by(|a, b| a.canonical_cmp(b));
                PageResult {
                    url,
                    title: None,
                    findings,
                }
            })
            .collect();
        MergeOutcome {
            dataset: MergedDataset { pages },
            artifacts_read: self.artifacts_read,
            skipped: self.skipped,
            records_skipped: self.records_skipped,
            duplicates_dropped: self.duplicates_dropped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Engine, Impact, Origin};
    use tempfile::tempdir;

    fn write(root: &Path, rel: &str, body: &str) -> PathBuf {
        let p = root.join(rel);
        fs::create_dir_all(p.parent().unwrap()).unwrap();
        fs::write(&p, body).unwrap();
        p
    }

    fn all_json() -> Vec<String> {
        vec!["**/*.json".to_string()]
    }

    #[test]
    fn test_duplicate_finding_across_artifacts_collapses() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let body = r#"[{"url":"https://a.test/","violations":[{"id":"color-contrast","impact":"serious","nodes":[{"target":["button"]}]}]}]"#;
        write(root, "run1/axe.json", body);
        write(root, "run2/axe.json", body);
        let out = merge_directory(root, &all_json(), &[]).unwrap();
        assert_eq!(out.dataset.pages.len(), 1);
        assert_eq!(out.dataset.pages[0].url, "https://a.test/");
        assert_eq!(out.dataset.pages[0].findings.len(), 1);
        assert_eq!(out.duplicates_dropped, 1);
        assert_eq!(out.artifacts_read, 2);
    }

    #[test]
    fn test_first_occurrence_wins_without_field_merging() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(
            root,
            "a.json",
            r##"{"url":"https://a.test/","violations":[{"id":"label","impact":"critical","description":"Form elements must have labels","nodes":[{"target":["#q"]}]}]}"##,
        );
        write(
            root,
            "b.json",
            r##"{"url":"https://a.test/","violations":[{"id":"label","impact":"critical","description":"FORM ELEMENTS MUST HAVE LABELS","nodes":[{"target":["#q"]}]}]}"##,
        );
        let out = merge_directory(root, &all_json(), &[]).unwrap();
        let findings = &out.dataset.pages[0].findings;
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].description, "Form elements must have labels");
    }

    #[test]
    fn test_concatenated_artifact_sorted_by_severity() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let path = write(
            root,
            "flat.json",
            r#"{"id":"region","impact":"moderate"}{"id":"label","impact":"critical"}"#,
        );
        let artifact = Artifact::from_path(root, path).with_page_url("https://a.test/");
        let out = merge_artifacts(&[artifact], root).unwrap();
        let rules: Vec<&str> = out.dataset.pages[0]
            .findings
            .iter()
            .map(|f| f.rule_id.as_str())
            .collect();
        assert_eq!(rules, vec!["label", "region"]);
    }

    #[test]
    fn test_empty_directory_is_no_artifacts() {
        let dir = tempdir().unwrap();
        let err = merge_directory(dir.path(), &all_json(), &[]).unwrap_err();
        match err {
            AuditError::NoArtifacts { dir: d } => assert_eq!(d, dir.path()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_corrupt_artifact_is_skipped_not_fatal() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(root, "bad.json", r#"{"url": "https://a.test/", "violations": ["#);
        write(
            root,
            "good.json",
            r#"[{"url":"https://b.test/","violations":[{"id":"bypass","impact":"serious"}]}]"#,
        );
        let out = merge_directory(root, &all_json(), &[]).unwrap();
        assert_eq!(out.skipped.len(), 1);
        assert_eq!(out.skipped[0].file, "bad.json");
        assert_eq!(out.skipped[0].stage, "repair");
        assert_eq!(out.dataset.pages.len(), 1);
        assert_eq!(out.dataset.pages[0].url, "https://b.test/");
    }

    #[test]
    fn test_unknown_records_are_counted_and_skipped() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(
            root,
            "mixed.json",
            r#"{"url":"https://a.test/","violations":[{"id":"list","impact":"minor"},{"nonsense":true}]}"#,
        );
        let out = merge_directory(root, &all_json(), &[]).unwrap();
        assert_eq!(out.records_skipped, 1);
        assert_eq!(out.dataset.finding_count(), 1);
    }

    #[test]
    fn test_pages_without_findings_are_dropped_and_pages_sorted() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(
            root,
            "axe.json",
            r#"[
                {"url":"https://z.test/","violations":[{"id":"bypass","impact":"serious"}]},
                {"url":"https://clean.test/","violations":[]},
                {"url":"https://a.test/","violations":[{"id":"bypass","impact":"serious"}]}
            ]"#,
        );
        let out = merge_directory(root, &all_json(), &[]).unwrap();
        let urls: Vec<&str> = out.dataset.pages.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(urls, vec!["https://a.test/", "https://z.test/"]);
    }

    #[test]
    fn test_engines_do_not_dedup_against_each_other() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(
            root,
            "sitemap/axe.json",
            r#"{"url":"https://a.test/","violations":[{"id":"H37","impact":"serious","nodes":[{"target":["img"]}]}]}"#,
        );
        write(
            root,
            "sitemap/pa11y.json",
            r#"{"url":"https://a.test/","issues":[{"code":"H37","type":"error","selector":"img"}]}"#,
        );
        let out = merge_directory(root, &all_json(), &[]).unwrap();
        let engines: Vec<Engine> = out.dataset.pages[0].findings.iter().map(|f| f.engine).collect();
        assert_eq!(engines, vec![Engine::RuleEngine, Engine::HtmlValidator]);
    }

    #[test]
    fn test_discovery_excludes_output_dir_and_infers_origin() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(root, "interactive/axe-menu.json", "[]");
        write(root, "merged/latest.json", "[]");
        let exclude = vec![root.join("merged")];
        let found = discover_artifacts(root, &all_json(), &exclude).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].context.origin, Origin::Interactive);
    }

    #[test]
    fn test_findings_sorted_by_rank_then_rule() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(
            root,
            "axe.json",
            r#"{"url":"https://a.test/","violations":[
                {"id":"zz-rule","impact":"minor"},
                {"id":"b-rule","impact":"serious"},
                {"id":"a-rule","impact":"serious"},
                {"id":"c-rule"}
            ]}"#,
        );
        let out = merge_directory(root, &all_json(), &[]).unwrap();
        let got: Vec<(&str, Impact)> = out.dataset.pages[0]
            .findings
            .iter()
            .map(|f| (f.rule_id.as_str(), f.impact))
            .collect();
        assert_eq!(
            got,
            vec![
                ("a-rule", Impact::Serious),
                ("b-rule", Impact::Serious),
                ("zz-rule", Impact::Minor),
                ("c-rule", Impact::Unknown),
            ]
        );
    }
}
