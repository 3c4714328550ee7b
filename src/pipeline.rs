//! Command-level pipeline steps shared by the binary and integration tests.

use crate::classify::classify_dataset;
use crate::config::Effective;
use crate::error::{AuditError, Result};
use crate::gate::{evaluate, GateReport, Thresholds};
use crate::merge::{merge_directory, MergeOutcome};
use crate::models::CrawledPage;
use crate::repair::repair_json;
use crate::store;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Discover, merge, title and classify the artifacts under `eff.results_dir`.
pub fn merge_session(eff: &Effective) -> Result<MergeOutcome> {
    let mut outcome = merge_directory(
        &eff.results_dir,
        &eff.patterns,
        std::slice::from_ref(&eff.out_dir),
    )?;
    let mut dataset = classify_dataset(std::mem::take(&mut outcome.dataset));
    if let Some(pages) = eff.pages.as_ref() {
        dataset = dataset.with_titles(&load_pages(pages)?);
    }
    outcome.dataset = dataset;
    Ok(outcome)
}

/// Merge and write a new canonical dataset. Returns the outcome and the
/// path written.
pub fn merge_and_write(eff: &Effective, now: DateTime<Utc>) -> Result<(MergeOutcome, PathBuf)> {
    let outcome = merge_session(eff)?;
    let path = store::write_dataset(&eff.out_dir, &outcome.dataset, now, eff.latest)?;
    Ok((outcome, path))
}

/// Load a dataset file and evaluate the gate on it.
pub fn gate_file(dataset: &Path, thresholds: Thresholds) -> Result<GateReport> {
    let ds = store::load_dataset(dataset)?;
    evaluate(&ds, thresholds)
}

/// Read the crawler's `[{url, title?}]` list. Entries that are not page
/// records are ignored.
pub fn load_pages(path: &Path) -> Result<Vec<CrawledPage>> {
    let text = fs::read_to_string(path).map_err(|e| AuditError::io(path, e))?;
    let label = path.to_string_lossy();
    let values = repair_json(&text, &label)?;
    let mut pages = Vec::with_capacity(values.len());
    for v in values {
        match serde_json::from_value::<CrawledPage>(v) {
            Ok(p) => pages.push(p),
            Err(e) => warn!(file = %label, error = %e, "ignoring crawler entry"),
        }
    }
    Ok(pages)
}
