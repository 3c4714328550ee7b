//! Severity quality gate over a merged dataset.

use crate::error::{AuditError, Result};
use crate::models::{MergedDataset, OriginCounts, SeverityCounts};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thresholds {
    pub critical_max: usize,
    pub serious_max: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            critical_max: 0,
            serious_max: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
/// Outcome of one gate evaluation. A failed gate is `passed == false`,
/// never an error.
pub struct GateReport {
    pub global: SeverityCounts,
    pub by_origin: OriginCounts,
    pub thresholds: Thresholds,
    pub passed: bool,
}

/// Evaluate `dataset` against `thresholds`.
///
/// Fails with `EmptyDataset` only when there are no pages at all, so that
/// "nothing audited" stays distinct from "audited and clean".
pub fn evaluate(dataset: &MergedDataset, thresholds: Thresholds) -> Result<GateReport> {
    if dataset.is_empty() {
        return Err(AuditError::EmptyDataset);
    }
    let global = dataset.severity_counts();
    let passed =
        global.critical <= thresholds.critical_max && global.serious <= thresholds.serious_max;
    Ok(GateReport {
        global,
        by_origin: dataset.origin_counts(),
        thresholds,
        passed,
    })
}
