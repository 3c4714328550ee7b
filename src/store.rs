//! Output files for merge and gate runs.
//!
//! The output directory is append-only: every run writes a new file named
//! after its UTC timestamp, suffixed `-1`, `-2`, ... on collision. Only the
//! `latest.json` convenience mirror is ever replaced.

use crate::error::{AuditError, Result};
use crate::models::MergedDataset;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::info;

pub const LATEST: &str = "latest.json";

/// Serialize the dataset exactly as written to disk.
pub fn dataset_json(dataset: &MergedDataset) -> Result<String> {
    let mut s = serde_json::to_string_pretty(dataset)?;
    s.push('\n');
    Ok(s)
}

/// Write a new `merged-<timestamp>.json`, optionally mirrored to `latest.json`.
pub fn write_dataset(
    out_dir: &Path,
    dataset: &MergedDataset,
    now: DateTime<Utc>,
    mirror_latest: bool,
) -> Result<PathBuf> {
    let body = dataset_json(dataset)?;
    let path = write_unique(out_dir, "merged", now, &body)?;
    if mirror_latest {
        let latest = out_dir.join(LATEST);
        fs::write(&latest, &body).map_err(|e| AuditError::io(&latest, e))?;
    }
    info!(path = %path.display(), "wrote canonical dataset");
    Ok(path)
}

/// Write a new `gate-<timestamp>.json`.
pub fn write_gate_report<T: Serialize>(out_dir: &Path, report: &T, now: DateTime<Utc>) -> Result<PathBuf> {
    let mut body = serde_json::to_string_pretty(report)?;
    body.push('\n');
    let path = write_unique(out_dir, "gate", now, &body)?;
    info!(path = %path.display(), "wrote gate report");
    Ok(path)
}

pub fn load_dataset(path: &Path) -> Result<MergedDataset> {
    let s = fs::read_to_string(path).map_err(|e| AuditError::io(path, e))?;
    Ok(serde_json::from_str(&s)?)
}

pub fn timestamp(now: DateTime<Utc>) -> String {
    now.format("%Y%m%dT%H%M%S%3fZ").to_string()
}

fn write_unique(out_dir: &Path, prefix: &str, now: DateTime<Utc>, body: &str) -> Result<PathBuf> {
    fs::create_dir_all(out_dir).map_err(|e| AuditError::io(out_dir, e))?;
    let stamp = timestamp(now);
    let mut attempt = 0usize;
    loop {
        let name = if attempt == 0 {
            format!("{}-{}.json", prefix, stamp)
        } else {
            format!("{}-{}-{}.json", prefix, stamp, attempt)
        };
        let path = out_dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut f) => {
                f.write_all(body.as_bytes())
                    .map_err(|e| AuditError::io(&path, e))?;
                return Ok(path);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(AuditError::io(&path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tests::finding;
    use crate::models::{Impact, Origin, PageResult};
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn sample() -> MergedDataset {
        MergedDataset {
            pages: vec![PageResult {
                url: "https://a.test/".into(),
                title: Some("Home".into()),
                findings: vec![finding("label", Impact::Critical, Origin::Sitemap)],
            }],
        }
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 0).unwrap()
    }

    #[test]
    fn test_repeated_writes_never_overwrite() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("merged");
        let a = write_dataset(&out, &sample(), fixed_now(), true).unwrap();
        let b = write_dataset(&out, &sample(), fixed_now(), true).unwrap();
        assert_ne!(a, b);
        assert_eq!(
            a.file_name().unwrap().to_string_lossy(),
            "merged-20261019T083000000Z.json"
        );
        assert_eq!(
            b.file_name().unwrap().to_string_lossy(),
            "merged-20261019T083000000Z-1.json"
        );
        assert_eq!(fs::read(&a).unwrap(), fs::read(&b).unwrap());
        assert_eq!(fs::read(&a).unwrap(), fs::read(out.join(LATEST)).unwrap());
    }

    #[test]
    fn test_dataset_round_trips_through_disk() {
        let dir = tempdir().unwrap();
        let path = write_dataset(dir.path(), &sample(), fixed_now(), false).unwrap();
        assert!(!dir.path().join(LATEST).exists());
        let loaded = load_dataset(&path).unwrap();
        assert_eq!(loaded, sample());
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.trim_start().starts_with('['));
    }

    #[test]
    fn test_gate_report_file_name() {
        let dir = tempdir().unwrap();
        let p = write_gate_report(dir.path(), &serde_json::json!({"passed": true}), fixed_now()).unwrap();
        assert_eq!(
            p.file_name().unwrap().to_string_lossy(),
            "gate-20261019T083000000Z.json"
        );
    }
}
