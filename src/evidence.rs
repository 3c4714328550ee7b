//! Evidence file naming shared by screenshot capture and report lookup.
//!
//! Names derive from `(ruleId, selector, pageUrl)`:
//! `<rule-slug>__<16 hex chars of sha256(pageUrl "\n" selector)>.png`.
//! Capture and lookup must both go through `file_name`.

use crate::models::Finding;
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

pub const EXTENSION: &str = "png";

/// Deterministic evidence file name for one finding location.
pub fn file_name(rule_id: &str, selector: &str, page_url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(page_url.as_bytes());
    hasher.update(b"\n");
    hasher.update(selector.as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(16);
    for byte in digest.iter().take(8) {
        let _ = write!(hex, "{:02x}", byte);
    }
    format!("{}__{}.{}", slug(rule_id), hex, EXTENSION)
}

pub fn file_name_for(finding: &Finding) -> String {
    file_name(&finding.rule_id, &finding.selector, &finding.page_url)
}

/// Path of the captured evidence for `finding` under `dir`, if it exists.
pub fn locate(dir: &Path, finding: &Finding) -> Option<PathBuf> {
    let p = dir.join(file_name_for(finding));
    p.is_file().then_some(p)
}

fn slug(rule_id: &str) -> String {
    let mut out = String::with_capacity(rule_id.len());
    let mut dash = false;
    for c in rule_id.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            dash = false;
        } else if !dash && !out.is_empty() {
            out.push('-');
            dash = true;
        }
    }
    let trimmed = out.trim_end_matches('-');
    if trimmed.is_empty() {
        "rule".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tests::finding;
    use crate::models::{Impact, Origin};
    use tempfile::tempdir;

    #[test]
    fn test_name_is_stable_and_slugged() {
        let a = file_name("WCAG2AA.Principle1.Guideline1_4.1_4_3.G18", "#nav > a", "https://a.test/");
        let b = file_name("WCAG2AA.Principle1.Guideline1_4.1_4_3.G18", "#nav > a", "https://a.test/");
        assert_eq!(a, b);
        assert!(a.starts_with("wcag2aa-principle1-guideline1-4-1-4-3-g18__"));
        assert!(a.ends_with(".png"));
        assert_eq!(a.len(), "wcag2aa-principle1-guideline1-4-1-4-3-g18__".len() + 16 + 4);
    }

    #[test]
    fn test_name_distinguishes_selector_and_page() {
        let base = file_name("label", "#q", "https://a.test/");
        assert_ne!(base, file_name("label", "#r", "https://a.test/"));
        assert_ne!(base, file_name("label", "#q", "https://b.test/"));
        assert_eq!(slug("???"), "rule");
    }

    #[test]
    fn test_locate_finds_captured_file() {
        let dir = tempdir().unwrap();
        let f = finding("color-contrast", Impact::Serious, Origin::Sitemap);
        assert_eq!(locate(dir.path(), &f), None);
        std::fs::write(dir.path().join(file_name_for(&f)), b"png").unwrap();
        assert!(locate(dir.path(), &f).is_some());
    }
}
