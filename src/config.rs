//! Configuration discovery and effective settings resolution.
//!
//! auditmerge reads `auditmerge.toml|yaml|yml` from the repository root (or
//! closest ancestor) and merges it with CLI flags and environment values to
//! produce an `Effective` config.
//! Defaults:
//! - `results`: `audit-results`
//! - `out_dir`: `<results>/merged`
//! - `patterns`: `["**/*.json"]`
//! - `output`: `human`
//! - `latest`: true
//! - `gate.critical_max`: 0, `gate.serious_max`: 5
//!
//! Overrides precedence: CLI > environment (`CRITICAL_MAX`, `SERIOUS_MAX`)
//! > config file > defaults.

use crate::error::{AuditError, Result};
use crate::gate::Thresholds;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const ENV_CRITICAL_MAX: &str = "CRITICAL_MAX";
pub const ENV_SERIOUS_MAX: &str = "SERIOUS_MAX";

#[derive(Debug, Default, Deserialize, Clone)]
/// Gate thresholds under `[gate]`.
pub struct GateCfg {
    pub critical_max: Option<usize>,
    pub serious_max: Option<usize>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `auditmerge.toml|yaml`.
pub struct AuditConfig {
    pub results: Option<String>,
    pub out_dir: Option<String>,
    pub patterns: Option<Vec<String>>,
    pub output: Option<String>,
    pub latest: Option<bool>,
    /// Crawler page list used to title pages.
    pub pages: Option<String>,
    #[serde(default)]
    pub gate: Option<GateCfg>,
}

#[derive(Debug, Default, Clone)]
/// Values supplied on the command line; `None` defers to lower layers.
pub struct Overrides {
    pub repo_root: Option<String>,
    pub results: Option<String>,
    pub out_dir: Option<String>,
    pub pages: Option<String>,
    pub output: Option<String>,
    pub no_latest: bool,
    pub critical_max: Option<usize>,
    pub serious_max: Option<usize>,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by commands after applying precedence.
pub struct Effective {
    pub repo_root: PathBuf,
    pub results_dir: PathBuf,
    pub out_dir: PathBuf,
    pub patterns: Vec<String>,
    pub output: String,
    pub latest: bool,
    pub pages: Option<PathBuf>,
    pub thresholds: Thresholds,
    pub config_found: bool,
}

const CONFIG_NAMES: [&str; 3] = ["auditmerge.toml", "auditmerge.yaml", "auditmerge.yml"];

/// Walk upward from `start` to detect the repository root.
///
/// Stops when an `auditmerge.toml|yaml|yml` or a `.git` directory is found.
/// Relative starts are resolved against the working directory first so the
/// walk reaches real ancestors.
pub fn detect_repo_root(start: &Path) -> PathBuf {
    let start = if start.is_relative() {
        fs::canonicalize(start).unwrap_or_else(|_| start.to_path_buf())
    } else {
        start.to_path_buf()
    };
    let mut cur = start.as_path();
    loop {
        if CONFIG_NAMES.iter().any(|n| cur.join(n).exists()) || cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.clone(),
        }
    }
}

/// Load `AuditConfig` from `auditmerge.toml` or `auditmerge.yaml|yml` if present.
pub fn load_config(root: &Path) -> Result<Option<AuditConfig>> {
    let toml_path = root.join(CONFIG_NAMES[0]);
    if toml_path.exists() {
        let s = fs::read_to_string(&toml_path).map_err(|e| AuditError::io(&toml_path, e))?;
        let cfg: AuditConfig = toml::from_str(&s)
            .map_err(|e| AuditError::Config(format!("{}: {}", toml_path.display(), e)))?;
        return Ok(Some(cfg));
    }
    for yml in &CONFIG_NAMES[1..] {
        let p = root.join(yml);
        if p.exists() {
            let s = fs::read_to_string(&p).map_err(|e| AuditError::io(&p, e))?;
            let cfg: AuditConfig = serde_yaml::from_str(&s)
                .map_err(|e| AuditError::Config(format!("{}: {}", p.display(), e)))?;
            return Ok(Some(cfg));
        }
    }
    Ok(None)
}

/// Resolve `Effective` from CLI values, the process environment, the
/// discovered config, and defaults.
pub fn resolve_effective(cli: &Overrides) -> Result<Effective> {
    resolve_with_env(cli, |k| std::env::var(k).ok())
}

/// Same as `resolve_effective` with an injectable environment lookup.
pub fn resolve_with_env(cli: &Overrides, env: impl Fn(&str) -> Option<String>) -> Result<Effective> {
    let start = PathBuf::from(cli.repo_root.as_deref().unwrap_or("."));
    let repo_root = detect_repo_root(&start);
    let loaded = load_config(&repo_root)?;
    let config_found = loaded.is_some();
    let cfg = loaded.unwrap_or_default();
    debug!(root = %repo_root.display(), config_found, "resolved repository root");

    let results = cli
        .results
        .clone()
        .or(cfg.results)
        .unwrap_or_else(|| "audit-results".to_string());
    let results_dir = repo_root.join(&results);

    let out_dir = cli
        .out_dir
        .clone()
        .or(cfg.out_dir)
        .map(|o| repo_root.join(o))
        .unwrap_or_else(|| results_dir.join("merged"));

    let patterns = cfg
        .patterns
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| vec!["**/*.json".to_string()]);

    let output = cli
        .output
        .clone()
        .or(cfg.output)
        .unwrap_or_else(|| "human".to_string());

    let latest = if cli.no_latest {
        false
    } else {
        cfg.latest.unwrap_or(true)
    };

    let pages = cli
        .pages
        .clone()
        .or(cfg.pages)
        .map(|p| repo_root.join(p));

    let defaults = Thresholds::default();
    let gate_cfg = cfg.gate.unwrap_or_default();
    let critical_max = match cli.critical_max {
        Some(v) => v,
        None => match env_usize(&env, ENV_CRITICAL_MAX)? {
            Some(v) => v,
            None => gate_cfg.critical_max.unwrap_or(defaults.critical_max),
        },
    };
    let serious_max = match cli.serious_max {
        Some(v) => v,
        None => match env_usize(&env, ENV_SERIOUS_MAX)? {
            Some(v) => v,
            None => gate_cfg.serious_max.unwrap_or(defaults.serious_max),
        },
    };

    Ok(Effective {
        repo_root,
        results_dir,
        out_dir,
        patterns,
        output,
        latest,
        pages,
        thresholds: Thresholds {
            critical_max,
            serious_max,
        },
        config_found,
    })
}

fn env_usize(env: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<usize>> {
    match env(key) {
        None => Ok(None),
        Some(v) if v.trim().is_empty() => Ok(None),
        Some(v) => v
            .trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|_| AuditError::Config(format!("{} must be a non-negative integer, got '{}'", key, v))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::tempdir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn at(root: &Path) -> Overrides {
        Overrides {
            repo_root: root.to_str().map(str::to_string),
            ..Overrides::default()
        }
    }

    #[test]
    fn test_defaults_without_config() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir(root.join(".git")).unwrap();
        let eff = resolve_with_env(&at(root), no_env).unwrap();
        assert!(!eff.config_found);
        assert_eq!(eff.results_dir, root.join("audit-results"));
        assert_eq!(eff.out_dir, root.join("audit-results").join("merged"));
        assert_eq!(eff.patterns, vec!["**/*.json"]);
        assert_eq!(eff.output, "human");
        assert!(eff.latest);
        assert_eq!(eff.thresholds, Thresholds::default());
    }

    #[test]
    fn test_detect_and_load_toml() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("auditmerge.toml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
results = "runs"
out_dir = "reports"
output = "json"
latest = false
patterns = ["axe/*.json", "pa11y/*.json"]
[gate]
critical_max = 2
serious_max = 10
"#
        )
        .unwrap();
        let nested = root.join("a/b");
        fs::create_dir_all(&nested).unwrap();
        let eff = resolve_with_env(&at(&nested), no_env).unwrap();
        assert!(eff.config_found);
        assert_eq!(eff.repo_root, root);
        assert_eq!(eff.results_dir, root.join("runs"));
        assert_eq!(eff.out_dir, root.join("reports"));
        assert_eq!(eff.patterns.len(), 2);
        assert!(!eff.latest);
        assert_eq!(eff.thresholds.critical_max, 2);
        assert_eq!(eff.thresholds.serious_max, 10);
    }

    #[test]
    fn test_load_yaml() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(
            root.join("auditmerge.yaml"),
            "results: out\npages: crawl/pages.json\ngate:\n  serious_max: 3\n",
        )
        .unwrap();
        let eff = resolve_with_env(&at(root), no_env).unwrap();
        assert_eq!(eff.results_dir, root.join("out"));
        assert_eq!(eff.pages, Some(root.join("crawl/pages.json")));
        assert_eq!(eff.thresholds.serious_max, 3);
        assert_eq!(eff.thresholds.critical_max, 0);
    }

    #[test]
    fn test_precedence_cli_over_env_over_file() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(
            root.join("auditmerge.toml"),
            "[gate]\ncritical_max = 4\nserious_max = 9\n",
        )
        .unwrap();
        let env: HashMap<&str, &str> = [("CRITICAL_MAX", "1"), ("SERIOUS_MAX", "7")].into_iter().collect();
        let lookup = |k: &str| env.get(k).map(|v| v.to_string());

        let eff = resolve_with_env(&at(root), lookup).unwrap();
        assert_eq!(eff.thresholds.critical_max, 1);
        assert_eq!(eff.thresholds.serious_max, 7);

        let mut cli = at(root);
        cli.serious_max = Some(0);
        cli.no_latest = true;
        let eff = resolve_with_env(&cli, lookup).unwrap();
        assert_eq!(eff.thresholds.critical_max, 1);
        assert_eq!(eff.thresholds.serious_max, 0);
        assert!(!eff.latest);
    }

    #[test]
    fn test_invalid_env_threshold_is_config_error() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir(root.join(".git")).unwrap();
        let err = resolve_with_env(&at(root), |k| (k == "SERIOUS_MAX").then(|| "five".to_string()))
            .unwrap_err();
        assert_eq!(err.stage(), "config");
        assert!(err.to_string().contains("SERIOUS_MAX"));
    }

    #[test]
    fn test_relative_start_walks_real_ancestors() {
        let root = detect_repo_root(Path::new("."));
        assert!(root.is_absolute());
        let cwd = std::env::current_dir().unwrap().canonicalize().unwrap();
        assert!(cwd.starts_with(&root));
    }

    #[test]
    fn test_invalid_config_file_is_reported() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("auditmerge.toml"), "results = [").unwrap();
        let err = resolve_with_env(&at(root), no_env).unwrap_err();
        assert!(matches!(err, AuditError::Config(_)));
    }
}
