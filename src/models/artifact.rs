//! Result artifacts: one JSON file written by one audit run, plus the
//! context inferred from where it was found.

use super::{Engine, Origin};
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Audit-run context applied to every record of an artifact.
pub struct ArtifactContext {
    pub origin: Origin,
    /// Engine used for already-canonical records that do not name one.
    pub engine_hint: Option<Engine>,
    /// Page url for flat artifacts that carry no page grouping.
    pub page_url: Option<String>,
}

impl Default for ArtifactContext {
    fn default() -> Self {
        Self {
            origin: Origin::Sitemap,
            engine_hint: None,
            page_url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub context: ArtifactContext,
}

impl Artifact {
    /// Build an artifact, inferring origin and engine hint from its location.
    ///
    /// Only components below `root` are considered, so a results directory
    /// that happens to live under e.g. `/srv/manual/` is not misread.
    pub fn from_path(root: &Path, path: PathBuf) -> Self {
        let rel = path.strip_prefix(root).unwrap_or(path.as_path());
        let parts: Vec<String> = rel
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().to_ascii_lowercase()),
                _ => None,
            })
            .collect();

        let origin = if parts.iter().any(|p| p.contains("manual")) {
            Origin::Manual
        } else if parts
            .iter()
            .any(|p| p.contains("interactive") || p.contains("component"))
        {
            Origin::Interactive
        } else {
            Origin::Sitemap
        };

        let engine_hint = if origin == Origin::Manual {
            Some(Engine::Manual)
        } else if parts.iter().any(|p| p.contains("axe")) {
            Some(Engine::RuleEngine)
        } else if parts
            .iter()
            .any(|p| p.contains("pa11y") || p.contains("htmlcs") || p.contains("validator"))
        {
            Some(Engine::HtmlValidator)
        } else {
            None
        };

        Artifact {
            context: ArtifactContext {
                origin,
                engine_hint,
                page_url: None,
            },
            path,
        }
    }

    pub fn with_page_url(mut self, url: impl Into<String>) -> Self {
        self.context.page_url = Some(url.into());
        self
    }

    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.context.origin = origin;
        self
    }

    /// Display name relative to `root` when possible.
    pub fn display_name(&self, root: &Path) -> String {
        pathdiff::diff_paths(&self.path, root)
            .filter(|p| !p.as_os_str().is_empty() && !p.starts_with(".."))
            .unwrap_or_else(|| self.path.clone())
            .to_string_lossy()
            .to_string()
    }
}
