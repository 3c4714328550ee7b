//! Error taxonomy for the merge pipeline.
//!
//! Artifact- and record-level errors (`MalformedInput`, `UnknownShape`) are
//! contained by the merge engine and turned into skip entries. Session-level
//! errors (`NoArtifacts`, `EmptyDataset`) propagate to the caller.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("malformed JSON in {file}: {source}")]
    MalformedInput {
        file: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unrecognized record shape (keys: {keys})")]
    UnknownShape { keys: String },

    #[error("no result artifacts found under {}", dir.display())]
    NoArtifacts { dir: PathBuf },

    #[error("dataset contains no pages; nothing to gate")]
    EmptyDataset,

    #[error("cannot access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

impl AuditError {
    /// Pipeline stage the error belongs to, used as a prefix for operators.
    pub fn stage(&self) -> &'static str {
        match self {
            AuditError::MalformedInput { .. } => "repair",
            AuditError::UnknownShape { .. } => "normalize",
            AuditError::NoArtifacts { .. } | AuditError::Pattern(_) => "discover",
            AuditError::EmptyDataset => "gate",
            AuditError::Io { .. } | AuditError::Json(_) => "io",
            AuditError::Config(_) => "config",
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AuditError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, AuditError>;
