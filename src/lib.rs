//! auditmerge core library.
//!
//! This crate merges the JSON fragments written by accessibility audit runs
//! into one canonical, deduplicated dataset, maps findings to WCAG success
//! criteria, and evaluates a severity quality gate over the result.
//!
//! High-level modules:
//! - `repair`: Recovery of concatenated or unbracketed JSON payloads.
//! - `normalize`: Engine-specific records to canonical findings.
//! - `merge`: Artifact discovery, deduplication and deterministic ordering.
//! - `classify` / `wcag`: Rule id to WCAG criterion mapping.
//! - `gate`: Severity counting and threshold evaluation.
//! - `store` / `evidence`: Timestamped outputs and screenshot naming.
//! - `config`, `cli`, `output`, `pipeline`: Command-line surface.
pub mod classify;
pub mod cli;
pub mod config;
pub mod error;
pub mod evidence;
pub mod gate;
pub mod merge;
pub mod models;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod repair;
pub mod store;
pub mod wcag;
