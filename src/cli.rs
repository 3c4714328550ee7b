//! CLI argument parsing via `clap`.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "auditmerge",
    version,
    about = "Merge, classify and gate accessibility audit results",
    long_about = "auditmerge reads the JSON fragments written by accessibility audit runs, repairs and deduplicates them into one canonical dataset, maps findings to WCAG criteria, and evaluates a severity quality gate.\n\nConfiguration precedence: CLI > environment > auditmerge.toml > defaults.",
    after_help = "Examples:\n  auditmerge merge --results audit-results\n  auditmerge gate --critical-max 0 --serious-max 5\n  auditmerge check --output json\n  auditmerge classify color-contrast",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[arg(long, short, global = true, help = "Enable debug logging")]
    pub verbose: bool,
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
/// Supported subcommands.
pub enum Commands {
    /// Show version
    #[command(about = "Show version", long_about = "Print the current auditmerge version.")]
    Version,
    /// Merge result artifacts into a canonical dataset
    #[command(
        about = "Merge audit artifacts",
        long_about = "Discover result artifacts, repair and normalize them, deduplicate findings, classify them against WCAG, and write a new timestamped dataset.",
        after_help = "Examples:\n  auditmerge merge\n  auditmerge merge --results runs/2026-10-19 --pages crawl/pages.json --output json"
    )]
    Merge {
        #[command(flatten)]
        merge: MergeArgs,
    },
    /// Evaluate the quality gate on a dataset
    #[command(
        about = "Evaluate quality gate",
        long_about = "Count findings by severity and origin and compare against thresholds. Exits 1 when the gate fails.",
        after_help = "Examples:\n  auditmerge gate\n  auditmerge gate --dataset audit-results/merged/merged-20261019T083000000Z.json"
    )]
    Gate {
        #[arg(long, help = "Repository root (default: current dir)")]
        repo_root: Option<String>,
        #[arg(long, help = "Dataset file (default: <out-dir>/latest.json)")]
        dataset: Option<String>,
        #[arg(long, help = "Output directory for gate reports")]
        out_dir: Option<String>,
        #[command(flatten)]
        thresholds: ThresholdArgs,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
    },
    /// Merge then gate in one run
    #[command(
        about = "Merge and gate",
        long_about = "Run merge followed by the quality gate on the freshly written dataset.",
        after_help = "Examples:\n  auditmerge check\n  CRITICAL_MAX=1 auditmerge check --output json"
    )]
    Check {
        #[command(flatten)]
        merge: MergeArgs,
        #[command(flatten)]
        thresholds: ThresholdArgs,
    },
    /// Resolve the WCAG criterion for a rule id
    #[command(
        about = "Classify a rule id",
        long_about = "Show which WCAG success criterion a rule id maps to and how confident the mapping is."
    )]
    Classify {
        #[arg(help = "Engine rule id, e.g. color-contrast")]
        rule_id: String,
        #[arg(long, default_value = "rule-engine", help = "Engine: rule-engine|html-validator|manual")]
        engine: String,
        #[arg(long = "tag", help = "WCAG tag hint (repeatable), e.g. wcag143")]
        tags: Vec<String>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
    },
}

#[derive(clap::Args, Clone, Default)]
pub struct MergeArgs {
    #[arg(long, help = "Repository root (default: current dir)")]
    pub repo_root: Option<String>,
    #[arg(long, help = "Directory holding result artifacts (default: audit-results)")]
    pub results: Option<String>,
    #[arg(long, help = "Output directory (default: <results>/merged)")]
    pub out_dir: Option<String>,
    #[arg(long, help = "Crawler page list used for page titles")]
    pub pages: Option<String>,
    #[arg(long, help = "Output mode: human|json (default: human)")]
    pub output: Option<String>,
    #[arg(long, action = clap::ArgAction::SetTrue, help = "Do not mirror the dataset to latest.json")]
    pub no_latest: bool,
}

#[derive(clap::Args, Clone, Default)]
pub struct ThresholdArgs {
    #[arg(long, help = "Maximum allowed critical findings (env CRITICAL_MAX, default 0)")]
    pub critical_max: Option<usize>,
    #[arg(long, help = "Maximum allowed serious findings (env SERIOUS_MAX, default 5)")]
    pub serious_max: Option<usize>,
}
