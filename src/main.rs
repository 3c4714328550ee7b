//! auditmerge CLI binary entry point.
//! Resolves configuration, delegates to the library pipeline and prints results.

use auditmerge::classify::classify_rule;
use auditmerge::cli::{Cli, Commands, MergeArgs, ThresholdArgs};
use auditmerge::config::{self, Effective, Overrides};
use auditmerge::error::{AuditError, Result};
use auditmerge::gate::GateReport;
use auditmerge::models::Engine;
use auditmerge::output::{self, error_prefix, note_prefix};
use auditmerge::{pipeline, store};
use chrono::{SecondsFormat, Utc};
use clap::Parser;
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: bool) {
    let default = if verbose { "auditmerge=debug" } else { "auditmerge=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let code = match run(cli.cmd) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {}: {}", error_prefix(), err.stage(), err);
            2
        }
    };
    std::process::exit(code);
}

fn run(cmd: Commands) -> Result<i32> {
    match cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(0)
        }
        Commands::Merge { merge } => {
            let eff = resolve(&merge, &ThresholdArgs::default())?;
            let (outcome, written) = pipeline::merge_and_write(&eff, Utc::now())?;
            output::print_merge(&outcome, &written, &eff.repo_root, &eff.output);
            Ok(0)
        }
        Commands::Gate {
            repo_root,
            dataset,
            out_dir,
            thresholds,
            output,
        } => {
            let eff = resolve(
                &MergeArgs {
                    repo_root,
                    out_dir,
                    output,
                    ..MergeArgs::default()
                },
                &thresholds,
            )?;
            let file = match dataset {
                Some(d) => eff.repo_root.join(d),
                None => eff.out_dir.join(store::LATEST),
            };
            let gated = gate_and_record(&eff, &file)?;
            output::print_gate(&gated.report, &gated.label, &eff.output, &gated.date);
            Ok(gated.exit_code())
        }
        Commands::Check { merge, thresholds } => {
            let eff = resolve(&merge, &thresholds)?;
            let (outcome, written) = pipeline::merge_and_write(&eff, Utc::now())?;
            let gated = gate_and_record(&eff, &written)?;
            if eff.output == "json" {
                let doc = output::compose_check_json(
                    &outcome,
                    &written,
                    &gated.report,
                    &gated.label,
                    &gated.date,
                );
                println!("{}", serde_json::to_string_pretty(&doc).unwrap_or_default());
            } else {
                output::print_merge(&outcome, &written, &eff.repo_root, &eff.output);
                output::print_gate(&gated.report, &gated.label, &eff.output, &gated.date);
            }
            Ok(gated.exit_code())
        }
        Commands::Classify {
            rule_id,
            engine,
            tags,
            output,
        } => {
            let engine = Engine::parse(&engine)
                .ok_or_else(|| AuditError::Config(format!("unknown engine '{}'", engine)))?;
            let c = classify_rule(engine, &rule_id, &tags);
            output::print_classification(&rule_id, &c, output.as_deref().unwrap_or("human"));
            Ok(0)
        }
    }
}

fn resolve(merge: &MergeArgs, thresholds: &ThresholdArgs) -> Result<Effective> {
    let eff = config::resolve_effective(&Overrides {
        repo_root: merge.repo_root.clone(),
        results: merge.results.clone(),
        out_dir: merge.out_dir.clone(),
        pages: merge.pages.clone(),
        output: merge.output.clone(),
        no_latest: merge.no_latest,
        critical_max: thresholds.critical_max,
        serious_max: thresholds.serious_max,
    })?;
    if !eff.config_found && eff.output != "json" {
        eprintln!("{} No auditmerge.toml found; using defaults.", note_prefix());
    }
    Ok(eff)
}

struct Gated {
    report: GateReport,
    label: String,
    date: String,
}

impl Gated {
    fn exit_code(&self) -> i32 {
        if self.report.passed {
            0
        } else {
            1
        }
    }
}

/// Evaluate the gate on `dataset` and persist the gate report.
fn gate_and_record(eff: &Effective, dataset: &Path) -> Result<Gated> {
    let report = pipeline::gate_file(dataset, eff.thresholds)?;
    let now = Utc::now();
    let date = now.to_rfc3339_opts(SecondsFormat::Secs, true);
    let label = pathdiff::diff_paths(dataset, &eff.repo_root)
        .unwrap_or_else(|| dataset.to_path_buf())
        .to_string_lossy()
        .to_string();
    let doc = output::compose_gate_json(&report, &label, &date);
    store::write_gate_report(&eff.out_dir, &doc, now)?;
    Ok(Gated {
        report,
        label,
        date,
    })
}
