//! Backfill command

use crate::settings::AppConfig;
use anyhow::Context;
use clap::{Args, ValueEnum};
use fsbackfill_core::logging_facility::{self, Profile};
use fsbackfill_core::memory::MemorySink;
use fsbackfill_core::{log_op_error, run_scoped, BfError, CollectionStatus, Registry, RunSummary};
use fsbackfill_firestore::FirestoreSource;
use fsbackfill_store::PgSink;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::process::ExitCode;

/// Exit status when `--strict` is set and some rows failed
pub const EXIT_ROW_FAILURES: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Collection to backfill; repeat for several, processed in the order given
    #[arg(long = "collection", value_name = "NAME", default_value = "Users")]
    pub collections: Vec<String>,

    /// Fetch, map and type-check every row, but write to an in-memory table
    /// instead of PostgreSQL
    #[arg(long)]
    pub dry_run: bool,

    /// Exit with status 2 when any row failed
    #[arg(long)]
    pub strict: bool,

    /// Env file to seed the environment from (defaults to ./.env if present)
    #[arg(long, value_name = "PATH")]
    pub env_file: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

pub async fn execute(args: RunArgs) -> anyhow::Result<ExitCode> {
    logging_facility::init(match args.log_format {
        LogFormat::Pretty => Profile::Development,
        LogFormat::Json => Profile::Production,
    });

    let config = AppConfig::load(args.env_file.as_deref(), !args.dry_run)
        .map_err(BfError::from)
        .map_err(|err| fatal("load_config", err))?;
    let registry = Registry::standard()
        .map_err(BfError::from)
        .map_err(|err| fatal("registry", err))?;

    let source = FirestoreSource::connect(config.firestore)
        .await
        .map_err(BfError::from)
        .map_err(|err| fatal("connect_source", err))
        .context("Firestore source unavailable")?;

    let summary = match config.sink {
        Some(settings) if !args.dry_run => {
            let sink = PgSink::connect(&settings)
                .await
                .map_err(BfError::from)
                .map_err(|err| fatal("connect_sink", err))
                .context("PostgreSQL sink unavailable")?;
            run_scoped(&registry, &args.collections, &source, sink).await
        }
        _ => run_scoped(&registry, &args.collections, &source, MemorySink::new()).await,
    }
    .context("backfill aborted")?;

    print!("{}", render_summary(&summary, args.dry_run));

    if args.strict && summary.has_row_failures() {
        Ok(ExitCode::from(EXIT_ROW_FAILURES))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Log an INIT failure and hand it on for the exit diagnostic
fn fatal(op: &'static str, err: BfError) -> BfError {
    log_op_error!(op, err, duration_ms = 0u64);
    err
}

pub fn render_summary(summary: &RunSummary, dry_run: bool) -> String {
    let mut out = String::new();
    let verb = if dry_run { "would insert" } else { "inserted" };

    let _ = writeln!(out, "run {}", summary.run_id);
    for report in &summary.collections {
        let status = match report.status {
            CollectionStatus::Completed => "completed",
            CollectionStatus::Empty => "empty",
            CollectionStatus::Unregistered => "unregistered",
        };
        let _ = writeln!(
            out,
            "  {}: {status}, fetched {}, {verb} {}, skipped {}, failed {}",
            report.collection,
            report.fetched,
            report.inserted,
            report.skipped,
            report.failures.len()
        );
        for failure in &report.failures {
            let _ = writeln!(out, "    {}: {}", failure.doc_id, failure.error);
        }
    }
    let _ = writeln!(
        out,
        "total: {verb} {}, skipped {}, failed {}",
        summary.total_inserted(),
        summary.total_skipped(),
        summary.total_failed()
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use fsbackfill_core::{BfErrorKind, CollectionReport, RowFailure};
    use fsbackfill_core_types::RunId;

    fn summary() -> RunSummary {
        RunSummary {
            run_id: RunId::from_string("run-1".to_string()),
            collections: vec![
                CollectionReport {
                    collection: "Users".into(),
                    status: CollectionStatus::Completed,
                    fetched: 3,
                    inserted: 1,
                    skipped: 1,
                    failures: vec![RowFailure {
                        doc_id: "u2".into(),
                        error: BfError::new(BfErrorKind::ConstraintViolation)
                            .with_message("duplicate email"),
                    }],
                },
                CollectionReport {
                    collection: "Posts".into(),
                    status: CollectionStatus::Unregistered,
                    fetched: 0,
                    inserted: 0,
                    skipped: 0,
                    failures: vec![],
                },
            ],
        }
    }

    #[test]
    fn test_render_summary() {
        let text = render_summary(&summary(), false);
        assert!(text.starts_with("run run-1\n"));
        assert!(text.contains("  Users: completed, fetched 3, inserted 1, skipped 1, failed 1\n"));
        assert!(text.contains("    u2: [ERR_CONSTRAINT_VIOLATION]: duplicate email\n"));
        assert!(text.contains("  Posts: unregistered,"));
        assert!(text.ends_with("total: inserted 1, skipped 1, failed 1\n"));
    }

    #[test]
    fn test_render_dry_run_wording() {
        let text = render_summary(&summary(), true);
        assert!(text.contains("would insert 1"));
    }
}
