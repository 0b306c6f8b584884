//! coursefix — one-off repair pass over legacy course records.
//!
//! Opens the configured store, brings every course into compliance with the
//! course invariants, prints what changed, and closes the store again. The
//! process exits non-zero only when the pass cannot run at all (no teacher to
//! own courses, unreachable store); per-course failures are reported but do
//! not change the exit status.
//!
//! ```sh
//! COURSEFIX_DATABASE_URL=sqlite://courses.db coursefix
//! coursefix sqlite://courses.db --dry-run
//! ```

mod settings;

use std::{io::Write, path::PathBuf};

use anyhow::Context as _;
use clap::Parser;
use coursefix_core::normalize::{CourseNormalizer, NormalizeReport};
use coursefix_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use settings::RunConfig;

#[derive(Parser)]
#[command(author, version, about = "Normalize legacy course records")]
struct Cli {
  /// Database URL; overrides `database_url` from the file and environment.
  uri: Option<String>,

  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "coursefix.toml")]
  config: PathBuf,

  /// Report the updates without writing them.
  #[arg(long)]
  dry_run: bool,

  /// Print the full report as JSON instead of the per-course summary.
  #[arg(long)]
  json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  let run_cfg = RunConfig::load(&cli.config, cli.uri, cli.dry_run)?;
  let report = run(&run_cfg).await?;

  let mut out = std::io::stdout().lock();
  if cli.json {
    serde_json::to_writer_pretty(&mut out, &report)?;
    writeln!(out)?;
  } else {
    write_summary(&mut out, &report)?;
  }
  Ok(())
}

/// Open the configured store, run one pass over it, and close it again. The
/// store is closed on every path, including a failed pass.
async fn run(run_cfg: &RunConfig) -> anyhow::Result<NormalizeReport> {
  let url = run_cfg.database_url();
  let store = SqliteStore::connect(&url)
    .await
    .with_context(|| format!("failed to open store at {url:?}"))?;
  tracing::info!(%url, dry_run = run_cfg.dry_run, "store opened");

  let outcome = CourseNormalizer::new(&store)
    .with_options(run_cfg.options())
    .normalize_all()
    .await;
  store.close().await.context("failed to close store")?;

  outcome.context("normalization failed")
}

fn write_summary(mut out: impl Write, report: &NormalizeReport) -> anyhow::Result<()> {
  for change in &report.changes {
    writeln!(
      out,
      "{} {:?}: {}",
      change.course_id,
      change.title.as_deref().unwrap_or_default(),
      serde_json::to_string(&change.update)?,
    )?;
  }
  for failure in &report.failures {
    writeln!(out, "FAILED {}: {}", failure.course_id, failure.error)?;
  }

  let verb = if report.dry_run { "Would update" } else { "Updated" };
  writeln!(out, "{verb} {}/{} courses", report.updated_count, report.total_courses)?;
  Ok(())
}
