use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use storysync_model::StagesConfig;
use storysync_pipeline::{consolidate, ConsolidateOptions};
use storysync_store::SignOptions;
use tokio_util::sync::CancellationToken;

mod local_store;
mod report;
mod snapshot;

use local_store::LocalDirStore;

#[derive(Parser)]
#[command(name = "storysync")]
#[command(about = "Consolidate video-story snapshots across stages", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Deduplicate, cluster, refresh signed URLs, and assign sequence ids
    Consolidate {
        /// Input snapshot (JSON array of records)
        #[arg(long)]
        input: PathBuf,

        /// Stage resource map (resources.json)
        #[arg(long)]
        stages: PathBuf,

        /// Output snapshot path (defaults to rewriting the input)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Also write the merged sessions to this path
        #[arg(long)]
        sessions: Option<PathBuf>,

        /// Local media directory backing the object store
        #[arg(long, default_value = "demo-assets")]
        media_root: PathBuf,

        /// Regenerate URLs even when the existing ones look valid
        #[arg(long)]
        force: bool,

        /// Per-request timeout in seconds
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,

        /// Concurrent signing requests
        #[arg(long, default_value_t = 8)]
        concurrency: usize,

        /// Keep raw signer error messages in the snapshot
        #[arg(long)]
        keep_error_messages: bool,

        /// Sequence id prefix
        #[arg(long, default_value = "demo")]
        prefix: String,

        /// Zero-pad width for sequence ids
        #[arg(long, default_value_t = 3)]
        pad_width: usize,

        /// Starting sequence value for a first-ever run
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Summarize a snapshot without modifying it
    Stats {
        /// Input snapshot (JSON array of records)
        #[arg(long)]
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.quiet {
        "warn"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Commands::Consolidate {
            input,
            stages,
            output,
            sessions,
            media_root,
            force,
            timeout_secs,
            concurrency,
            keep_error_messages,
            prefix,
            pad_width,
            seed,
        } => {
            let records = snapshot::load_records(&input)?;
            let stages_config =
                StagesConfig::load(&stages).context("loading stage configuration")?;

            let opts = ConsolidateOptions {
                sign: SignOptions {
                    force,
                    request_timeout: Duration::from_secs(timeout_secs),
                    suppress_errors: !keep_error_messages,
                    max_in_flight: concurrency,
                },
                sequence_prefix: prefix,
                sequence_pad_width: pad_width,
                sequence_seed: seed,
            };

            let cancel = CancellationToken::new();
            let handler = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    log::warn!("interrupt received; letting in-flight signing drain");
                    handler.cancel();
                }
            });

            let spinner = ProgressBar::new_spinner().with_style(
                ProgressStyle::with_template("{spinner} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            spinner.set_message(format!("consolidating {} record(s)...", records.len()));
            spinner.enable_steady_tick(Duration::from_millis(120));

            let store = Arc::new(LocalDirStore::new(media_root));
            let run = consolidate(records, &stages_config, store, &opts, cancel).await?;
            spinner.finish_and_clear();

            let output = output.unwrap_or(input);
            snapshot::save_records(&output, &run.records)?;
            if let Some(sessions_path) = sessions {
                snapshot::save_sessions(&sessions_path, &run.sessions)?;
            }
            report::print_summary(&run.summary);
        }
        Commands::Stats { input } => {
            let records = snapshot::load_records(&input)?;
            print_stats(&records);
        }
    }

    Ok(())
}

/// Quick per-stage/per-entity breakdown of a snapshot.
fn print_stats(records: &[storysync_model::AnnotatedRecord]) {
    let mut by_stage: BTreeMap<&str, usize> = BTreeMap::new();
    let mut entities: std::collections::BTreeSet<&str> = std::collections::BTreeSet::new();
    let mut with_handle = 0usize;
    let mut with_id = 0usize;
    for annotated in records {
        *by_stage.entry(annotated.record.source_tag.as_str()).or_default() += 1;
        entities.insert(annotated.record.entity_id.as_str());
        if annotated
            .annotations
            .video_handle
            .as_ref()
            .is_some_and(|h| h.url.is_some())
        {
            with_handle += 1;
        }
        if annotated.annotations.sequence_id.is_some() {
            with_id += 1;
        }
    }

    println!("Records: {}", records.len());
    println!("Entities: {}", entities.len());
    println!("With signed URL: {with_handle}");
    println!("With sequence id: {with_id}");
    for (stage, count) in by_stage {
        println!("  {stage}: {count}");
    }
}
