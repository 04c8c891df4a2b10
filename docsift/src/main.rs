//! Ingest a directory of documents into a local embedding index.
//!
//! Every flag can also be set through the environment or a `.env` file.
use std::{path::Path, sync::Arc};

use anyhow::{Context as _, Result};
use clap::Parser;
use docsift::{
    indexing::{
        FailurePolicy, IndexStateInspector, IngestConfig, Ingestion, IngestionReport,
        ProgressReporter, SplitMode, config,
    },
    integrations::{LocalStore, embedding_model_for},
};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tracing_subscriber::EnvFilter;

/// Sentence-transformer models need the `fastembed` feature, without it the default works offline.
#[cfg(feature = "fastembed")]
const DEFAULT_MODEL: &str = config::DEFAULT_EMBEDDINGS_MODEL_NAME;
#[cfg(not(feature = "fastembed"))]
const DEFAULT_MODEL: &str = "hashed";

#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Directory scanned for PDF and text files
    #[arg(long, env = "SOURCE_DIRECTORY", default_value = config::DEFAULT_SOURCE_DIRECTORY)]
    source_directory: String,

    /// Directory holding the persisted index
    #[arg(long, env = "PERSIST_DIRECTORY", default_value = config::DEFAULT_PERSIST_DIRECTORY)]
    persist_directory: String,

    /// Embedding model; `hashed-<dimensions>` works offline, other names need the `fastembed`
    /// feature
    #[arg(long, env = "EMBEDDINGS_MODEL_NAME", default_value = DEFAULT_MODEL)]
    embeddings_model_name: String,

    /// Maximum chunk length in characters
    #[arg(long, env = "CHUNK_SIZE", default_value_t = config::DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Characters shared by consecutive chunks
    #[arg(long, env = "CHUNK_OVERLAP", default_value_t = config::DEFAULT_CHUNK_OVERLAP)]
    chunk_overlap: usize,

    /// Files loaded concurrently, defaults to the number of CPUs
    #[arg(long, env = "INGEST_CONCURRENCY")]
    concurrency: Option<usize>,

    /// `abort` or `skip` when a file fails to load
    #[arg(long, env = "LOAD_FAILURE_POLICY", default_value_t = FailurePolicy::Abort)]
    failure_policy: FailurePolicy,

    /// `recursive` or `semantic`
    #[arg(long, env = "SPLIT_MODE", default_value_t = SplitMode::Recursive)]
    split_mode: SplitMode,

    /// Chunks sent to the embedding model at once
    #[arg(long, env = "EMBED_BATCH_SIZE", default_value_t = config::DEFAULT_EMBED_BATCH_SIZE)]
    embed_batch_size: usize,
}

impl Args {
    fn into_config(self) -> Result<IngestConfig> {
        let mut builder = IngestConfig::builder();
        builder
            .source_directory(self.source_directory)
            .persist_directory(self.persist_directory)
            .embeddings_model_name(self.embeddings_model_name)
            .chunk_size(self.chunk_size)
            .chunk_overlap(self.chunk_overlap)
            .failure_policy(self.failure_policy)
            .split_mode(self.split_mode)
            .embed_batch_size(self.embed_batch_size);

        if let Some(concurrency) = self.concurrency {
            builder.concurrency(concurrency);
        }

        builder.build()
    }
}

/// Shows a progress bar while files load.
#[derive(Debug, Clone)]
struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new() -> Result<Self> {
        let bar = ProgressBar::hidden();
        bar.set_style(
            ProgressStyle::with_template(
                "{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )?
            .progress_chars("=> "),
        );
        bar.set_message("Loading new documents");
        Ok(Self { bar })
    }
}

impl ProgressReporter for BarProgress {
    fn start(&self, total: usize) {
        self.bar.set_length(u64::try_from(total).unwrap_or(u64::MAX));
        self.bar.set_position(0);
        self.bar.set_draw_target(ProgressDrawTarget::stderr());
    }

    fn file_done(&self, _path: &Path) {
        self.bar.inc(1);
    }

    fn finish(&self) {
        self.bar.finish();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    match run(args).await {
        Ok(report) => {
            print_report(&report);
            Ok(())
        }
        Err(err) => {
            tracing::error!(error = format!("{err:#}"), "Ingestion failed");
            Err(err)
        }
    }
}

async fn run(args: Args) -> Result<IngestionReport> {
    let config = args.into_config()?;

    let store = LocalStore::builder()
        .persist_directory(config.persist_directory.clone())
        .batch_size(config.embed_batch_size)
        .build()?;
    let inspector = IndexStateInspector::new(store.layout());
    let embedder = embedding_model_for(&config.embeddings_model_name)
        .context("Could not set up the embedding model")?;

    let report = Ingestion::builder()
        .config(config)
        .store(Arc::new(store))
        .embedder(embedder)
        .inspector(inspector)
        .progress(Arc::new(BarProgress::new()?))
        .build()?
        .run()
        .await?;

    Ok(report)
}

fn print_report(report: &IngestionReport) {
    println!(
        "{}: scanned {} files, loaded {} documents, added {} chunks",
        report.mode, report.files_scanned, report.documents_loaded, report.chunks_added
    );

    if !report.failures.is_empty() {
        println!("Skipped {} files that failed to load:", report.failures.len());
        for failure in &report.failures {
            println!("  {failure}");
        }
    }
}
