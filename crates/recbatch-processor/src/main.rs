//! recbatch - run a record batch against a seeded in-memory store.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

use recbatch_core::{Record, RecordId};
use recbatch_processor::{metrics, BatchProcessor, Config, InMemoryRecordStore, WorkerPool};

/// recbatch - Concurrent record batch processor
#[derive(Parser)]
#[command(name = "recbatch")]
#[command(about = "Process a batch of records on a worker pool", long_about = None)]
struct Cli {
    /// Number of records to seed into the store
    #[arg(short, long, default_value_t = 10)]
    records: u64,

    /// Number of ids with no record to add to the batch
    #[arg(short, long, default_value_t = 0)]
    missing: u64,

    /// Worker pool size (defaults to available parallelism)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Batch deadline in seconds
    #[arg(long, default_value_t = 30)]
    deadline_secs: u64,

    /// Simulated work per record in milliseconds
    #[arg(long, default_value_t = 100)]
    task_delay_ms: u64,

    /// Print the run report in Prometheus text format after the records
    #[arg(long)]
    metrics: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn config(&self) -> Config {
        let mut config = Config::default()
            .with_batch_deadline(Duration::from_secs(self.deadline_secs))
            .with_task_delay(Duration::from_millis(self.task_delay_ms));
        if let Some(workers) = self.workers {
            config = config.with_worker_count(workers);
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing; stdout is reserved for results
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config();

    let store = Arc::new(InMemoryRecordStore::new());
    let seeded = store
        .seed((1..=cli.records).map(|n| {
            Record::new(format!("Record {n}")).with_description("seeded by recbatch")
        }))
        .await?;

    let mut ids: Vec<RecordId> = seeded.iter().filter_map(|record| record.id).collect();
    let first_missing = cli.records.saturating_add(1);
    ids.extend((first_missing..first_missing.saturating_add(cli.missing)).map(RecordId::new));

    info!(
        records = seeded.len(),
        missing = cli.missing,
        workers = config.worker_count,
        "Seeded store"
    );

    let pool = Arc::new(WorkerPool::new(config.worker_count)?);
    let processor = BatchProcessor::new(store, pool.clone(), config);

    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, cancelling batch");
                cancel.cancel();
            }
        })
    };

    let result = processor.execute(ids, cancel).await;
    ctrl_c.abort();
    pool.shutdown().await;

    let output = match result {
        Ok(output) => output,
        Err(e) => {
            error!(error = %e, "Batch failed");
            return Err(e.into());
        }
    };

    println!("{}", serde_json::to_string_pretty(&output.records)?);
    if cli.metrics {
        print!("{}", metrics::render(&output.report));
    }

    Ok(())
}
