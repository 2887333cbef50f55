use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use txflow::application::pipeline::TransactionPipeline;
use txflow::application::report::sum_by_user;
use txflow::config::PipelineConfig;
use txflow::domain::ports::{EventPublisherRef, TransactionRepositoryRef};
use txflow::infrastructure::in_memory::InMemoryTransactionStore;
use txflow::infrastructure::json_lines::JsonLinesPublisher;
use txflow::infrastructure::json_schema::JsonSchemaValidator;
use txflow::interfaces::csv::transaction_reader::TransactionReader;
use txflow::interfaces::csv::transaction_writer::TransactionWriter;
use txflow::interfaces::intake::TransactionIntake;
use txflow::telemetry::{PipelineMetrics, init_tracing};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input CSV with transaction_id,user_id,amount,timestamp rows
    input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Append published events to this file as JSON lines
    #[arg(long)]
    events_out: Option<PathBuf>,

    /// Comma-separated Kafka brokers (requires the `publisher-kafka` feature)
    #[arg(long, env = "KAFKA_BROKERS")]
    kafka_brokers: Option<String>,

    /// Kafka topic for transaction events
    #[arg(long, env = "KAFKA_TOPIC_TRANSACTIONS")]
    kafka_topic: Option<String>,

    #[arg(long, env = "TXFLOW_QUEUE_CAPACITY", default_value_t = 100)]
    queue_capacity: usize,

    /// Simulated processing cost per transaction
    #[arg(long, env = "TXFLOW_PROCESSING_DELAY_MS", default_value_t = 150)]
    processing_delay_ms: u64,

    /// Overall deadline for all publish attempts of one event
    #[arg(long, env = "TXFLOW_PUBLISH_TIMEOUT_MS", default_value_t = 5000)]
    publish_timeout_ms: u64,

    #[arg(long, env = "TXFLOW_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    #[arg(long, env = "TXFLOW_BACKOFF_BASE_MS", default_value_t = 200)]
    backoff_base_ms: u64,

    /// Do not check events against the transaction.created v1 schema
    #[arg(long)]
    skip_schema_validation: bool,

    /// Print per-user totals of processed transactions instead of the transaction list
    #[arg(long)]
    report: bool,

    /// Print metrics in Prometheus text format to stderr on exit
    #[arg(long)]
    print_metrics: bool,
}

impl Cli {
    fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig::default()
            .with_queue_capacity(self.queue_capacity)
            .with_processing_delay(Duration::from_millis(self.processing_delay_ms))
            .with_publish_timeout(Duration::from_millis(self.publish_timeout_ms))
            .with_retry(self.max_retries, Duration::from_millis(self.backoff_base_ms))
    }
}

fn open_repository(db_path: Option<&PathBuf>) -> Result<TransactionRepositoryRef> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => {
            let store =
                txflow::infrastructure::rocksdb::RocksDBStore::open(path).into_diagnostic()?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            eprintln!(
                "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
            Ok(Arc::new(InMemoryTransactionStore::new()))
        }
        None => Ok(Arc::new(InMemoryTransactionStore::new())),
    }
}

async fn open_publisher(cli: &Cli) -> Result<Option<EventPublisherRef>> {
    if let (Some(brokers), Some(topic)) = (&cli.kafka_brokers, &cli.kafka_topic) {
        #[cfg(feature = "publisher-kafka")]
        {
            if let Some(path) = &cli.events_out {
                eprintln!(
                    "WARNING: Both Kafka and --events-out ('{}') were configured. Publishing to Kafka only.",
                    path.display()
                );
            }
            let publisher = txflow::infrastructure::kafka::KafkaPublisher::new(
                brokers,
                topic.clone(),
                Duration::from_millis(cli.publish_timeout_ms),
            )
            .into_diagnostic()?;
            info!(brokers = %brokers, topic = %topic, "kafka publisher enabled");
            return Ok(Some(Arc::new(publisher)));
        }
        #[cfg(not(feature = "publisher-kafka"))]
        eprintln!(
            "WARNING: Kafka publishing requested for topic '{}' on '{}', but 'publisher-kafka' feature is not enabled.",
            topic, brokers
        );
    }

    if let Some(path) = &cli.events_out {
        let publisher = JsonLinesPublisher::open(path).await.into_diagnostic()?;
        info!(path = %path.display(), "event file publisher enabled");
        return Ok(Some(Arc::new(publisher)));
    }

    warn!("event publisher disabled (no --events-out or Kafka configuration)");
    Ok(None)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(io::stderr().is_terminal());

    let config = cli.pipeline_config();
    let repository = open_repository(cli.db_path.as_ref())?;
    let metrics = Arc::new(PipelineMetrics::new().into_diagnostic()?);

    let mut pipeline =
        TransactionPipeline::new(config, repository.clone()).with_metrics(metrics.clone());
    if !cli.skip_schema_validation {
        let validator = JsonSchemaValidator::transaction_created_v1().into_diagnostic()?;
        pipeline = pipeline.with_validator(Arc::new(validator));
    }
    if let Some(publisher) = open_publisher(&cli).await? {
        pipeline = pipeline.with_publisher(publisher);
    }

    let cancel = CancellationToken::new();
    let (queue, worker) = pipeline.spawn(cancel.clone()).into_diagnostic()?;

    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("shutdown requested; abandoning queued transactions");
            on_signal.cancel();
        }
    });

    let intake = TransactionIntake::new(repository.clone(), queue, metrics.clone());
    let file = File::open(&cli.input).into_diagnostic()?;
    let reader = TransactionReader::new(file);
    for request in reader.transactions() {
        match request {
            Ok(request) => {
                if let Err(e) = intake.submit(request).await {
                    warn!(error = %e, "error submitting transaction");
                }
            }
            Err(e) => {
                intake.record_rejected();
                warn!(error = %e, "error reading transaction");
            }
        }
    }

    // Closing the intake lets the worker finish what was admitted and stop.
    drop(intake);
    worker.await.into_diagnostic()?;

    if cli.report {
        let totals = sum_by_user(repository.as_ref()).await.into_diagnostic()?;
        TransactionWriter::new(io::stdout().lock())
            .write_report(&totals)
            .into_diagnostic()?;
    } else {
        let transactions = repository.list().await.into_diagnostic()?;
        TransactionWriter::new(io::stdout().lock())
            .write_transactions(transactions)
            .into_diagnostic()?;
    }

    if cli.print_metrics {
        eprint!("{}", metrics.render().into_diagnostic()?);
    }

    Ok(())
}
