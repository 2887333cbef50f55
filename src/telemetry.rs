//! # Pipeline Telemetry
//!
//! Prometheus metrics for the transaction pipeline and the tracing subscriber
//! used by the binary.
//!
//! ## Metrics Exported
//!
//! - `transactions_processed_total` - Transactions persisted as `processed`
//! - `transactions_failed_total` - Failures, labeled by reason (`validation`, `db`, `schema`, `kafka`)
//! - `transactions_dropped_total` - Transactions dropped because the queue was full
//! - `events_published_total` - Events delivered to the publisher
//! - `events_publish_skipped_total` - Events not sent because no publisher is configured
//! - `worker_queue_current` - Approximate number of items waiting in the queue

use crate::error::Result;
use prometheus::{IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    Validation,
    Db,
    Schema,
    Kafka,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::Validation => "validation",
            FailureReason::Db => "db",
            FailureReason::Schema => "schema",
            FailureReason::Kafka => "kafka",
        }
    }
}

/// Counters and gauges for one pipeline instance, held in their own registry.
pub struct PipelineMetrics {
    registry: Registry,
    processed: IntCounter,
    failed: IntCounterVec,
    dropped: IntCounter,
    published: IntCounter,
    publish_skipped: IntCounter,
    queue_current: IntGauge,
}

impl PipelineMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let processed = IntCounter::new(
            "transactions_processed_total",
            "Total number of transactions successfully processed by the worker",
        )?;
        let failed = IntCounterVec::new(
            Opts::new(
                "transactions_failed_total",
                "Total number of transactions that failed, partitioned by reason",
            ),
            &["reason"],
        )?;
        let dropped = IntCounter::new(
            "transactions_dropped_total",
            "Total number of transactions dropped because the worker queue was full",
        )?;
        let published = IntCounter::new(
            "events_published_total",
            "Total number of transaction events published",
        )?;
        let publish_skipped = IntCounter::new(
            "events_publish_skipped_total",
            "Total number of transaction events not published because no publisher is configured",
        )?;
        let queue_current = IntGauge::new(
            "worker_queue_current",
            "Current number of items in the worker queue (approximate)",
        )?;

        registry.register(Box::new(processed.clone()))?;
        registry.register(Box::new(failed.clone()))?;
        registry.register(Box::new(dropped.clone()))?;
        registry.register(Box::new(published.clone()))?;
        registry.register(Box::new(publish_skipped.clone()))?;
        registry.register(Box::new(queue_current.clone()))?;

        Ok(Self {
            registry,
            processed,
            failed,
            dropped,
            published,
            publish_skipped,
            queue_current,
        })
    }

    pub fn inc_processed(&self) {
        self.processed.inc();
    }

    pub fn inc_failed(&self, reason: FailureReason) {
        self.failed.with_label_values(&[reason.as_str()]).inc();
    }

    pub fn inc_dropped(&self) {
        self.dropped.inc();
    }

    pub fn inc_published(&self) {
        self.published.inc();
    }

    pub fn inc_publish_skipped(&self) {
        self.publish_skipped.inc();
    }

    pub fn set_queue_current(&self, depth: usize) {
        self.queue_current.set(depth as i64);
    }

    pub fn processed_total(&self) -> u64 {
        self.processed.get()
    }

    pub fn failed_total(&self, reason: FailureReason) -> u64 {
        self.failed.with_label_values(&[reason.as_str()]).get()
    }

    pub fn dropped_total(&self) -> u64 {
        self.dropped.get()
    }

    pub fn published_total(&self) -> u64 {
        self.published.get()
    }

    pub fn publish_skipped_total(&self) -> u64 {
        self.publish_skipped.get()
    }

    pub fn queue_current(&self) -> i64 {
        self.queue_current.get()
    }

    /// Renders every metric in the Prometheus text exposition format.
    pub fn render(&self) -> Result<String> {
        let families = self.registry.gather();
        Ok(TextEncoder::new().encode_to_string(&families)?)
    }
}

/// Installs the global `fmt` subscriber, writing to stderr and filtered by `RUST_LOG`.
pub fn init_tracing(ansi: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(ansi)
        .init();
}
