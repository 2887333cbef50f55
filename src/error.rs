use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Storage error: {0}")]
    StorageError(String),
    #[cfg(feature = "storage-rocksdb")]
    #[error("RocksDB error: {0}")]
    RocksDbError(#[from] rocksdb::Error),
    #[error("Schema validation failed: {0}")]
    ValidationError(String),
    #[error("Publish error: {0}")]
    PublishError(String),
    #[error("Publish deadline exceeded")]
    DeadlineExceeded,
    #[error("Metrics error: {0}")]
    MetricsError(#[from] prometheus::Error),
    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
