//! Adapters implementing the domain ports.

pub mod in_memory;
pub mod json_lines;
pub mod json_schema;
#[cfg(feature = "publisher-kafka")]
pub mod kafka;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
