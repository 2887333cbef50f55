//! Application layer containing the asynchronous transaction pipeline.
//!
//! Intake hands transactions to a bounded `WorkQueue` without blocking. A single
//! `ProcessingLoop` task owns the receiving end and, for each item in arrival
//! order, persists it as processed, builds and validates a `transaction.created`
//! event, and publishes it under the `RetryPolicy`.

pub mod pipeline;
pub mod queue;
pub mod report;
pub mod retry;
pub mod worker;
