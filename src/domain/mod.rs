//! Domain types and the ports through which the pipeline reaches its collaborators.

pub mod event;
pub mod ports;
pub mod transaction;
