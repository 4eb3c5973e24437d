#![forbid(unsafe_code)]
//! routecycle-core library.
//!
//! Routing records are read from a delimited text stream and grouped by
//! partition key (claim id, status code) into independent directed graphs.
//!
//! # Conventions
//!
//! - **Errors**: `thiserror` enums per module, each mapped to an [`error::ErrorCode`].
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod config;
pub mod error;
pub mod ingest;
pub mod model;

pub use ingest::{IngestError, IngestStats, Ingested, ingest_path, ingest_reader};
pub use model::{PartitionGraph, PartitionKey, PartitionedGraphs, RouteGraph};
