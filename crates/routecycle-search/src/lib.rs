#![forbid(unsafe_code)]
//! routecycle-search library.
//!
//! # Pipeline
//!
//! ```text
//! PartitionedGraphs
//!        ↓  reduce::partition_lengths()
//! per partition: cycles::longest_cycle(RouteGraph)
//!        ↓  reduce::select_best()
//! Option<CycleResult>   (first partition reaching the maximum wins)
//! ```
//!
//! # Conventions
//!
//! - **Errors**: the search is infallible; nothing here returns `Result`.
//! - **Logging**: Use `tracing` macros (`debug!`, `trace!`).

pub mod cycles;
pub mod reduce;

pub use cycles::{longest_cycle, longest_cycle_from};
pub use reduce::{
    CycleResult, PartitionLength, find_longest_routing_cycle, partition_lengths, select_best,
};
