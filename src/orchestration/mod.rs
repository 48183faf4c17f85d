//! Job execution layer.
//!
//! Executors run one job each, the distributor queues submitted jobs and
//! hands them to idle executors while keeping per-node ordering.

mod distributor;
mod executor;

pub use distributor::Distributor;
pub use executor::{Executor, ExecutorState, RetryPolicy};
