//! Integration tests for the configuration engine.
//!
//! Jobs are driven end to end through the `Configurator` against a
//! recording mesh stack and the in-memory node database.
//!
//! # Test Categories
//!
//! - `job_flow`: task chains, branches and notifications
//! - `dcd`: composition data collection and registration
//! - `ordering`: per-node serialization and parallel nodes
//! - `retry`: busy back-off and timeout re-requests
//! - `submission`: queue limits, auto-destroy and configuration

mod fixtures;

mod job_flow;
mod ordering;
mod retry;
mod submission;
