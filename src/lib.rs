//! Bluetooth Mesh node configuration engine.
//!
//! Applications describe configuration work as a [`TaskTree`] of
//! [`Task`]s, wrap it in a [`Job`] targeting one node and submit it to the
//! [`Configurator`]. The configurator runs jobs on a pool of executors,
//! correlates stack events with outstanding requests and reports the
//! outcome through the job's notification callback.

pub mod config;
pub mod configurator;
pub mod core;
pub mod error;
pub mod log;
pub mod mesh;
pub mod orchestration;
pub mod util;

pub use config::Config;
pub use configurator::Configurator;
pub use crate::core::{
    Branch, EventOutcome, Job, JobId, JobNotification, RequestOutcome, Task, TaskId, TaskIndex,
    TaskKind, TaskResult, TaskTree,
};
pub use error::{Error, Result, StackResult, SubmitError};
pub use mesh::{
    ConfRequest, MemoryNodeDb, MeshEvent, MeshStack, ModelTarget, NodeDatabase, Publication,
};
