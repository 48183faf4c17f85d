//! Core domain models of the configurator.
//!
//! Tasks are single configuration operations, a task tree links them with
//! success and failure branches, and a job runs one tree against one node.

pub mod job;
pub mod task;
pub mod tree;

pub use job::{Job, JobId, JobNotification};
pub use task::{EventOutcome, RequestOutcome, Task, TaskId, TaskKind, TaskResult};
pub use tree::{Branch, TaskIndex, TaskTree};
