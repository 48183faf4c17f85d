//! Configuration jobs.
//!
//! A job binds a task tree to one node (encrypted netkey index and server
//! address) and keeps a cursor to the task being executed.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::core::task::{Task, TaskResult};
use crate::core::tree::{Branch, TaskIndex, TaskTree};
use crate::error::{Error, Result};

pub type JobId = u32;

/// Called once when a job finishes.
pub type JobNotification = Box<dyn FnMut(&Job)>;

static NEXT_JOB_ID: AtomicU32 = AtomicU32::new(1);

/// Generate a process-wide unique job id.
pub fn next_job_id() -> JobId {
    NEXT_JOB_ID.fetch_add(1, Ordering::Relaxed)
}

pub struct Job {
    id: JobId,
    enc_netkey_index: u16,
    server_address: u16,
    task_tree: TaskTree,
    /// Task being executed, `None` before the job starts.
    current: Option<TaskIndex>,
    result: TaskResult,
    on_notification: Option<JobNotification>,
    /// Opaque value for the notification callback.
    pub status_param: u64,
    /// Drop the job right after its notification.
    pub auto_destroy: bool,
}

impl Job {
    /// Create a job for the node at `server_address`.
    ///
    /// # Arguments
    ///
    /// * `enc_netkey_index` - Network key used to reach the node
    /// * `server_address` - Primary element address of the node
    /// * `task_tree` - Tasks to run, starting at the tree's root
    /// * `on_notification` - Called when the job finishes
    /// * `status_param` - Opaque value kept for the callback
    /// * `auto_destroy` - Drop the job once the callback returns
    pub fn new(
        enc_netkey_index: u16,
        server_address: u16,
        task_tree: TaskTree,
        on_notification: Option<JobNotification>,
        status_param: u64,
        auto_destroy: bool,
    ) -> Box<Self> {
        Box::new(Self {
            id: next_job_id(),
            enc_netkey_index,
            server_address,
            task_tree,
            current: None,
            result: TaskResult::Unknown,
            on_notification,
            status_param,
            auto_destroy,
        })
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn enc_netkey_index(&self) -> u16 {
        self.enc_netkey_index
    }

    pub fn server_address(&self) -> u16 {
        self.server_address
    }

    pub fn task_tree(&self) -> &TaskTree {
        &self.task_tree
    }

    pub fn task_tree_mut(&mut self) -> &mut TaskTree {
        &mut self.task_tree
    }

    pub fn current_index(&self) -> Option<TaskIndex> {
        self.current
    }

    pub fn current_task(&self) -> Option<&Task> {
        self.task_tree.task(self.current?)
    }

    pub fn current_task_mut(&mut self) -> Option<&mut Task> {
        self.task_tree.task_mut(self.current?)
    }

    pub fn result(&self) -> TaskResult {
        self.result
    }

    pub fn set_result(&mut self, result: TaskResult) {
        self.result = result;
    }

    /// Move the cursor to the next task.
    ///
    /// The first call selects the root. Later calls follow the success or
    /// failure branch of the current task depending on its result.
    ///
    /// # Errors
    /// - `Fail` if the tree has no root on the first call
    /// - `NotFound` if there is no next task; the job is complete
    pub fn set_next_task(&mut self) -> Result<()> {
        let next = match self.current {
            None => Some(self.task_tree.root().ok_or(Error::Fail)?),
            Some(current) => {
                let task = self.task_tree.task(current).ok_or(Error::Fail)?;
                let branch = if task.result().is_ok() {
                    Branch::Success
                } else {
                    Branch::Failure
                };
                self.task_tree.next(current, branch)
            }
        };
        match next {
            Some(index) => {
                self.current = Some(index);
                Ok(())
            }
            None => Err(Error::NotFound),
        }
    }

    pub fn has_notification(&self) -> bool {
        self.on_notification.is_some()
    }

    /// Invoke the notification callback, if any.
    pub(crate) fn notify(&mut self) {
        if let Some(mut callback) = self.on_notification.take() {
            callback(self);
            self.on_notification = Some(callback);
        }
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("enc_netkey_index", &self.enc_netkey_index)
            .field("server_address", &format_args!("0x{:04x}", self.server_address))
            .field("tasks", &self.task_tree.task_count())
            .field("current", &self.current)
            .field("result", &self.result)
            .field("auto_destroy", &self.auto_destroy)
            .finish()
    }
}
