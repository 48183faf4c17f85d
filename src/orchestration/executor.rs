//! Executor for a single job.
//!
//! An `Executor` drives the task chain of one job at a time: it issues the
//! current task's request, waits for events carrying the request handle,
//! and follows the success or failure branch once the task concludes.
//! Busy and timeout conditions are retried within the `RetryPolicy`.

use std::time::{Duration, Instant};

use crate::config::Config;
use crate::core::job::Job;
use crate::core::task::{EventOutcome, RequestOutcome, TaskResult};
use crate::error::Error;
use crate::log::{self, LogLevel};
use crate::mesh::db::NodeDatabase;
use crate::mesh::event::{handle_from_event, MeshEvent};
use crate::mesh::stack::MeshStack;
use crate::{mlog, mlog_debug, mlog_warn};

/// Retry limits applied to every task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub busy_retry_limit: u32,
    pub busy_retry_interval: Duration,
    pub timeout_retry_limit: u32,
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            busy_retry_limit: config.busy_retry_limit,
            busy_retry_interval: config.busy_retry_interval(),
            timeout_retry_limit: config.timeout_retry_limit,
        }
    }
}

/// What an executor is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorState {
    Idle,
    /// Request accepted, waiting for events with this handle.
    WaitingForEvent { handle: u32 },
    /// Stack was busy, request is re-issued at `retry_at`.
    BusyBackoff { retry_at: Instant },
}

pub struct Executor {
    index: usize,
    policy: RetryPolicy,
    job: Option<Box<Job>>,
    state: ExecutorState,
    busy_retries: u32,
    timeout_retries: u32,
}

impl Executor {
    pub fn new(index: usize, policy: RetryPolicy) -> Self {
        Self {
            index,
            policy,
            job: None,
            state: ExecutorState::Idle,
            busy_retries: 0,
            timeout_retries: 0,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_idle(&self) -> bool {
        self.job.is_none()
    }

    pub fn state(&self) -> ExecutorState {
        self.state
    }

    pub fn job(&self) -> Option<&Job> {
        self.job.as_deref()
    }

    /// Server address of the running job.
    pub fn server_address(&self) -> Option<u16> {
        self.job.as_ref().map(|job| job.server_address())
    }

    /// Start `job` on this executor.
    ///
    /// Returns the job back if it finished without waiting for any event,
    /// e.g. when its tree is empty or every request was rejected.
    pub fn assign(
        &mut self,
        mut job: Box<Job>,
        stack: &mut dyn MeshStack,
        now: Instant,
    ) -> Option<Box<Job>> {
        debug_assert!(self.job.is_none(), "executor {} already busy", self.index);
        mlog!(
            "Executor {} starting job {} (netkey_idx={},addr=0x{:04x})",
            self.index,
            job.id(),
            job.enc_netkey_index(),
            job.server_address()
        );
        self.busy_retries = 0;
        self.timeout_retries = 0;

        if let Err(e) = job.set_next_task() {
            mlog_warn!("Job {} has no tasks", job.id());
            job.set_result(TaskResult::Failed(e));
            return Some(job);
        }
        self.job = Some(job);
        self.issue_request(stack, now)
    }

    /// Feed a configuration event.
    ///
    /// Events whose handle does not match the outstanding request are
    /// ignored. Returns the job once it is finished.
    pub fn on_event(
        &mut self,
        event: &MeshEvent,
        stack: &mut dyn MeshStack,
        db: &mut dyn NodeDatabase,
        now: Instant,
    ) -> Option<Box<Job>> {
        let ExecutorState::WaitingForEvent { handle } = self.state else {
            return None;
        };
        if handle_from_event(event) != Ok(handle) {
            return None;
        }

        let job = self.job.as_mut()?;
        let (netkey, address) = (job.enc_netkey_index(), job.server_address());
        let task = job.current_task_mut()?;
        let outcome = task.on_event(db, netkey, address, event);

        match outcome {
            EventOutcome::InProgress => None,
            EventOutcome::Timeout if self.timeout_retries < self.policy.timeout_retry_limit => {
                self.timeout_retries += 1;
                mlog_debug!(
                    "Executor {} retrying timed out task ({}/{})",
                    self.index,
                    self.timeout_retries,
                    self.policy.timeout_retry_limit
                );
                self.issue_request(stack, now)
            }
            EventOutcome::Ok | EventOutcome::Timeout | EventOutcome::Fail | EventOutcome::Abort => {
                self.log_task_result();
                self.advance_and_request(stack, now)
            }
        }
    }

    /// Re-issue a request whose busy back-off has elapsed.
    pub fn step(&mut self, stack: &mut dyn MeshStack, now: Instant) -> Option<Box<Job>> {
        match self.state {
            ExecutorState::BusyBackoff { retry_at } if now >= retry_at => {
                self.issue_request(stack, now)
            }
            _ => None,
        }
    }

    fn issue_request(&mut self, stack: &mut dyn MeshStack, now: Instant) -> Option<Box<Job>> {
        loop {
            let job = self.job.as_mut()?;
            let (netkey, address) = (job.enc_netkey_index(), job.server_address());
            let task = job.current_task_mut()?;

            match task.request(stack, netkey, address) {
                RequestOutcome::Accepted(handle) => {
                    self.state = ExecutorState::WaitingForEvent { handle };
                    return None;
                }
                RequestOutcome::Busy if self.busy_retries < self.policy.busy_retry_limit => {
                    self.busy_retries += 1;
                    mlog_debug!(
                        "Executor {} stack busy, retry {}/{} in {:?}",
                        self.index,
                        self.busy_retries,
                        self.policy.busy_retry_limit,
                        self.policy.busy_retry_interval
                    );
                    self.state = ExecutorState::BusyBackoff {
                        retry_at: now + self.policy.busy_retry_interval,
                    };
                    return None;
                }
                RequestOutcome::Busy | RequestOutcome::Failed => {
                    self.log_task_result();
                }
            }

            if let Some(finished) = self.advance() {
                return Some(finished);
            }
        }
    }

    fn advance_and_request(&mut self, stack: &mut dyn MeshStack, now: Instant) -> Option<Box<Job>> {
        match self.advance() {
            Some(finished) => Some(finished),
            None => self.issue_request(stack, now),
        }
    }

    /// Move the job to its next task. Returns the job if it is finished.
    fn advance(&mut self) -> Option<Box<Job>> {
        self.busy_retries = 0;
        self.timeout_retries = 0;
        let job = self.job.as_mut()?;
        match job.set_next_task() {
            Ok(()) => None,
            Err(_) => self.finish(),
        }
    }

    fn finish(&mut self) -> Option<Box<Job>> {
        self.state = ExecutorState::Idle;
        let mut job = self.job.take()?;
        let result = job
            .current_task()
            .map(|task| task.result())
            .unwrap_or(TaskResult::Failed(Error::Fail));
        job.set_result(result);
        mlog!(
            "Executor {} finished job {} (addr=0x{:04x}): {}",
            self.index,
            job.id(),
            job.server_address(),
            result
        );
        Some(job)
    }

    fn log_task_result(&self) {
        if !log::any_severe_log_level(LogLevel::Info) {
            return;
        }
        if let Some(job) = self.job.as_deref() {
            if let Some(task) = job.current_task() {
                mlog!(
                    "Node (netkey_idx={},addr=0x{:04x}) {} -> {}",
                    job.enc_netkey_index(),
                    job.server_address(),
                    task,
                    task.result()
                );
            }
        }
    }
}
