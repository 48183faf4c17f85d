//! Job distribution across executors.
//!
//! The `Distributor` owns a fixed set of executors and a bounded FIFO wait
//! queue. At most one job per server address runs at a time, and jobs for
//! the same address start in submission order. Finished jobs are collected
//! in a queue drained by the owner.

use std::collections::{HashSet, VecDeque};
use std::time::Instant;

use crate::config::Config;
use crate::core::job::Job;
use crate::error::{Error, Result};
use crate::mesh::db::NodeDatabase;
use crate::mesh::event::{is_configuration_event, MeshEvent};
use crate::mesh::stack::MeshStack;
use crate::orchestration::executor::{Executor, RetryPolicy};
use crate::{mlog, mlog_debug, mlog_warn};

pub struct Distributor {
    executors: Vec<Executor>,
    wait_queue: VecDeque<Box<Job>>,
    wait_queue_limit: usize,
    finished: VecDeque<Box<Job>>,
}

impl Distributor {
    /// Create a distributor with `config.executor_count` executors.
    ///
    /// # Errors
    /// `InvalidConfiguration` when the config does not validate.
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        let policy = RetryPolicy::from_config(config);
        let executors = (0..config.executor_count)
            .map(|index| Executor::new(index, policy))
            .collect();
        mlog_debug!(
            "Distributor created: executors={},wait_queue_limit={}",
            config.executor_count,
            config.wait_queue_limit
        );
        Ok(Self {
            executors,
            wait_queue: VecDeque::new(),
            wait_queue_limit: config.wait_queue_limit,
            finished: VecDeque::new(),
        })
    }

    /// Queue `job` and start whatever can run.
    ///
    /// On failure the job is handed back together with the error.
    ///
    /// # Errors
    /// - `NoMoreResource` if the wait queue is full
    /// - `AllocationFailed` if the queue cannot grow
    pub fn submit(
        &mut self,
        job: Box<Job>,
        stack: &mut dyn MeshStack,
        now: Instant,
    ) -> std::result::Result<(), (Error, Box<Job>)> {
        if self.wait_queue.len() >= self.wait_queue_limit {
            mlog_warn!(
                "Wait queue full ({}), rejecting job {} (addr=0x{:04x})",
                self.wait_queue_limit,
                job.id(),
                job.server_address()
            );
            return Err((Error::NoMoreResource, job));
        }
        if self.wait_queue.try_reserve(1).is_err() {
            return Err((Error::AllocationFailed, job));
        }
        mlog_debug!(
            "Job {} queued (addr=0x{:04x},waiting={})",
            job.id(),
            job.server_address(),
            self.wait_queue.len() + 1
        );
        self.wait_queue.push_back(job);
        self.schedule(stack, now);
        Ok(())
    }

    /// Route a configuration event to the executor waiting for it.
    pub fn on_event(
        &mut self,
        event: &MeshEvent,
        stack: &mut dyn MeshStack,
        db: &mut dyn NodeDatabase,
        now: Instant,
    ) {
        if !is_configuration_event(event.id()) {
            return;
        }
        let mut any_finished = false;
        for executor in &mut self.executors {
            if let Some(job) = executor.on_event(event, stack, db, now) {
                self.finished.push_back(job);
                any_finished = true;
            }
        }
        if any_finished {
            self.schedule(stack, now);
        }
    }

    /// Drive busy back-offs whose deadline has passed.
    pub fn step(&mut self, stack: &mut dyn MeshStack, now: Instant) {
        let mut any_finished = false;
        for executor in &mut self.executors {
            if let Some(job) = executor.step(stack, now) {
                self.finished.push_back(job);
                any_finished = true;
            }
        }
        if any_finished {
            self.schedule(stack, now);
        }
    }

    /// Start waiting jobs on idle executors.
    ///
    /// A job is skipped while its address is busy on an executor or held
    /// by an earlier job still in the queue, which keeps per-address order.
    fn schedule(&mut self, stack: &mut dyn MeshStack, now: Instant) {
        loop {
            let mut blocked: HashSet<u16> = self
                .executors
                .iter()
                .filter_map(Executor::server_address)
                .collect();

            let Some(free) = self.executors.iter().position(Executor::is_idle) else {
                return;
            };

            let mut pick = None;
            for (position, job) in self.wait_queue.iter().enumerate() {
                if blocked.insert(job.server_address()) {
                    pick = Some(position);
                    break;
                }
            }
            let Some(job) = pick.and_then(|position| self.wait_queue.remove(position)) else {
                return;
            };

            mlog!(
                "Job {} assigned to executor {} (addr=0x{:04x})",
                job.id(),
                free,
                job.server_address()
            );
            if let Some(done) = self.executors[free].assign(job, stack, now) {
                self.finished.push_back(done);
            }
        }
    }

    /// Drain the jobs that finished since the last call.
    pub fn take_finished(&mut self) -> Vec<Box<Job>> {
        self.finished.drain(..).collect()
    }

    pub fn active_job_count(&self) -> usize {
        self.executors.iter().filter(|e| !e.is_idle()).count()
    }

    pub fn waiting_job_count(&self) -> usize {
        self.wait_queue.len()
    }

    pub fn executors(&self) -> &[Executor] {
        &self.executors
    }
}
