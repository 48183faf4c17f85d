//! Configurator façade.
//!
//! `Configurator` is the entry point for the embedding application. It owns
//! the mesh stack handle, the node database and the distributor, accepts
//! jobs, forwards stack events and reports finished jobs through their
//! notification callbacks.
//!
//! All calls are expected from one driving loop. Nothing here blocks: the
//! stack answers asynchronously through [`Configurator::on_event`] and busy
//! back-offs are driven by [`Configurator::step`].

use std::time::Instant;

use crate::config::Config;
use crate::core::job::{Job, JobId, JobNotification};
use crate::core::task::Task;
use crate::core::tree::TaskTree;
use crate::error::{Error, Result, SubmitError};
use crate::mesh::db::NodeDatabase;
use crate::mesh::event::MeshEvent;
use crate::mesh::models::{self, SigModelInfo, SIG_MODELS, UNKNOWN_SIG_MODEL};
use crate::mesh::stack::MeshStack;
use crate::orchestration::Distributor;
use crate::{mlog, mlog_debug, mlog_error};

pub struct Configurator<S: MeshStack, D: NodeDatabase> {
    config: Config,
    stack: S,
    db: D,
    model_table: &'static [SigModelInfo],
    distributor: Option<Distributor>,
    /// Set while a job notification callback runs.
    callback_active: bool,
    /// Finished jobs without auto-destroy, waiting to be taken.
    parked: Vec<Box<Job>>,
}

impl<S: MeshStack, D: NodeDatabase> Configurator<S, D> {
    /// Create an uninitialized configurator.
    ///
    /// Call [`Configurator::init`] before submitting jobs, or let the
    /// provisioning-initialized event do it.
    pub fn new(config: Config, stack: S, db: D) -> Self {
        Self {
            config,
            stack,
            db,
            model_table: SIG_MODELS,
            distributor: None,
            callback_active: false,
            parked: Vec::new(),
        }
    }

    /// Use `table` instead of the built-in SIG model table.
    pub fn with_model_table(mut self, table: &'static [SigModelInfo]) -> Self {
        self.model_table = table;
        self
    }

    /// Validate the model table and create the distributor.
    ///
    /// Calling it again while initialized does nothing.
    ///
    /// # Errors
    /// - `InvalidConfiguration` if the model table is not sorted or the
    ///   config is invalid
    pub fn init(&mut self) -> Result<()> {
        if self.distributor.is_some() {
            return Ok(());
        }
        models::validate_model_table(self.model_table)?;
        let distributor = Distributor::new(&self.config)?;
        self.distributor = Some(distributor);
        mlog!(
            "Configurator initialized (executors={},wait_queue_limit={})",
            self.config.executor_count,
            self.config.wait_queue_limit
        );
        Ok(())
    }

    /// Drop the distributor together with every queued and running job.
    ///
    /// # Errors
    /// `InvalidState` when called from a job notification callback.
    pub fn deinit(&mut self) -> Result<()> {
        if self.callback_active {
            mlog_error!("Configurator deinit refused inside job notification");
            return Err(Error::InvalidState);
        }
        if self.distributor.take().is_some() {
            mlog!("Configurator deinitialized");
        }
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.distributor.is_some()
    }

    /// Submit `job` using the configured auto-destroy-on-failure policy.
    ///
    /// # Errors
    /// - `InvalidState` if not initialized
    /// - `NoMoreResource` if the wait queue is full
    /// - `AllocationFailed` if the wait queue cannot grow
    ///
    /// The job is handed back in the error unless it was destroyed.
    pub fn submit_job(&mut self, job: Box<Job>) -> std::result::Result<JobId, SubmitError> {
        let auto_destroy = self.config.auto_destroy_on_submit_failure;
        self.submit_job_with(job, auto_destroy)
    }

    fn submit_job_with(
        &mut self,
        job: Box<Job>,
        auto_destroy_on_failure: bool,
    ) -> std::result::Result<JobId, SubmitError> {
        let id = job.id();
        let outcome = match self.distributor.as_mut() {
            Some(distributor) => distributor.submit(job, &mut self.stack, Instant::now()),
            None => Err((Error::InvalidState, job)),
        };

        match outcome {
            Ok(()) => {
                mlog_debug!("Job {} submitted", id);
                self.dispatch_finished();
                Ok(id)
            }
            Err((error, job)) => {
                mlog_error!("Job {} submission failed: {}", id, error);
                let job = if auto_destroy_on_failure {
                    drop(job);
                    None
                } else {
                    Some(job)
                };
                Err(SubmitError { error, job })
            }
        }
    }

    /// Read DCD `page` of the node at `server_address`.
    ///
    /// The job is destroyed after `on_notification` returns.
    pub fn dcd_get(
        &mut self,
        enc_netkey_index: u16,
        server_address: u16,
        page: u8,
        on_notification: Option<JobNotification>,
    ) -> Result<JobId> {
        self.submit_single(enc_netkey_index, server_address, Task::dcd_get(page), on_notification)
    }

    /// Reset the node at `server_address`, removing it from the network.
    pub fn reset_node(
        &mut self,
        enc_netkey_index: u16,
        server_address: u16,
        on_notification: Option<JobNotification>,
    ) -> Result<JobId> {
        self.submit_single(enc_netkey_index, server_address, Task::reset_node(), on_notification)
    }

    fn submit_single(
        &mut self,
        enc_netkey_index: u16,
        server_address: u16,
        task: Task,
        on_notification: Option<JobNotification>,
    ) -> Result<JobId> {
        let job = Job::new(
            enc_netkey_index,
            server_address,
            TaskTree::with_root(task),
            on_notification,
            0,
            true,
        );
        self.submit_job_with(job, true).map_err(|e| e.error)
    }

    /// Handle one event from the mesh stack.
    ///
    /// Provisioning-initialized brings the configurator up and pushes the
    /// request timeouts to the stack. Every other event goes to the
    /// distributor once initialized.
    ///
    /// # Errors
    /// Failures of the lazy init or of the timeout setup.
    pub fn on_event(&mut self, event: &MeshEvent) -> Result<()> {
        if let MeshEvent::ProvInitialized { address, iv_index } = event {
            mlog!(
                "Provisioning initialized (addr=0x{:04x},iv_index={})",
                address,
                iv_index
            );
            if let Err(e) = self.init() {
                mlog_error!("Configurator init failed: {}", e);
                return Err(e);
            }
            if let Err(e) = self
                .stack
                .set_default_timeout(self.config.request_timeout_ms, self.config.lpn_request_timeout_ms)
            {
                mlog_error!("Failed to set default request timeouts: {}", e);
                return Err(e);
            }
        }

        if let Some(distributor) = self.distributor.as_mut() {
            distributor.on_event(event, &mut self.stack, &mut self.db, Instant::now());
        }
        self.dispatch_finished();
        Ok(())
    }

    /// Re-issue requests whose busy back-off has elapsed.
    pub fn step(&mut self) {
        if let Some(distributor) = self.distributor.as_mut() {
            distributor.step(&mut self.stack, Instant::now());
        }
        self.dispatch_finished();
    }

    fn dispatch_finished(&mut self) {
        let finished = match self.distributor.as_mut() {
            Some(distributor) => distributor.take_finished(),
            None => return,
        };
        for job in finished {
            self.on_job_notification(job);
        }
    }

    fn on_job_notification(&mut self, mut job: Box<Job>) {
        self.callback_active = true;
        job.notify();
        self.callback_active = false;

        if job.auto_destroy {
            mlog_debug!("Job {} destroyed after notification", job.id());
        } else {
            self.parked.push(job);
        }
    }

    /// Take a finished job that was not auto-destroyed.
    pub fn take_finished_job(&mut self, id: JobId) -> Option<Box<Job>> {
        let position = self.parked.iter().position(|job| job.id() == id)?;
        Some(self.parked.swap_remove(position))
    }

    pub fn get_model_info(&self, model_id: u16) -> Option<&'static SigModelInfo> {
        models::find_model(self.model_table, model_id)
    }

    /// # Errors
    /// `NotFound` for models not in the table.
    pub fn get_sig_model_attributes(&self, model_id: u16) -> Result<u8> {
        self.get_model_info(model_id)
            .map(|info| info.attributes)
            .ok_or(Error::NotFound)
    }

    pub fn sig_model_id_to_string(&self, model_id: u16) -> &'static str {
        self.get_model_info(model_id)
            .map(|info| info.name)
            .unwrap_or(UNKNOWN_SIG_MODEL)
    }

    pub fn active_job_count(&self) -> usize {
        self.distributor
            .as_ref()
            .map_or(0, Distributor::active_job_count)
    }

    pub fn waiting_job_count(&self) -> usize {
        self.distributor
            .as_ref()
            .map_or(0, Distributor::waiting_job_count)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn stack(&self) -> &S {
        &self.stack
    }

    pub fn stack_mut(&mut self) -> &mut S {
        &mut self.stack
    }

    pub fn db(&self) -> &D {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut D {
        &mut self.db
    }
}
