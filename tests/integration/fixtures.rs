//! Test fixtures for integration tests.
//!
//! Provides:
//! - `RecordingStack`, a mesh stack that records every request
//! - A ready-to-use configurator over the in-memory node database
//! - Notification recorders and DCD buffers

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use btmesh_conf::{
    ConfRequest, Config, Configurator, Error, Job, JobNotification, MemoryNodeDb, MeshEvent,
    MeshStack, Result, TaskResult,
};

/// A request as seen by the stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentRequest {
    pub enc_netkey_index: u16,
    pub server_address: u16,
    pub request: ConfRequest,
    pub handle: Option<u32>,
}

/// Mesh stack double.
///
/// Requests are accepted with increasing handles starting at 1 unless a
/// rejection was queued with [`RecordingStack::reject_next`].
#[derive(Debug, Default)]
pub struct RecordingStack {
    pub sent: Vec<SentRequest>,
    pub timeouts: Vec<(u32, u32)>,
    rejections: VecDeque<Error>,
    next_handle: u32,
}

impl RecordingStack {
    pub fn reject_next(&mut self, error: Error) {
        self.rejections.push_back(error);
    }

    /// Handle of the most recent accepted request.
    pub fn last_handle(&self) -> u32 {
        self.sent
            .iter()
            .rev()
            .find_map(|sent| sent.handle)
            .expect("no request was accepted")
    }

    pub fn requests(&self) -> Vec<ConfRequest> {
        self.sent.iter().map(|sent| sent.request.clone()).collect()
    }

    pub fn addresses(&self) -> Vec<u16> {
        self.sent.iter().map(|sent| sent.server_address).collect()
    }
}

impl MeshStack for RecordingStack {
    fn conf_request(
        &mut self,
        enc_netkey_index: u16,
        server_address: u16,
        request: &ConfRequest,
    ) -> Result<u32> {
        let outcome = match self.rejections.pop_front() {
            Some(error) => Err(error),
            None => {
                self.next_handle += 1;
                Ok(self.next_handle)
            }
        };
        self.sent.push(SentRequest {
            enc_netkey_index,
            server_address,
            request: request.clone(),
            handle: outcome.ok(),
        });
        outcome
    }

    fn set_default_timeout(&mut self, timeout_ms: u32, lpn_timeout_ms: u32) -> Result<()> {
        self.timeouts.push((timeout_ms, lpn_timeout_ms));
        Ok(())
    }
}

pub type TestConfigurator = Configurator<RecordingStack, MemoryNodeDb>;

/// A configurator brought up by the provisioning-initialized event.
pub fn configurator(config: Config) -> TestConfigurator {
    let mut conf = Configurator::new(config, RecordingStack::default(), MemoryNodeDb::new());
    conf.on_event(&MeshEvent::ProvInitialized {
        address: 0x0001,
        iv_index: 0,
    })
    .expect("configurator init failed");
    conf
}

/// Results reported by notification callbacks, in call order.
pub type Notifications = Rc<RefCell<Vec<(u16, TaskResult)>>>;

/// A callback that records `(server_address, result)` of every finished job.
pub fn recorder() -> (Notifications, JobNotification) {
    let seen: Notifications = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let callback: JobNotification = Box::new(move |job: &Job| {
        sink.borrow_mut().push((job.server_address(), job.result()));
    });
    (seen, callback)
}

/// Composition data with two elements.
///
/// Element 0 hosts the configuration server and a generic OnOff server,
/// element 1 hosts one vendor model. Feature bits: relay and proxy.
pub fn two_element_dcd() -> Vec<u8> {
    vec![
        // company 0x02FF, product 0x0001, version 0x0002, crpl 8, features
        0xFF, 0x02, 0x01, 0x00, 0x02, 0x00, 0x08, 0x00, 0x03, 0x00,
        // element 0: location 0x0100, 2 SIG models, 0 vendor models
        0x00, 0x01, 0x02, 0x00, 0x00, 0x00, 0x00, 0x10,
        // element 1: location 0x0101, 0 SIG models, 1 vendor model
        0x01, 0x01, 0x00, 0x01, 0xFF, 0x02, 0x34, 0x12,
    ]
}
