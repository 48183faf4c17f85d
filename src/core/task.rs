//! Configuration tasks.
//!
//! A task is one configuration operation against a remote node: it knows
//! which request to issue, which stack events answer it, and how to render
//! itself for diagnostics. Tasks are linked into a `TaskTree` and driven by
//! an executor.

use std::fmt;

use crate::error::{Error, StackResult};
use crate::mesh::db::NodeDatabase;
use crate::mesh::dcd;
use crate::mesh::event::MeshEvent;
use crate::mesh::stack::{ConfRequest, MeshStack, ModelTarget, Publication};
use crate::util;
use crate::{mlog_debug, mlog_error};

/// Largest number of appkey indices a list task accepts.
pub const MAX_APPKEY_COUNT: usize = 4096;
/// Largest number of subscription addresses a list task accepts.
pub const MAX_SUB_ADDRESS_COUNT: usize = 4096;

const UNKNOWN_U8: u8 = 0xFF;
const UNKNOWN_U16: u16 = 0xFFFF;

/// Kind of configuration operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskId {
    AppkeyAdd,
    AppkeyRemove,
    AppkeyList,
    ModelBind,
    ModelUnbind,
    ModelBindingsList,
    ModelPubSet,
    ModelPubGet,
    ModelSubAdd,
    ModelSubSet,
    ModelSubRemove,
    ModelSubClear,
    ModelSubList,
    DefaultTtlSet,
    DefaultTtlGet,
    GattProxySet,
    GattProxyGet,
    RelaySet,
    RelayGet,
    NetworkTransmitSet,
    NetworkTransmitGet,
    FriendSet,
    FriendGet,
    DcdGet,
    ResetNode,
}

/// Outcome of a task.
///
/// Starts as `Unknown` and never returns to it once set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskResult {
    #[default]
    Unknown,
    Ok,
    Failed(Error),
}

impl TaskResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, TaskResult::Ok)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, TaskResult::Unknown)
    }
}

impl From<StackResult> for TaskResult {
    fn from(result: StackResult) -> Self {
        match result {
            Ok(()) => TaskResult::Ok,
            Err(e) => TaskResult::Failed(e),
        }
    }
}

impl fmt::Display for TaskResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskResult::Unknown => write!(f, "unknown"),
            TaskResult::Ok => write!(f, "ok"),
            TaskResult::Failed(e) => write!(f, "{}", e),
        }
    }
}

/// What the caller should do after issuing a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Request accepted; wait for events carrying this handle.
    Accepted(u32),
    /// Stack out of resources; retry later.
    Busy,
    /// Request rejected for good.
    Failed,
}

/// What the caller should do after feeding an event to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    InProgress,
    Ok,
    /// The stack gave up waiting for the node. Terminal, but retryable.
    Timeout,
    Fail,
    /// Local failure; no further events are accepted.
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppkeyRef {
    pub appkey_index: u16,
    pub netkey_index: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppkeyList {
    pub netkey_index: u16,
    pub appkey_indices: Vec<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub target: ModelTarget,
    pub appkey_index: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingsList {
    pub target: ModelTarget,
    pub appkey_indices: Vec<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelPub {
    pub target: ModelTarget,
    pub publication: Publication,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelSub {
    pub target: ModelTarget,
    pub sub_address: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubsList {
    pub target: ModelTarget,
    pub addresses: Vec<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relay {
    pub value: u8,
    pub retransmit_count: u8,
    pub retransmit_interval_ms: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkTransmit {
    pub transmit_count: u8,
    pub transmit_interval_ms: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dcd {
    pub page: u8,
    /// Composition data collected from `DcdData` events.
    pub raw: Vec<u8>,
}

/// Parameters and collected values of each task kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskKind {
    AppkeyAdd(AppkeyRef),
    AppkeyRemove(AppkeyRef),
    AppkeyList(AppkeyList),
    ModelBind(Binding),
    ModelUnbind(Binding),
    ModelBindingsList(BindingsList),
    ModelPubSet(ModelPub),
    ModelPubGet(ModelPub),
    ModelSubAdd(ModelSub),
    ModelSubSet(ModelSub),
    ModelSubRemove(ModelSub),
    ModelSubClear(ModelTarget),
    ModelSubList(SubsList),
    DefaultTtlSet { ttl: u8 },
    DefaultTtlGet { ttl: u8 },
    GattProxySet { value: u8 },
    GattProxyGet { value: u8 },
    RelaySet(Relay),
    RelayGet(Relay),
    NetworkTransmitSet(NetworkTransmit),
    NetworkTransmitGet(NetworkTransmit),
    FriendSet { value: u8 },
    FriendGet { value: u8 },
    DcdGet(Dcd),
    ResetNode,
}

/// A single configuration operation and its result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    kind: TaskKind,
    result: TaskResult,
}

impl Task {
    pub fn new(kind: TaskKind) -> Self {
        Self {
            kind,
            result: TaskResult::Unknown,
        }
    }

    pub fn appkey_add(appkey_index: u16, netkey_index: u16) -> Self {
        Self::new(TaskKind::AppkeyAdd(AppkeyRef {
            appkey_index,
            netkey_index,
        }))
    }

    pub fn appkey_remove(appkey_index: u16, netkey_index: u16) -> Self {
        Self::new(TaskKind::AppkeyRemove(AppkeyRef {
            appkey_index,
            netkey_index,
        }))
    }

    pub fn appkey_list(netkey_index: u16) -> Self {
        Self::new(TaskKind::AppkeyList(AppkeyList {
            netkey_index,
            appkey_indices: Vec::new(),
        }))
    }

    pub fn model_bind(target: ModelTarget, appkey_index: u16) -> Self {
        Self::new(TaskKind::ModelBind(Binding {
            target,
            appkey_index,
        }))
    }

    pub fn model_unbind(target: ModelTarget, appkey_index: u16) -> Self {
        Self::new(TaskKind::ModelUnbind(Binding {
            target,
            appkey_index,
        }))
    }

    pub fn model_bindings_list(target: ModelTarget) -> Self {
        Self::new(TaskKind::ModelBindingsList(BindingsList {
            target,
            appkey_indices: Vec::new(),
        }))
    }

    pub fn model_pub_set(target: ModelTarget, publication: Publication) -> Self {
        Self::new(TaskKind::ModelPubSet(ModelPub {
            target,
            publication,
        }))
    }

    pub fn model_pub_get(target: ModelTarget) -> Self {
        Self::new(TaskKind::ModelPubGet(ModelPub {
            target,
            publication: Publication::UNKNOWN,
        }))
    }

    pub fn model_sub_add(target: ModelTarget, sub_address: u16) -> Self {
        Self::new(TaskKind::ModelSubAdd(ModelSub { target, sub_address }))
    }

    pub fn model_sub_set(target: ModelTarget, sub_address: u16) -> Self {
        Self::new(TaskKind::ModelSubSet(ModelSub { target, sub_address }))
    }

    pub fn model_sub_remove(target: ModelTarget, sub_address: u16) -> Self {
        Self::new(TaskKind::ModelSubRemove(ModelSub { target, sub_address }))
    }

    pub fn model_sub_clear(target: ModelTarget) -> Self {
        Self::new(TaskKind::ModelSubClear(target))
    }

    pub fn model_sub_list(target: ModelTarget) -> Self {
        Self::new(TaskKind::ModelSubList(SubsList {
            target,
            addresses: Vec::new(),
        }))
    }

    pub fn default_ttl_set(ttl: u8) -> Self {
        Self::new(TaskKind::DefaultTtlSet { ttl })
    }

    pub fn default_ttl_get() -> Self {
        Self::new(TaskKind::DefaultTtlGet { ttl: UNKNOWN_U8 })
    }

    pub fn gatt_proxy_set(value: u8) -> Self {
        Self::new(TaskKind::GattProxySet { value })
    }

    pub fn gatt_proxy_get() -> Self {
        Self::new(TaskKind::GattProxyGet { value: UNKNOWN_U8 })
    }

    pub fn relay_set(value: u8, retransmit_count: u8, retransmit_interval_ms: u16) -> Self {
        Self::new(TaskKind::RelaySet(Relay {
            value,
            retransmit_count,
            retransmit_interval_ms,
        }))
    }

    pub fn relay_get() -> Self {
        Self::new(TaskKind::RelayGet(Relay {
            value: UNKNOWN_U8,
            retransmit_count: UNKNOWN_U8,
            retransmit_interval_ms: UNKNOWN_U16,
        }))
    }

    pub fn network_transmit_set(transmit_count: u8, transmit_interval_ms: u16) -> Self {
        Self::new(TaskKind::NetworkTransmitSet(NetworkTransmit {
            transmit_count,
            transmit_interval_ms,
        }))
    }

    pub fn network_transmit_get() -> Self {
        Self::new(TaskKind::NetworkTransmitGet(NetworkTransmit {
            transmit_count: UNKNOWN_U8,
            transmit_interval_ms: UNKNOWN_U16,
        }))
    }

    pub fn friend_set(value: u8) -> Self {
        Self::new(TaskKind::FriendSet { value })
    }

    pub fn friend_get() -> Self {
        Self::new(TaskKind::FriendGet { value: UNKNOWN_U8 })
    }

    pub fn dcd_get(page: u8) -> Self {
        Self::new(TaskKind::DcdGet(Dcd {
            page,
            raw: Vec::new(),
        }))
    }

    pub fn reset_node() -> Self {
        Self::new(TaskKind::ResetNode)
    }

    pub fn id(&self) -> TaskId {
        match &self.kind {
            TaskKind::AppkeyAdd(_) => TaskId::AppkeyAdd,
            TaskKind::AppkeyRemove(_) => TaskId::AppkeyRemove,
            TaskKind::AppkeyList(_) => TaskId::AppkeyList,
            TaskKind::ModelBind(_) => TaskId::ModelBind,
            TaskKind::ModelUnbind(_) => TaskId::ModelUnbind,
            TaskKind::ModelBindingsList(_) => TaskId::ModelBindingsList,
            TaskKind::ModelPubSet(_) => TaskId::ModelPubSet,
            TaskKind::ModelPubGet(_) => TaskId::ModelPubGet,
            TaskKind::ModelSubAdd(_) => TaskId::ModelSubAdd,
            TaskKind::ModelSubSet(_) => TaskId::ModelSubSet,
            TaskKind::ModelSubRemove(_) => TaskId::ModelSubRemove,
            TaskKind::ModelSubClear(_) => TaskId::ModelSubClear,
            TaskKind::ModelSubList(_) => TaskId::ModelSubList,
            TaskKind::DefaultTtlSet { .. } => TaskId::DefaultTtlSet,
            TaskKind::DefaultTtlGet { .. } => TaskId::DefaultTtlGet,
            TaskKind::GattProxySet { .. } => TaskId::GattProxySet,
            TaskKind::GattProxyGet { .. } => TaskId::GattProxyGet,
            TaskKind::RelaySet(_) => TaskId::RelaySet,
            TaskKind::RelayGet(_) => TaskId::RelayGet,
            TaskKind::NetworkTransmitSet(_) => TaskId::NetworkTransmitSet,
            TaskKind::NetworkTransmitGet(_) => TaskId::NetworkTransmitGet,
            TaskKind::FriendSet { .. } => TaskId::FriendSet,
            TaskKind::FriendGet { .. } => TaskId::FriendGet,
            TaskKind::DcdGet(_) => TaskId::DcdGet,
            TaskKind::ResetNode => TaskId::ResetNode,
        }
    }

    pub fn kind(&self) -> &TaskKind {
        &self.kind
    }

    pub fn result(&self) -> TaskResult {
        self.result
    }

    /// Record a final result. There is no way back to `Unknown`.
    pub fn set_result(&mut self, result: StackResult) {
        self.result = result.into();
    }

    /// Values collected by a list task so far.
    pub fn collected(&self) -> Option<&[u16]> {
        match &self.kind {
            TaskKind::AppkeyList(list) => Some(&list.appkey_indices),
            TaskKind::ModelBindingsList(list) => Some(&list.appkey_indices),
            TaskKind::ModelSubList(list) => Some(&list.addresses),
            _ => None,
        }
    }

    /// Raw composition data collected by a DCD get task so far.
    pub fn raw_dcd(&self) -> Option<&[u8]> {
        match &self.kind {
            TaskKind::DcdGet(dcd) => Some(&dcd.raw),
            _ => None,
        }
    }

    /// Issue this task's request to the stack.
    ///
    /// Anything collected by an earlier attempt is dropped first. On
    /// rejection the task result is set to the stack's status.
    pub fn request(
        &mut self,
        stack: &mut dyn MeshStack,
        enc_netkey_index: u16,
        server_address: u16,
    ) -> RequestOutcome {
        self.reset_collected();
        let request = self.conf_request();
        mlog_debug!(
            "Config task request (nwkey={},addr=0x{:04x}): {}",
            enc_netkey_index,
            server_address,
            self
        );

        match stack.conf_request(enc_netkey_index, server_address, &request) {
            Ok(handle) => RequestOutcome::Accepted(handle),
            Err(e) => {
                self.result = TaskResult::Failed(e);
                match e {
                    Error::NoMoreResource => RequestOutcome::Busy,
                    _ => RequestOutcome::Failed,
                }
            }
        }
    }

    /// Feed a stack event that carries this task's request handle.
    ///
    /// Events of a kind the task does not wait for leave it untouched and
    /// report `InProgress`.
    pub fn on_event(
        &mut self,
        db: &mut dyn NodeDatabase,
        enc_netkey_index: u16,
        server_address: u16,
        event: &MeshEvent,
    ) -> EventOutcome {
        let Task { kind, result: slot } = self;

        match (kind, event) {
            (
                TaskKind::AppkeyAdd(_) | TaskKind::AppkeyRemove(_),
                MeshEvent::AppkeyStatus { result, .. },
            ) => finish(slot, *result),

            (TaskKind::AppkeyList(list), MeshEvent::AppkeyList { appkey_indices, .. }) => collect(
                slot,
                &mut list.appkey_indices,
                MAX_APPKEY_COUNT,
                appkey_indices,
                (enc_netkey_index, server_address),
                "appkeys from appkey list",
            ),
            (TaskKind::AppkeyList(_), MeshEvent::AppkeyListEnd { result, .. }) => {
                finish(slot, *result)
            }

            (
                TaskKind::ModelBind(_) | TaskKind::ModelUnbind(_),
                MeshEvent::BindingStatus { result, .. },
            ) => finish(slot, *result),

            (
                TaskKind::ModelBindingsList(list),
                MeshEvent::BindingsList { appkey_indices, .. },
            ) => collect(
                slot,
                &mut list.appkey_indices,
                MAX_APPKEY_COUNT,
                appkey_indices,
                (enc_netkey_index, server_address),
                "appkeys from bindings list",
            ),
            (TaskKind::ModelBindingsList(_), MeshEvent::BindingsListEnd { result, .. }) => {
                finish(slot, *result)
            }

            (TaskKind::ModelPubSet(_), MeshEvent::ModelPubStatus { result, .. }) => {
                finish(slot, *result)
            }
            (
                TaskKind::ModelPubGet(model_pub),
                MeshEvent::ModelPubStatus {
                    result,
                    address,
                    appkey_index,
                    credentials,
                    ttl,
                    period_ms,
                    retransmit_count,
                    retransmit_interval_ms,
                    ..
                },
            ) => {
                if result.is_ok() {
                    model_pub.publication = Publication {
                        address: *address,
                        appkey_index: *appkey_index,
                        credentials: *credentials,
                        ttl: *ttl,
                        period_ms: *period_ms,
                        retransmit_count: *retransmit_count,
                        retransmit_interval_ms: *retransmit_interval_ms,
                    };
                }
                finish(slot, *result)
            }

            (
                TaskKind::ModelSubAdd(_)
                | TaskKind::ModelSubSet(_)
                | TaskKind::ModelSubRemove(_)
                | TaskKind::ModelSubClear(_),
                MeshEvent::ModelSubStatus { result, .. },
            ) => finish(slot, *result),

            (TaskKind::ModelSubList(list), MeshEvent::SubsList { addresses, .. }) => collect(
                slot,
                &mut list.addresses,
                MAX_SUB_ADDRESS_COUNT,
                addresses,
                (enc_netkey_index, server_address),
                "addresses from subs list",
            ),
            (TaskKind::ModelSubList(_), MeshEvent::SubsListEnd { result, .. }) => {
                finish(slot, *result)
            }

            (TaskKind::DefaultTtlSet { .. }, MeshEvent::DefaultTtlStatus { result, .. }) => {
                finish(slot, *result)
            }
            (TaskKind::DefaultTtlGet { ttl }, MeshEvent::DefaultTtlStatus { result, value, .. }) => {
                if result.is_ok() {
                    *ttl = *value;
                }
                finish(slot, *result)
            }

            (TaskKind::GattProxySet { .. }, MeshEvent::GattProxyStatus { result, .. }) => {
                finish(slot, *result)
            }
            (
                TaskKind::GattProxyGet { value: stored },
                MeshEvent::GattProxyStatus { result, value, .. },
            ) => {
                if result.is_ok() {
                    *stored = *value;
                }
                finish(slot, *result)
            }

            (TaskKind::RelaySet(_), MeshEvent::RelayStatus { result, .. }) => finish(slot, *result),
            (
                TaskKind::RelayGet(relay),
                MeshEvent::RelayStatus {
                    result,
                    relay: value,
                    retransmit_count,
                    retransmit_interval_ms,
                    ..
                },
            ) => {
                if result.is_ok() {
                    *relay = Relay {
                        value: *value,
                        retransmit_count: *retransmit_count,
                        retransmit_interval_ms: *retransmit_interval_ms,
                    };
                }
                finish(slot, *result)
            }

            (TaskKind::NetworkTransmitSet(_), MeshEvent::NetworkTransmitStatus { result, .. }) => {
                finish(slot, *result)
            }
            (
                TaskKind::NetworkTransmitGet(transmit),
                MeshEvent::NetworkTransmitStatus {
                    result,
                    transmit_count,
                    transmit_interval_ms,
                    ..
                },
            ) => {
                if result.is_ok() {
                    *transmit = NetworkTransmit {
                        transmit_count: *transmit_count,
                        transmit_interval_ms: *transmit_interval_ms,
                    };
                }
                finish(slot, *result)
            }

            (TaskKind::FriendSet { .. }, MeshEvent::FriendStatus { result, .. }) => {
                finish(slot, *result)
            }
            (
                TaskKind::FriendGet { value: stored },
                MeshEvent::FriendStatus { result, value, .. },
            ) => {
                if result.is_ok() {
                    *stored = *value;
                }
                finish(slot, *result)
            }

            (TaskKind::DcdGet(dcd), MeshEvent::DcdData { data, .. }) => {
                if dcd.raw.try_reserve(data.len()).is_err() {
                    mlog_error!(
                        "Node (netkey_idx={},addr=0x{:04x}) DCD buffer allocation failed",
                        enc_netkey_index,
                        server_address
                    );
                    *slot = TaskResult::Failed(Error::AllocationFailed);
                    return EventOutcome::Abort;
                }
                dcd.raw.extend_from_slice(data);
                EventOutcome::InProgress
            }
            (TaskKind::DcdGet(dcd), MeshEvent::DcdDataEnd { result, .. }) => {
                let outcome = finish(slot, *result);
                if result.is_err() {
                    return outcome;
                }
                let processed = dcd::process_dcd(db, enc_netkey_index, server_address, &dcd.raw);
                *slot = processed.into();
                if processed.is_ok() {
                    EventOutcome::Ok
                } else {
                    EventOutcome::Fail
                }
            }

            (TaskKind::ResetNode, MeshEvent::ResetStatus { result, .. }) => finish(slot, *result),

            _ => EventOutcome::InProgress,
        }
    }

    /// Render into `buf` with `snprintf` semantics.
    ///
    /// Returns the length the full text needs. Pass an empty buffer to
    /// learn the size, then call again.
    pub fn to_string_bounded(&self, buf: &mut [u8]) -> usize {
        util::format_bounded(buf, format_args!("{}", self))
    }

    fn reset_collected(&mut self) {
        match &mut self.kind {
            TaskKind::AppkeyList(list) => list.appkey_indices = Vec::new(),
            TaskKind::ModelBindingsList(list) => list.appkey_indices = Vec::new(),
            TaskKind::ModelSubList(list) => list.addresses = Vec::new(),
            TaskKind::DcdGet(dcd) => dcd.raw = Vec::new(),
            _ => {}
        }
    }

    fn conf_request(&self) -> ConfRequest {
        match &self.kind {
            TaskKind::AppkeyAdd(key) => ConfRequest::AddAppkey {
                appkey_index: key.appkey_index,
                netkey_index: key.netkey_index,
            },
            TaskKind::AppkeyRemove(key) => ConfRequest::RemoveAppkey {
                appkey_index: key.appkey_index,
                netkey_index: key.netkey_index,
            },
            TaskKind::AppkeyList(list) => ConfRequest::ListAppkeys {
                netkey_index: list.netkey_index,
            },
            TaskKind::ModelBind(b) => ConfRequest::BindModel {
                target: b.target,
                appkey_index: b.appkey_index,
            },
            TaskKind::ModelUnbind(b) => ConfRequest::UnbindModel {
                target: b.target,
                appkey_index: b.appkey_index,
            },
            TaskKind::ModelBindingsList(list) => ConfRequest::ListBindings {
                target: list.target,
            },
            TaskKind::ModelPubSet(p) => ConfRequest::SetModelPub {
                target: p.target,
                publication: p.publication,
            },
            TaskKind::ModelPubGet(p) => ConfRequest::GetModelPub { target: p.target },
            TaskKind::ModelSubAdd(s) => ConfRequest::AddModelSub {
                target: s.target,
                sub_address: s.sub_address,
            },
            TaskKind::ModelSubSet(s) => ConfRequest::SetModelSub {
                target: s.target,
                sub_address: s.sub_address,
            },
            TaskKind::ModelSubRemove(s) => ConfRequest::RemoveModelSub {
                target: s.target,
                sub_address: s.sub_address,
            },
            TaskKind::ModelSubClear(target) => ConfRequest::ClearModelSub { target: *target },
            TaskKind::ModelSubList(list) => ConfRequest::ListSubs {
                target: list.target,
            },
            TaskKind::DefaultTtlSet { ttl } => ConfRequest::SetDefaultTtl { value: *ttl },
            TaskKind::DefaultTtlGet { .. } => ConfRequest::GetDefaultTtl,
            TaskKind::GattProxySet { value } => ConfRequest::SetGattProxy { value: *value },
            TaskKind::GattProxyGet { .. } => ConfRequest::GetGattProxy,
            TaskKind::RelaySet(relay) => ConfRequest::SetRelay {
                value: relay.value,
                retransmit_count: relay.retransmit_count,
                retransmit_interval_ms: relay.retransmit_interval_ms,
            },
            TaskKind::RelayGet(_) => ConfRequest::GetRelay,
            TaskKind::NetworkTransmitSet(t) => ConfRequest::SetNetworkTransmit {
                transmit_count: t.transmit_count,
                transmit_interval_ms: t.transmit_interval_ms,
            },
            TaskKind::NetworkTransmitGet(_) => ConfRequest::GetNetworkTransmit,
            TaskKind::FriendSet { value } => ConfRequest::SetFriend { value: *value },
            TaskKind::FriendGet { .. } => ConfRequest::GetFriend,
            TaskKind::DcdGet(dcd) => ConfRequest::GetDcd { page: dcd.page },
            TaskKind::ResetNode => ConfRequest::ResetNode,
        }
    }
}

/// Store the result of a terminal event and map it for the executor.
fn finish(slot: &mut TaskResult, result: StackResult) -> EventOutcome {
    *slot = result.into();
    match result {
        Ok(()) => EventOutcome::Ok,
        Err(Error::Timeout) => EventOutcome::Timeout,
        Err(_) => EventOutcome::Fail,
    }
}

/// Append one list event's payload; aborts the task on failure.
fn collect(
    slot: &mut TaskResult,
    dest: &mut Vec<u16>,
    max_len: usize,
    data: &[u8],
    (enc_netkey_index, server_address): (u16, u16),
    what: &str,
) -> EventOutcome {
    match util::collect_u16_le(dest, max_len, data) {
        Ok(()) => EventOutcome::InProgress,
        Err(e) => {
            mlog_error!(
                "Node (netkey_idx={},addr=0x{:04x}) failed to collect {} event: {}",
                enc_netkey_index,
                server_address,
                what,
                e
            );
            *slot = TaskResult::Failed(e);
            EventOutcome::Abort
        }
    }
}

fn write_collected(
    f: &mut fmt::Formatter<'_>,
    count_label: &str,
    list_label: &str,
    values: &[u16],
    hex: bool,
) -> fmt::Result {
    write!(f, ",{}={}", count_label, values.len())?;
    if values.is_empty() {
        return write!(f, ")");
    }
    write!(f, ",{}=", list_label)?;
    for (idx, value) in values.iter().enumerate() {
        let sep = if idx + 1 == values.len() { ")" } else { "," };
        if hex {
            write!(f, "0x{:04x}{}", value, sep)?;
        } else {
            write!(f, "{}{}", value, sep)?;
        }
    }
    Ok(())
}

fn write_publication(f: &mut fmt::Formatter<'_>, p: &Publication) -> fmt::Result {
    write!(
        f,
        ",addr=0x{:04x},appkey_idx={},cred={},ttl={},period_ms={}ms,tx_cnt={},tx_interval_ms={})",
        p.address,
        p.appkey_index,
        p.credentials,
        p.ttl,
        p.period_ms,
        p.retransmit_count,
        p.retransmit_interval_ms
    )
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let done = self.result.is_ok();
        match &self.kind {
            TaskKind::AppkeyAdd(key) => write!(
                f,
                "appkey add (appkey_idx={},netkey_idx={})",
                key.appkey_index, key.netkey_index
            ),
            TaskKind::AppkeyRemove(key) => write!(
                f,
                "appkey remove (appkey_idx={},netkey_idx={})",
                key.appkey_index, key.netkey_index
            ),
            TaskKind::AppkeyList(list) => {
                write!(f, "appkey list (netkey_idx={}", list.netkey_index)?;
                if !done {
                    return write!(f, ")");
                }
                write_collected(f, "appkey_cnt", "appkey_idxs", &list.appkey_indices, false)
            }
            TaskKind::ModelBind(b) => {
                write!(f, "model bind ({},appkey_idx={})", b.target, b.appkey_index)
            }
            TaskKind::ModelUnbind(b) => {
                write!(f, "model unbind ({},appkey_idx={})", b.target, b.appkey_index)
            }
            TaskKind::ModelBindingsList(list) => {
                write!(f, "model bindings list ({}", list.target)?;
                if !done {
                    return write!(f, ")");
                }
                write_collected(f, "appkey_cnt", "appkey_idxs", &list.appkey_indices, false)
            }
            TaskKind::ModelPubSet(p) => {
                write!(f, "model pub set ({}", p.target)?;
                write_publication(f, &p.publication)
            }
            TaskKind::ModelPubGet(p) => {
                write!(f, "model pub get ({}", p.target)?;
                if !done {
                    return write!(f, ")");
                }
                write_publication(f, &p.publication)
            }
            TaskKind::ModelSubAdd(s) => write!(
                f,
                "model sub add ({},sub_addr=0x{:04x})",
                s.target, s.sub_address
            ),
            TaskKind::ModelSubSet(s) => write!(
                f,
                "model sub set ({},sub_addr=0x{:04x})",
                s.target, s.sub_address
            ),
            TaskKind::ModelSubRemove(s) => write!(
                f,
                "model sub remove ({},sub_addr=0x{:04x})",
                s.target, s.sub_address
            ),
            TaskKind::ModelSubClear(target) => write!(f, "model sub clear ({})", target),
            TaskKind::ModelSubList(list) => {
                write!(f, "model subs list ({}", list.target)?;
                if !done {
                    return write!(f, ")");
                }
                write_collected(f, "addr_cnt", "addrs", &list.addresses, true)
            }
            TaskKind::DefaultTtlSet { ttl } => write!(f, "default ttl set (ttl={})", ttl),
            TaskKind::DefaultTtlGet { ttl } if done => write!(f, "default ttl get (ttl={})", ttl),
            TaskKind::DefaultTtlGet { .. } => write!(f, "default ttl get"),
            TaskKind::GattProxySet { value } => write!(f, "gatt_proxy set (val={})", value),
            TaskKind::GattProxyGet { value } if done => write!(f, "gatt_proxy get (val={})", value),
            TaskKind::GattProxyGet { .. } => write!(f, "gatt_proxy get"),
            TaskKind::RelaySet(r) => write!(
                f,
                "relay set (val={},cnt={},interval={}ms)",
                r.value, r.retransmit_count, r.retransmit_interval_ms
            ),
            TaskKind::RelayGet(r) if done => write!(
                f,
                "relay get (val={},cnt={},interval={}ms)",
                r.value, r.retransmit_count, r.retransmit_interval_ms
            ),
            TaskKind::RelayGet(_) => write!(f, "relay get"),
            TaskKind::NetworkTransmitSet(t) => write!(
                f,
                "network transmit set (cnt={},interval={}ms)",
                t.transmit_count, t.transmit_interval_ms
            ),
            TaskKind::NetworkTransmitGet(t) if done => write!(
                f,
                "network transmit get (cnt={},interval={}ms)",
                t.transmit_count, t.transmit_interval_ms
            ),
            TaskKind::NetworkTransmitGet(_) => write!(f, "network transmit get"),
            TaskKind::FriendSet { value } => write!(f, "friend set (val={})", value),
            TaskKind::FriendGet { value } if done => write!(f, "friend get (val={})", value),
            TaskKind::FriendGet { .. } => write!(f, "friend get"),
            TaskKind::DcdGet(dcd) => write!(f, "DCD get (page={})", dcd.page),
            TaskKind::ResetNode => write!(f, "node reset"),
        }
    }
}
