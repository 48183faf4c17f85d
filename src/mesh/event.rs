//! Events delivered by the mesh stack.

use crate::error::{Error, Result, StackResult};
use crate::mlog_error;

/// Message type and device bits shared by every mesh stack event id.
const EVENT_ID_BASE: u32 = 0x0000_00A8;
const CLASS_SHIFT: u32 = 16;
const CLASS_MASK: u32 = 0x00FF_0000;
const INDEX_SHIFT: u32 = 24;

pub const PROV_CLASS: u8 = 0x15;
pub const CONFIG_CLIENT_CLASS: u8 = 0x27;

pub const fn event_id(class: u8, index: u8) -> u32 {
    EVENT_ID_BASE | (class as u32) << CLASS_SHIFT | (index as u32) << INDEX_SHIFT
}

pub const PROV_INITIALIZED_ID: u32 = event_id(PROV_CLASS, 0x00);

pub const REQUEST_MODIFIED_ID: u32 = event_id(CONFIG_CLIENT_CLASS, 0x00);
pub const NETKEY_STATUS_ID: u32 = event_id(CONFIG_CLIENT_CLASS, 0x01);
pub const NETKEY_LIST_ID: u32 = event_id(CONFIG_CLIENT_CLASS, 0x02);
pub const NETKEY_LIST_END_ID: u32 = event_id(CONFIG_CLIENT_CLASS, 0x03);
pub const APPKEY_STATUS_ID: u32 = event_id(CONFIG_CLIENT_CLASS, 0x04);
pub const APPKEY_LIST_ID: u32 = event_id(CONFIG_CLIENT_CLASS, 0x05);
pub const APPKEY_LIST_END_ID: u32 = event_id(CONFIG_CLIENT_CLASS, 0x06);
pub const BINDING_STATUS_ID: u32 = event_id(CONFIG_CLIENT_CLASS, 0x07);
pub const BINDINGS_LIST_ID: u32 = event_id(CONFIG_CLIENT_CLASS, 0x08);
pub const BINDINGS_LIST_END_ID: u32 = event_id(CONFIG_CLIENT_CLASS, 0x09);
pub const MODEL_PUB_STATUS_ID: u32 = event_id(CONFIG_CLIENT_CLASS, 0x0A);
pub const MODEL_SUB_STATUS_ID: u32 = event_id(CONFIG_CLIENT_CLASS, 0x0B);
pub const SUBS_LIST_ID: u32 = event_id(CONFIG_CLIENT_CLASS, 0x0C);
pub const SUBS_LIST_END_ID: u32 = event_id(CONFIG_CLIENT_CLASS, 0x0D);
pub const HEARTBEAT_PUB_STATUS_ID: u32 = event_id(CONFIG_CLIENT_CLASS, 0x0E);
pub const HEARTBEAT_SUB_STATUS_ID: u32 = event_id(CONFIG_CLIENT_CLASS, 0x0F);
pub const BEACON_STATUS_ID: u32 = event_id(CONFIG_CLIENT_CLASS, 0x10);
pub const DEFAULT_TTL_STATUS_ID: u32 = event_id(CONFIG_CLIENT_CLASS, 0x11);
pub const GATT_PROXY_STATUS_ID: u32 = event_id(CONFIG_CLIENT_CLASS, 0x12);
pub const RELAY_STATUS_ID: u32 = event_id(CONFIG_CLIENT_CLASS, 0x13);
pub const NETWORK_TRANSMIT_STATUS_ID: u32 = event_id(CONFIG_CLIENT_CLASS, 0x14);
pub const IDENTITY_STATUS_ID: u32 = event_id(CONFIG_CLIENT_CLASS, 0x15);
pub const FRIEND_STATUS_ID: u32 = event_id(CONFIG_CLIENT_CLASS, 0x16);
pub const KEY_REFRESH_PHASE_STATUS_ID: u32 = event_id(CONFIG_CLIENT_CLASS, 0x17);
pub const LPN_POLLTIMEOUT_STATUS_ID: u32 = event_id(CONFIG_CLIENT_CLASS, 0x18);
pub const DCD_DATA_ID: u32 = event_id(CONFIG_CLIENT_CLASS, 0x19);
pub const DCD_DATA_END_ID: u32 = event_id(CONFIG_CLIENT_CLASS, 0x1A);
pub const RESET_STATUS_ID: u32 = event_id(CONFIG_CLIENT_CLASS, 0x1B);

/// A single event from the mesh stack.
///
/// Configuration client events carry the `handle` returned by the request
/// they answer. Terminal events carry the outcome of that request in `result`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeshEvent {
    ProvInitialized { address: u16, iv_index: u32 },
    RequestModified { handle: u32 },
    NetkeyStatus { handle: u32, result: StackResult },
    NetkeyList { handle: u32, netkey_indices: Vec<u8> },
    NetkeyListEnd { handle: u32, result: StackResult },
    AppkeyStatus { handle: u32, result: StackResult },
    AppkeyList { handle: u32, appkey_indices: Vec<u8> },
    AppkeyListEnd { handle: u32, result: StackResult },
    BindingStatus { handle: u32, result: StackResult },
    BindingsList { handle: u32, appkey_indices: Vec<u8> },
    BindingsListEnd { handle: u32, result: StackResult },
    ModelPubStatus {
        handle: u32,
        result: StackResult,
        address: u16,
        appkey_index: u16,
        credentials: u8,
        ttl: u8,
        period_ms: u32,
        retransmit_count: u8,
        retransmit_interval_ms: u16,
    },
    ModelSubStatus { handle: u32, result: StackResult },
    SubsList { handle: u32, addresses: Vec<u8> },
    SubsListEnd { handle: u32, result: StackResult },
    HeartbeatPubStatus { handle: u32, result: StackResult },
    HeartbeatSubStatus { handle: u32, result: StackResult },
    BeaconStatus { handle: u32, result: StackResult, value: u8 },
    DefaultTtlStatus { handle: u32, result: StackResult, value: u8 },
    GattProxyStatus { handle: u32, result: StackResult, value: u8 },
    RelayStatus {
        handle: u32,
        result: StackResult,
        relay: u8,
        retransmit_count: u8,
        retransmit_interval_ms: u16,
    },
    NetworkTransmitStatus {
        handle: u32,
        result: StackResult,
        transmit_count: u8,
        transmit_interval_ms: u16,
    },
    IdentityStatus { handle: u32, result: StackResult, value: u8 },
    FriendStatus { handle: u32, result: StackResult, value: u8 },
    KeyRefreshPhaseStatus { handle: u32, result: StackResult, phase: u8 },
    LpnPolltimeoutStatus { handle: u32, result: StackResult, poll_timeout_ms: u32 },
    DcdData { handle: u32, page: u8, data: Vec<u8> },
    DcdDataEnd { handle: u32, result: StackResult },
    ResetStatus { handle: u32, result: StackResult },
    /// Any event the configurator does not interpret.
    Other { id: u32 },
}

impl MeshEvent {
    /// Stack message id of this event.
    pub fn id(&self) -> u32 {
        match self {
            MeshEvent::ProvInitialized { .. } => PROV_INITIALIZED_ID,
            MeshEvent::RequestModified { .. } => REQUEST_MODIFIED_ID,
            MeshEvent::NetkeyStatus { .. } => NETKEY_STATUS_ID,
            MeshEvent::NetkeyList { .. } => NETKEY_LIST_ID,
            MeshEvent::NetkeyListEnd { .. } => NETKEY_LIST_END_ID,
            MeshEvent::AppkeyStatus { .. } => APPKEY_STATUS_ID,
            MeshEvent::AppkeyList { .. } => APPKEY_LIST_ID,
            MeshEvent::AppkeyListEnd { .. } => APPKEY_LIST_END_ID,
            MeshEvent::BindingStatus { .. } => BINDING_STATUS_ID,
            MeshEvent::BindingsList { .. } => BINDINGS_LIST_ID,
            MeshEvent::BindingsListEnd { .. } => BINDINGS_LIST_END_ID,
            MeshEvent::ModelPubStatus { .. } => MODEL_PUB_STATUS_ID,
            MeshEvent::ModelSubStatus { .. } => MODEL_SUB_STATUS_ID,
            MeshEvent::SubsList { .. } => SUBS_LIST_ID,
            MeshEvent::SubsListEnd { .. } => SUBS_LIST_END_ID,
            MeshEvent::HeartbeatPubStatus { .. } => HEARTBEAT_PUB_STATUS_ID,
            MeshEvent::HeartbeatSubStatus { .. } => HEARTBEAT_SUB_STATUS_ID,
            MeshEvent::BeaconStatus { .. } => BEACON_STATUS_ID,
            MeshEvent::DefaultTtlStatus { .. } => DEFAULT_TTL_STATUS_ID,
            MeshEvent::GattProxyStatus { .. } => GATT_PROXY_STATUS_ID,
            MeshEvent::RelayStatus { .. } => RELAY_STATUS_ID,
            MeshEvent::NetworkTransmitStatus { .. } => NETWORK_TRANSMIT_STATUS_ID,
            MeshEvent::IdentityStatus { .. } => IDENTITY_STATUS_ID,
            MeshEvent::FriendStatus { .. } => FRIEND_STATUS_ID,
            MeshEvent::KeyRefreshPhaseStatus { .. } => KEY_REFRESH_PHASE_STATUS_ID,
            MeshEvent::LpnPolltimeoutStatus { .. } => LPN_POLLTIMEOUT_STATUS_ID,
            MeshEvent::DcdData { .. } => DCD_DATA_ID,
            MeshEvent::DcdDataEnd { .. } => DCD_DATA_END_ID,
            MeshEvent::ResetStatus { .. } => RESET_STATUS_ID,
            MeshEvent::Other { id } => *id,
        }
    }
}

/// Whether `event_id` belongs to the configuration client class.
pub fn is_configuration_event(event_id: u32) -> bool {
    (event_id & CLASS_MASK) == (CONFIG_CLIENT_CLASS as u32) << CLASS_SHIFT
}

/// Extract the request handle a configuration client event refers to.
///
/// # Errors
/// `NotFound` if the event is not a configuration client event. An id of
/// the configuration client class that no variant models is a programming
/// error and trips a debug assertion.
pub fn handle_from_event(event: &MeshEvent) -> Result<u32> {
    let handle = match event {
        MeshEvent::RequestModified { handle }
        | MeshEvent::NetkeyStatus { handle, .. }
        | MeshEvent::NetkeyList { handle, .. }
        | MeshEvent::NetkeyListEnd { handle, .. }
        | MeshEvent::AppkeyStatus { handle, .. }
        | MeshEvent::AppkeyList { handle, .. }
        | MeshEvent::AppkeyListEnd { handle, .. }
        | MeshEvent::BindingStatus { handle, .. }
        | MeshEvent::BindingsList { handle, .. }
        | MeshEvent::BindingsListEnd { handle, .. }
        | MeshEvent::ModelPubStatus { handle, .. }
        | MeshEvent::ModelSubStatus { handle, .. }
        | MeshEvent::SubsList { handle, .. }
        | MeshEvent::SubsListEnd { handle, .. }
        | MeshEvent::HeartbeatPubStatus { handle, .. }
        | MeshEvent::HeartbeatSubStatus { handle, .. }
        | MeshEvent::BeaconStatus { handle, .. }
        | MeshEvent::DefaultTtlStatus { handle, .. }
        | MeshEvent::GattProxyStatus { handle, .. }
        | MeshEvent::RelayStatus { handle, .. }
        | MeshEvent::NetworkTransmitStatus { handle, .. }
        | MeshEvent::IdentityStatus { handle, .. }
        | MeshEvent::FriendStatus { handle, .. }
        | MeshEvent::KeyRefreshPhaseStatus { handle, .. }
        | MeshEvent::LpnPolltimeoutStatus { handle, .. }
        | MeshEvent::DcdData { handle, .. }
        | MeshEvent::DcdDataEnd { handle, .. }
        | MeshEvent::ResetStatus { handle, .. } => *handle,
        MeshEvent::ProvInitialized { .. } => return Err(Error::NotFound),
        MeshEvent::Other { id } => {
            if is_configuration_event(*id) {
                mlog_error!("Unknown configuration client event 0x{:08x}", id);
                debug_assert!(false, "unknown configuration client event 0x{:08x}", id);
            }
            return Err(Error::NotFound);
        }
    };
    Ok(handle)
}
