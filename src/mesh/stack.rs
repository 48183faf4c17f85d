//! Request seam towards the mesh stack's configuration client.

use crate::error::Result;

/// Vendor id used for Bluetooth SIG defined models.
pub const SIG_VENDOR_ID: u16 = 0xFFFF;

/// A model on a remote node, addressed by element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelTarget {
    pub elem_index: u8,
    pub vendor_id: u16,
    pub model_id: u16,
}

impl ModelTarget {
    pub fn sig(elem_index: u8, model_id: u16) -> Self {
        Self {
            elem_index,
            vendor_id: SIG_VENDOR_ID,
            model_id,
        }
    }

    pub fn vendor(elem_index: u8, vendor_id: u16, model_id: u16) -> Self {
        Self {
            elem_index,
            vendor_id,
            model_id,
        }
    }
}

impl std::fmt::Display for ModelTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "elem={},vendor=0x{:04x},model=0x{:04x}",
            self.elem_index, self.vendor_id, self.model_id
        )
    }
}

/// Model publication parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Publication {
    pub address: u16,
    pub appkey_index: u16,
    pub credentials: u8,
    pub ttl: u8,
    pub period_ms: u32,
    pub retransmit_count: u8,
    pub retransmit_interval_ms: u16,
}

impl Publication {
    /// Placeholder values held until a publication status is received.
    pub const UNKNOWN: Publication = Publication {
        address: 0xFFFF,
        appkey_index: 0xFFFF,
        credentials: 0xFF,
        ttl: 0xFF,
        period_ms: u32::MAX,
        retransmit_count: 0xFF,
        retransmit_interval_ms: 0xFFFF,
    };
}

/// One configuration client request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfRequest {
    AddAppkey { appkey_index: u16, netkey_index: u16 },
    RemoveAppkey { appkey_index: u16, netkey_index: u16 },
    ListAppkeys { netkey_index: u16 },
    BindModel { target: ModelTarget, appkey_index: u16 },
    UnbindModel { target: ModelTarget, appkey_index: u16 },
    ListBindings { target: ModelTarget },
    SetModelPub { target: ModelTarget, publication: Publication },
    GetModelPub { target: ModelTarget },
    AddModelSub { target: ModelTarget, sub_address: u16 },
    SetModelSub { target: ModelTarget, sub_address: u16 },
    RemoveModelSub { target: ModelTarget, sub_address: u16 },
    ClearModelSub { target: ModelTarget },
    ListSubs { target: ModelTarget },
    SetDefaultTtl { value: u8 },
    GetDefaultTtl,
    SetGattProxy { value: u8 },
    GetGattProxy,
    SetRelay { value: u8, retransmit_count: u8, retransmit_interval_ms: u16 },
    GetRelay,
    SetNetworkTransmit { transmit_count: u8, transmit_interval_ms: u16 },
    GetNetworkTransmit,
    SetFriend { value: u8 },
    GetFriend,
    GetDcd { page: u8 },
    ResetNode,
}

/// Configuration client API of the mesh stack.
///
/// Calls return immediately. Progress is reported later through
/// `MeshEvent`s carrying the returned handle.
pub trait MeshStack {
    /// Issue `request` to the node at `server_address`.
    ///
    /// # Errors
    /// `NoMoreResource` when the stack cannot take another request right
    /// now. Any other error rejects the request for good.
    fn conf_request(
        &mut self,
        enc_netkey_index: u16,
        server_address: u16,
        request: &ConfRequest,
    ) -> Result<u32>;

    /// Configure how long the stack waits for a status from regular and
    /// low power nodes.
    fn set_default_timeout(&mut self, timeout_ms: u32, lpn_timeout_ms: u32) -> Result<()>;
}
