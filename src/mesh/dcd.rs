//! Device Composition Data wire format.
//!
//! A raw composition page is a fixed 10 byte header followed by a sequence
//! of elements:
//!
//! ```text
//! header:  cid(2) pid(2) vid(2) crpl(2) features(2)
//! element: location(2) num_sig(1) num_vendor(1)
//!          num_sig * sig_model_id(2)
//!          num_vendor * (vendor_id(2) model_id(2))
//! ```
//!
//! All multi-byte fields are little endian. The elements must account for
//! every remaining byte.

use crate::error::{Error, Result};
use crate::log::{self, LogLevel};
use crate::mesh::db::{ModelId, NodeDatabase};
use crate::mesh::models;
use crate::mesh::stack::SIG_VENDOR_ID;
use crate::util::read_u16_le;
use crate::{mlog, mlog_error};

pub const DCD_HEADER_SIZE: usize = 10;
pub const ELEMENT_HEADER_SIZE: usize = 4;
pub const SIG_MODEL_SIZE: usize = 2;
pub const VENDOR_MODEL_SIZE: usize = 4;

const FEATURE_RELAY: u8 = 0x01;
const FEATURE_PROXY: u8 = 0x02;
const FEATURE_FRIEND: u8 = 0x04;
const FEATURE_LOW_POWER: u8 = 0x08;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DcdHeader {
    pub company_id: u16,
    pub product_id: u16,
    pub version_id: u16,
    pub min_replay_prot_list_len: u16,
    pub feature_relay: bool,
    pub feature_proxy: bool,
    pub feature_friend: bool,
    pub feature_low_power: bool,
}

impl DcdHeader {
    /// Parse the header at the start of `raw`.
    ///
    /// # Errors
    /// `InvalidCount` if `raw` is shorter than the header.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        if raw.len() < DCD_HEADER_SIZE {
            return Err(Error::InvalidCount);
        }
        let field = |offset| read_u16_le(raw, offset).ok_or(Error::InvalidCount);
        let features = raw[8];
        Ok(Self {
            company_id: field(0)?,
            product_id: field(2)?,
            version_id: field(4)?,
            min_replay_prot_list_len: field(6)?,
            feature_relay: features & FEATURE_RELAY != 0,
            feature_proxy: features & FEATURE_PROXY != 0,
            feature_friend: features & FEATURE_FRIEND != 0,
            feature_low_power: features & FEATURE_LOW_POWER != 0,
        })
    }
}

/// What a pass over the elements does.
pub enum ElementPass<'a> {
    /// Only verify that every element fits in the buffer.
    CheckSize,
    /// Register elements and models with the node database.
    UpdateDb(&'a mut dyn NodeDatabase),
}

/// Walk the elements of `raw` (header included).
///
/// # Errors
/// `InvalidCount` on a length mismatch. In `UpdateDb` mode, the first
/// failing database call is returned as is.
pub fn iterate_elements(
    enc_netkey_index: u16,
    server_address: u16,
    raw: &[u8],
    mut pass: ElementPass<'_>,
) -> Result<()> {
    if raw.len() < DCD_HEADER_SIZE {
        return Err(Error::InvalidCount);
    }
    let node_str = node_label(enc_netkey_index, server_address);
    let mut offset = DCD_HEADER_SIZE;
    let mut element_index: u16 = 0;

    while offset < raw.len() {
        let remaining = raw.len() - offset;
        if remaining < ELEMENT_HEADER_SIZE {
            return Err(Error::InvalidCount);
        }
        let location = read_u16_le(raw, offset).ok_or(Error::InvalidCount)?;
        let num_sig = raw[offset + 2] as usize;
        let num_vendor = raw[offset + 3] as usize;
        let models_size = num_sig * SIG_MODEL_SIZE + num_vendor * VENDOR_MODEL_SIZE;
        let element_size = ELEMENT_HEADER_SIZE + models_size;
        if remaining < element_size {
            return Err(Error::InvalidCount);
        }

        if let ElementPass::UpdateDb(db) = &mut pass {
            let models_start = offset + ELEMENT_HEADER_SIZE;
            let add_element = db.add_element(server_address, location);
            mlog!(
                "{} DCD element index {} with location 0x{:04x} (sig_models={},vendor_models={})",
                node_str,
                element_index,
                location,
                num_sig,
                num_vendor
            );
            add_element?;

            for i in 0..num_sig {
                let model = ModelId {
                    vendor: SIG_VENDOR_ID,
                    model: read_u16_le(raw, models_start + i * SIG_MODEL_SIZE)
                        .ok_or(Error::InvalidCount)?,
                };
                let add_model = db.add_model(server_address, element_index, model);
                mlog!(
                    "{} DCD SIG model 0x{:04x}-{} (elem={})",
                    node_str,
                    model.model,
                    models::sig_model_id_to_string(model.model),
                    element_index
                );
                add_model?;
            }

            let vendor_start = models_start + num_sig * SIG_MODEL_SIZE;
            for i in 0..num_vendor {
                let at = vendor_start + i * VENDOR_MODEL_SIZE;
                let model = ModelId {
                    vendor: read_u16_le(raw, at).ok_or(Error::InvalidCount)?,
                    model: read_u16_le(raw, at + 2).ok_or(Error::InvalidCount)?,
                };
                let add_model = db.add_model(server_address, element_index, model);
                mlog!(
                    "{} DCD vendor model 0x{:04x} (elem={},vendor=0x{:04x})",
                    node_str,
                    model.model,
                    element_index,
                    model.vendor
                );
                add_model?;
            }
        }

        offset += element_size;
        element_index = element_index.wrapping_add(1);
    }
    Ok(())
}

/// Register the composition in `raw` for the node at `server_address`.
///
/// The node must exist and must not have its DCD marked available yet. The
/// size check runs over the whole buffer before the database is touched
/// beyond the header. On any failure after the header was stored, the
/// partial entry is cleared.
///
/// # Errors
/// - `NotFound` if the node is unknown
/// - `InvalidState` if the node already has DCD available
/// - `InvalidCount` if the buffer length does not match its content
/// - Any error of the node database
pub fn process_dcd(
    db: &mut dyn NodeDatabase,
    enc_netkey_index: u16,
    server_address: u16,
    raw: &[u8],
) -> Result<()> {
    match db.node_dcd_available(server_address) {
        None => return Err(Error::NotFound),
        Some(true) => return Err(Error::InvalidState),
        Some(false) => {}
    }

    let header = DcdHeader::parse(raw)?;
    if log::any_severe_log_level(LogLevel::Info) {
        let node_str = node_label(enc_netkey_index, server_address);
        mlog!("{} DCD company id: 0x{:04x}", node_str, header.company_id);
        mlog!("{} DCD product id: 0x{:04x}", node_str, header.product_id);
        mlog!("{} DCD version id: 0x{:04x}", node_str, header.version_id);
        mlog!(
            "{} DCD min replay prot list length: {}",
            node_str,
            header.min_replay_prot_list_len
        );
        mlog!("{} DCD feature relay:  {}", node_str, header.feature_relay as u8);
        mlog!("{} DCD feature proxy:  {}", node_str, header.feature_proxy as u8);
        mlog!("{} DCD feature friend: {}", node_str, header.feature_friend as u8);
        mlog!("{} DCD feature lpn:    {}", node_str, header.feature_low_power as u8);
    }

    db.set_dcd_header(server_address, &header)?;

    let registered = iterate_elements(
        enc_netkey_index,
        server_address,
        raw,
        ElementPass::CheckSize,
    )
    .and_then(|()| {
        iterate_elements(
            enc_netkey_index,
            server_address,
            raw,
            ElementPass::UpdateDb(&mut *db),
        )
    });

    if let Err(e) = registered {
        if let Err(clear_err) = db.clear_dcd(server_address) {
            mlog_error!(
                "Failed to clear DCD of node (addr=0x{:04x}): {}",
                server_address,
                clear_err
            );
        }
        return Err(e);
    }

    if let Err(e) = db.set_dcd_available(server_address) {
        // Every earlier call succeeded for this node, so it cannot be missing.
        mlog_error!(
            "Failed to set DCD available of node (addr=0x{:04x}): {}",
            server_address,
            e
        );
        debug_assert!(false, "set_dcd_available failed after registration");
        return Err(e);
    }
    Ok(())
}

fn node_label(enc_netkey_index: u16, server_address: u16) -> String {
    if log::any_severe_log_level(LogLevel::Info) {
        format!("Node (netkey_idx={},addr=0x{:04x})", enc_netkey_index, server_address)
    } else {
        String::new()
    }
}
