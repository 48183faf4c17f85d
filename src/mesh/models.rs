//! Static table of Bluetooth SIG defined models.
//!
//! The table is sorted by model id so lookups can binary search it.
//! `validate_model_table` checks that ordering once at configurator init.

use crate::error::{Error, Result};

/// The model can be bound to application keys.
pub const APPKEY_BINDING: u8 = 0x01;
/// The model supports subscription lists.
pub const SUBSCRIPTION: u8 = 0x02;
/// The model supports publication.
pub const PUBLICATION: u8 = 0x04;

const CLIENT: u8 = APPKEY_BINDING | SUBSCRIPTION | PUBLICATION;
const SERVER: u8 = APPKEY_BINDING | SUBSCRIPTION | PUBLICATION;
const SETUP_SERVER: u8 = APPKEY_BINDING | SUBSCRIPTION;
const FOUNDATION: u8 = 0;

pub const UNKNOWN_SIG_MODEL: &str = "UnknownSigModel";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SigModelInfo {
    pub model_id: u16,
    pub name: &'static str,
    pub attributes: u8,
}

impl SigModelInfo {
    const fn new(model_id: u16, name: &'static str, attributes: u8) -> Self {
        Self {
            model_id,
            name,
            attributes,
        }
    }

    pub fn appkey_binding(&self) -> bool {
        self.attributes & APPKEY_BINDING != 0
    }

    pub fn subscription(&self) -> bool {
        self.attributes & SUBSCRIPTION != 0
    }

    pub fn publication(&self) -> bool {
        self.attributes & PUBLICATION != 0
    }
}

pub static SIG_MODELS: &[SigModelInfo] = &[
    SigModelInfo::new(0x0000, "ConfigurationServer", FOUNDATION),
    SigModelInfo::new(0x0001, "ConfigurationClient", FOUNDATION),
    SigModelInfo::new(0x0002, "HealthServer", SERVER),
    SigModelInfo::new(0x0003, "HealthClient", CLIENT),
    SigModelInfo::new(0x1000, "GenericOnOffServer", SERVER),
    SigModelInfo::new(0x1001, "GenericOnOffClient", CLIENT),
    SigModelInfo::new(0x1002, "GenericLevelServer", SERVER),
    SigModelInfo::new(0x1003, "GenericLevelClient", CLIENT),
    SigModelInfo::new(0x1004, "GenericDefaultTransitionTimeServer", SERVER),
    SigModelInfo::new(0x1005, "GenericDefaultTransitionTimeClient", CLIENT),
    SigModelInfo::new(0x1006, "GenericPowerOnOffServer", SERVER),
    SigModelInfo::new(0x1007, "GenericPowerOnOffSetupServer", SETUP_SERVER),
    SigModelInfo::new(0x1008, "GenericPowerOnOffClient", CLIENT),
    SigModelInfo::new(0x1009, "GenericPowerLevelServer", SERVER),
    SigModelInfo::new(0x100A, "GenericPowerLevelSetupServer", SETUP_SERVER),
    SigModelInfo::new(0x100B, "GenericPowerLevelClient", CLIENT),
    SigModelInfo::new(0x100C, "GenericBatteryServer", SERVER),
    SigModelInfo::new(0x100D, "GenericBatteryClient", CLIENT),
    SigModelInfo::new(0x100E, "GenericLocationServer", SERVER),
    SigModelInfo::new(0x100F, "GenericLocationSetupServer", SETUP_SERVER),
    SigModelInfo::new(0x1010, "GenericLocationClient", CLIENT),
    SigModelInfo::new(0x1011, "GenericAdminPropertyServer", SERVER),
    SigModelInfo::new(0x1012, "GenericManufacturerPropertyServer", SERVER),
    SigModelInfo::new(0x1013, "GenericUserPropertyServer", SERVER),
    SigModelInfo::new(0x1014, "GenericClientPropertyServer", SERVER),
    SigModelInfo::new(0x1015, "GenericPropertyClient", CLIENT),
    SigModelInfo::new(0x1100, "SensorServer", SERVER),
    SigModelInfo::new(0x1101, "SensorSetupServer", SERVER),
    SigModelInfo::new(0x1102, "SensorClient", CLIENT),
    SigModelInfo::new(0x1200, "TimeServer", SERVER),
    SigModelInfo::new(0x1201, "TimeSetupServer", SETUP_SERVER),
    SigModelInfo::new(0x1202, "TimeClient", CLIENT),
    SigModelInfo::new(0x1203, "SceneServer", SERVER),
    SigModelInfo::new(0x1204, "SceneSetupServer", SETUP_SERVER),
    SigModelInfo::new(0x1205, "SceneClient", CLIENT),
    SigModelInfo::new(0x1206, "SchedulerServer", SERVER),
    SigModelInfo::new(0x1207, "SchedulerSetupServer", SETUP_SERVER),
    SigModelInfo::new(0x1208, "SchedulerClient", CLIENT),
    SigModelInfo::new(0x1300, "LightLightnessServer", SERVER),
    SigModelInfo::new(0x1301, "LightLightnessSetupServer", SETUP_SERVER),
    SigModelInfo::new(0x1302, "LightLightnessClient", CLIENT),
    SigModelInfo::new(0x1303, "LightCTLServer", SERVER),
    SigModelInfo::new(0x1304, "LightCTLSetupServer", SETUP_SERVER),
    SigModelInfo::new(0x1305, "LightCTLClient", CLIENT),
    SigModelInfo::new(0x1306, "LightCTLTemperatureServer", SERVER),
    SigModelInfo::new(0x1307, "LightHSLServer", SERVER),
    SigModelInfo::new(0x1308, "LightHSLSetupServer", SETUP_SERVER),
    SigModelInfo::new(0x1309, "LightHSLClient", CLIENT),
    SigModelInfo::new(0x130A, "LightHSLHueServer", SERVER),
    SigModelInfo::new(0x130B, "LightHSLSaturationServer", SERVER),
    SigModelInfo::new(0x130C, "LightxyLServer", SERVER),
    SigModelInfo::new(0x130D, "LightxyLSetupServer", SETUP_SERVER),
    SigModelInfo::new(0x130E, "LightxyLClient", CLIENT),
    SigModelInfo::new(0x130F, "LightLCServer", SERVER),
    SigModelInfo::new(0x1310, "LightLCSetupServer", SETUP_SERVER),
    SigModelInfo::new(0x1311, "LightLCClient", CLIENT),
];

/// Check that model ids are strictly ascending.
///
/// # Errors
/// `InvalidConfiguration` at the first pair out of order.
pub fn validate_model_table(table: &[SigModelInfo]) -> Result<()> {
    match table
        .windows(2)
        .find(|pair| pair[0].model_id >= pair[1].model_id)
    {
        Some(pair) => {
            crate::mlog_error!(
                "SIG model table out of order at 0x{:04x} -> 0x{:04x}",
                pair[0].model_id,
                pair[1].model_id
            );
            Err(Error::InvalidConfiguration)
        }
        None => Ok(()),
    }
}

/// Binary search `table` for `model_id`.
pub fn find_model(table: &[SigModelInfo], model_id: u16) -> Option<&SigModelInfo> {
    table
        .binary_search_by_key(&model_id, |info| info.model_id)
        .ok()
        .map(|idx| &table[idx])
}

pub fn get_sig_model_info(model_id: u16) -> Option<&'static SigModelInfo> {
    find_model(SIG_MODELS, model_id)
}

/// Attribute bitmask of a SIG model.
///
/// # Errors
/// `NotFound` for ids not in the table.
pub fn get_sig_model_attributes(model_id: u16) -> Result<u8> {
    get_sig_model_info(model_id)
        .map(|info| info.attributes)
        .ok_or(Error::NotFound)
}

/// Display name of a SIG model, `"UnknownSigModel"` for ids not in the table.
pub fn sig_model_id_to_string(model_id: u16) -> &'static str {
    get_sig_model_info(model_id)
        .map(|info| info.name)
        .unwrap_or(UNKNOWN_SIG_MODEL)
}
