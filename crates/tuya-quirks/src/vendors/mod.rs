//! Built-in vendor quirks

pub mod avatto;
pub mod beca;
pub mod electsmart;
pub mod etop;
pub mod maxsmart;
pub mod me167;
pub mod rtitek;
pub mod saswell;
pub mod sensor;
pub mod zonnsmart;

use crate::quirk::QuirkDescriptor;
use zigbee_core::cluster::{device_type, id, GP_PROFILE, HA_PROFILE};
use zigbee_core::Endpoint;

/// Every built-in descriptor, in matching order
#[must_use]
pub fn descriptors() -> Vec<QuirkDescriptor> {
    let mut all = Vec::new();
    all.extend(saswell::descriptors());
    all.extend(avatto::descriptors());
    all.extend(electsmart::descriptors());
    all.extend(etop::descriptors());
    all.extend(me167::descriptors());
    all.extend(zonnsmart::descriptors());
    all.extend(rtitek::descriptors());
    all.extend(maxsmart::descriptors());
    all.extend(beca::descriptors());
    all.extend(sensor::descriptors());
    all
}

/// Endpoint 1 as advertised by TS0601 devices
pub(crate) fn ts0601_endpoint(device_id: u16) -> Endpoint {
    Endpoint::new(1, HA_PROFILE, device_id)
        .with_in(&[id::BASIC, id::GROUPS, id::SCENES, id::TUYA_MANUFACTURER])
        .with_out(&[id::TIME, id::OTA])
}

/// Green Power proxy endpoint
pub(crate) fn green_power_endpoint() -> Endpoint {
    Endpoint::new(242, GP_PROFILE, device_type::GREEN_POWER_PROXY_BASIC).with_out(&[id::GREEN_POWER])
}

/// Integer view of a report, for vendors that only send numbers
pub(crate) fn int(value: &tuya_protocol::DpValue) -> i64 {
    value.as_int().unwrap_or_default()
}
