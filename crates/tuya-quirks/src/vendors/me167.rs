//! ME167 / ME168 radiator valves (also sold by Avatto and Thaleos)

use super::{int, ts0601_endpoint};
use crate::clusters::{AnalogSpec, ClusterSpec, Feature, ModeUpdate, SetpointLimits};
use crate::convert::{reverse_direct, scale_to_raw, Conversion, DirectMapping};
use crate::device::DeviceState;
use crate::manufacturer::{ManufAttr, ManufValue, ManufWrite};
use crate::quirk::{EndpointLayout, Quirk, QuirkDescriptor, Target};
use tuya_protocol::DpValue;
use zigbee_core::cluster::thermostat_attrs as attrs;
use zigbee_core::cluster::{
    device_type, id, on_off_attrs, user_interface_attrs, Occupancy, Preset,
    ProgrammingOperationMode, SystemMode,
};
use zigbee_core::ZclValue;

pub const TEMPERATURE: u16 = 0x0205;
pub const TARGET_TEMP: u16 = 0x0204;
pub const TEMP_CALIBRATION: u16 = 0x022F;
pub const CHILD_LOCK: u16 = 0x0107;
pub const BATTERY_STATE: u16 = 0x0523;
/// 0 auto, 1 heat, 2 off
pub const MODE: u16 = 0x0402;
/// 0 while heating
pub const STATE: u16 = 0x0403;
pub const FROST_PROTECTION: u16 = 0x0124;

static ATTRIBUTES: [ManufAttr; 8] = [
    ManufAttr::new(TEMPERATURE, "temperature"),
    ManufAttr::new(TARGET_TEMP, "target_temperature"),
    ManufAttr::new(TEMP_CALIBRATION, "temperature_calibration"),
    ManufAttr::new(CHILD_LOCK, "child_lock"),
    ManufAttr::new(MODE, "mode"),
    ManufAttr::new(STATE, "state"),
    ManufAttr::new(BATTERY_STATE, "battery_state"),
    ManufAttr::new(FROST_PROTECTION, "frost_protection"),
];

static MAPPINGS: [DirectMapping; 3] = [
    DirectMapping::new(TEMPERATURE, attrs::LOCAL_TEMPERATURE, Conversion::Scale(10)),
    DirectMapping::new(TARGET_TEMP, attrs::OCCUPIED_HEATING_SETPOINT, Conversion::Scale(10)),
    DirectMapping::new(
        TEMP_CALIBRATION,
        attrs::LOCAL_TEMPERATURE_CALIBRATION,
        Conversion::Identity,
    ),
];

static CALIBRATION: AnalogSpec = AnalogSpec {
    description: "Temperature Calibration",
    min: -10.0,
    max: 10.0,
    resolution: 1.0,
    application_type: 13 << 16,
    engineering_units: 62,
    writable: true,
};

pub struct Me167;

impl Me167 {
    /// Mode byte for a system mode or programming mode write
    fn mode_write(state: &DeviceState, attr: u16, value: &ZclValue) -> Option<i64> {
        let thermostat = state.thermostat()?;
        let raw = u8::try_from(value.as_int()?).ok()?;
        let (system_mode, programming) = if attr == attrs::SYSTEM_MODE {
            (
                SystemMode::try_from(raw).ok(),
                thermostat
                    .programming_mode()
                    .unwrap_or(ProgrammingOperationMode::Simple),
            )
        } else {
            let Ok(programming) = ProgrammingOperationMode::try_from(raw) else {
                tracing::error!("Unsupported value for programming operation mode: {:?}", value);
                return None;
            };
            (
                Some(thermostat.system_mode().unwrap_or(SystemMode::Heat)),
                programming,
            )
        };

        match (system_mode, programming) {
            (Some(SystemMode::Off), _) => Some(2),
            (Some(SystemMode::Heat), ProgrammingOperationMode::ScheduleProgrammingMode) => Some(0),
            (Some(SystemMode::Heat), ProgrammingOperationMode::Simple) => Some(1),
            (Some(SystemMode::Heat), _) => {
                tracing::error!("Unsupported value for programming operation mode: {:?}", value);
                None
            }
            _ => {
                tracing::error!("Unsupported value for system mode: {:?}", value);
                None
            }
        }
    }
}

impl Quirk for Me167 {
    fn attributes(&self) -> &'static [ManufAttr] {
        &ATTRIBUTES
    }

    fn direct_mappings(&self) -> &[DirectMapping] {
        &MAPPINGS
    }

    fn decode(&self, state: &mut DeviceState, attr: u16, value: &DpValue) {
        let v = int(value);
        match attr {
            MODE => {
                let update = match v {
                    0 => ModeUpdate::preset(Preset::Schedule)
                        .programming(ProgrammingOperationMode::ScheduleProgrammingMode)
                        .system_mode(SystemMode::Heat),
                    1 => ModeUpdate::preset(Preset::Manual)
                        .programming(ProgrammingOperationMode::Simple)
                        .system_mode(SystemMode::Heat),
                    2 => ModeUpdate::preset(Preset::Manual)
                        .programming(ProgrammingOperationMode::Simple)
                        .system_mode(SystemMode::Off),
                    other => {
                        tracing::warn!("Unknown ME167 mode {}", other);
                        return;
                    }
                };
                state.apply_mode(update.occupancy(Occupancy::Occupied));
            }
            CHILD_LOCK => state.child_lock_change(v != 0),
            STATE => state.state_change(v == 0),
            BATTERY_STATE => state.battery_low(v == 1),
            TEMP_CALIBRATION => state.set_analog(Feature::TemperatureCalibration, v as f64),
            FROST_PROTECTION => state.set_switch(Feature::FrostProtection, v != 0),
            _ => {}
        }
    }

    fn map_attribute(
        &self,
        state: &DeviceState,
        target: Target,
        attr: u16,
        value: &ZclValue,
    ) -> Option<ManufWrite> {
        let write = match (target, attr) {
            (
                Target::Thermostat,
                attrs::OCCUPIED_HEATING_SETPOINT | attrs::LOCAL_TEMPERATURE_CALIBRATION,
            ) => {
                let (manuf, raw) = reverse_direct(&MAPPINGS, attr, value.as_int()?)?;
                (manuf, ManufValue::Int(raw))
            }
            (Target::Thermostat, attrs::OPERATION_PRESET) => {
                (MODE, ManufValue::Int(value.as_int()?))
            }
            (Target::Thermostat, attrs::SYSTEM_MODE | attrs::PROGRAMING_OPER_MODE) => {
                (MODE, ManufValue::Int(Self::mode_write(state, attr, value)?))
            }
            (Target::UserInterface, user_interface_attrs::KEYPAD_LOCKOUT) => {
                (CHILD_LOCK, (value.as_int()? != 0).into())
            }
            (Target::Switch(Feature::ChildLock), on_off_attrs::ON_OFF) => {
                (CHILD_LOCK, value.as_bool()?.into())
            }
            (Target::Switch(Feature::FrostProtection), on_off_attrs::ON_OFF) => {
                (FROST_PROTECTION, value.as_bool()?.into())
            }
            (Target::Analog(Feature::TemperatureCalibration), _) => (
                TEMP_CALIBRATION,
                scale_to_raw(value.as_float()?, 1.0).into(),
            ),
            _ => return None,
        };
        Some(vec![write])
    }
}

#[must_use]
pub fn descriptors() -> Vec<QuirkDescriptor> {
    vec![QuirkDescriptor {
        name: "me167",
        models: &[
            ("_TZE200_bvu2wnxz", "TS0601"),
            ("_TZE200_6rdj8dzm", "TS0601"),
            ("_TZE200_p3dbf6qs", "TS0601"),
            ("_TZE200_rxntag7i", "TS0601"),
            ("_TZE200_rxq4iti9", "TS0601"),
            ("_TZE200_9xfjixap", "TS0601"),
            ("_TZE200_ow09xlxm", "TS0601"),
        ],
        signature: vec![ts0601_endpoint(device_type::SMART_PLUG)],
        replacement: vec![
            EndpointLayout::new(1, device_type::THERMOSTAT)
                .passthrough(&[id::BASIC, id::GROUPS, id::SCENES])
                .with(ClusterSpec::Manufacturer)
                .with(ClusterSpec::Thermostat(SetpointLimits::new(500, 3500)))
                .with(ClusterSpec::UserInterface)
                .with(ClusterSpec::PowerConfiguration(None))
                .with_out(&[id::TIME, id::OTA]),
            EndpointLayout::new(2, device_type::ON_OFF_SWITCH)
                .with(ClusterSpec::OnOff(Feature::ChildLock)),
            EndpointLayout::new(3, device_type::CONSUMPTION_AWARENESS_DEVICE)
                .with(ClusterSpec::AnalogOutput(Feature::TemperatureCalibration, &CALIBRATION)),
            EndpointLayout::new(4, device_type::ON_OFF_SWITCH)
                .with(ClusterSpec::OnOff(Feature::FrostProtection)),
        ],
        build: |_| Box::new(Me167),
    }]
}
