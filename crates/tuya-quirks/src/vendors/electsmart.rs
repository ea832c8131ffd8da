//! Electsmart wall thermostat
//!
//! Same mode handling as the Avatto family, with decidegree temperatures
//! on different data points.

use super::avatto::{mode_update, mode_write};
use super::{int, ts0601_endpoint};
use crate::clusters::{AnalogSpec, ClusterSpec, Feature, SetpointLimits};
use crate::convert::{reverse_direct, scale_to_raw, Conversion, DirectMapping};
use crate::device::DeviceState;
use crate::manufacturer::{ManufAttr, ManufValue, ManufWrite};
use crate::quirk::{EndpointLayout, Quirk, QuirkDescriptor, Target};
use tuya_protocol::DpValue;
use zigbee_core::cluster::thermostat_attrs as attrs;
use zigbee_core::cluster::{device_type, id, on_off_attrs, user_interface_attrs, SystemMode};
use zigbee_core::ZclValue;

pub const TARGET_TEMP: u16 = 0x0210;
pub const TEMPERATURE: u16 = 0x0266;
pub const MODE: u16 = 0x0402;
pub const SYSTEM_MODE: u16 = 0x0101;
pub const HEAT_STATE: u16 = 0x0424;
pub const CHILD_LOCK: u16 = 0x0128;
pub const TEMP_CALIBRATION: u16 = 0x021B;

static ATTRIBUTES: [ManufAttr; 7] = [
    ManufAttr::new(TEMPERATURE, "temperature"),
    ManufAttr::new(TARGET_TEMP, "target_temperature"),
    ManufAttr::new(MODE, "mode"),
    ManufAttr::new(SYSTEM_MODE, "system_mode"),
    ManufAttr::new(HEAT_STATE, "heat_state"),
    ManufAttr::new(CHILD_LOCK, "child_lock"),
    ManufAttr::new(TEMP_CALIBRATION, "temperature_calibration"),
];

static MAPPINGS: [DirectMapping; 2] = [
    DirectMapping::new(TEMPERATURE, attrs::LOCAL_TEMPERATURE, Conversion::Scale(10)),
    DirectMapping::new(TARGET_TEMP, attrs::OCCUPIED_HEATING_SETPOINT, Conversion::Scale(10)),
];

static CALIBRATION: AnalogSpec = AnalogSpec {
    description: "Temperature Calibration",
    min: -10.0,
    max: 10.0,
    resolution: 0.1,
    application_type: 13 << 16,
    engineering_units: 62,
    writable: true,
};

pub struct Electsmart;

impl Quirk for Electsmart {
    fn attributes(&self) -> &'static [ManufAttr] {
        &ATTRIBUTES
    }

    fn direct_mappings(&self) -> &[DirectMapping] {
        &MAPPINGS
    }

    fn decode(&self, state: &mut DeviceState, attr: u16, value: &DpValue) {
        let v = int(value);
        match attr {
            MODE => state.apply_mode(mode_update(v)),
            SYSTEM_MODE => {
                state.set_system_mode(if v == 0 { SystemMode::Off } else { SystemMode::Heat });
            }
            // Heating icon is lit at 0
            HEAT_STATE => state.state_change(v == 0),
            CHILD_LOCK => state.child_lock_change(v != 0),
            TEMP_CALIBRATION => state.set_analog(Feature::TemperatureCalibration, v as f64 / 10.0),
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
            (Target::Thermostat, attrs::OCCUPIED_HEATING_SETPOINT) => {
                let (manuf, raw) = reverse_direct(&MAPPINGS, attr, value.as_int()?)?;
                (manuf, ManufValue::Int(raw))
            }
            (
                Target::Thermostat,
                attrs::OPERATION_PRESET | attrs::PROGRAMING_OPER_MODE | attrs::OCCUPANCY,
            ) => (MODE, ManufValue::Int(mode_write(state, attr, value)?)),
            (Target::Thermostat, attrs::SYSTEM_MODE) => {
                (SYSTEM_MODE, (value.as_int()? != SystemMode::Off as i64).into())
            }
            (Target::UserInterface, user_interface_attrs::KEYPAD_LOCKOUT) => {
                (CHILD_LOCK, (value.as_int()? != 0).into())
            }
            (Target::Switch(Feature::ChildLock), on_off_attrs::ON_OFF) => {
                (CHILD_LOCK, value.as_bool()?.into())
            }
            (Target::Analog(Feature::TemperatureCalibration), _) => (
                TEMP_CALIBRATION,
                scale_to_raw(value.as_float()?, 10.0).into(),
            ),
            _ => return None,
        };
        Some(vec![write])
    }
}

#[must_use]
pub fn descriptors() -> Vec<QuirkDescriptor> {
    vec![QuirkDescriptor {
        name: "electsmart",
        models: &[("_TZE204_edl8pz1k", "TS0601")],
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
        ],
        build: |_| Box::new(Electsmart),
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vendors::testing::{attach, sent};
    use zigbee_core::cluster::analog_output_attrs;

    #[test]
    fn test_reports() {
        let (mut device, _rx) = attach(&descriptors()[0], "_TZE204_edl8pz1k");
        device.handle_report(TEMPERATURE, DpValue::Value(195));
        device.handle_report(SYSTEM_MODE, DpValue::Bool(false));
        device.handle_report(TEMP_CALIBRATION, DpValue::Value(-5));

        assert_eq!(
            device.read_attribute(1, id::THERMOSTAT, attrs::LOCAL_TEMPERATURE),
            Some(ZclValue::Int(1950))
        );
        assert_eq!(
            device.state().thermostat().unwrap().system_mode(),
            Some(SystemMode::Off)
        );
        assert_eq!(
            device.state().analog_value(Feature::TemperatureCalibration),
            Some(-0.5)
        );
        assert_eq!(
            device.read_attribute(1, id::THERMOSTAT, attrs::MAX_HEAT_SETPOINT_LIMIT),
            Some(ZclValue::Int(3500))
        );
    }

    #[tokio::test]
    async fn test_writes() {
        let (mut device, mut rx) = attach(&descriptors()[0], "_TZE204_edl8pz1k");
        device
            .write_attributes(1, id::THERMOSTAT, &[(attrs::OCCUPIED_HEATING_SETPOINT, ZclValue::Int(2250))])
            .await
            .unwrap();
        assert_eq!(sent(&mut rx), vec![(TARGET_TEMP, DpValue::Value(225))]);

        device
            .write_attributes(1, id::THERMOSTAT, &[(attrs::OPERATION_PRESET, ZclValue::Int(1))])
            .await
            .unwrap();
        assert_eq!(sent(&mut rx), vec![(MODE, DpValue::Enum(1))]);

        device
            .write_attributes(
                3,
                id::ANALOG_OUTPUT,
                &[(analog_output_attrs::PRESENT_VALUE, ZclValue::Float(1.5))],
            )
            .await
            .unwrap();
        assert_eq!(sent(&mut rx), vec![(TEMP_CALIBRATION, DpValue::Value(15))]);
    }
}
