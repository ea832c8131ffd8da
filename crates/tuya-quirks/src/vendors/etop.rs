//! Etop radiator valve

use super::{int, ts0601_endpoint};
use crate::clusters::{ClusterSpec, Feature, ModeUpdate, SetpointLimits};
use crate::convert::{reverse_direct, Conversion, DirectMapping};
use crate::device::DeviceState;
use crate::manufacturer::{ManufAttr, ManufValue, ManufWrite};
use crate::quirk::{EndpointLayout, Quirk, QuirkDescriptor, Target};
use tuya_protocol::DpValue;
use zigbee_core::cluster::thermostat_attrs as attrs;
use zigbee_core::cluster::{
    device_type, id, on_off_attrs, Occupancy, Preset, ProgrammingOperationMode, SystemMode,
};
use zigbee_core::ZclValue;

pub const TARGET_TEMP: u16 = 0x0210;
pub const TEMPERATURE: u16 = 0x0218;
/// 0 manual, 1 away, 2 schedule
pub const PRESET: u16 = 0x0402;
pub const SYSTEM_MODE: u16 = 0x0101;
pub const BATTERY_STATE: u16 = 0x0523;
pub const WINDOW_DETECT: u16 = 0x0108;

static ATTRIBUTES: [ManufAttr; 6] = [
    ManufAttr::new(TARGET_TEMP, "target_temperature"),
    ManufAttr::new(TEMPERATURE, "temperature"),
    ManufAttr::new(PRESET, "preset"),
    ManufAttr::new(SYSTEM_MODE, "system_mode"),
    ManufAttr::new(BATTERY_STATE, "battery_state"),
    ManufAttr::new(WINDOW_DETECT, "window_detection_func"),
];

static MAPPINGS: [DirectMapping; 2] = [
    DirectMapping::new(TEMPERATURE, attrs::LOCAL_TEMPERATURE, Conversion::Scale(10)),
    DirectMapping::new(TARGET_TEMP, attrs::OCCUPIED_HEATING_SETPOINT, Conversion::Scale(10)),
];

pub struct Etop;

impl Quirk for Etop {
    fn attributes(&self) -> &'static [ManufAttr] {
        &ATTRIBUTES
    }

    fn direct_mappings(&self) -> &[DirectMapping] {
        &MAPPINGS
    }

    fn decode(&self, state: &mut DeviceState, attr: u16, value: &DpValue) {
        let v = int(value);
        match attr {
            PRESET => {
                let update = match v {
                    0 => ModeUpdate::preset(Preset::Manual)
                        .programming(ProgrammingOperationMode::Simple)
                        .occupancy(Occupancy::Occupied),
                    1 => ModeUpdate::preset(Preset::Away)
                        .programming(ProgrammingOperationMode::Simple)
                        .occupancy(Occupancy::Unoccupied),
                    _ => ModeUpdate::preset(Preset::Schedule)
                        .programming(ProgrammingOperationMode::ScheduleProgrammingMode)
                        .occupancy(Occupancy::Occupied),
                };
                state.apply_mode(update);
            }
            SYSTEM_MODE => {
                state.set_system_mode(if v == 0 { SystemMode::Off } else { SystemMode::Heat });
            }
            BATTERY_STATE => state.battery_low(v == 1),
            WINDOW_DETECT => state.set_switch(Feature::WindowDetection, v != 0),
            _ => {}
        }
    }

    fn map_attribute(
        &self,
        _state: &DeviceState,
        target: Target,
        attr: u16,
        value: &ZclValue,
    ) -> Option<ManufWrite> {
        let write = match (target, attr) {
            (Target::Thermostat, attrs::OCCUPIED_HEATING_SETPOINT) => {
                let (manuf, raw) = reverse_direct(&MAPPINGS, attr, value.as_int()?)?;
                (manuf, ManufValue::Int(raw))
            }
            (Target::Thermostat, attrs::OPERATION_PRESET) => {
                let preset = Preset::try_from(u8::try_from(value.as_int()?).ok()?).ok()?;
                let raw = match preset {
                    Preset::Manual => 0,
                    Preset::Away => 1,
                    Preset::Schedule => 2,
                    _ => return None,
                };
                (PRESET, ManufValue::Int(raw))
            }
            (Target::Thermostat, attrs::SYSTEM_MODE) => {
                (SYSTEM_MODE, (value.as_int()? != SystemMode::Off as i64).into())
            }
            (Target::Switch(Feature::WindowDetection), on_off_attrs::ON_OFF) => {
                (WINDOW_DETECT, value.as_bool()?.into())
            }
            _ => return None,
        };
        Some(vec![write])
    }
}

#[must_use]
pub fn descriptors() -> Vec<QuirkDescriptor> {
    vec![QuirkDescriptor {
        name: "etop",
        models: &[("_TZE200_0hg58wyk", "TS0601")],
        signature: vec![ts0601_endpoint(device_type::SMART_PLUG)],
        replacement: vec![EndpointLayout::new(1, device_type::THERMOSTAT)
            .passthrough(&[id::BASIC, id::GROUPS, id::SCENES])
            .with(ClusterSpec::Manufacturer)
            .with(ClusterSpec::Thermostat(SetpointLimits::new(500, 3000)))
            .with(ClusterSpec::UserInterface)
            .with(ClusterSpec::OnOff(Feature::WindowDetection))
            .with(ClusterSpec::PowerConfiguration(None))
            .with_out(&[id::TIME, id::OTA])],
        build: |_| Box::new(Etop),
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vendors::testing::{attach, sent};
    use zigbee_core::cluster::power_config_attrs;

    #[test]
    fn test_preset_reports() {
        let (mut device, _rx) = attach(&descriptors()[0], "_TZE200_0hg58wyk");

        device.handle_report(PRESET, DpValue::Enum(1));
        let thermostat = device.state().thermostat().unwrap();
        assert_eq!(thermostat.preset(), Some(Preset::Away));
        assert_eq!(thermostat.occupancy(), Some(Occupancy::Unoccupied));

        device.handle_report(PRESET, DpValue::Enum(2));
        let thermostat = device.state().thermostat().unwrap();
        assert_eq!(thermostat.preset(), Some(Preset::Schedule));
        assert_eq!(
            thermostat.programming_mode(),
            Some(ProgrammingOperationMode::ScheduleProgrammingMode)
        );
    }

    #[test]
    fn test_battery_and_window() {
        let (mut device, _rx) = attach(&descriptors()[0], "_TZE200_0hg58wyk");
        device.handle_report(BATTERY_STATE, DpValue::Bitmap(1));
        device.handle_report(WINDOW_DETECT, DpValue::Bool(true));

        assert_eq!(
            device.read_attribute(1, id::POWER_CONFIG, power_config_attrs::BATTERY_PERCENTAGE_REMAINING),
            Some(ZclValue::Int(0))
        );
        assert_eq!(device.state().switch_state(Feature::WindowDetection), Some(true));
    }

    #[tokio::test]
    async fn test_preset_write() {
        let (mut device, mut rx) = attach(&descriptors()[0], "_TZE200_0hg58wyk");
        device
            .write_attributes(1, id::THERMOSTAT, &[(attrs::OPERATION_PRESET, ZclValue::Int(0))])
            .await
            .unwrap();
        assert_eq!(sent(&mut rx), vec![(PRESET, DpValue::Enum(1))]);

        let records = device
            .write_attributes(1, id::THERMOSTAT, &[(attrs::OPERATION_PRESET, ZclValue::Int(5))])
            .await
            .unwrap();
        assert_eq!(records[0].status, zigbee_core::Status::Failure);
    }
}
