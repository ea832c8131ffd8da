//! Saswell radiator valves (also sold under TYST11 firmware ids)

use super::{int, ts0601_endpoint};
use crate::clusters::{AnalogSpec, ClusterSpec, Feature, SetpointLimits};
use crate::convert::{reverse_direct, scale_to_raw, Conversion, DirectMapping};
use crate::device::DeviceState;
use crate::manufacturer::{ManufAttr, ManufValue, ManufWrite};
use crate::quirk::{EndpointLayout, Quirk, QuirkDescriptor, Target};
use tuya_protocol::DpValue;
use zigbee_core::cluster::thermostat_attrs as attrs;
use zigbee_core::cluster::{device_type, id, on_off_attrs, SystemMode, HA_PROFILE};
use zigbee_core::{Endpoint, ZclValue};

pub const CHILD_LOCK: u16 = 0x0128;
pub const ANTI_FREEZE: u16 = 0x010A;
pub const WINDOW_DETECT: u16 = 0x0108;
pub const LIMESCALE_PROTECT: u16 = 0x0182;
pub const TEMP_CORRECTION: u16 = 0x021B;
pub const ROOM_TEMP: u16 = 0x0266;
pub const AWAY_MODE: u16 = 0x016A;
pub const SCHEDULE_MODE: u16 = 0x016C;
pub const ON_OFF: u16 = 0x0165;
pub const TARGET_TEMP: u16 = 0x0267;
pub const BATTERY_ALARM: u16 = 0x0569;

static ATTRIBUTES: [ManufAttr; 11] = [
    ManufAttr::new(ON_OFF, "on_off"),
    ManufAttr::new(TARGET_TEMP, "target_temperature"),
    ManufAttr::new(ROOM_TEMP, "current_room_temp"),
    ManufAttr::new(CHILD_LOCK, "child_lock"),
    ManufAttr::new(SCHEDULE_MODE, "schedule_mode"),
    ManufAttr::new(WINDOW_DETECT, "window_detection"),
    ManufAttr::new(ANTI_FREEZE, "anti_freeze_protection"),
    ManufAttr::new(LIMESCALE_PROTECT, "limescale_protection"),
    ManufAttr::new(AWAY_MODE, "away_mode"),
    ManufAttr::new(BATTERY_ALARM, "battery_low"),
    ManufAttr::new(TEMP_CORRECTION, "room_temperature_correction"),
];

static MAPPINGS: [DirectMapping; 3] = [
    DirectMapping::new(ROOM_TEMP, attrs::LOCAL_TEMPERATURE, Conversion::Scale(10)),
    DirectMapping::new(TARGET_TEMP, attrs::OCCUPIED_HEATING_SETPOINT, Conversion::Scale(10)),
    DirectMapping::new(
        TEMP_CORRECTION,
        attrs::LOCAL_TEMPERATURE_CALIBRATION,
        Conversion::Identity,
    ),
];

const LIMITS: SetpointLimits = SetpointLimits::new(500, 3000);

static CALIBRATION: AnalogSpec = AnalogSpec {
    description: "Temperature Calibration",
    min: -6.0,
    max: 6.0,
    resolution: 1.0,
    application_type: 13 << 16,
    engineering_units: 62,
    writable: true,
};

const SWITCHES: [(Feature, u16); 6] = [
    (Feature::WindowDetection, WINDOW_DETECT),
    (Feature::ChildLock, CHILD_LOCK),
    (Feature::AntiFreeze, ANTI_FREEZE),
    (Feature::LimescaleProtection, LIMESCALE_PROTECT),
    (Feature::ScheduleMode, SCHEDULE_MODE),
    (Feature::AwayMode, AWAY_MODE),
];

pub struct Saswell;

impl Saswell {
    /// Running state follows the distance between room and target temperature
    fn climate_state_change(state: &mut DeviceState) {
        let thermostat = state.thermostat();
        if thermostat.and_then(|t| t.system_mode()) != Some(SystemMode::Heat) {
            state.state_change(false);
            return;
        }

        let current = state.thermostat_attr(attrs::LOCAL_TEMPERATURE);
        let target = state.thermostat_attr(attrs::OCCUPIED_HEATING_SETPOINT);
        match (current, target) {
            (Some(current), Some(target)) => state.state_change(current < target + 2),
            _ => tracing::error!(
                "Cannot derive running state: local {:?}, setpoint {:?}",
                current,
                target
            ),
        }
    }
}

impl Quirk for Saswell {
    fn attributes(&self) -> &'static [ManufAttr] {
        &ATTRIBUTES
    }

    fn direct_mappings(&self) -> &[DirectMapping] {
        &MAPPINGS
    }

    fn decode(&self, state: &mut DeviceState, attr: u16, value: &DpValue) {
        let v = int(value);
        match attr {
            ON_OFF => {
                let on = v == 1;
                state.set_system_mode(if on { SystemMode::Heat } else { SystemMode::Off });
                state.state_change(on);
                tracing::debug!("reported system_mode: {}", if on { "heat" } else { "off" });
            }
            CHILD_LOCK => state.child_lock_change(v != 0),
            BATTERY_ALARM => state.battery_low(v == 1),
            TEMP_CORRECTION => state.set_analog(Feature::TemperatureCalibration, v as f64),
            ROOM_TEMP | TARGET_TEMP => Self::climate_state_change(state),
            _ => {
                if let Some((feature, _)) = SWITCHES.iter().find(|(_, a)| *a == attr) {
                    state.set_switch(*feature, v != 0);
                }
            }
        }
    }

    fn map_attribute(
        &self,
        _state: &DeviceState,
        target: Target,
        attr: u16,
        value: &ZclValue,
    ) -> Option<ManufWrite> {
        match target {
            Target::Thermostat => match attr {
                attrs::OCCUPIED_HEATING_SETPOINT | attrs::LOCAL_TEMPERATURE_CALIBRATION => {
                    let (manuf, raw) = reverse_direct(&MAPPINGS, attr, value.as_int()?)?;
                    Some(vec![(manuf, raw.into())])
                }
                attrs::SYSTEM_MODE => match SystemMode::try_from(u8::try_from(value.as_int()?).ok()?) {
                    Ok(SystemMode::Off) => Some(vec![(ON_OFF, ManufValue::Int(0))]),
                    Ok(SystemMode::Heat) => Some(vec![(ON_OFF, ManufValue::Int(1))]),
                    _ => None,
                },
                _ => None,
            },
            Target::Switch(feature) if attr == on_off_attrs::ON_OFF => {
                let (_, manuf) = SWITCHES.iter().find(|(f, _)| *f == feature)?;
                Some(vec![(*manuf, value.as_bool()?.into())])
            }
            Target::Analog(Feature::TemperatureCalibration) => Some(vec![(
                TEMP_CORRECTION,
                scale_to_raw(value.as_float()?, 1.0).into(),
            )]),
            _ => None,
        }
    }
}

fn build(_manufacturer: &str) -> Box<dyn Quirk> {
    Box::new(Saswell)
}

fn switch(endpoint: u8, feature: Feature) -> EndpointLayout {
    EndpointLayout::new(endpoint, device_type::ON_OFF_SWITCH).with(ClusterSpec::OnOff(feature))
}

/// Endpoints 2..7 shared by both firmware families
fn feature_endpoints() -> Vec<EndpointLayout> {
    vec![
        switch(2, Feature::ChildLock),
        switch(3, Feature::AntiFreeze),
        switch(4, Feature::LimescaleProtection),
        switch(5, Feature::ScheduleMode),
        switch(6, Feature::AwayMode),
        EndpointLayout::new(7, device_type::CONSUMPTION_AWARENESS_DEVICE).with(
            ClusterSpec::AnalogOutput(Feature::TemperatureCalibration, &CALIBRATION),
        ),
    ]
}

#[must_use]
pub fn descriptors() -> Vec<QuirkDescriptor> {
    let tze200 = QuirkDescriptor {
        name: "saswell",
        models: &[
            ("_TZE200_yw7cahqs", "TS0601"),
            ("_TZE200_c88teujp", "TS0601"),
            ("_TZE200_azqp6ssj", "TS0601"),
            ("_TZE200_9gvruqf5", "TS0601"),
            ("_TZE200_zuhszj9s", "TS0601"),
            ("_TZE200_zr9c0day", "TS0601"),
            ("_TZE200_h4cgnbzg", "TS0601"),
            ("_TZE200_0dvm9mva", "TS0601"),
            ("_TZE200_exfrnlow", "TS0601"),
            ("_TZE200_9m4kmbfu", "TS0601"),
            ("_TZE200_3yp57tby", "TS0601"),
        ],
        signature: vec![ts0601_endpoint(device_type::SMART_PLUG)],
        replacement: std::iter::once(
            EndpointLayout::new(1, device_type::THERMOSTAT)
                .passthrough(&[id::BASIC, id::GROUPS, id::SCENES])
                .with(ClusterSpec::Manufacturer)
                .with(ClusterSpec::Thermostat(LIMITS))
                .with(ClusterSpec::OnOff(Feature::WindowDetection))
                .with(ClusterSpec::PowerConfiguration(None))
                .with_out(&[id::OTA, id::TIME]),
        )
        .chain(feature_endpoints())
        .collect(),
        build,
    };

    let tyst11 = QuirkDescriptor {
        name: "saswell",
        models: &[
            ("_TYST11_KGbxAXL2", "GbxAXL2"),
            ("_TYST11_c88teujp", "88teujp"),
            ("_TYST11_azqp6ssj", "zqp6ssj"),
            ("_TYST11_yw7cahqs", "w7cahqs"),
            ("_TYST11_9gvruqf5", "gvruqf5"),
            ("_TYST11_zuhszj9s", "uhszj9s"),
            ("_TYST11_caj4jz0i", "aj4jz0i"),
        ],
        signature: vec![Endpoint::new(1, HA_PROFILE, device_type::ON_OFF_SWITCH)
            .with_in(&[id::BASIC, id::IDENTIFY])
            .with_out(&[id::IDENTIFY, id::OTA])],
        replacement: std::iter::once(
            EndpointLayout::new(1, device_type::THERMOSTAT)
                .passthrough(&[id::BASIC, id::IDENTIFY])
                .with(ClusterSpec::Manufacturer)
                .with(ClusterSpec::Thermostat(LIMITS))
                .with(ClusterSpec::OnOff(Feature::WindowDetection))
                .with(ClusterSpec::PowerConfiguration(None))
                .with_out(&[id::OTA, id::IDENTIFY]),
        )
        .chain(feature_endpoints())
        .collect(),
        build,
    };

    vec![tze200, tyst11]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vendors::testing::{attach, sent};
    use zigbee_core::cluster::{power_config_attrs, RunningState};

    fn device() -> (crate::QuirkDevice, tokio::sync::mpsc::Receiver<crate::Outbound>) {
        attach(&descriptors()[0], "_TZE200_c88teujp")
    }

    #[test]
    fn test_room_temperature_is_centidegrees() {
        let (mut device, _rx) = device();
        device.handle_report(ROOM_TEMP, DpValue::Value(202));
        assert_eq!(
            device.read_attribute(1, id::THERMOSTAT, attrs::LOCAL_TEMPERATURE),
            Some(ZclValue::Int(2020))
        );
    }

    #[test]
    fn test_running_state_follows_temperatures() {
        let (mut device, _rx) = device();
        device.handle_report(ON_OFF, DpValue::Bool(true));
        device.handle_report(TARGET_TEMP, DpValue::Value(215));
        device.handle_report(ROOM_TEMP, DpValue::Value(200));
        assert_eq!(
            device.read_attribute(1, id::THERMOSTAT, attrs::RUNNING_STATE),
            Some(ZclValue::Int(RunningState::HeatStateOn as i64))
        );

        device.handle_report(ROOM_TEMP, DpValue::Value(216));
        assert_eq!(
            device.read_attribute(1, id::THERMOSTAT, attrs::RUNNING_STATE),
            Some(ZclValue::Int(RunningState::Idle as i64))
        );

        device.handle_report(ON_OFF, DpValue::Bool(false));
        device.handle_report(ROOM_TEMP, DpValue::Value(150));
        assert_eq!(
            device.read_attribute(1, id::THERMOSTAT, attrs::SYSTEM_MODE),
            Some(ZclValue::Int(SystemMode::Off as i64))
        );
        assert_eq!(
            device.read_attribute(1, id::THERMOSTAT, attrs::RUNNING_STATE),
            Some(ZclValue::Int(RunningState::Idle as i64))
        );
    }

    #[test]
    fn test_battery_alarm() {
        let (mut device, _rx) = device();
        device.handle_report(BATTERY_ALARM, DpValue::Bitmap(1));
        assert_eq!(
            device.read_attribute(1, id::POWER_CONFIG, power_config_attrs::BATTERY_PERCENTAGE_REMAINING),
            Some(ZclValue::Int(0))
        );
        device.handle_report(BATTERY_ALARM, DpValue::Bitmap(0));
        assert_eq!(
            device.read_attribute(1, id::POWER_CONFIG, power_config_attrs::BATTERY_PERCENTAGE_REMAINING),
            Some(ZclValue::Int(200))
        );
    }

    #[tokio::test]
    async fn test_setpoint_write() {
        let (mut device, mut rx) = device();
        device
            .write_attributes(1, id::THERMOSTAT, &[(attrs::OCCUPIED_HEATING_SETPOINT, ZclValue::Int(2150))])
            .await
            .unwrap();
        assert_eq!(sent(&mut rx), vec![(TARGET_TEMP, DpValue::Value(215))]);
    }

    #[tokio::test]
    async fn test_system_mode_and_switch_writes() {
        let (mut device, mut rx) = device();
        device
            .write_attributes(1, id::THERMOSTAT, &[(attrs::SYSTEM_MODE, ZclValue::Int(0))])
            .await
            .unwrap();
        assert_eq!(sent(&mut rx), vec![(ON_OFF, DpValue::Bool(false))]);

        let status = device.command(3, id::ON_OFF, 0x01, &[]).await.unwrap();
        assert_eq!(status, zigbee_core::Status::Success);
        assert_eq!(sent(&mut rx), vec![(ANTI_FREEZE, DpValue::Bool(true))]);

        device.command(1, id::ON_OFF, 0x00, &[]).await.unwrap();
        assert_eq!(sent(&mut rx), vec![(WINDOW_DETECT, DpValue::Bool(false))]);
    }

    #[tokio::test]
    async fn test_calibration_control() {
        let (mut device, mut rx) = device();
        device.handle_report(TEMP_CORRECTION, DpValue::Value(-2));
        assert_eq!(
            device.read_attribute(1, id::THERMOSTAT, attrs::LOCAL_TEMPERATURE_CALIBRATION),
            Some(ZclValue::Int(-2))
        );
        assert_eq!(
            device.state().analog_value(Feature::TemperatureCalibration),
            Some(-2.0)
        );

        device
            .write_attributes(
                7,
                id::ANALOG_OUTPUT,
                &[(zigbee_core::cluster::analog_output_attrs::PRESENT_VALUE, ZclValue::Float(3.0))],
            )
            .await
            .unwrap();
        assert_eq!(sent(&mut rx), vec![(TEMP_CORRECTION, DpValue::Value(3))]);
    }
}
