//! Zonnsmart TV01/TV02 radiator valves and their rebrands

use super::{int, ts0601_endpoint};
use crate::clusters::{AnalogSpec, ClusterSpec, Feature, ModeUpdate, SetpointLimits};
use crate::convert::{reverse_direct, scale_to_raw, Conversion, DirectMapping};
use crate::device::DeviceState;
use crate::manufacturer::{ManufAttr, ManufValue, ManufWrite};
use crate::quirk::{EndpointLayout, Quirk, QuirkDescriptor, Target};
use tuya_protocol::DpValue;
use zigbee_core::cluster::thermostat_attrs as attrs;
use zigbee_core::cluster::{
    device_type, id, on_off_attrs, user_interface_attrs, ProgrammingOperationMode, SystemMode,
};
use zigbee_core::ZclValue;

pub const CHILD_LOCK: u16 = 0x0128;
pub const WINDOW_DETECT: u16 = 0x0108;
pub const TARGET_TEMP: u16 = 0x0210;
pub const TEMPERATURE: u16 = 0x0218;
pub const BATTERY: u16 = 0x0223;
/// 0 schedule, 1 manual, 2 holiday, 3 holiday ready
pub const MODE: u16 = 0x0402;
pub const HEATING_STOP: u16 = 0x016B;
/// Boost time left in seconds
pub const BOOST_TIME: u16 = 0x0265;
pub const UPTIME: u16 = 0x0024;
pub const TEMP_CALIBRATION: u16 = 0x021B;
pub const COMFORT_TEMP: u16 = 0x0268;
pub const ECO_TEMP: u16 = 0x0269;

/// Boost length the valve runs when switched on from the controller
const BOOST_SECONDS: i64 = 299;

static ATTRIBUTES: [ManufAttr; 12] = [
    ManufAttr::new(CHILD_LOCK, "child_lock"),
    ManufAttr::new(WINDOW_DETECT, "window_detection"),
    ManufAttr::new(TARGET_TEMP, "target_temperature"),
    ManufAttr::new(TEMPERATURE, "temperature"),
    ManufAttr::new(BATTERY, "battery"),
    ManufAttr::new(MODE, "mode"),
    ManufAttr::new(BOOST_TIME, "boost_duration_seconds"),
    ManufAttr::new(UPTIME, "uptime"),
    ManufAttr::new(HEATING_STOP, "heating_stop"),
    ManufAttr::new(TEMP_CALIBRATION, "temperature_calibration"),
    ManufAttr::new(COMFORT_TEMP, "comfort_mode_temperature"),
    ManufAttr::new(ECO_TEMP, "eco_mode_temperature"),
];

static MAPPINGS: [DirectMapping; 3] = [
    DirectMapping::new(TEMPERATURE, attrs::LOCAL_TEMPERATURE, Conversion::Scale(10)),
    DirectMapping::new(TARGET_TEMP, attrs::OCCUPIED_HEATING_SETPOINT, Conversion::Scale(10)),
    DirectMapping::new(
        TEMP_CALIBRATION,
        attrs::LOCAL_TEMPERATURE_CALIBRATION,
        Conversion::Scale(10),
    ),
];

static CALIBRATION: AnalogSpec = AnalogSpec {
    description: "Temperature calibration",
    min: -5.5,
    max: 5.5,
    resolution: 0.1,
    application_type: 13 << 16,
    engineering_units: 62,
    writable: true,
};

static COMFORT: AnalogSpec = AnalogSpec {
    description: "Comfort Temperature",
    min: 5.0,
    max: 30.0,
    resolution: 0.5,
    application_type: 13 << 16,
    engineering_units: 62,
    writable: true,
};

static ECO: AnalogSpec = AnalogSpec {
    description: "Eco Temperature",
    min: 5.0,
    max: 30.0,
    resolution: 0.5,
    application_type: 13 << 16,
    engineering_units: 62,
    writable: true,
};

/// Analog controls and the decidegree attribute behind each
const DECIDEGREE_CONTROLS: [(Feature, u16); 3] = [
    (Feature::TemperatureCalibration, TEMP_CALIBRATION),
    (Feature::ComfortTemperature, COMFORT_TEMP),
    (Feature::EcoTemperature, ECO_TEMP),
];

pub struct Zonnsmart;

impl Zonnsmart {
    fn mode_write(state: &DeviceState, attr: u16, value: &ZclValue) -> Option<(u16, ManufValue)> {
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
            (
                Some(thermostat.system_mode().unwrap_or(SystemMode::Heat)),
                ProgrammingOperationMode::try_from(raw).ok()?,
            )
        };

        match (system_mode, programming) {
            (Some(SystemMode::Off), _) => Some((HEATING_STOP, ManufValue::Int(1))),
            (Some(SystemMode::Heat), ProgrammingOperationMode::ScheduleProgrammingMode) => {
                Some((MODE, ManufValue::Int(0)))
            }
            (Some(SystemMode::Heat), ProgrammingOperationMode::Simple) => {
                Some((MODE, ManufValue::Int(1)))
            }
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

impl Quirk for Zonnsmart {
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
                let programming = if v == 0 {
                    ProgrammingOperationMode::ScheduleProgrammingMode
                } else {
                    ProgrammingOperationMode::Simple
                };
                state.apply_mode(ModeUpdate {
                    programming: Some(programming),
                    system_mode: Some(SystemMode::Heat),
                    ..ModeUpdate::default()
                });
            }
            HEATING_STOP => {
                state.state_change(v == 0);
                state.set_system_mode(if v == 1 { SystemMode::Off } else { SystemMode::Heat });
            }
            CHILD_LOCK => state.child_lock_change(v != 0),
            BATTERY => state.battery_change(v as f64),
            BOOST_TIME => state.set_switch(Feature::Boost, v > 0),
            _ => {
                if let Some((feature, _)) = DECIDEGREE_CONTROLS.iter().find(|(_, a)| *a == attr) {
                    state.set_analog(*feature, v as f64 / 10.0);
                }
            }
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
                Self::mode_write(state, attr, value)?
            }
            (Target::UserInterface, user_interface_attrs::KEYPAD_LOCKOUT) => {
                (CHILD_LOCK, (value.as_int()? != 0).into())
            }
            (Target::Switch(Feature::ChildLock), on_off_attrs::ON_OFF) => {
                (CHILD_LOCK, value.as_bool()?.into())
            }
            (Target::Switch(Feature::Boost), on_off_attrs::ON_OFF) => {
                let seconds = if value.as_bool()? { BOOST_SECONDS } else { 0 };
                (BOOST_TIME, ManufValue::Int(seconds))
            }
            (Target::Analog(feature), _) => {
                let (_, manuf) = DECIDEGREE_CONTROLS.iter().find(|(f, _)| *f == feature)?;
                (*manuf, scale_to_raw(value.as_float()?, 10.0).into())
            }
            _ => return None,
        };
        Some(vec![write])
    }
}

#[must_use]
pub fn descriptors() -> Vec<QuirkDescriptor> {
    vec![QuirkDescriptor {
        name: "zonnsmart",
        models: &[
            ("_TZE200_7yoranx2", "TS0601"),
            ("_TZE200_e9ba97vf", "TS0601"),
            ("_TZE200_hue3yfsn", "TS0601"),
            ("_TZE200_husqqvux", "TS0601"),
            ("_TZE200_kly8gjlz", "TS0601"),
            ("_TZE200_lnbfnyxd", "TS0601"),
            ("_TZE200_mudxchsu", "TS0601"),
            ("_TZE200_kds0pmmv", "TS0601"),
            ("_TZE200_sur6q7ko", "TS0601"),
            ("_TZE200_lllliz3p", "TS0601"),
        ],
        signature: vec![ts0601_endpoint(device_type::SMART_PLUG)],
        replacement: vec![
            EndpointLayout::new(1, device_type::THERMOSTAT)
                .passthrough(&[id::BASIC, id::GROUPS, id::SCENES])
                .with(ClusterSpec::Manufacturer)
                .with(ClusterSpec::Thermostat(SetpointLimits::new(500, 3000)))
                .with(ClusterSpec::UserInterface)
                .with(ClusterSpec::PowerConfiguration(None))
                .with_out(&[id::TIME, id::OTA]),
            EndpointLayout::new(2, device_type::ON_OFF_SWITCH)
                .with(ClusterSpec::OnOff(Feature::ChildLock)),
            EndpointLayout::new(3, device_type::CONSUMPTION_AWARENESS_DEVICE)
                .with(ClusterSpec::AnalogOutput(Feature::TemperatureCalibration, &CALIBRATION)),
            EndpointLayout::new(4, device_type::CONSUMPTION_AWARENESS_DEVICE)
                .with(ClusterSpec::AnalogOutput(Feature::ComfortTemperature, &COMFORT)),
            EndpointLayout::new(5, device_type::CONSUMPTION_AWARENESS_DEVICE)
                .with(ClusterSpec::AnalogOutput(Feature::EcoTemperature, &ECO)),
            EndpointLayout::new(6, device_type::ON_OFF_SWITCH)
                .with(ClusterSpec::OnOff(Feature::Boost)),
        ],
        build: |_| Box::new(Zonnsmart),
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vendors::testing::{attach, sent};
    use zigbee_core::cluster::{analog_output_attrs, RunningState};

    fn device() -> (crate::QuirkDevice, tokio::sync::mpsc::Receiver<crate::Outbound>) {
        attach(&descriptors()[0], "_TZE200_e9ba97vf")
    }

    #[test]
    fn test_heating_stop() {
        let (mut device, _rx) = device();
        device.handle_report(HEATING_STOP, DpValue::Bool(true));
        let thermostat = device.state().thermostat().unwrap();
        assert_eq!(thermostat.system_mode(), Some(SystemMode::Off));
        assert_eq!(
            thermostat.get(attrs::RUNNING_STATE),
            Some(RunningState::Idle as i64)
        );

        device.handle_report(HEATING_STOP, DpValue::Bool(false));
        let thermostat = device.state().thermostat().unwrap();
        assert_eq!(thermostat.system_mode(), Some(SystemMode::Heat));
        assert_eq!(
            thermostat.get(attrs::RUNNING_STATE),
            Some(RunningState::HeatStateOn as i64)
        );
    }

    #[test]
    fn test_decidegree_controls() {
        let (mut device, _rx) = device();
        device.handle_report(TEMP_CALIBRATION, DpValue::Value(-15));
        device.handle_report(COMFORT_TEMP, DpValue::Value(215));
        device.handle_report(BATTERY, DpValue::Value(98));

        assert_eq!(
            device.read_attribute(1, id::THERMOSTAT, attrs::LOCAL_TEMPERATURE_CALIBRATION),
            Some(ZclValue::Int(-150))
        );
        assert_eq!(device.state().analog_value(Feature::TemperatureCalibration), Some(-1.5));
        assert_eq!(device.state().analog_value(Feature::ComfortTemperature), Some(21.5));
        assert_eq!(
            device.read_attribute(1, id::POWER_CONFIG, 0x0021),
            Some(ZclValue::Int(196))
        );
    }

    #[tokio::test]
    async fn test_system_mode_writes() {
        let (mut device, mut rx) = device();
        device
            .write_attributes(1, id::THERMOSTAT, &[(attrs::SYSTEM_MODE, ZclValue::Int(0))])
            .await
            .unwrap();
        assert_eq!(sent(&mut rx), vec![(HEATING_STOP, DpValue::Bool(true))]);

        device
            .write_attributes(1, id::THERMOSTAT, &[(attrs::PROGRAMING_OPER_MODE, ZclValue::Int(1))])
            .await
            .unwrap();
        assert_eq!(sent(&mut rx), vec![(MODE, DpValue::Enum(0))]);
    }

    #[tokio::test]
    async fn test_boost_and_eco_writes() {
        let (mut device, mut rx) = device();
        device.command(6, id::ON_OFF, 0x01, &[]).await.unwrap();
        assert_eq!(sent(&mut rx), vec![(BOOST_TIME, DpValue::Value(299))]);

        device
            .write_attributes(
                5,
                id::ANALOG_OUTPUT,
                &[(analog_output_attrs::PRESENT_VALUE, ZclValue::Float(17.5))],
            )
            .await
            .unwrap();
        assert_eq!(sent(&mut rx), vec![(ECO_TEMP, DpValue::Value(175))]);
    }
}
