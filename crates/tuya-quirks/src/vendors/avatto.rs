//! Avatto and Beok wall thermostats

use super::{green_power_endpoint, int, ts0601_endpoint};
use crate::clusters::{
    resolve_programming_write, AnalogSpec, ClusterSpec, Feature, ModeUpdate, SetpointLimits,
};
use crate::convert::{reverse_direct, scale_to_raw, Conversion, DirectMapping, ReportGuard};
use crate::device::DeviceState;
use crate::manufacturer::{ManufAttr, ManufValue, ManufWrite};
use crate::quirk::{EndpointLayout, Quirk, QuirkDescriptor, Target};
use tuya_protocol::DpValue;
use zigbee_core::cluster::thermostat_attrs as attrs;
use zigbee_core::cluster::{
    device_type, id, on_off_attrs, user_interface_attrs, Occupancy, Preset,
    ProgrammingOperationMode, SystemMode, GP_PROFILE,
};
use zigbee_core::ZclValue;

pub const TARGET_TEMP: u16 = 0x0210;
pub const TEMPERATURE: u16 = 0x0218;
/// 0 manual, 1 schedule
pub const MODE: u16 = 0x0402;
pub const SYSTEM_MODE: u16 = 0x0101;
/// 0 while heating
pub const HEAT_STATE: u16 = 0x0424;
/// 1 while heating
pub const BEOK_HEAT_STATE: u16 = 0x0403;
pub const CHILD_LOCK: u16 = 0x0128;
pub const TEMP_CALIBRATION: u16 = 0x021B;
pub const DEADZONE: u16 = 0x0214;

static ATTRIBUTES: [ManufAttr; 9] = [
    ManufAttr::new(TEMPERATURE, "temperature"),
    ManufAttr::new(TARGET_TEMP, "target_temperature"),
    ManufAttr::new(MODE, "mode"),
    ManufAttr::new(SYSTEM_MODE, "system_mode"),
    ManufAttr::new(HEAT_STATE, "heat_state"),
    ManufAttr::new(BEOK_HEAT_STATE, "beok_heat_state"),
    ManufAttr::new(CHILD_LOCK, "child_lock"),
    ManufAttr::new(TEMP_CALIBRATION, "temperature_calibration"),
    ManufAttr::new(DEADZONE, "deadzone_temp"),
];

/// Whole degrees on the wire
static DEGREE_MAPPINGS: [DirectMapping; 2] = [
    DirectMapping::new(TEMPERATURE, attrs::LOCAL_TEMPERATURE, Conversion::Scale(100)),
    DirectMapping::new(TARGET_TEMP, attrs::OCCUPIED_HEATING_SETPOINT, Conversion::Scale(100)),
];

static DECIDEGREE_MAPPINGS: [DirectMapping; 2] = [
    DirectMapping::new(TEMPERATURE, attrs::LOCAL_TEMPERATURE, Conversion::Scale(10)),
    DirectMapping::new(TARGET_TEMP, attrs::OCCUPIED_HEATING_SETPOINT, Conversion::Scale(10)),
];

/// Room temperature in decidegrees, setpoint in degrees
static MIXED_MAPPINGS: [DirectMapping; 2] = [
    DirectMapping::new(TEMPERATURE, attrs::LOCAL_TEMPERATURE, Conversion::Scale(10)),
    DirectMapping::new(TARGET_TEMP, attrs::OCCUPIED_HEATING_SETPOINT, Conversion::Scale(100)),
];

const LIMITS: SetpointLimits = SetpointLimits::new(500, 3000);

static CALIBRATION: AnalogSpec = AnalogSpec {
    description: "Temperature Calibration",
    min: -10.0,
    max: 10.0,
    resolution: 0.1,
    application_type: 13 << 16,
    engineering_units: 62,
    writable: true,
};

static DEADZONE_SPEC: AnalogSpec = AnalogSpec {
    description: "Deadzone Temperature",
    min: 0.0,
    max: 5.0,
    resolution: 1.0,
    application_type: 13 << 16,
    engineering_units: 62,
    writable: true,
};

/// Firmware differences between manufacturer ids
#[derive(Debug, Clone, Copy)]
struct Model {
    mappings: &'static [DirectMapping],
    /// Raw calibration units per displayed degree
    calibration_scale: f64,
    /// `heat_state` reads 0 while heating
    heat_state_inverted: bool,
}

impl Model {
    fn for_manufacturer(manufacturer: &str) -> Self {
        let mappings: &'static [DirectMapping] = match manufacturer {
            "_TZE200_2ekuz3dz" | "_TZE200_g9a3awaj" => &DECIDEGREE_MAPPINGS,
            "_TZE200_u9bfwha0" | "_TZE204_u9bfwha0" | "_TZE200_aoclfnxz" | "_TZE204_aoclfnxz" => {
                &MIXED_MAPPINGS
            }
            _ => &DEGREE_MAPPINGS,
        };
        let decidegree = matches!(manufacturer, "_TZE200_2ekuz3dz" | "_TZE200_g9a3awaj");
        Self {
            mappings,
            calibration_scale: if decidegree { 10.0 } else { 1.0 },
            heat_state_inverted: manufacturer != "_TZE200_g9a3awaj",
        }
    }
}

pub struct Avatto {
    model: Model,
}

impl Quirk for Avatto {
    fn attributes(&self) -> &'static [ManufAttr] {
        &ATTRIBUTES
    }

    fn direct_mappings(&self) -> &[DirectMapping] {
        self.model.mappings
    }

    fn report_guard(&self) -> ReportGuard {
        ReportGuard::Below(500)
    }

    fn decode(&self, state: &mut DeviceState, attr: u16, value: &DpValue) {
        let v = int(value);
        match attr {
            MODE => state.apply_mode(mode_update(v)),
            SYSTEM_MODE => {
                state.set_system_mode(if v == 0 { SystemMode::Off } else { SystemMode::Heat });
            }
            HEAT_STATE => {
                let heating = if self.model.heat_state_inverted { v == 0 } else { v != 0 };
                state.state_change(heating);
            }
            BEOK_HEAT_STATE => state.state_change(v != 0),
            CHILD_LOCK => state.child_lock_change(v != 0),
            TEMP_CALIBRATION => state.set_analog(
                Feature::TemperatureCalibration,
                v as f64 / self.model.calibration_scale,
            ),
            DEADZONE => state.set_analog(Feature::Deadzone, v as f64),
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
        let write = match target {
            Target::Thermostat => match attr {
                attrs::OCCUPIED_HEATING_SETPOINT => {
                    let (manuf, raw) = reverse_direct(self.model.mappings, attr, value.as_int()?)?;
                    (manuf, raw.into())
                }
                attrs::OPERATION_PRESET | attrs::PROGRAMING_OPER_MODE | attrs::OCCUPANCY => {
                    (MODE, ManufValue::Int(mode_write(state, attr, value)?))
                }
                attrs::SYSTEM_MODE => {
                    (SYSTEM_MODE, (value.as_int()? != SystemMode::Off as i64).into())
                }
                _ => return None,
            },
            Target::UserInterface if attr == user_interface_attrs::KEYPAD_LOCKOUT => {
                (CHILD_LOCK, (value.as_int()? != 0).into())
            }
            Target::Switch(Feature::ChildLock) if attr == on_off_attrs::ON_OFF => {
                (CHILD_LOCK, value.as_bool()?.into())
            }
            Target::Analog(Feature::TemperatureCalibration) => (
                TEMP_CALIBRATION,
                scale_to_raw(value.as_float()?, self.model.calibration_scale).into(),
            ),
            Target::Analog(Feature::Deadzone) => {
                (DEADZONE, scale_to_raw(value.as_float()?, 1.0).into())
            }
            _ => return None,
        };
        Some(vec![write])
    }
}

/// Mode byte for a preset, programming mode or occupancy write
///
/// 0 is manual, 1 follows the schedule.
pub(crate) fn mode_write(state: &DeviceState, attr: u16, value: &ZclValue) -> Option<i64> {
    match attr {
        attrs::OPERATION_PRESET => match value.as_int()? {
            v if v == Preset::Schedule as i64 => Some(1),
            v if v == Preset::Manual as i64 => Some(0),
            _ => None,
        },
        attrs::PROGRAMING_OPER_MODE | attrs::OCCUPANCY => {
            let mode = resolve_programming_write(state.thermostat()?, attr, value)?;
            Some(i64::from(mode == ProgrammingOperationMode::ScheduleProgrammingMode))
        }
        _ => None,
    }
}

/// Decoded form of the mode byte
pub(crate) fn mode_update(mode: i64) -> ModeUpdate {
    if mode == 0 {
        ModeUpdate::preset(Preset::Manual)
            .programming(ProgrammingOperationMode::Simple)
            .occupancy(Occupancy::Occupied)
    } else {
        ModeUpdate::preset(Preset::Schedule)
            .programming(ProgrammingOperationMode::ScheduleProgrammingMode)
            .occupancy(Occupancy::Occupied)
    }
}

fn build(manufacturer: &str) -> Box<dyn Quirk> {
    Box::new(Avatto {
        model: Model::for_manufacturer(manufacturer),
    })
}

fn replacement() -> Vec<EndpointLayout> {
    vec![
        EndpointLayout::new(1, device_type::THERMOSTAT)
            .passthrough(&[id::BASIC, id::GROUPS, id::SCENES])
            .with(ClusterSpec::Manufacturer)
            .with(ClusterSpec::Thermostat(LIMITS))
            .with(ClusterSpec::UserInterface)
            .with(ClusterSpec::PowerConfiguration(None))
            .with_out(&[id::TIME, id::OTA]),
        EndpointLayout::new(2, device_type::ON_OFF_SWITCH)
            .with(ClusterSpec::OnOff(Feature::ChildLock)),
        EndpointLayout::new(3, device_type::CONSUMPTION_AWARENESS_DEVICE)
            .with(ClusterSpec::AnalogOutput(Feature::TemperatureCalibration, &CALIBRATION)),
        EndpointLayout::new(4, device_type::CONSUMPTION_AWARENESS_DEVICE)
            .with(ClusterSpec::AnalogOutput(Feature::Deadzone, &DEADZONE_SPEC)),
    ]
}

fn green_power_layout() -> EndpointLayout {
    EndpointLayout::new(242, device_type::GREEN_POWER_PROXY_BASIC)
        .profile(GP_PROFILE)
        .with_out(&[id::GREEN_POWER])
}

#[must_use]
pub fn descriptors() -> Vec<QuirkDescriptor> {
    let avatto = QuirkDescriptor {
        name: "avatto",
        models: &[
            ("_TZE200_ye5jkfsb", "TS0601"),
            ("_TZE200_aoclfnxz", "TS0601"),
            ("_TZE200_ztvwu4nk", "TS0601"),
            ("_TZE200_5toc8efa", "TS0601"),
            ("_TZE200_u9bfwha0", "TS0601"),
        ],
        signature: vec![ts0601_endpoint(device_type::SMART_PLUG)],
        replacement: replacement(),
        build,
    };

    let beok = QuirkDescriptor {
        name: "beok",
        models: &[
            ("_TZE200_2ekuz3dz", "TS0601"),
            ("_TZE204_aoclfnxz", "TS0601"),
            ("_TZE204_u9bfwha0", "TS0601"),
            ("_TZE200_g9a3awaj", "TS0601"),
        ],
        signature: vec![
            ts0601_endpoint(device_type::SMART_PLUG),
            green_power_endpoint(),
        ],
        replacement: replacement()
            .into_iter()
            .chain(std::iter::once(green_power_layout()))
            .collect(),
        build,
    };

    // Same firmware, advertised without the Green Power endpoint
    let beok_single = QuirkDescriptor {
        name: "beok",
        models: &[("_TZE200_g9a3awaj", "TS0601")],
        signature: vec![ts0601_endpoint(device_type::SMART_PLUG)],
        replacement: replacement(),
        build,
    };

    vec![avatto, beok, beok_single]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vendors::testing::{attach, sent};
    use zigbee_core::cluster::RunningState;

    fn thermostat(device: &crate::QuirkDevice, attr: u16) -> Option<ZclValue> {
        device.read_attribute(1, id::THERMOSTAT, attr)
    }

    #[test]
    fn test_degree_models_scale_by_100() {
        let (mut device, _rx) = attach(&descriptors()[0], "_TZE200_ye5jkfsb");
        device.handle_report(TEMPERATURE, DpValue::Value(21));
        device.handle_report(TARGET_TEMP, DpValue::Value(22));
        assert_eq!(thermostat(&device, attrs::LOCAL_TEMPERATURE), Some(ZclValue::Int(2100)));
        assert_eq!(
            thermostat(&device, attrs::OCCUPIED_HEATING_SETPOINT),
            Some(ZclValue::Int(2200))
        );
    }

    #[test]
    fn test_mixed_and_decidegree_models() {
        let (mut device, _rx) = attach(&descriptors()[0], "_TZE200_u9bfwha0");
        device.handle_report(TEMPERATURE, DpValue::Value(215));
        device.handle_report(TARGET_TEMP, DpValue::Value(22));
        assert_eq!(thermostat(&device, attrs::LOCAL_TEMPERATURE), Some(ZclValue::Int(2150)));
        assert_eq!(
            thermostat(&device, attrs::OCCUPIED_HEATING_SETPOINT),
            Some(ZclValue::Int(2200))
        );

        let (mut device, _rx) = attach(&descriptors()[1], "_TZE200_2ekuz3dz");
        device.handle_report(TARGET_TEMP, DpValue::Value(215));
        assert_eq!(
            thermostat(&device, attrs::OCCUPIED_HEATING_SETPOINT),
            Some(ZclValue::Int(2150))
        );
    }

    #[test]
    fn test_out_of_range_report_is_dropped() {
        let (mut device, _rx) = attach(&descriptors()[0], "_TZE200_ye5jkfsb");
        device.handle_report(TEMPERATURE, DpValue::Value(600));
        assert_eq!(thermostat(&device, attrs::LOCAL_TEMPERATURE), None);
        assert_eq!(device.state().manufacturer().get_int(TEMPERATURE), Some(600));
    }

    #[test]
    fn test_heat_state_polarity() {
        let (mut device, _rx) = attach(&descriptors()[0], "_TZE200_ye5jkfsb");
        device.handle_report(HEAT_STATE, DpValue::Enum(0));
        assert_eq!(
            thermostat(&device, attrs::RUNNING_STATE),
            Some(ZclValue::Int(RunningState::HeatStateOn as i64))
        );

        let (mut device, _rx) = attach(&descriptors()[2], "_TZE200_g9a3awaj");
        device.handle_report(HEAT_STATE, DpValue::Enum(0));
        assert_eq!(
            thermostat(&device, attrs::RUNNING_STATE),
            Some(ZclValue::Int(RunningState::Idle as i64))
        );
        device.handle_report(BEOK_HEAT_STATE, DpValue::Enum(1));
        assert_eq!(
            thermostat(&device, attrs::RUNNING_STATE),
            Some(ZclValue::Int(RunningState::HeatStateOn as i64))
        );
    }

    #[test]
    fn test_mode_report() {
        let (mut device, _rx) = attach(&descriptors()[0], "_TZE200_ye5jkfsb");
        device.handle_report(MODE, DpValue::Enum(1));
        let state = device.state().thermostat().unwrap();
        assert_eq!(state.preset(), Some(Preset::Schedule));
        assert_eq!(
            state.programming_mode(),
            Some(ProgrammingOperationMode::ScheduleProgrammingMode)
        );
        assert_eq!(state.occupancy(), Some(Occupancy::Occupied));

        device.handle_report(MODE, DpValue::Enum(0));
        assert_eq!(device.state().thermostat().unwrap().preset(), Some(Preset::Manual));
    }

    #[tokio::test]
    async fn test_thermostat_writes() {
        let (mut device, mut rx) = attach(&descriptors()[0], "_TZE200_ye5jkfsb");

        device
            .write_attributes(1, id::THERMOSTAT, &[(attrs::OCCUPIED_HEATING_SETPOINT, ZclValue::Int(2150))])
            .await
            .unwrap();
        assert_eq!(sent(&mut rx), vec![(TARGET_TEMP, DpValue::Value(22))]);

        device
            .write_attributes(1, id::THERMOSTAT, &[(attrs::OPERATION_PRESET, ZclValue::Int(2))])
            .await
            .unwrap();
        assert_eq!(sent(&mut rx), vec![(MODE, DpValue::Enum(0))]);

        device
            .write_attributes(1, id::THERMOSTAT, &[(attrs::PROGRAMING_OPER_MODE, ZclValue::Int(1))])
            .await
            .unwrap();
        assert_eq!(sent(&mut rx), vec![(MODE, DpValue::Enum(1))]);

        device
            .write_attributes(1, id::THERMOSTAT, &[(attrs::SYSTEM_MODE, ZclValue::Int(4))])
            .await
            .unwrap();
        assert_eq!(sent(&mut rx), vec![(SYSTEM_MODE, DpValue::Bool(true))]);
    }

    #[tokio::test]
    async fn test_unoccupied_write_fails() {
        let (mut device, mut rx) = attach(&descriptors()[0], "_TZE200_ye5jkfsb");
        let records = device
            .write_attributes(1, id::THERMOSTAT, &[(attrs::OCCUPANCY, ZclValue::Int(0))])
            .await
            .unwrap();
        assert_eq!(records, vec![zigbee_core::WriteStatusRecord::failure(attrs::OCCUPANCY)]);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_calibration_per_model() {
        let (mut device, mut rx) = attach(&descriptors()[1], "_TZE200_2ekuz3dz");
        device.handle_report(TEMP_CALIBRATION, DpValue::Value(-15));
        assert_eq!(
            device.state().analog_value(Feature::TemperatureCalibration),
            Some(-1.5)
        );
        device
            .write_attributes(
                3,
                id::ANALOG_OUTPUT,
                &[(zigbee_core::cluster::analog_output_attrs::PRESENT_VALUE, ZclValue::Float(2.5))],
            )
            .await
            .unwrap();
        assert_eq!(sent(&mut rx), vec![(TEMP_CALIBRATION, DpValue::Value(25))]);

        let (mut device, mut rx) = attach(&descriptors()[0], "_TZE200_ye5jkfsb");
        device
            .write_attributes(
                3,
                id::ANALOG_OUTPUT,
                &[(zigbee_core::cluster::analog_output_attrs::PRESENT_VALUE, ZclValue::Float(-2.0))],
            )
            .await
            .unwrap();
        assert_eq!(sent(&mut rx), vec![(TEMP_CALIBRATION, DpValue::Value(-2))]);
    }

    #[tokio::test]
    async fn test_keypad_lockout_write() {
        let (mut device, mut rx) = attach(&descriptors()[0], "_TZE200_ye5jkfsb");
        device
            .write_attributes(
                1,
                id::THERMOSTAT_UI,
                &[(user_interface_attrs::KEYPAD_LOCKOUT, ZclValue::Int(1))],
            )
            .await
            .unwrap();
        assert_eq!(sent(&mut rx), vec![(CHILD_LOCK, DpValue::Bool(true))]);
    }

    #[test]
    fn test_beok_layout_keeps_green_power() {
        let beok = &descriptors()[1];
        let endpoints = beok.replacement_endpoints();
        let gp = endpoints.iter().find(|e| e.id == 242).unwrap();
        assert_eq!(gp.profile_id, GP_PROFILE);
        assert!(gp.out_clusters.contains(&id::GREEN_POWER));
    }
}
