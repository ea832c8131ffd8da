//! RtiTek radiator valves
//!
//! The second generation moved the valve position to another data point and
//! dropped boost and the firmware version report.

use super::{int, ts0601_endpoint};
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
    ProgrammingOperationMode, SystemMode,
};
use zigbee_core::ZclValue;

pub const TARGET_TEMP: u16 = 0x0202;
pub const TEMPERATURE: u16 = 0x0203;
/// 0 schedule, 1 manual, 2 off, 3 on
pub const MODE: u16 = 0x0401;
pub const CHILD_LOCK: u16 = 0x010C;
pub const TEMP_CALIBRATION: u16 = 0x0265;
pub const MIN_TEMPERATURE: u16 = 0x020F;
pub const MAX_TEMPERATURE: u16 = 0x0210;
pub const WINDOW_DETECT: u16 = 0x0108;
pub const BOOST: u16 = 0x0104;
/// Seconds of boost left
pub const BOOST_COUNTDOWN: u16 = 0x0205;
pub const VALVE_POSITION: u16 = 0x0266;
pub const VALVE_POSITION_V2: u16 = 0x026C;
/// 0 closed, 1 open
pub const VALVE_STATE: u16 = 0x0406;
pub const BATTERY: u16 = 0x020D;
/// 109 reads as 1.0.9
pub const SOFTWARE_VERSION: u16 = 0x0296;

/// Mode value standing in for an active boost
const MODE_BOOST: i64 = 5;

static ATTRIBUTES: [ManufAttr; 14] = [
    ManufAttr::new(TARGET_TEMP, "target_temperature"),
    ManufAttr::new(TEMPERATURE, "temperature"),
    ManufAttr::new(MODE, "mode"),
    ManufAttr::new(CHILD_LOCK, "child_lock"),
    ManufAttr::new(TEMP_CALIBRATION, "temperature_calibration"),
    ManufAttr::new(MIN_TEMPERATURE, "min_temperature"),
    ManufAttr::new(MAX_TEMPERATURE, "max_temperature"),
    ManufAttr::new(WINDOW_DETECT, "window_detection"),
    ManufAttr::new(BOOST, "boost_enabled"),
    ManufAttr::new(BOOST_COUNTDOWN, "boost_duration_seconds"),
    ManufAttr::new(VALVE_POSITION, "valve_position"),
    ManufAttr::new(VALVE_STATE, "valve_state"),
    ManufAttr::new(BATTERY, "battery"),
    ManufAttr::new(SOFTWARE_VERSION, "software_version"),
];

static ATTRIBUTES_V2: [ManufAttr; 11] = [
    ManufAttr::new(TARGET_TEMP, "target_temperature"),
    ManufAttr::new(TEMPERATURE, "temperature"),
    ManufAttr::new(MODE, "mode"),
    ManufAttr::new(CHILD_LOCK, "child_lock"),
    ManufAttr::new(TEMP_CALIBRATION, "temperature_calibration"),
    ManufAttr::new(MIN_TEMPERATURE, "min_temperature"),
    ManufAttr::new(MAX_TEMPERATURE, "max_temperature"),
    ManufAttr::new(WINDOW_DETECT, "window_detection"),
    ManufAttr::new(VALVE_POSITION_V2, "valve_position"),
    ManufAttr::new(VALVE_STATE, "valve_state"),
    ManufAttr::new(BATTERY, "battery"),
];

static MAPPINGS: [DirectMapping; 6] = [
    DirectMapping::new(TEMPERATURE, attrs::LOCAL_TEMPERATURE, Conversion::Scale(10)),
    DirectMapping::new(TARGET_TEMP, attrs::OCCUPIED_HEATING_SETPOINT, Conversion::Scale(10)),
    DirectMapping::new(
        TEMP_CALIBRATION,
        attrs::LOCAL_TEMPERATURE_CALIBRATION,
        Conversion::Scale(10),
    ),
    DirectMapping::new(MIN_TEMPERATURE, attrs::MIN_HEAT_SETPOINT_LIMIT, Conversion::Scale(10)),
    DirectMapping::new(MAX_TEMPERATURE, attrs::MAX_HEAT_SETPOINT_LIMIT, Conversion::Scale(10)),
    DirectMapping::new(VALVE_POSITION, attrs::VALVE_POSITION, Conversion::Scale(10)),
];

static MAPPINGS_V2: [DirectMapping; 6] = [
    DirectMapping::new(TEMPERATURE, attrs::LOCAL_TEMPERATURE, Conversion::Scale(10)),
    DirectMapping::new(TARGET_TEMP, attrs::OCCUPIED_HEATING_SETPOINT, Conversion::Scale(10)),
    DirectMapping::new(
        TEMP_CALIBRATION,
        attrs::LOCAL_TEMPERATURE_CALIBRATION,
        Conversion::Scale(10),
    ),
    DirectMapping::new(MIN_TEMPERATURE, attrs::MIN_HEAT_SETPOINT_LIMIT, Conversion::Scale(10)),
    DirectMapping::new(MAX_TEMPERATURE, attrs::MAX_HEAT_SETPOINT_LIMIT, Conversion::Scale(10)),
    DirectMapping::new(VALVE_POSITION_V2, attrs::VALVE_POSITION, Conversion::Scale(10)),
];

const fn celsius(description: &'static str, min: f64, max: f64, resolution: f64) -> AnalogSpec {
    AnalogSpec {
        description,
        min,
        max,
        resolution,
        application_type: 13 << 16,
        engineering_units: 62,
        writable: true,
    }
}

static VALVE: AnalogSpec = AnalogSpec {
    description: "Valve Position",
    min: 0.0,
    max: 100.0,
    resolution: 0.1,
    application_type: 4 << 16,
    engineering_units: 98,
    writable: true,
};
static VALVE_V2: AnalogSpec = AnalogSpec {
    description: "Valve Position",
    min: 0.0,
    max: 100.0,
    resolution: 1.0,
    application_type: 4 << 16,
    engineering_units: 98,
    writable: true,
};
static CALIBRATION: AnalogSpec = celsius("Temperature Calibration", -2.0, 2.0, 0.1);
static CALIBRATION_V2: AnalogSpec = celsius("Temperature Calibration", -10.0, 10.0, 0.1);
static MIN_TEMP: AnalogSpec = celsius("Min Temperature", 5.0, 15.0, 0.1);
static MIN_TEMP_V2: AnalogSpec = celsius("Min Temperature", 5.0, 15.0, 1.0);
static MAX_TEMP: AnalogSpec = celsius("Max Temperature", 15.0, 35.0, 0.1);
static MAX_TEMP_V2: AnalogSpec = celsius("Max Temperature", 20.0, 35.0, 1.0);

static BOOST_COUNTDOWN_SPEC: AnalogSpec = AnalogSpec {
    description: "Boost Countdown",
    min: 0.0,
    max: 9999.0,
    resolution: 1.0,
    application_type: 12 << 16,
    engineering_units: 73,
    writable: false,
};

static SOFTWARE_VERSION_SPEC: AnalogSpec = AnalogSpec {
    description: "Software version",
    min: 0.0,
    max: 9999.0,
    resolution: 1.0,
    application_type: 0,
    engineering_units: 95,
    writable: false,
};

/// Analog controls holding decidegree or per-mille values
const DECI_CONTROLS: [Feature; 4] = [
    Feature::ValvePosition,
    Feature::TemperatureCalibration,
    Feature::MinTemperature,
    Feature::MaxTemperature,
];

/// Generation differences
#[derive(Debug)]
struct Model {
    attributes: &'static [ManufAttr],
    mappings: &'static [DirectMapping],
    valve_position: u16,
    boost: bool,
}

static RTITEK: Model = Model {
    attributes: &ATTRIBUTES,
    mappings: &MAPPINGS,
    valve_position: VALVE_POSITION,
    boost: true,
};

static RTITEK2: Model = Model {
    attributes: &ATTRIBUTES_V2,
    mappings: &MAPPINGS_V2,
    valve_position: VALVE_POSITION_V2,
    boost: false,
};

pub struct RtiTek {
    model: &'static Model,
}

impl RtiTek {
    fn control_attr(&self, feature: Feature) -> Option<u16> {
        match feature {
            Feature::ValvePosition => Some(self.model.valve_position),
            Feature::TemperatureCalibration => Some(TEMP_CALIBRATION),
            Feature::MinTemperature => Some(MIN_TEMPERATURE),
            Feature::MaxTemperature => Some(MAX_TEMPERATURE),
            _ => None,
        }
    }

    fn mode_update(&self, mode: i64) -> ModeUpdate {
        let update = match mode {
            1..=3 => ModeUpdate::preset(Preset::Manual).programming(ProgrammingOperationMode::Simple),
            MODE_BOOST if self.model.boost => {
                ModeUpdate::preset(Preset::Boost).programming(ProgrammingOperationMode::Simple)
            }
            _ => ModeUpdate::preset(Preset::Schedule)
                .programming(ProgrammingOperationMode::ScheduleProgrammingMode),
        };
        let system_mode = if mode == 2 { SystemMode::Off } else { SystemMode::Heat };
        update.occupancy(Occupancy::Occupied).system_mode(system_mode)
    }

    fn preset_write(&self, preset: Preset) -> Option<ManufWrite> {
        let write = match (preset, self.model.boost) {
            (Preset::Schedule, true) => vec![(MODE, ManufValue::Int(0)), (BOOST, false.into())],
            (Preset::Manual, true) => vec![(MODE, ManufValue::Int(1)), (BOOST, false.into())],
            (Preset::Boost, true) => vec![(BOOST, true.into())],
            (Preset::Schedule, false) => vec![(MODE, ManufValue::Int(0))],
            (Preset::Manual, false) => vec![(MODE, ManufValue::Int(1))],
            _ => {
                tracing::warn!("Unsupported preset {:?}", preset);
                return None;
            }
        };
        Some(write)
    }
}

impl Quirk for RtiTek {
    fn attributes(&self) -> &'static [ManufAttr] {
        self.model.attributes
    }

    fn direct_mappings(&self) -> &[DirectMapping] {
        self.model.mappings
    }

    fn report_guard(&self) -> ReportGuard {
        ReportGuard::Below(60000)
    }

    fn decode(&self, state: &mut DeviceState, attr: u16, value: &DpValue) {
        let v = int(value);
        match attr {
            WINDOW_DETECT => state.set_binary(Feature::WindowOpen, v != 0),
            CHILD_LOCK => state.child_lock_change(v != 0),
            MODE => state.apply_mode(self.mode_update(v)),
            BOOST if self.model.boost && v == 1 => state.apply_mode(self.mode_update(MODE_BOOST)),
            VALVE_STATE => state.state_change(v != 0),
            BATTERY => state.battery_change(v as f64),
            BOOST_COUNTDOWN if self.model.boost => state.set_analog(Feature::BoostCountdown, v as f64),
            SOFTWARE_VERSION if self.model.boost => {
                state.set_analog(Feature::SoftwareVersion, v as f64);
            }
            _ => {
                if let Some(feature) = DECI_CONTROLS
                    .iter()
                    .find(|f| self.control_attr(**f) == Some(attr))
                {
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
                attrs::OCCUPIED_HEATING_SETPOINT
                | attrs::LOCAL_TEMPERATURE_CALIBRATION
                | attrs::MIN_HEAT_SETPOINT_LIMIT
                | attrs::MAX_HEAT_SETPOINT_LIMIT
                | attrs::VALVE_POSITION,
            ) => {
                let (manuf, raw) = reverse_direct(self.model.mappings, attr, value.as_int()?)?;
                (manuf, ManufValue::Int(raw))
            }
            (Target::Thermostat, attrs::OPERATION_PRESET) => {
                let preset = Preset::try_from(u8::try_from(value.as_int()?).ok()?).ok()?;
                return self.preset_write(preset);
            }
            (Target::Thermostat, attrs::PROGRAMING_OPER_MODE | attrs::OCCUPANCY) => {
                let mode = resolve_programming_write(state.thermostat()?, attr, value)?;
                let raw = i64::from(mode == ProgrammingOperationMode::Simple);
                (MODE, ManufValue::Int(raw))
            }
            (Target::Thermostat, attrs::SYSTEM_MODE) => {
                let raw = if value.as_int()? == SystemMode::Off as i64 { 2 } else { 0 };
                (MODE, ManufValue::Int(raw))
            }
            (Target::UserInterface, user_interface_attrs::KEYPAD_LOCKOUT) => {
                (CHILD_LOCK, (value.as_int()? != 0).into())
            }
            (Target::Switch(Feature::ChildLock), on_off_attrs::ON_OFF) => {
                (CHILD_LOCK, value.as_bool()?.into())
            }
            (Target::Analog(feature), _) => {
                let manuf = self.control_attr(feature)?;
                (manuf, scale_to_raw(value.as_float()?, 10.0).into())
            }
            _ => return None,
        };
        Some(vec![write])
    }
}

fn thermostat_endpoint() -> EndpointLayout {
    EndpointLayout::new(1, device_type::THERMOSTAT)
        .passthrough(&[id::BASIC, id::GROUPS, id::SCENES])
        .with(ClusterSpec::Manufacturer)
        .with(ClusterSpec::Thermostat(SetpointLimits::new(500, 3500)))
        .with(ClusterSpec::UserInterface)
        .with(ClusterSpec::BinaryInput(Feature::WindowOpen))
        .with(ClusterSpec::PowerConfiguration(None))
        .with_out(&[id::TIME, id::OTA])
}

fn analog_endpoint(ep: u8, feature: Feature, spec: &'static AnalogSpec) -> EndpointLayout {
    EndpointLayout::new(ep, device_type::CONSUMPTION_AWARENESS_DEVICE)
        .with(ClusterSpec::AnalogOutput(feature, spec))
}

#[must_use]
pub fn descriptors() -> Vec<QuirkDescriptor> {
    vec![
        QuirkDescriptor {
            name: "rtitek",
            models: &[
                ("_TZE200_a4bpgplm", "TS0601"),
                ("_TZE200_dv8abrrz", "TS0601"),
                ("_TZE200_z1tyspqw", "TS0601"),
                ("_TZE200_rtrmfadk", "TS0601"),
            ],
            signature: vec![ts0601_endpoint(device_type::SMART_PLUG)],
            replacement: vec![
                thermostat_endpoint(),
                EndpointLayout::new(2, device_type::ON_OFF_SWITCH)
                    .with(ClusterSpec::OnOff(Feature::ChildLock)),
                analog_endpoint(3, Feature::ValvePosition, &VALVE),
                analog_endpoint(4, Feature::TemperatureCalibration, &CALIBRATION),
                analog_endpoint(5, Feature::BoostCountdown, &BOOST_COUNTDOWN_SPEC),
                analog_endpoint(6, Feature::MinTemperature, &MIN_TEMP),
                analog_endpoint(7, Feature::MaxTemperature, &MAX_TEMP),
                analog_endpoint(8, Feature::SoftwareVersion, &SOFTWARE_VERSION_SPEC),
            ],
            build: |_| Box::new(RtiTek { model: &RTITEK }),
        },
        QuirkDescriptor {
            name: "rtitek2",
            models: &[
                ("_TZE200_bvrlmajk", "TS0601"),
                ("_TZE204_9mjy74mp", "TS0601"),
                ("_TZE200_9mjy74mp", "TS0601"),
                ("_TZE200_rtrmfadk", "TS0601"),
            ],
            signature: vec![ts0601_endpoint(device_type::SMART_PLUG)],
            replacement: vec![
                thermostat_endpoint(),
                EndpointLayout::new(2, device_type::ON_OFF_SWITCH)
                    .with(ClusterSpec::OnOff(Feature::ChildLock)),
                analog_endpoint(3, Feature::ValvePosition, &VALVE_V2),
                analog_endpoint(4, Feature::TemperatureCalibration, &CALIBRATION_V2),
                analog_endpoint(5, Feature::MinTemperature, &MIN_TEMP_V2),
                analog_endpoint(6, Feature::MaxTemperature, &MAX_TEMP_V2),
            ],
            build: |_| Box::new(RtiTek { model: &RTITEK2 }),
        },
    ]
}
