//! Beca radiator valve
//!
//! The weekly program is one 36-byte record: four switch points for
//! workdays, Saturday and Sunday, each `hour, minute, temperature * 2`,
//! sent in reverse order.

use super::{int, ts0601_endpoint};
use crate::clusters::{
    resolve_programming_write, AnalogSpec, ClusterSpec, Feature, ModeUpdate, SetpointLimits,
};
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

/// Degrees
pub const TARGET_TEMP: u16 = 0x0202;
/// Decidegrees
pub const TEMPERATURE: u16 = 0x0203;
/// 0 schedule, 1 manual, 2 temporary manual, 3 away
pub const MODE: u16 = 0x0401;
pub const CHILD_LOCK: u16 = 0x010D;
pub const TEMP_CALIBRATION: u16 = 0x0269;
pub const MIN_TEMPERATURE: u16 = 0x026D;
pub const MAX_TEMPERATURE: u16 = 0x026C;
pub const WINDOW_DETECT: u16 = 0x0409;
/// Window detection function on/off
pub const WINDOW_DETECT_FUNCTION: u16 = 0x0108;
/// Seconds
pub const BOOST_TIME: u16 = 0x0267;
pub const BOOST: u16 = 0x0104;
pub const BOOST_COUNTDOWN: u16 = 0x0205;
pub const ECO_TEMP: u16 = 0x026B;
pub const ECO_MODE: u16 = 0x016A;
/// Opening percentage
pub const VALVE_STATE: u16 = 0x0268;
/// 0 while heating
pub const VALVE_STATE_ONOFF: u16 = 0x0407;
pub const BATTERY: u16 = 0x020E;
pub const SCHEDULE: u16 = 0x0065;

const SCHEDULE_LEN: usize = 36;

/// Mode values standing in for the eco and boost flags
const MODE_ECO: i64 = 4;
const MODE_BOOST: i64 = 5;

/// Program used for switch points that were never reported
///
/// Logical order: workdays, Saturday, Sunday; each point `hour, minute,
/// temperature * 2`.
const DEFAULT_SCHEDULE: [u8; SCHEDULE_LEN] = [
    6, 0, 40, 11, 30, 42, 13, 30, 44, 17, 30, 46, //
    6, 0, 48, 12, 0, 46, 14, 30, 44, 17, 30, 42, //
    6, 0, 38, 12, 30, 40, 14, 30, 42, 18, 30, 40,
];

static ATTRIBUTES: [ManufAttr; 18] = [
    ManufAttr::new(TEMPERATURE, "temperature"),
    ManufAttr::new(TARGET_TEMP, "target_temperature"),
    ManufAttr::new(MODE, "mode"),
    ManufAttr::new(CHILD_LOCK, "child_lock"),
    ManufAttr::new(TEMP_CALIBRATION, "temperature_calibration"),
    ManufAttr::new(MIN_TEMPERATURE, "min_temperature"),
    ManufAttr::new(MAX_TEMPERATURE, "max_temperature"),
    ManufAttr::new(WINDOW_DETECT, "window_detection"),
    ManufAttr::new(WINDOW_DETECT_FUNCTION, "window_detection_function"),
    ManufAttr::new(BOOST_TIME, "boost_duration_seconds"),
    ManufAttr::new(BOOST, "boost_enabled"),
    ManufAttr::new(BOOST_COUNTDOWN, "boost_duration_seconds_countdown"),
    ManufAttr::new(ECO_TEMP, "eco_mode_temperature"),
    ManufAttr::new(ECO_MODE, "eco_mode_enabled"),
    ManufAttr::new(VALVE_STATE, "valve_state"),
    ManufAttr::new(VALVE_STATE_ONOFF, "valve_state_onoff"),
    ManufAttr::new(BATTERY, "battery"),
    ManufAttr::new(SCHEDULE, "schedule"),
];

static MAPPINGS: [DirectMapping; 5] = [
    DirectMapping::new(TEMPERATURE, attrs::LOCAL_TEMPERATURE, Conversion::Scale(10)),
    DirectMapping::new(TARGET_TEMP, attrs::OCCUPIED_HEATING_SETPOINT, Conversion::Scale(100)),
    DirectMapping::new(
        TEMP_CALIBRATION,
        attrs::LOCAL_TEMPERATURE_CALIBRATION,
        Conversion::Identity,
    ),
    DirectMapping::new(MIN_TEMPERATURE, attrs::MIN_HEAT_SETPOINT_LIMIT, Conversion::Scale(100)),
    DirectMapping::new(MAX_TEMPERATURE, attrs::MAX_HEAT_SETPOINT_LIMIT, Conversion::Scale(100)),
];

const fn degrees(description: &'static str, min: f64, max: f64) -> AnalogSpec {
    AnalogSpec {
        description,
        min,
        max,
        resolution: 1.0,
        application_type: 13 << 16,
        engineering_units: 62,
        writable: true,
    }
}

static VALVE: AnalogSpec = AnalogSpec {
    description: "Valve State",
    min: 0.0,
    max: 100.0,
    resolution: 1.0,
    application_type: 4 << 16,
    engineering_units: 98,
    writable: false,
};
static CALIBRATION: AnalogSpec = degrees("Temperature Calibration", -9.0, 9.0);
static BOOST_TIME_SPEC: AnalogSpec = AnalogSpec {
    description: "Boost Time",
    min: 0.0,
    max: 9999.0,
    resolution: 1.0,
    application_type: 14 << 16,
    engineering_units: 73,
    writable: true,
};
static BOOST_COUNTDOWN_SPEC: AnalogSpec = AnalogSpec {
    description: "Boost Countdown",
    min: 0.0,
    max: 9999.0,
    resolution: 1.0,
    application_type: 12 << 16,
    engineering_units: 72,
    writable: false,
};
static ECO: AnalogSpec = degrees("Eco Temperature", 5.0, 35.0);
static MIN_TEMP: AnalogSpec = degrees("Min Temperature", 5.0, 15.0);
static MAX_TEMP: AnalogSpec = degrees("Max Temperature", 15.0, 45.0);

/// Thermostat attribute of one schedule field
///
/// `index` is the position in the logical program; every third field
/// (starting at 2) is a temperature in degrees.
#[must_use]
pub fn schedule_attr(index: usize) -> Option<u16> {
    (index < SCHEDULE_LEN)
        .then(|| u16::try_from(index).ok())
        .flatten()
        .map(|i| attrs::SCHEDULE_BASE + i)
}

fn is_temperature(index: usize) -> bool {
    index % 3 == 2
}

pub struct Beca;

impl Beca {
    fn mode_change(state: &mut DeviceState, mode: i64) {
        let update = match mode {
            1 => ModeUpdate::preset(Preset::Manual).programming(ProgrammingOperationMode::Simple),
            2 => ModeUpdate::preset(Preset::TempManual)
                .programming(ProgrammingOperationMode::Simple),
            3 => ModeUpdate::preset(Preset::Away)
                .programming(ProgrammingOperationMode::Simple)
                .occupancy(Occupancy::Unoccupied),
            MODE_ECO => {
                ModeUpdate::preset(Preset::Eco).programming(ProgrammingOperationMode::EconomyMode)
            }
            MODE_BOOST => {
                ModeUpdate::preset(Preset::Boost).programming(ProgrammingOperationMode::Simple)
            }
            _ => ModeUpdate::preset(Preset::Schedule)
                .programming(ProgrammingOperationMode::ScheduleProgrammingMode),
        };
        let update = if update.occupancy.is_none() {
            update.occupancy(Occupancy::Occupied)
        } else {
            update
        };
        state.apply_mode(update);
    }

    fn schedule_report(state: &mut DeviceState, bytes: &[u8]) {
        if bytes.len() != SCHEDULE_LEN {
            tracing::warn!("Malformed Beca schedule {:02X?}", bytes);
            return;
        }
        let Some(thermostat) = state.thermostat_mut() else {
            return;
        };
        for (index, &raw) in bytes.iter().rev().enumerate() {
            let Some(attr) = schedule_attr(index) else {
                continue;
            };
            if is_temperature(index) {
                thermostat.attrs.set(attr, f64::from(raw) / 2.0);
            } else {
                thermostat.attrs.set(attr, raw);
            }
        }
    }

    /// Whole program with one field replaced, in wire order
    fn schedule_write(state: &DeviceState, attr: u16, value: &ZclValue) -> Option<Vec<u8>> {
        let thermostat = state.thermostat()?;
        let mut program = Vec::with_capacity(SCHEDULE_LEN);
        for (index, &default) in DEFAULT_SCHEDULE.iter().enumerate() {
            let field = schedule_attr(index)?;
            let current = if field == attr {
                value.as_float()
            } else {
                thermostat.value(field).and_then(ZclValue::as_float)
            };
            let raw = match current {
                Some(v) if is_temperature(index) => scale_to_raw(v, 2.0),
                Some(v) => scale_to_raw(v, 1.0),
                None => i64::from(default),
            };
            let Ok(raw) = u8::try_from(raw) else {
                tracing::error!("Schedule field {} out of range: {}", index, raw);
                return None;
            };
            program.push(raw);
        }
        program.reverse();
        Some(program)
    }

    fn preset_write(value: &ZclValue) -> Option<ManufWrite> {
        let preset = Preset::try_from(u8::try_from(value.as_int()?).ok()?).ok()?;
        let (mode, boost, eco) = match preset {
            Preset::Away => (Some(3), false, false),
            Preset::Schedule => (Some(0), false, false),
            Preset::Manual => (Some(1), false, false),
            Preset::TempManual => (Some(2), false, false),
            Preset::Eco => (None, false, true),
            Preset::Boost => (None, true, false),
            other => {
                tracing::warn!("Unsupported preset {:?}", other);
                return None;
            }
        };
        let mut write: ManufWrite = mode
            .map(|m| (MODE, ManufValue::Int(m)))
            .into_iter()
            .collect();
        write.push((BOOST, boost.into()));
        write.push((ECO_MODE, eco.into()));
        Some(write)
    }

    fn occupancy_write(state: &DeviceState, attr: u16, value: &ZclValue) -> Option<i64> {
        let thermostat = state.thermostat()?;
        let unoccupied = if attr == attrs::OCCUPANCY {
            value.as_int()? == Occupancy::Unoccupied as i64
        } else {
            thermostat.occupancy() == Some(Occupancy::Unoccupied)
        };
        if unoccupied {
            return Some(3);
        }
        let mode = resolve_programming_write(thermostat, attr, value)?;
        Some(i64::from(mode == ProgrammingOperationMode::Simple))
    }
}

impl Quirk for Beca {
    fn attributes(&self) -> &'static [ManufAttr] {
        &ATTRIBUTES
    }

    fn direct_mappings(&self) -> &[DirectMapping] {
        &MAPPINGS
    }

    fn initialize(&self, state: &mut DeviceState) {
        state.set_system_mode(SystemMode::Heat);
    }

    fn decode(&self, state: &mut DeviceState, attr: u16, value: &DpValue) {
        let v = int(value);
        match attr {
            WINDOW_DETECT => state.set_binary(Feature::WindowOpen, v != 0),
            WINDOW_DETECT_FUNCTION => state.set_switch(Feature::WindowDetection, v != 0),
            CHILD_LOCK => state.child_lock_change(v != 0),
            MODE => Self::mode_change(state, v),
            BOOST if v == 1 => Self::mode_change(state, MODE_BOOST),
            ECO_MODE if v == 1 => Self::mode_change(state, MODE_ECO),
            VALVE_STATE => state.set_analog(Feature::ValvePosition, v as f64),
            VALVE_STATE_ONOFF => state.state_change(v == 0),
            TEMP_CALIBRATION => state.set_analog(Feature::TemperatureCalibration, v as f64),
            BOOST_TIME => state.set_analog(Feature::BoostTime, v as f64),
            BOOST_COUNTDOWN => state.set_analog(Feature::BoostCountdown, v as f64),
            ECO_TEMP => state.set_analog(Feature::EcoTemperature, v as f64),
            MIN_TEMPERATURE => state.set_analog(Feature::MinTemperature, v as f64),
            MAX_TEMPERATURE => state.set_analog(Feature::MaxTemperature, v as f64),
            BATTERY => state.battery_change(v as f64),
            SCHEDULE => match value.as_bytes() {
                Some(bytes) => Self::schedule_report(state, bytes),
                None => tracing::warn!("Schedule is not raw: {:?}", value),
            },
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
        let schedule = schedule_attr(0)?..=schedule_attr(SCHEDULE_LEN - 1)?;
        let write = match target {
            Target::Thermostat => match attr {
                attrs::OCCUPIED_HEATING_SETPOINT => {
                    let (manuf, raw) = reverse_direct(&MAPPINGS, attr, value.as_int()?)?;
                    let schedule_active = state
                        .thermostat()
                        .is_some_and(|t| t.preset() == Some(Preset::Schedule));
                    // A setpoint change leaves the program until the next switch point
                    return Some(if schedule_active {
                        vec![(MODE, ManufValue::Int(2)), (manuf, ManufValue::Int(raw))]
                    } else {
                        vec![(manuf, ManufValue::Int(raw))]
                    });
                }
                attrs::MIN_HEAT_SETPOINT_LIMIT
                | attrs::MAX_HEAT_SETPOINT_LIMIT
                | attrs::LOCAL_TEMPERATURE_CALIBRATION => {
                    let (manuf, raw) = reverse_direct(&MAPPINGS, attr, value.as_int()?)?;
                    (manuf, ManufValue::Int(raw))
                }
                attrs::OPERATION_PRESET => return Self::preset_write(value),
                attrs::PROGRAMING_OPER_MODE | attrs::OCCUPANCY => {
                    (MODE, ManufValue::Int(Self::occupancy_write(state, attr, value)?))
                }
                attrs::SYSTEM_MODE => (
                    VALVE_STATE_ONOFF,
                    (value.as_int()? != SystemMode::Off as i64).into(),
                ),
                a if schedule.contains(&a) => {
                    (SCHEDULE, Self::schedule_write(state, attr, value)?.into())
                }
                _ => return None,
            },
            Target::UserInterface if attr == user_interface_attrs::KEYPAD_LOCKOUT => {
                (CHILD_LOCK, (value.as_int()? != 0).into())
            }
            Target::Switch(Feature::ChildLock) if attr == on_off_attrs::ON_OFF => {
                (CHILD_LOCK, value.as_bool()?.into())
            }
            Target::Switch(Feature::WindowDetection) if attr == on_off_attrs::ON_OFF => {
                (WINDOW_DETECT_FUNCTION, value.as_bool()?.into())
            }
            Target::Analog(feature) => {
                let manuf = match feature {
                    Feature::TemperatureCalibration => TEMP_CALIBRATION,
                    Feature::BoostTime => BOOST_TIME,
                    Feature::EcoTemperature => ECO_TEMP,
                    Feature::MinTemperature => MIN_TEMPERATURE,
                    Feature::MaxTemperature => MAX_TEMPERATURE,
                    _ => return None,
                };
                (manuf, ManufValue::Int(scale_to_raw(value.as_float()?, 1.0)))
            }
            _ => return None,
        };
        Some(vec![write])
    }
}

#[must_use]
pub fn descriptors() -> Vec<QuirkDescriptor> {
    let analog = |ep: u8, feature: Feature, spec: &'static AnalogSpec| {
        EndpointLayout::new(ep, device_type::CONSUMPTION_AWARENESS_DEVICE)
            .with(ClusterSpec::AnalogOutput(feature, spec))
    };
    vec![QuirkDescriptor {
        name: "beca",
        models: &[("_TZE200_b6wax7g0", "TS0601")],
        signature: vec![ts0601_endpoint(device_type::SMART_PLUG)],
        replacement: vec![
            EndpointLayout::new(1, device_type::THERMOSTAT)
                .passthrough(&[id::BASIC, id::GROUPS, id::SCENES])
                .with(ClusterSpec::Manufacturer)
                .with(ClusterSpec::Thermostat(SetpointLimits::new(500, 3000)))
                .with(ClusterSpec::UserInterface)
                .with(ClusterSpec::BinaryInput(Feature::WindowOpen))
                .with(ClusterSpec::PowerConfiguration(None))
                .with_out(&[id::TIME, id::OTA]),
            EndpointLayout::new(2, device_type::ON_OFF_SWITCH)
                .with(ClusterSpec::OnOff(Feature::ChildLock)),
            analog(3, Feature::ValvePosition, &VALVE),
            EndpointLayout::new(4, device_type::ON_OFF_SWITCH)
                .with(ClusterSpec::OnOff(Feature::WindowDetection)),
            analog(5, Feature::TemperatureCalibration, &CALIBRATION),
            analog(6, Feature::BoostTime, &BOOST_TIME_SPEC),
            analog(7, Feature::BoostCountdown, &BOOST_COUNTDOWN_SPEC),
            analog(8, Feature::EcoTemperature, &ECO),
            analog(9, Feature::MinTemperature, &MIN_TEMP),
            analog(10, Feature::MaxTemperature, &MAX_TEMP),
        ],
        build: |_| Box::new(Beca),
    }]
}
