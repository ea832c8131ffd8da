//! Maxsmart and Silvercrest (Lidl) radiator valves
//!
//! These valves keep separate setpoints for schedule, manual and away mode.
//! The Thermostat `occupied_heating_setpoint` always shows the one that is
//! active, and writes to it are routed to the matching data point.
//!
//! Away settings travel as one 8-byte record and each weekday schedule as an
//! 18-byte record; the controls exposing their fields recompose the whole
//! record from cached values on every write.

use super::int;
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
    ProgrammingOperationMode, SystemMode, HA_PROFILE,
};
use zigbee_core::{Endpoint, ZclValue};

/// Setpoint while following the schedule, half degrees
pub const TARGET_TEMP_AUTO: u16 = 0x0269;
/// Setpoint in manual mode, half degrees
pub const TARGET_TEMP_MANUAL: u16 = 0x0210;
pub const TEMPERATURE: u16 = 0x0218;
/// 0 schedule, 1 manual, 2 away
pub const MODE: u16 = 0x0402;
pub const CHILD_LOCK: u16 = 0x011E;
pub const SILVERCREST_CHILD_LOCK: u16 = 0x0128;
pub const TEMP_CALIBRATION: u16 = 0x0268;
pub const WINDOW_DETECT: u16 = 0x016B;
pub const WINDOW_DETECT_TEMP: u16 = 0x0274;
/// Minutes
pub const WINDOW_DETECT_TIME: u16 = 0x0275;
pub const COMFORT_TEMP: u16 = 0x0265;
pub const ECO_TEMP: u16 = 0x0266;
pub const BATTERY: u16 = 0x0222;
pub const SILVERCREST_BATTERY: u16 = 0x0223;
pub const AWAY_DATA: u16 = 0x0067;
/// Seconds
pub const BOOST_COUNTDOWN: u16 = 0x0276;
pub const BOOST: u16 = 0x016A;
pub const SCHEDULE_MONDAY: u16 = 0x006D;
pub const SCHEDULE_SUNDAY: u16 = 0x0073;

/// Schedule slots per day: nine temperatures with eight switch hours between
const SLOTS_PER_DAY: u16 = 17;
const DAYS: u16 = 7;

/// Mode value standing in for an active boost
const MODE_BOOST: i64 = 3;

static ATTRIBUTES: [ManufAttr; 25] = [
    ManufAttr::new(CHILD_LOCK, "child_lock_m"),
    ManufAttr::new(SILVERCREST_CHILD_LOCK, "child_lock_s"),
    ManufAttr::new(WINDOW_DETECT, "window_detection"),
    ManufAttr::new(WINDOW_DETECT_TEMP, "window_detection_temp"),
    ManufAttr::new(WINDOW_DETECT_TIME, "window_detection_time"),
    ManufAttr::new(TARGET_TEMP_AUTO, "target_temperature_auto"),
    ManufAttr::new(TARGET_TEMP_MANUAL, "target_temperature_manual"),
    ManufAttr::new(TEMPERATURE, "temperature"),
    ManufAttr::new(MODE, "mode"),
    ManufAttr::new(TEMP_CALIBRATION, "temperature_calibration"),
    ManufAttr::new(COMFORT_TEMP, "comfort_mode_temperature"),
    ManufAttr::new(ECO_TEMP, "eco_mode_temperature"),
    ManufAttr::new(BATTERY, "battery_m"),
    ManufAttr::new(SILVERCREST_BATTERY, "battery_s"),
    ManufAttr::new(AWAY_DATA, "away_data"),
    ManufAttr::new(BOOST_COUNTDOWN, "boost_countdown"),
    ManufAttr::new(BOOST, "boost_enabled"),
    ManufAttr::new(SCHEDULE_MONDAY, "schedule_monday"),
    ManufAttr::new(0x006E, "schedule_tuesday"),
    ManufAttr::new(0x006F, "schedule_wednesday"),
    ManufAttr::new(0x0070, "schedule_thursday"),
    ManufAttr::new(0x0071, "schedule_friday"),
    ManufAttr::new(0x0072, "schedule_saturday"),
    ManufAttr::new(SCHEDULE_SUNDAY, "schedule_sunday"),
    ManufAttr::new(0x0024, "set_time"),
];

/// Half degrees on the device, centidegrees on the Thermostat cluster
const HALF_DEGREE: Conversion = Conversion::Scale(50);

static MAPPINGS: [DirectMapping; 8] = [
    DirectMapping::new(TEMPERATURE, attrs::LOCAL_TEMPERATURE, Conversion::Scale(10)),
    DirectMapping::new(TARGET_TEMP_AUTO, attrs::OCCUPIED_HEATING_SETPOINT_AUTO, HALF_DEGREE),
    DirectMapping::new(TARGET_TEMP_MANUAL, attrs::OCCUPIED_HEATING_SETPOINT_MANUAL, HALF_DEGREE),
    DirectMapping::new(COMFORT_TEMP, attrs::COMFORT_HEATING_SETPOINT, HALF_DEGREE),
    DirectMapping::new(ECO_TEMP, attrs::ECO_HEATING_SETPOINT, HALF_DEGREE),
    DirectMapping::new(
        TEMP_CALIBRATION,
        attrs::LOCAL_TEMPERATURE_CALIBRATION,
        Conversion::Scale(10),
    ),
    DirectMapping::new(WINDOW_DETECT_TEMP, attrs::WINDOW_DETECTION_TEMP, HALF_DEGREE),
    DirectMapping::new(WINDOW_DETECT_TIME, attrs::WINDOW_DETECTION_TIME, Conversion::Identity),
];

const fn control(
    description: &'static str,
    min: f64,
    max: f64,
    engineering_units: u16,
) -> AnalogSpec {
    AnalogSpec {
        description,
        min,
        max,
        resolution: 1.0,
        application_type: 14 << 16,
        engineering_units,
        writable: true,
    }
}

const fn half_degrees(description: &'static str) -> AnalogSpec {
    AnalogSpec {
        description,
        min: 0.5,
        max: 29.5,
        resolution: 0.5,
        application_type: 13 << 16,
        engineering_units: 62,
        writable: true,
    }
}

static AWAY_YEAR: AnalogSpec = control("G01 Away Year start", 2000.0, 9999.0, 67);
static AWAY_MONTH: AnalogSpec = control("G01 Away Month start", 1.0, 12.0, 68);
static AWAY_DAY: AnalogSpec = control("G01 Away Day start", 1.0, 31.0, 70);
static AWAY_HOUR: AnalogSpec = control("G02 Away Hour start", 0.0, 23.0, 71);
static AWAY_MINUTE: AnalogSpec = control("G02 Away Minute start", 0.0, 59.0, 72);
static AWAY_TEMPERATURE: AnalogSpec = half_degrees("G03 Away Temperature");
static AWAY_HOURS: AnalogSpec = control("G04 Away Operating time(hours)", 1.0, 65535.0, 71);
static ECO: AnalogSpec = half_degrees("G04 Eco Temperature");
static COMFORT: AnalogSpec = half_degrees("G04 Comfort Temperature");
static WINDOW_TEMP: AnalogSpec = half_degrees("G05 Window detect Temperature");
static WINDOW_TIME: AnalogSpec = control("G05 Window detect Time", 0.0, 60.0, 72);
static BOOST_COUNTDOWN_SPEC: AnalogSpec = AnalogSpec {
    description: "G06 Boost countdown",
    min: 0.0,
    max: 9999.0,
    resolution: 1.0,
    application_type: 14 << 16,
    engineering_units: 73,
    writable: false,
};
static CALIBRATION: AnalogSpec = AnalogSpec {
    description: "G07 Temperature calibration",
    min: -5.5,
    max: 5.5,
    resolution: 0.1,
    application_type: 13 << 16,
    engineering_units: 62,
    writable: true,
};

/// Away period start, temperature and length
///
/// Wire order: `[year - 2000, month, day, hour, minute, temp * 2, hours_hi, hours_lo]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AwaySettings {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    /// Half degrees
    pub temperature: u8,
    pub hours: u16,
}

impl AwaySettings {
    #[must_use]
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        let &[year, month, day, hour, minute, temperature, hi, lo] = bytes else {
            return None;
        };
        Some(Self {
            year: 2000 + u16::from(year),
            month,
            day,
            hour,
            minute,
            temperature,
            hours: u16::from_be_bytes([hi, lo]),
        })
    }

    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let [hi, lo] = self.hours.to_be_bytes();
        vec![
            u8::try_from(self.year.saturating_sub(2000)).unwrap_or(u8::MAX),
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.temperature,
            hi,
            lo,
        ]
    }

    /// Rebuild the record from the away controls, with one field replaced
    fn from_controls(state: &DeviceState, replace: Option<(Feature, f64)>) -> Option<Self> {
        let get = |feature: Feature| -> Option<f64> {
            let value = match replace {
                Some((f, v)) if f == feature => Some(v),
                _ => state.analog_value(feature),
            };
            if value.is_none() {
                tracing::error!("No cached value for {:?}, cannot compose away data", feature);
            }
            value
        };
        Some(Self {
            year: to_int(get(Feature::AwayYear)?)?,
            month: to_int(get(Feature::AwayMonth)?)?,
            day: to_int(get(Feature::AwayDay)?)?,
            hour: to_int(get(Feature::AwayHour)?)?,
            minute: to_int(get(Feature::AwayMinute)?)?,
            temperature: to_int(get(Feature::AwayTemperature)? * 2.0)?,
            hours: to_int(get(Feature::AwayOperatingHours)?)?,
        })
    }
}

/// Round a control value into a record field
fn to_int<T: TryFrom<i64>>(value: f64) -> Option<T> {
    let raw = scale_to_raw(value, 1.0);
    let converted = T::try_from(raw).ok();
    if converted.is_none() {
        tracing::error!("Value {} does not fit its field", value);
    }
    converted
}

/// Thermostat attribute holding one schedule slot
///
/// `day` counts from 0 (Monday), `slot` from 1; odd slots are temperatures in
/// degrees, even slots switch hours.
#[must_use]
pub fn schedule_attr(day: u16, slot: u16) -> u16 {
    attrs::SCHEDULE_BASE + day * SLOTS_PER_DAY + (slot - 1)
}

/// Record scale of a schedule slot
fn slot_scale(slot: u16) -> f64 {
    if slot % 2 == 1 {
        2.0
    } else {
        4.0
    }
}

/// Per-manufacturer differences
#[derive(Debug, Clone, Copy)]
struct Model {
    child_lock: u16,
}

pub struct Maxsmart {
    model: Model,
}

impl Maxsmart {
    /// Mode byte decoded into the thermostat, with the active setpoint
    fn mode_change(state: &mut DeviceState, mode: i64) {
        let Some(thermostat) = state.thermostat() else {
            return;
        };
        let (update, active) = match mode {
            0 => (
                ModeUpdate::preset(Preset::Schedule)
                    .programming(ProgrammingOperationMode::ScheduleProgrammingMode)
                    .occupancy(Occupancy::Occupied),
                Some(attrs::OCCUPIED_HEATING_SETPOINT_AUTO),
            ),
            1 => (
                ModeUpdate::preset(Preset::Manual)
                    .programming(ProgrammingOperationMode::Simple)
                    .occupancy(Occupancy::Occupied),
                Some(attrs::OCCUPIED_HEATING_SETPOINT_MANUAL),
            ),
            2 => (
                ModeUpdate::preset(Preset::Away)
                    .programming(ProgrammingOperationMode::Simple)
                    .occupancy(Occupancy::Unoccupied),
                Some(attrs::OCCUPIED_HEATING_SETPOINT_AWAY),
            ),
            MODE_BOOST => (
                ModeUpdate::preset(Preset::Boost)
                    .programming(ProgrammingOperationMode::Simple)
                    .occupancy(Occupancy::Occupied),
                None,
            ),
            other => {
                tracing::warn!("Unknown Maxsmart mode {}", other);
                return;
            }
        };

        let setpoint = active.and_then(|attr| thermostat.get(attr));
        let system_mode = if mode == 1 && setpoint == Some(0) {
            SystemMode::Off
        } else {
            SystemMode::Heat
        };
        if let Some(setpoint) = setpoint {
            state.temperature_change(attrs::OCCUPIED_HEATING_SETPOINT, setpoint);
        }
        state.apply_mode(update.system_mode(system_mode));
    }

    /// Mirror a mode-specific setpoint when it is the active one
    fn setpoint_report(state: &mut DeviceState, attr: u16) {
        let Some(thermostat) = state.thermostat() else {
            return;
        };
        let preset = thermostat.preset();
        let active = match attr {
            TARGET_TEMP_AUTO => matches!(preset, None | Some(Preset::Schedule | Preset::Boost)),
            TARGET_TEMP_MANUAL => preset == Some(Preset::Manual),
            _ => false,
        };
        let source = if attr == TARGET_TEMP_AUTO {
            attrs::OCCUPIED_HEATING_SETPOINT_AUTO
        } else {
            attrs::OCCUPIED_HEATING_SETPOINT_MANUAL
        };
        if let (true, Some(setpoint)) = (active, thermostat.get(source)) {
            state.temperature_change(attrs::OCCUPIED_HEATING_SETPOINT, setpoint);
            if attr == TARGET_TEMP_MANUAL {
                let mode = if setpoint == 0 { SystemMode::Off } else { SystemMode::Heat };
                state.set_system_mode(mode);
            }
        }
    }

    /// Heating while the room is below the active setpoint
    fn climate_state_change(state: &mut DeviceState) {
        let local = state.thermostat_attr(attrs::LOCAL_TEMPERATURE).unwrap_or(0);
        let target = state
            .thermostat_attr(attrs::OCCUPIED_HEATING_SETPOINT)
            .unwrap_or(0);
        state.state_change(local < target);
    }

    fn away_report(state: &mut DeviceState, bytes: &[u8]) {
        let Some(away) = AwaySettings::decode(bytes) else {
            tracing::warn!("Malformed away data {:02X?}", bytes);
            return;
        };
        state.set_analog(Feature::AwayYear, f64::from(away.year));
        state.set_analog(Feature::AwayMonth, f64::from(away.month));
        state.set_analog(Feature::AwayDay, f64::from(away.day));
        state.set_analog(Feature::AwayHour, f64::from(away.hour));
        state.set_analog(Feature::AwayMinute, f64::from(away.minute));
        state.set_analog(Feature::AwayTemperature, f64::from(away.temperature) / 2.0);
        state.set_analog(Feature::AwayOperatingHours, f64::from(away.hours));

        let setpoint = HALF_DEGREE.forward(i64::from(away.temperature));
        state.temperature_change(attrs::OCCUPIED_HEATING_SETPOINT_AWAY, setpoint);
        let away_active = state
            .thermostat()
            .is_some_and(|t| t.preset() == Some(Preset::Away));
        if away_active {
            state.temperature_change(attrs::OCCUPIED_HEATING_SETPOINT, setpoint);
        }
    }

    fn schedule_report(state: &mut DeviceState, attr: u16, bytes: &[u8]) {
        let day = attr - SCHEDULE_MONDAY;
        if bytes.len() != usize::from(SLOTS_PER_DAY) + 1 {
            tracing::warn!("Malformed schedule for day {}: {:02X?}", day + 1, bytes);
            return;
        }
        let Some(thermostat) = state.thermostat_mut() else {
            return;
        };
        for slot in 1..=SLOTS_PER_DAY {
            let value = f64::from(bytes[usize::from(slot)]) / slot_scale(slot);
            thermostat.attrs.set(schedule_attr(day, slot), value);
        }
    }

    /// Day record with one slot replaced
    fn schedule_write(state: &DeviceState, attr: u16, value: &ZclValue) -> Option<(u16, ManufValue)> {
        let offset = attr - attrs::SCHEDULE_BASE;
        let (day, written) = (offset / SLOTS_PER_DAY, offset % SLOTS_PER_DAY + 1);
        let thermostat = state.thermostat()?;

        let mut record = Vec::with_capacity(usize::from(SLOTS_PER_DAY) + 1);
        record.push(u8::try_from(day + 1).ok()?);
        for slot in 1..=SLOTS_PER_DAY {
            let current = if slot == written {
                value.as_float()
            } else {
                thermostat.value(schedule_attr(day, slot)).and_then(ZclValue::as_float)
            };
            let Some(current) = current else {
                tracing::error!("No cached schedule slot {} for day {}", slot, day + 1);
                return None;
            };
            record.push(to_int(current * slot_scale(slot))?);
        }
        Some((SCHEDULE_MONDAY + day, record.into()))
    }

    fn away_write(state: &DeviceState, replace: (Feature, f64)) -> Option<(u16, ManufValue)> {
        let away = AwaySettings::from_controls(state, Some(replace))?;
        Some((AWAY_DATA, away.encode().into()))
    }

    /// Route a setpoint write to the data point of the active preset
    fn setpoint_write(state: &DeviceState, value: i64) -> Option<(u16, ManufValue)> {
        let preset = state
            .thermostat()?
            .preset()
            .unwrap_or(Preset::Schedule);
        let attr = match preset {
            Preset::Schedule | Preset::Boost => attrs::OCCUPIED_HEATING_SETPOINT_AUTO,
            Preset::Manual => attrs::OCCUPIED_HEATING_SETPOINT_MANUAL,
            Preset::Away => {
                let degrees = HALF_DEGREE.reverse(value) as f64 / 2.0;
                return Self::away_write(state, (Feature::AwayTemperature, degrees));
            }
            other => {
                tracing::error!("No setpoint behind preset {:?}", other);
                return None;
            }
        };
        let (manuf, raw) = reverse_direct(&MAPPINGS, attr, value)?;
        Some((manuf, ManufValue::Int(raw)))
    }

    fn preset_write(value: &ZclValue) -> Option<ManufWrite> {
        let preset = Preset::try_from(u8::try_from(value.as_int()?).ok()?).ok()?;
        let write = match preset {
            Preset::Away => vec![(MODE, ManufValue::Int(2)), (BOOST, false.into())],
            Preset::Schedule => vec![(MODE, ManufValue::Int(0)), (BOOST, false.into())],
            Preset::Manual => vec![(MODE, ManufValue::Int(1)), (BOOST, false.into())],
            Preset::Boost => vec![(BOOST, true.into())],
            other => {
                tracing::warn!("Unsupported preset {:?}", other);
                return None;
            }
        };
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
            return Some(2);
        }
        let mode = resolve_programming_write(thermostat, attr, value)?;
        Some(i64::from(mode == ProgrammingOperationMode::Simple))
    }

    fn control_write(state: &DeviceState, feature: Feature, value: f64) -> Option<(u16, ManufValue)> {
        let write = match feature {
            Feature::AwayYear
            | Feature::AwayMonth
            | Feature::AwayDay
            | Feature::AwayHour
            | Feature::AwayMinute
            | Feature::AwayTemperature
            | Feature::AwayOperatingHours => return Self::away_write(state, (feature, value)),
            Feature::EcoTemperature => (ECO_TEMP, scale_to_raw(value, 2.0)),
            Feature::ComfortTemperature => (COMFORT_TEMP, scale_to_raw(value, 2.0)),
            Feature::WindowDetectTemperature => (WINDOW_DETECT_TEMP, scale_to_raw(value, 2.0)),
            Feature::WindowDetectTime => (WINDOW_DETECT_TIME, scale_to_raw(value, 1.0)),
            Feature::TemperatureCalibration => (TEMP_CALIBRATION, scale_to_raw(value, 10.0)),
            _ => return None,
        };
        Some((write.0, ManufValue::Int(write.1)))
    }
}

/// Battery charge reading to percent
#[must_use]
pub fn battery_percent(raw: i64) -> f64 {
    if raw > 130 {
        100.0
    } else if raw < 70 {
        0.0
    } else {
        ((raw - 70) as f64 * 1.67 * 10.0).round() / 10.0
    }
}

impl Quirk for Maxsmart {
    fn attributes(&self) -> &'static [ManufAttr] {
        &ATTRIBUTES
    }

    fn direct_mappings(&self) -> &[DirectMapping] {
        &MAPPINGS
    }

    fn write_sent(&self, state: &mut DeviceState, target: Target, attr: u16, value: &ZclValue) {
        let away = state
            .thermostat()
            .is_some_and(|t| t.preset() == Some(Preset::Away));
        if !away || target != Target::Thermostat || attr != attrs::OCCUPIED_HEATING_SETPOINT {
            return;
        }
        let Some(value) = value.as_int() else {
            return;
        };
        // The away record holds half degrees
        let setpoint = HALF_DEGREE.forward(HALF_DEGREE.reverse(value));
        state.temperature_change(attrs::OCCUPIED_HEATING_SETPOINT_AWAY, setpoint);
        state.temperature_change(attrs::OCCUPIED_HEATING_SETPOINT, setpoint);
        state.set_analog(Feature::AwayTemperature, setpoint as f64 / 100.0);
    }

    fn decode(&self, state: &mut DeviceState, attr: u16, value: &DpValue) {
        let v = int(value);
        match attr {
            BATTERY | SILVERCREST_BATTERY => state.battery_change(battery_percent(v)),
            WINDOW_DETECT => state.set_binary(Feature::WindowOpen, v != 0),
            MODE => Self::mode_change(state, v),
            BOOST if v == 1 => Self::mode_change(state, MODE_BOOST),
            TEMPERATURE => Self::climate_state_change(state),
            TARGET_TEMP_AUTO | TARGET_TEMP_MANUAL => {
                Self::setpoint_report(state, attr);
                Self::climate_state_change(state);
            }
            CHILD_LOCK | SILVERCREST_CHILD_LOCK => state.child_lock_change(v != 0),
            AWAY_DATA => match value.as_bytes() {
                Some(bytes) => Self::away_report(state, bytes),
                None => tracing::warn!("Away data is not raw: {:?}", value),
            },
            ECO_TEMP => state.set_analog(Feature::EcoTemperature, v as f64 / 2.0),
            COMFORT_TEMP => state.set_analog(Feature::ComfortTemperature, v as f64 / 2.0),
            WINDOW_DETECT_TEMP => state.set_analog(Feature::WindowDetectTemperature, v as f64 / 2.0),
            WINDOW_DETECT_TIME => state.set_analog(Feature::WindowDetectTime, v as f64),
            BOOST_COUNTDOWN => state.set_analog(Feature::BoostCountdown, v as f64),
            TEMP_CALIBRATION => state.set_analog(Feature::TemperatureCalibration, v as f64 / 10.0),
            SCHEDULE_MONDAY..=SCHEDULE_SUNDAY => match value.as_bytes() {
                Some(bytes) => Self::schedule_report(state, attr, bytes),
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
        let schedule = attrs::SCHEDULE_BASE..attrs::SCHEDULE_BASE + DAYS * SLOTS_PER_DAY;
        let write = match target {
            Target::Thermostat => match attr {
                attrs::OCCUPIED_HEATING_SETPOINT => Self::setpoint_write(state, value.as_int()?)?,
                attrs::OCCUPIED_HEATING_SETPOINT_AWAY => {
                    let degrees = HALF_DEGREE.reverse(value.as_int()?) as f64 / 2.0;
                    Self::away_write(state, (Feature::AwayTemperature, degrees))?
                }
                attrs::OPERATION_PRESET => return Self::preset_write(value),
                attrs::PROGRAMING_OPER_MODE | attrs::OCCUPANCY => {
                    (MODE, ManufValue::Int(Self::occupancy_write(state, attr, value)?))
                }
                attrs::SYSTEM_MODE => {
                    return if value.as_int()? == SystemMode::Off as i64 {
                        Some(vec![
                            (MODE, ManufValue::Int(1)),
                            (TARGET_TEMP_MANUAL, ManufValue::Int(0)),
                        ])
                    } else {
                        Some(vec![(MODE, ManufValue::Int(0))])
                    };
                }
                a if schedule.contains(&a) => Self::schedule_write(state, attr, value)?,
                _ => {
                    let (manuf, raw) = reverse_direct(&MAPPINGS, attr, value.as_int()?)?;
                    (manuf, ManufValue::Int(raw))
                }
            },
            Target::UserInterface if attr == user_interface_attrs::KEYPAD_LOCKOUT => {
                (self.model.child_lock, (value.as_int()? != 0).into())
            }
            Target::Switch(Feature::ChildLock) if attr == on_off_attrs::ON_OFF => {
                (self.model.child_lock, value.as_bool()?.into())
            }
            // Zeroing the reading makes the valve measure again
            Target::Switch(Feature::LocalTemperatureUpdate) if attr == on_off_attrs::ON_OFF => {
                (TEMPERATURE, ManufValue::Int(0))
            }
            Target::Analog(feature) => Self::control_write(state, feature, value.as_float()?)?,
            _ => return None,
        };
        Some(vec![write])
    }
}

fn build(manufacturer: &str) -> Box<dyn Quirk> {
    let child_lock = if manufacturer == "_TZE200_chyvmhay" {
        SILVERCREST_CHILD_LOCK
    } else {
        CHILD_LOCK
    };
    Box::new(Maxsmart {
        model: Model { child_lock },
    })
}

fn replacement(passthrough: &[u16], out_clusters: &[u16]) -> Vec<EndpointLayout> {
    let analog = |ep: u8, feature: Feature, spec: &'static AnalogSpec| {
        EndpointLayout::new(ep, device_type::CONSUMPTION_AWARENESS_DEVICE)
            .with(ClusterSpec::AnalogOutput(feature, spec))
    };
    vec![
        EndpointLayout::new(1, device_type::THERMOSTAT)
            .passthrough(passthrough)
            .with(ClusterSpec::Manufacturer)
            .with(ClusterSpec::Thermostat(SetpointLimits::new(50, 2950)))
            .with(ClusterSpec::UserInterface)
            .with(ClusterSpec::BinaryInput(Feature::WindowOpen))
            .with(ClusterSpec::PowerConfiguration(None))
            .with_out(out_clusters),
        EndpointLayout::new(2, device_type::ON_OFF_SWITCH)
            .with(ClusterSpec::OnOff(Feature::ChildLock)),
        analog(3, Feature::AwayYear, &AWAY_YEAR),
        analog(4, Feature::AwayMonth, &AWAY_MONTH),
        analog(5, Feature::AwayDay, &AWAY_DAY),
        analog(6, Feature::AwayHour, &AWAY_HOUR),
        analog(7, Feature::AwayMinute, &AWAY_MINUTE),
        analog(8, Feature::AwayTemperature, &AWAY_TEMPERATURE),
        analog(9, Feature::AwayOperatingHours, &AWAY_HOURS),
        analog(10, Feature::EcoTemperature, &ECO),
        analog(11, Feature::ComfortTemperature, &COMFORT),
        analog(12, Feature::WindowDetectTemperature, &WINDOW_TEMP),
        analog(13, Feature::WindowDetectTime, &WINDOW_TIME),
        analog(14, Feature::BoostCountdown, &BOOST_COUNTDOWN_SPEC),
        analog(15, Feature::TemperatureCalibration, &CALIBRATION),
        EndpointLayout::new(16, device_type::ON_OFF_SWITCH)
            .with(ClusterSpec::OnOff(Feature::LocalTemperatureUpdate)),
    ]
}

#[must_use]
pub fn descriptors() -> Vec<QuirkDescriptor> {
    let silvercrest_in = [id::BASIC, id::IDENTIFY, id::GROUPS, id::SCENES];
    vec![
        QuirkDescriptor {
            name: "maxsmart",
            models: &[
                ("_TZE200_qc4fpmcn", "TS0601"),
                ("_TZE200_i48qyn9s", "TS0601"),
                ("_TZE200_fhn3negr", "TS0601"),
                ("_TZE200_thbr5z34", "TS0601"),
            ],
            signature: vec![Endpoint::new(1, HA_PROFILE, device_type::SMART_PLUG)
                .with_in(&[id::BASIC, id::GROUPS, id::SCENES, id::TIME, id::TUYA_MANUFACTURER])
                .with_out(&[id::OTA])],
            replacement: replacement(&[id::BASIC, id::GROUPS, id::SCENES], &[id::OTA]),
            build,
        },
        QuirkDescriptor {
            name: "silvercrest",
            models: &[("_TZE200_chyvmhay", "TS0601")],
            signature: vec![Endpoint::new(1, HA_PROFILE, device_type::SMART_PLUG)
                .with_in(&[
                    id::BASIC,
                    id::IDENTIFY,
                    id::GROUPS,
                    id::SCENES,
                    id::TUYA_MANUFACTURER,
                ])
                .with_out(&[id::TIME, id::OTA])],
            replacement: replacement(&silvercrest_in, &[id::TIME, id::OTA]),
            build,
        },
        // Later firmware announces itself as a thermostat
        QuirkDescriptor {
            name: "silvercrest",
            models: &[("_TZE200_chyvmhay", "TS0601")],
            signature: vec![Endpoint::new(1, HA_PROFILE, device_type::THERMOSTAT)
                .with_in(&[
                    id::BASIC,
                    id::IDENTIFY,
                    id::GROUPS,
                    id::SCENES,
                    id::THERMOSTAT,
                    id::TUYA_MANUFACTURER,
                ])
                .with_out(&[id::TIME, id::OTA])],
            replacement: replacement(&silvercrest_in, &[id::TIME, id::OTA]),
            build,
        },
        QuirkDescriptor {
            name: "silvercrest3",
            models: &[("_TZE200_uiyqstza", "TS0601")],
            signature: vec![super::ts0601_endpoint(device_type::SMART_PLUG)],
            replacement: replacement(&silvercrest_in, &[id::TIME, id::OTA]),
            build,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vendors::testing::{attach, sent};
    use zigbee_core::cluster::analog_output_attrs;

    const AWAY: [u8; 8] = [24, 12, 24, 18, 30, 33, 0x01, 0x2C];

    fn device() -> (crate::QuirkDevice, tokio::sync::mpsc::Receiver<crate::Outbound>) {
        attach(&descriptors()[0], "_TZE200_qc4fpmcn")
    }

    fn setpoint(device: &crate::QuirkDevice) -> Option<i64> {
        device.state().thermostat_attr(attrs::OCCUPIED_HEATING_SETPOINT)
    }

    #[test]
    fn test_away_mode_uses_away_setpoint() {
        let (mut device, _rx) = device();
        device.handle_report(AWAY_DATA, DpValue::Raw(AWAY.to_vec()));
        device.handle_report(MODE, DpValue::Enum(2));

        let thermostat = device.state().thermostat().unwrap();
        assert_eq!(thermostat.system_mode(), Some(SystemMode::Heat));
        assert_eq!(thermostat.occupancy(), Some(Occupancy::Unoccupied));
        assert_eq!(thermostat.preset(), Some(Preset::Away));
        assert_eq!(thermostat.get(attrs::OCCUPIED_HEATING_SETPOINT_AWAY), Some(1650));
        assert_eq!(setpoint(&device), Some(1650));
    }

    #[test]
    fn test_away_data_fills_controls() {
        let (mut device, _rx) = device();
        device.handle_report(AWAY_DATA, DpValue::Raw(AWAY.to_vec()));

        let state = device.state();
        assert_eq!(state.analog_value(Feature::AwayYear), Some(2024.0));
        assert_eq!(state.analog_value(Feature::AwayMonth), Some(12.0));
        assert_eq!(state.analog_value(Feature::AwayTemperature), Some(16.5));
        assert_eq!(state.analog_value(Feature::AwayOperatingHours), Some(300.0));
    }

    #[test]
    fn test_setpoint_follows_mode() {
        let (mut device, _rx) = device();
        device.handle_report(TARGET_TEMP_AUTO, DpValue::Value(42));
        device.handle_report(TARGET_TEMP_MANUAL, DpValue::Value(38));
        device.handle_report(MODE, DpValue::Enum(0));
        assert_eq!(setpoint(&device), Some(2100));

        device.handle_report(MODE, DpValue::Enum(1));
        assert_eq!(setpoint(&device), Some(1900));
        assert_eq!(
            device.state().thermostat().unwrap().system_mode(),
            Some(SystemMode::Heat)
        );

        device.handle_report(TARGET_TEMP_MANUAL, DpValue::Value(0));
        assert_eq!(setpoint(&device), Some(0));
        assert_eq!(
            device.state().thermostat().unwrap().system_mode(),
            Some(SystemMode::Off)
        );
    }

    #[test]
    fn test_running_state_and_battery() {
        let (mut device, _rx) = device();
        device.handle_report(TARGET_TEMP_AUTO, DpValue::Value(42));
        device.handle_report(TEMPERATURE, DpValue::Value(195));
        assert_eq!(device.state().thermostat_attr(attrs::RUNNING_STATE), Some(1));

        device.handle_report(TEMPERATURE, DpValue::Value(215));
        assert_eq!(device.state().thermostat_attr(attrs::RUNNING_STATE), Some(0));

        assert_eq!(battery_percent(140), 100.0);
        assert_eq!(battery_percent(60), 0.0);
        assert_eq!(battery_percent(100), 50.1);
    }

    #[tokio::test]
    async fn test_setpoint_write_routes_on_preset() {
        let (mut device, mut rx) = device();
        device.handle_report(MODE, DpValue::Enum(1));
        device
            .write_attributes(1, id::THERMOSTAT, &[(attrs::OCCUPIED_HEATING_SETPOINT, ZclValue::Int(2150))])
            .await
            .unwrap();
        assert_eq!(sent(&mut rx), vec![(TARGET_TEMP_MANUAL, DpValue::Value(43))]);

        device.handle_report(AWAY_DATA, DpValue::Raw(AWAY.to_vec()));
        device.handle_report(MODE, DpValue::Enum(2));
        device
            .write_attributes(1, id::THERMOSTAT, &[(attrs::OCCUPIED_HEATING_SETPOINT, ZclValue::Int(1210))])
            .await
            .unwrap();
        let mut expected = AWAY.to_vec();
        expected[5] = 24;
        assert_eq!(sent(&mut rx), vec![(AWAY_DATA, DpValue::Raw(expected))]);
        // Shown right away, at the half degree the record holds
        assert_eq!(setpoint(&device), Some(1200));
        assert_eq!(device.state().analog_value(Feature::AwayTemperature), Some(12.0));
    }

    #[tokio::test]
    async fn test_mode_writes() {
        let (mut device, mut rx) = device();
        device
            .write_attributes(1, id::THERMOSTAT, &[(attrs::OPERATION_PRESET, ZclValue::Int(0))])
            .await
            .unwrap();
        assert_eq!(
            sent(&mut rx),
            vec![(MODE, DpValue::Enum(2)), (BOOST, DpValue::Bool(false))]
        );

        device
            .write_attributes(1, id::THERMOSTAT, &[(attrs::SYSTEM_MODE, ZclValue::Int(0))])
            .await
            .unwrap();
        assert_eq!(
            sent(&mut rx),
            vec![(MODE, DpValue::Enum(1)), (TARGET_TEMP_MANUAL, DpValue::Value(0))]
        );

        device
            .write_attributes(1, id::THERMOSTAT, &[(attrs::OCCUPANCY, ZclValue::Int(0))])
            .await
            .unwrap();
        assert_eq!(sent(&mut rx), vec![(MODE, DpValue::Enum(2))]);
    }

    #[tokio::test]
    async fn test_schedule_slot_write_recomposes_day() {
        let (mut device, mut rx) = device();
        let mut tuesday = vec![2u8];
        for slot in 1..=SLOTS_PER_DAY {
            tuesday.push(if slot % 2 == 1 { 40 } else { 24 });
        }
        device.handle_report(SCHEDULE_MONDAY + 1, DpValue::Raw(tuesday.clone()));
        assert_eq!(
            device.read_attribute(1, id::THERMOSTAT, schedule_attr(1, 2)),
            Some(ZclValue::Float(6.0))
        );

        device
            .write_attributes(1, id::THERMOSTAT, &[(schedule_attr(1, 3), ZclValue::Float(21.5))])
            .await
            .unwrap();
        tuesday[3] = 43;
        assert_eq!(sent(&mut rx), vec![(SCHEDULE_MONDAY + 1, DpValue::Raw(tuesday))]);
    }

    #[tokio::test]
    async fn test_away_control_without_cache_fails() {
        let (mut device, _rx) = device();
        let records = device
            .write_attributes(
                3,
                id::ANALOG_OUTPUT,
                &[(analog_output_attrs::PRESENT_VALUE, ZclValue::Float(2025.0))],
            )
            .await
            .unwrap();
        assert_eq!(records[0].status, zigbee_core::Status::Failure);
    }

    #[tokio::test]
    async fn test_silvercrest_child_lock_and_temperature_update() {
        let (mut device, mut rx) = attach(&descriptors()[1], "_TZE200_chyvmhay");
        device.command(2, id::ON_OFF, 0x01, &[]).await.unwrap();
        assert_eq!(sent(&mut rx), vec![(SILVERCREST_CHILD_LOCK, DpValue::Bool(true))]);

        device.command(16, id::ON_OFF, 0x01, &[]).await.unwrap();
        assert_eq!(sent(&mut rx), vec![(TEMPERATURE, DpValue::Value(0))]);
    }
}
