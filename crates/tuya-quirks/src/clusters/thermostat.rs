//! Synthetic Thermostat cluster

use super::AttributeCache;
use tracing::{debug, error};
use zigbee_core::cluster::thermostat_attrs as attrs;
use zigbee_core::cluster::{
    ControlSequenceOfOperation, Occupancy, Preset, ProgrammingOperationMode, RunningMode,
    RunningState, SystemMode,
};
use zigbee_core::ZclValue;

/// Heating setpoint range in centidegrees
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetpointLimits {
    pub min: i64,
    pub max: i64,
}

impl SetpointLimits {
    #[must_use]
    pub const fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }
}

/// Attributes a vendor mode byte decodes into
///
/// Fields left `None` keep their current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModeUpdate {
    pub preset: Option<Preset>,
    pub programming: Option<ProgrammingOperationMode>,
    pub occupancy: Option<Occupancy>,
    pub system_mode: Option<SystemMode>,
}

impl ModeUpdate {
    #[must_use]
    pub fn preset(preset: Preset) -> Self {
        Self {
            preset: Some(preset),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn programming(mut self, mode: ProgrammingOperationMode) -> Self {
        self.programming = Some(mode);
        self
    }

    #[must_use]
    pub fn occupancy(mut self, occupancy: Occupancy) -> Self {
        self.occupancy = Some(occupancy);
        self
    }

    #[must_use]
    pub fn system_mode(mut self, mode: SystemMode) -> Self {
        self.system_mode = Some(mode);
        self
    }
}

#[derive(Debug)]
pub struct ThermostatCluster {
    pub(crate) attrs: AttributeCache,
}

impl ThermostatCluster {
    #[must_use]
    pub fn new(limits: SetpointLimits) -> Self {
        let mut cache = AttributeCache::new();
        cache.set(
            attrs::CTRL_SEQUENCE_OF_OPER,
            ControlSequenceOfOperation::HeatingOnly as u8,
        );
        cache.set(attrs::MIN_HEAT_SETPOINT_LIMIT, limits.min);
        cache.set(attrs::MAX_HEAT_SETPOINT_LIMIT, limits.max);
        Self { attrs: cache }
    }

    /// Local or target temperature change from the device
    pub fn temperature_change(&mut self, attr: u16, value: i64) {
        self.attrs.set(attr, value);
    }

    /// Heating demand reported (or derived) for the device
    pub fn state_change(&mut self, heating: bool) {
        let (mode, state) = if heating {
            (RunningMode::Heat, RunningState::HeatStateOn)
        } else {
            (RunningMode::Off, RunningState::Idle)
        };
        self.attrs.set(attrs::RUNNING_MODE, mode as u8);
        self.attrs.set(attrs::RUNNING_STATE, state as u16);
    }

    pub fn set_system_mode(&mut self, mode: SystemMode) {
        self.attrs.set(attrs::SYSTEM_MODE, mode as u8);
    }

    /// Apply a decoded mode byte: programming mode, occupancy, preset, system mode
    pub fn apply_mode(&mut self, update: ModeUpdate) {
        if let Some(programming) = update.programming {
            self.attrs.set(attrs::PROGRAMING_OPER_MODE, programming as u8);
        }
        if let Some(occupancy) = update.occupancy {
            self.attrs.set(attrs::OCCUPANCY, occupancy as u8);
        }
        if let Some(preset) = update.preset {
            self.attrs.set(attrs::OPERATION_PRESET, preset as u8);
        }
        if let Some(mode) = update.system_mode {
            self.set_system_mode(mode);
        }
        debug!("Thermostat mode update: {:?}", update);
    }

    #[must_use]
    pub fn get(&self, attr: u16) -> Option<i64> {
        self.attrs.get_int(attr)
    }

    #[must_use]
    pub fn value(&self, attr: u16) -> Option<&ZclValue> {
        self.attrs.get(attr)
    }

    #[must_use]
    pub fn system_mode(&self) -> Option<SystemMode> {
        self.get_u8(attrs::SYSTEM_MODE)
            .and_then(|v| SystemMode::try_from(v).ok())
    }

    #[must_use]
    pub fn preset(&self) -> Option<Preset> {
        self.get_u8(attrs::OPERATION_PRESET)
            .and_then(|v| Preset::try_from(v).ok())
    }

    #[must_use]
    pub fn programming_mode(&self) -> Option<ProgrammingOperationMode> {
        self.get_u8(attrs::PROGRAMING_OPER_MODE)
            .and_then(|v| ProgrammingOperationMode::try_from(v).ok())
    }

    #[must_use]
    pub fn occupancy(&self) -> Option<Occupancy> {
        self.get_u8(attrs::OCCUPANCY)
            .and_then(|v| Occupancy::try_from(v).ok())
    }

    fn get_u8(&self, attr: u16) -> Option<u8> {
        self.get(attr).and_then(|v| u8::try_from(v).ok())
    }
}

/// Resolve a programming mode or occupancy write against the cached counterpart
///
/// Only the occupied states map onto a vendor mode; anything else is logged
/// and yields `None`.
#[must_use]
pub fn resolve_programming_write(
    thermostat: &ThermostatCluster,
    attr: u16,
    value: &ZclValue,
) -> Option<ProgrammingOperationMode> {
    let raw = value.as_int().and_then(|v| u8::try_from(v).ok());
    let (occupancy, programming) = match attr {
        attrs::OCCUPANCY => (
            raw.and_then(|v| Occupancy::try_from(v).ok()),
            Some(
                thermostat
                    .programming_mode()
                    .unwrap_or(ProgrammingOperationMode::Simple),
            ),
        ),
        attrs::PROGRAMING_OPER_MODE => (
            Some(thermostat.occupancy().unwrap_or(Occupancy::Occupied)),
            raw.and_then(|v| ProgrammingOperationMode::try_from(v).ok()),
        ),
        _ => return None,
    };

    if occupancy != Some(Occupancy::Occupied) {
        error!("Unsupported value for occupancy: {:?}", value);
        return None;
    }
    match programming {
        Some(
            mode @ (ProgrammingOperationMode::Simple
            | ProgrammingOperationMode::ScheduleProgrammingMode),
        ) => Some(mode),
        _ => {
            error!("Unsupported value for programming operation mode: {:?}", value);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_pushes_constants_and_limits() {
        let thermostat = ThermostatCluster::new(SetpointLimits::new(500, 3000));
        assert_eq!(thermostat.get(attrs::CTRL_SEQUENCE_OF_OPER), Some(2));
        assert_eq!(thermostat.get(attrs::MIN_HEAT_SETPOINT_LIMIT), Some(500));
        assert_eq!(thermostat.get(attrs::MAX_HEAT_SETPOINT_LIMIT), Some(3000));
    }

    #[test]
    fn test_state_change() {
        let mut thermostat = ThermostatCluster::new(SetpointLimits::new(500, 3000));
        thermostat.state_change(true);
        assert_eq!(thermostat.get(attrs::RUNNING_MODE), Some(4));
        assert_eq!(thermostat.get(attrs::RUNNING_STATE), Some(1));

        thermostat.state_change(false);
        assert_eq!(thermostat.get(attrs::RUNNING_MODE), Some(0));
        assert_eq!(thermostat.get(attrs::RUNNING_STATE), Some(0));
    }

    #[test]
    fn test_apply_mode_leaves_unset_fields() {
        let mut thermostat = ThermostatCluster::new(SetpointLimits::new(500, 3000));
        thermostat.set_system_mode(SystemMode::Heat);
        thermostat.apply_mode(
            ModeUpdate::preset(Preset::Away).occupancy(Occupancy::Unoccupied),
        );

        assert_eq!(thermostat.preset(), Some(Preset::Away));
        assert_eq!(thermostat.occupancy(), Some(Occupancy::Unoccupied));
        assert_eq!(thermostat.system_mode(), Some(SystemMode::Heat));
        assert_eq!(thermostat.programming_mode(), None);
    }

    #[test]
    fn test_resolve_programming_write() {
        let mut thermostat = ThermostatCluster::new(SetpointLimits::new(500, 3000));

        assert_eq!(
            resolve_programming_write(&thermostat, attrs::PROGRAMING_OPER_MODE, &ZclValue::Int(1)),
            Some(ProgrammingOperationMode::ScheduleProgrammingMode)
        );
        assert_eq!(
            resolve_programming_write(&thermostat, attrs::OCCUPANCY, &ZclValue::Int(1)),
            Some(ProgrammingOperationMode::Simple)
        );
        assert_eq!(
            resolve_programming_write(&thermostat, attrs::OCCUPANCY, &ZclValue::Int(0)),
            None
        );

        thermostat.apply_mode(ModeUpdate::default().occupancy(Occupancy::Unoccupied));
        assert_eq!(
            resolve_programming_write(&thermostat, attrs::PROGRAMING_OPER_MODE, &ZclValue::Int(0)),
            None
        );
    }
}
