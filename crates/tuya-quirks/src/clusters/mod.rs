//! Synthetic standard clusters
//!
//! These clusters never talk to the radio. Their attribute values are
//! derived from manufacturer reports, and writes to them are mapped back to
//! manufacturer attributes by the device context.

mod analog_output;
mod binary_input;
mod measurement;
mod on_off;
mod power;
mod thermostat;
mod user_interface;

pub use analog_output::{AnalogOutputCluster, AnalogSpec};
pub use binary_input::BinaryInputCluster;
pub use measurement::{MeasurementCluster, MeasurementKind};
pub use on_off::OnOffCluster;
pub use power::{BatterySpec, PowerConfigurationCluster};
pub use thermostat::{resolve_programming_write, ModeUpdate, SetpointLimits, ThermostatCluster};
pub use user_interface::UserInterfaceCluster;

use std::collections::BTreeMap;
use tuya_protocol::TUYA_CLUSTER_ID;
use zigbee_core::cluster::id;
use zigbee_core::ZclValue;

/// Attribute values of one synthetic cluster plus the changes not yet published
#[derive(Debug, Default)]
pub struct AttributeCache {
    values: BTreeMap<u16, ZclValue>,
    pending: Vec<(u16, ZclValue)>,
}

impl AttributeCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Update an attribute; every update is published, changed or not
    pub fn set(&mut self, attr: u16, value: impl Into<ZclValue>) {
        let value = value.into();
        self.values.insert(attr, value.clone());
        self.pending.push((attr, value));
    }

    #[must_use]
    pub fn get(&self, attr: u16) -> Option<&ZclValue> {
        self.values.get(&attr)
    }

    #[must_use]
    pub fn get_int(&self, attr: u16) -> Option<i64> {
        self.values.get(&attr).and_then(ZclValue::as_int)
    }

    /// Take the updates made since the last call
    pub fn drain_pending(&mut self) -> Vec<(u16, ZclValue)> {
        std::mem::take(&mut self.pending)
    }
}

/// Sub-features exposed as their own switch, control or indicator endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    // Switches
    ChildLock,
    WindowDetection,
    AntiFreeze,
    LimescaleProtection,
    ScheduleMode,
    AwayMode,
    FrostProtection,
    Boost,
    LocalTemperatureUpdate,
    TemperatureUnit,

    // Analog controls
    TemperatureCalibration,
    Deadzone,
    ComfortTemperature,
    EcoTemperature,
    ValvePosition,
    BoostCountdown,
    BoostTime,
    MinTemperature,
    MaxTemperature,
    SoftwareVersion,
    AwayYear,
    AwayMonth,
    AwayDay,
    AwayHour,
    AwayMinute,
    AwayTemperature,
    AwayOperatingHours,
    WindowDetectTemperature,
    WindowDetectTime,
    MinHumidity,
    MaxHumidity,
    TemperatureSensitivity,
    HumiditySensitivity,
    TemperatureReporting,
    HumidityReporting,

    // Indicators
    WindowOpen,
    TemperatureAlarmLow,
    TemperatureAlarmHigh,
    HumidityAlarmLow,
    HumidityAlarmHigh,
}

/// What a replacement endpoint exposes for one cluster id
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClusterSpec {
    /// A real cluster of the device, left to the host
    Passthrough(u16),
    /// The Tuya manufacturer cluster itself
    Manufacturer,
    Thermostat(SetpointLimits),
    UserInterface,
    PowerConfiguration(Option<BatterySpec>),
    OnOff(Feature),
    AnalogOutput(Feature, &'static AnalogSpec),
    BinaryInput(Feature),
    TemperatureMeasurement,
    RelativeHumidity,
}

impl ClusterSpec {
    #[must_use]
    pub fn cluster_id(&self) -> u16 {
        match self {
            ClusterSpec::Passthrough(cluster) => *cluster,
            ClusterSpec::Manufacturer => TUYA_CLUSTER_ID,
            ClusterSpec::Thermostat(_) => id::THERMOSTAT,
            ClusterSpec::UserInterface => id::THERMOSTAT_UI,
            ClusterSpec::PowerConfiguration(_) => id::POWER_CONFIG,
            ClusterSpec::OnOff(_) => id::ON_OFF,
            ClusterSpec::AnalogOutput(..) => id::ANALOG_OUTPUT,
            ClusterSpec::BinaryInput(_) => id::BINARY_INPUT,
            ClusterSpec::TemperatureMeasurement => id::TEMPERATURE_MEASUREMENT,
            ClusterSpec::RelativeHumidity => id::HUMIDITY_MEASUREMENT,
        }
    }

    /// Feature served by this cluster, for per-feature clusters
    #[must_use]
    pub fn feature(&self) -> Option<Feature> {
        match self {
            ClusterSpec::OnOff(feature)
            | ClusterSpec::AnalogOutput(feature, _)
            | ClusterSpec::BinaryInput(feature) => Some(*feature),
            _ => None,
        }
    }

    /// Instantiate the synthetic cluster, `None` for host-owned clusters
    #[must_use]
    pub fn build(&self) -> Option<LocalCluster> {
        let cluster = match self {
            ClusterSpec::Passthrough(_) | ClusterSpec::Manufacturer => return None,
            ClusterSpec::Thermostat(limits) => {
                LocalCluster::Thermostat(ThermostatCluster::new(*limits))
            }
            ClusterSpec::UserInterface => LocalCluster::UserInterface(UserInterfaceCluster::new()),
            ClusterSpec::PowerConfiguration(battery) => {
                LocalCluster::PowerConfiguration(PowerConfigurationCluster::new(*battery))
            }
            ClusterSpec::OnOff(_) => LocalCluster::OnOff(OnOffCluster::new()),
            ClusterSpec::AnalogOutput(_, spec) => {
                LocalCluster::AnalogOutput(AnalogOutputCluster::new(spec))
            }
            ClusterSpec::BinaryInput(_) => LocalCluster::BinaryInput(BinaryInputCluster::new()),
            ClusterSpec::TemperatureMeasurement => {
                LocalCluster::Measurement(MeasurementCluster::new(MeasurementKind::Temperature))
            }
            ClusterSpec::RelativeHumidity => {
                LocalCluster::Measurement(MeasurementCluster::new(MeasurementKind::Humidity))
            }
        };
        Some(cluster)
    }
}

/// A live synthetic cluster
#[derive(Debug)]
pub enum LocalCluster {
    Thermostat(ThermostatCluster),
    UserInterface(UserInterfaceCluster),
    PowerConfiguration(PowerConfigurationCluster),
    OnOff(OnOffCluster),
    AnalogOutput(AnalogOutputCluster),
    BinaryInput(BinaryInputCluster),
    Measurement(MeasurementCluster),
}

impl LocalCluster {
    #[must_use]
    pub fn attrs(&self) -> &AttributeCache {
        match self {
            LocalCluster::Thermostat(c) => &c.attrs,
            LocalCluster::UserInterface(c) => &c.attrs,
            LocalCluster::PowerConfiguration(c) => &c.attrs,
            LocalCluster::OnOff(c) => &c.attrs,
            LocalCluster::AnalogOutput(c) => &c.attrs,
            LocalCluster::BinaryInput(c) => &c.attrs,
            LocalCluster::Measurement(c) => &c.attrs,
        }
    }

    pub fn attrs_mut(&mut self) -> &mut AttributeCache {
        match self {
            LocalCluster::Thermostat(c) => &mut c.attrs,
            LocalCluster::UserInterface(c) => &mut c.attrs,
            LocalCluster::PowerConfiguration(c) => &mut c.attrs,
            LocalCluster::OnOff(c) => &mut c.attrs,
            LocalCluster::AnalogOutput(c) => &mut c.attrs,
            LocalCluster::BinaryInput(c) => &mut c.attrs,
            LocalCluster::Measurement(c) => &mut c.attrs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_publishes_every_update() {
        let mut cache = AttributeCache::new();
        cache.set(0x0000, 2020i64);
        cache.set(0x0000, 2020i64);

        assert_eq!(cache.get_int(0x0000), Some(2020));
        assert_eq!(cache.drain_pending().len(), 2);
        assert!(cache.drain_pending().is_empty());
    }

    #[test]
    fn test_passthrough_has_no_local_cluster() {
        assert!(ClusterSpec::Passthrough(id::BASIC).build().is_none());
        assert!(ClusterSpec::Manufacturer.build().is_none());
        assert_eq!(ClusterSpec::Manufacturer.cluster_id(), 0xEF00);
        assert_eq!(
            ClusterSpec::OnOff(Feature::ChildLock).feature(),
            Some(Feature::ChildLock)
        );
    }
}
