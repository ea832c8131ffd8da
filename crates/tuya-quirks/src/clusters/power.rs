//! Battery reporting exposed as a Power Configuration cluster

use super::AttributeCache;
use crate::convert::scale_to_raw;
use zigbee_core::cluster::power_config_attrs as attrs;

/// Constant battery description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatterySpec {
    /// ZCL battery size enum (3 = AAA)
    pub size: u8,
    pub quantity: u8,
    /// In 100 mV units
    pub rated_voltage: u8,
}

#[derive(Debug)]
pub struct PowerConfigurationCluster {
    pub(crate) attrs: AttributeCache,
}

impl PowerConfigurationCluster {
    #[must_use]
    pub fn new(battery: Option<BatterySpec>) -> Self {
        let mut cache = AttributeCache::new();
        if let Some(battery) = battery {
            cache.set(attrs::BATTERY_SIZE, battery.size);
            cache.set(attrs::BATTERY_QUANTITY, battery.quantity);
            cache.set(attrs::BATTERY_RATED_VOLTAGE, battery.rated_voltage);
        }
        Self { attrs: cache }
    }

    /// Battery level in percent; stored as half-percent units
    pub fn battery_change(&mut self, percent: f64) {
        self.attrs
            .set(attrs::BATTERY_PERCENTAGE_REMAINING, scale_to_raw(percent, 2.0));
    }

    #[must_use]
    pub fn percentage_remaining(&self) -> Option<i64> {
        self.attrs.get_int(attrs::BATTERY_PERCENTAGE_REMAINING)
    }
}
