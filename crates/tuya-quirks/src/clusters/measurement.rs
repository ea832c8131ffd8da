//! Temperature and relative humidity measurement clusters

use super::AttributeCache;
use zigbee_core::cluster::measurement_attrs;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasurementKind {
    /// Centidegrees
    Temperature,
    /// Hundredths of a percent
    Humidity,
}

#[derive(Debug)]
pub struct MeasurementCluster {
    pub(crate) attrs: AttributeCache,
    kind: MeasurementKind,
}

impl MeasurementCluster {
    #[must_use]
    pub fn new(kind: MeasurementKind) -> Self {
        Self {
            attrs: AttributeCache::new(),
            kind,
        }
    }

    #[must_use]
    pub fn kind(&self) -> MeasurementKind {
        self.kind
    }

    pub fn set(&mut self, measured: i64) {
        self.attrs.set(measurement_attrs::MEASURED_VALUE, measured);
    }
}
