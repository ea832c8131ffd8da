//! Numeric control exposed as an Analog Output cluster

use super::AttributeCache;
use zigbee_core::cluster::analog_output_attrs as attrs;

/// Constant attributes of an analog control
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalogSpec {
    pub description: &'static str,
    pub min: f64,
    pub max: f64,
    pub resolution: f64,
    pub application_type: u32,
    pub engineering_units: u16,
    /// Whether the present value may be written
    pub writable: bool,
}

#[derive(Debug)]
pub struct AnalogOutputCluster {
    pub(crate) attrs: AttributeCache,
    writable: bool,
}

impl AnalogOutputCluster {
    #[must_use]
    pub fn new(spec: &AnalogSpec) -> Self {
        let mut cache = AttributeCache::new();
        cache.set(attrs::DESCRIPTION, spec.description);
        cache.set(attrs::MAX_PRESENT_VALUE, spec.max);
        cache.set(attrs::MIN_PRESENT_VALUE, spec.min);
        cache.set(attrs::RESOLUTION, spec.resolution);
        cache.set(attrs::APPLICATION_TYPE, i64::from(spec.application_type));
        cache.set(attrs::ENGINEERING_UNITS, spec.engineering_units);
        Self {
            attrs: cache,
            writable: spec.writable,
        }
    }

    #[must_use]
    pub fn present_value(&self) -> Option<f64> {
        self.attrs
            .get(attrs::PRESENT_VALUE)
            .and_then(zigbee_core::ZclValue::as_float)
    }

    pub fn set_present_value(&mut self, value: f64) {
        self.attrs.set(attrs::PRESENT_VALUE, value);
    }

    /// Only the present value of a writable control accepts writes
    #[must_use]
    pub fn accepts_write(&self, attr: u16) -> bool {
        self.writable && attr == attrs::PRESENT_VALUE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static CALIBRATION: AnalogSpec = AnalogSpec {
        description: "Temperature Calibration",
        min: -6.0,
        max: 6.0,
        resolution: 1.0,
        application_type: 13 << 16,
        engineering_units: 62,
        writable: true,
    };

    #[test]
    fn test_constant_attributes() {
        let cluster = AnalogOutputCluster::new(&CALIBRATION);
        assert_eq!(
            cluster.attrs.get(attrs::DESCRIPTION).and_then(|v| v.as_text()),
            Some("Temperature Calibration")
        );
        assert_eq!(cluster.attrs.get_int(attrs::APPLICATION_TYPE), Some(13 << 16));
        assert_eq!(cluster.present_value(), None);
        assert!(cluster.accepts_write(attrs::PRESENT_VALUE));
        assert!(!cluster.accepts_write(attrs::RESOLUTION));
    }
}
