//! Unit conversions between data point values and standard attributes

use tracing::debug;

/// Scale applied to a raw data point value to reach the standard unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    Identity,
    /// Multiply on the way in, divide (rounding) on the way out
    Scale(i64),
}

impl Conversion {
    #[must_use]
    pub const fn forward(self, raw: i64) -> i64 {
        match self {
            Conversion::Identity => raw,
            Conversion::Scale(k) => raw * k,
        }
    }

    #[must_use]
    pub fn reverse(self, value: i64) -> i64 {
        match self {
            Conversion::Identity => value,
            Conversion::Scale(k) => round_div(value, k),
        }
    }
}

/// Integer division rounding halves away from zero
#[must_use]
pub fn round_div(value: i64, divisor: i64) -> i64 {
    if divisor == 0 {
        return value;
    }
    let quotient = value / divisor;
    let remainder = value % divisor;
    if 2 * remainder.abs() >= divisor.abs() {
        if (value < 0) == (divisor < 0) {
            quotient + 1
        } else {
            quotient - 1
        }
    } else {
        quotient
    }
}

/// Scale a control value to device units, rounding halves away from zero
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn scale_to_raw(value: f64, factor: f64) -> i64 {
    (value * factor).round() as i64
}

/// A manufacturer attribute mirrored 1:1 into a thermostat attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectMapping {
    pub manuf_attr: u16,
    pub thermostat_attr: u16,
    pub conversion: Conversion,
}

impl DirectMapping {
    #[must_use]
    pub const fn new(manuf_attr: u16, thermostat_attr: u16, conversion: Conversion) -> Self {
        Self {
            manuf_attr,
            thermostat_attr,
            conversion,
        }
    }
}

/// Per-model filter on incoming direct-mapped reports
///
/// Rejected values are still cached on the manufacturer cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportGuard {
    #[default]
    None,
    /// Only forward raw values strictly below the limit
    Below(i64),
}

impl ReportGuard {
    #[must_use]
    pub fn allows(self, raw: i64) -> bool {
        match self {
            ReportGuard::None => true,
            ReportGuard::Below(limit) => raw < limit,
        }
    }
}

/// Forward a manufacturer report through the mapping table
///
/// Returns the thermostat attribute and its converted value, `None` when the
/// attribute is not mapped or the guard drops the value.
#[must_use]
pub fn apply_direct(
    mappings: &[DirectMapping],
    guard: ReportGuard,
    manuf_attr: u16,
    raw: i64,
) -> Option<(u16, i64)> {
    let mapping = mappings.iter().find(|m| m.manuf_attr == manuf_attr)?;
    if !guard.allows(raw) {
        debug!("Dropping report {} for 0x{:04X} ({:?})", raw, manuf_attr, guard);
        return None;
    }
    Some((mapping.thermostat_attr, mapping.conversion.forward(raw)))
}

/// Map a thermostat attribute write back to its manufacturer attribute
#[must_use]
pub fn reverse_direct(
    mappings: &[DirectMapping],
    thermostat_attr: u16,
    value: i64,
) -> Option<(u16, i64)> {
    mappings
        .iter()
        .find(|m| m.thermostat_attr == thermostat_attr)
        .map(|m| (m.manuf_attr, m.conversion.reverse(value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_div_halves_away_from_zero() {
        assert_eq!(round_div(2150, 10), 215);
        assert_eq!(round_div(2155, 10), 216);
        assert_eq!(round_div(2154, 10), 215);
        assert_eq!(round_div(-25, 10), -3);
        assert_eq!(round_div(-24, 10), -2);
        assert_eq!(round_div(75, 50), 2);
    }

    #[test]
    fn test_reverse_of_forward() {
        for conversion in [Conversion::Identity, Conversion::Scale(10), Conversion::Scale(50)] {
            for raw in [-60, -1, 0, 1, 5, 202, 599, 60000] {
                assert_eq!(conversion.reverse(conversion.forward(raw)), raw);
            }
        }
    }

    #[test]
    fn test_vendor_tables_reverse_their_reports() {
        for descriptor in crate::vendors::descriptors() {
            for (manufacturer, _) in descriptor.models {
                let quirk = (descriptor.build)(manufacturer);
                for mapping in quirk.direct_mappings() {
                    for raw in [-90, -1, 0, 1, 5, 43, 202, 215, 599, 3000] {
                        assert_eq!(
                            reverse_direct(
                                quirk.direct_mappings(),
                                mapping.thermostat_attr,
                                mapping.conversion.forward(raw),
                            ),
                            Some((mapping.manuf_attr, raw)),
                            "{} ({}) 0x{:04X}",
                            descriptor.name,
                            manufacturer,
                            mapping.manuf_attr
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_saswell_setpoint_write() {
        use crate::vendors::saswell;
        use zigbee_core::cluster::thermostat_attrs;

        let descriptor = &saswell::descriptors()[0];
        let quirk = (descriptor.build)(descriptor.models[0].0);
        assert_eq!(
            reverse_direct(
                quirk.direct_mappings(),
                thermostat_attrs::OCCUPIED_HEATING_SETPOINT,
                2150
            ),
            Some((saswell::TARGET_TEMP, 215))
        );
    }

    #[test]
    fn test_guard_drops_but_mapping_still_known() {
        let mappings = [DirectMapping::new(0x0218, 0x0000, Conversion::Scale(10))];

        assert_eq!(
            apply_direct(&mappings, ReportGuard::Below(500), 0x0218, 215),
            Some((0x0000, 2150))
        );
        assert_eq!(apply_direct(&mappings, ReportGuard::Below(500), 0x0218, 500), None);
        assert_eq!(apply_direct(&mappings, ReportGuard::None, 0x0219, 1), None);
    }

    #[test]
    fn test_scale_to_raw() {
        assert_eq!(scale_to_raw(-5.5, 10.0), -55);
        assert_eq!(scale_to_raw(0.25, 2.0), 1);
        assert_eq!(scale_to_raw(21.5, 2.0), 43);
    }
}
