//! Battery powered temperature and humidity sensor with alarm thresholds

use super::{int, ts0601_endpoint};
use crate::clusters::{AnalogSpec, BatterySpec, ClusterSpec, Feature, MeasurementKind};
use crate::convert::scale_to_raw;
use crate::device::DeviceState;
use crate::manufacturer::{ManufAttr, ManufValue, ManufWrite};
use crate::quirk::{EndpointLayout, Quirk, QuirkDescriptor, Target};
use tuya_protocol::DpValue;
use zigbee_core::cluster::{device_type, id, on_off_attrs};
use zigbee_core::ZclValue;

/// Decidegrees
pub const TEMPERATURE: u16 = 0x0201;
/// Percent
pub const HUMIDITY: u16 = 0x0202;
pub const BATTERY: u16 = 0x0204;
pub const MAX_TEMP: u16 = 0x020A;
pub const MIN_TEMP: u16 = 0x020B;
/// 0 below the minimum, 1 above the maximum, anything else is fine
pub const TEMP_ALARM: u16 = 0x040E;
pub const MAX_HUMIDITY: u16 = 0x020C;
pub const MIN_HUMIDITY: u16 = 0x020D;
pub const HUMIDITY_ALARM: u16 = 0x040F;
/// Half degrees
pub const TEMP_SENSITIVITY: u16 = 0x0213;
pub const HUMIDITY_SENSITIVITY: u16 = 0x0214;
/// Minutes
pub const TEMP_REPORTING: u16 = 0x0211;
pub const HUMIDITY_REPORTING: u16 = 0x0212;
/// 0 Celsius, 1 Fahrenheit
pub const TEMP_UNIT: u16 = 0x0409;

static ATTRIBUTES: [ManufAttr; 14] = [
    ManufAttr::new(TEMPERATURE, "temperature"),
    ManufAttr::new(HUMIDITY, "humidity"),
    ManufAttr::new(BATTERY, "battery"),
    ManufAttr::new(MAX_TEMP, "max_temperature"),
    ManufAttr::new(MIN_TEMP, "min_temperature"),
    ManufAttr::new(TEMP_ALARM, "temperature_alarm"),
    ManufAttr::new(MAX_HUMIDITY, "max_humidity"),
    ManufAttr::new(MIN_HUMIDITY, "min_humidity"),
    ManufAttr::new(HUMIDITY_ALARM, "humidity_alarm"),
    ManufAttr::new(TEMP_SENSITIVITY, "temperature_sensitivity"),
    ManufAttr::new(HUMIDITY_SENSITIVITY, "humidity_sensitivity"),
    ManufAttr::new(TEMP_REPORTING, "temperature_reporting"),
    ManufAttr::new(HUMIDITY_REPORTING, "humidity_reporting"),
    ManufAttr::new(TEMP_UNIT, "temperature_unit"),
];

static BATTERY_2AAA: BatterySpec = BatterySpec {
    size: 3,
    quantity: 2,
    rated_voltage: 15,
};

const fn limit(description: &'static str, min: f64, max: f64, celsius: bool) -> AnalogSpec {
    AnalogSpec {
        description,
        min,
        max,
        resolution: if celsius { 0.1 } else { 1.0 },
        application_type: if celsius { 13 << 16 } else { 1 << 16 },
        engineering_units: if celsius { 62 } else { 98 },
        writable: true,
    }
}

const fn reporting(description: &'static str) -> AnalogSpec {
    AnalogSpec {
        description,
        min: 1.0,
        max: 300.0,
        resolution: 1.0,
        application_type: 14 << 16,
        engineering_units: 72,
        writable: true,
    }
}

static MAX_TEMP_SPEC: AnalogSpec = limit("Max Temperature", -20.0, 30.0, true);
static MIN_TEMP_SPEC: AnalogSpec = limit("Min Temperature", -20.0, 30.0, true);
static MAX_HUMIDITY_SPEC: AnalogSpec = limit("Max Humidity", 0.0, 100.0, false);
static MIN_HUMIDITY_SPEC: AnalogSpec = limit("Min Humidity", 0.0, 100.0, false);
static TEMP_SENSITIVITY_SPEC: AnalogSpec = AnalogSpec {
    description: "Temperature sensitivity",
    min: 0.5,
    max: 10.0,
    resolution: 0.5,
    application_type: 13 << 16,
    engineering_units: 62,
    writable: true,
};
static HUMIDITY_SENSITIVITY_SPEC: AnalogSpec = limit("Humidity sensitivity", 1.0, 10.0, false);
static TEMP_REPORTING_SPEC: AnalogSpec = reporting("Temperature reporting time");
static HUMIDITY_REPORTING_SPEC: AnalogSpec = reporting("Humidity reporting time");

/// Data point and scale behind each writable control
const CONTROLS: [(Feature, u16, f64); 8] = [
    (Feature::MaxTemperature, MAX_TEMP, 10.0),
    (Feature::MinTemperature, MIN_TEMP, 10.0),
    (Feature::MaxHumidity, MAX_HUMIDITY, 1.0),
    (Feature::MinHumidity, MIN_HUMIDITY, 1.0),
    (Feature::TemperatureSensitivity, TEMP_SENSITIVITY, 2.0),
    (Feature::HumiditySensitivity, HUMIDITY_SENSITIVITY, 1.0),
    (Feature::TemperatureReporting, TEMP_REPORTING, 1.0),
    (Feature::HumidityReporting, HUMIDITY_REPORTING, 1.0),
];

pub struct TemperatureSensor;

impl TemperatureSensor {
    fn alarm(state: &mut DeviceState, low: Feature, high: Feature, value: i64) {
        state.set_binary(low, value == 0);
        state.set_binary(high, value == 1);
    }
}

impl Quirk for TemperatureSensor {
    fn attributes(&self) -> &'static [ManufAttr] {
        &ATTRIBUTES
    }

    fn decode(&self, state: &mut DeviceState, attr: u16, value: &DpValue) {
        let v = int(value);
        match attr {
            TEMPERATURE => state.set_measurement(MeasurementKind::Temperature, v * 10),
            HUMIDITY => state.set_measurement(MeasurementKind::Humidity, v * 100),
            BATTERY => state.battery_change(v as f64),
            TEMP_ALARM => Self::alarm(
                state,
                Feature::TemperatureAlarmLow,
                Feature::TemperatureAlarmHigh,
                v,
            ),
            HUMIDITY_ALARM => Self::alarm(
                state,
                Feature::HumidityAlarmLow,
                Feature::HumidityAlarmHigh,
                v,
            ),
            TEMP_UNIT => state.set_switch(Feature::TemperatureUnit, v != 0),
            _ => {
                if let Some(&(feature, _, scale)) = CONTROLS.iter().find(|(_, a, _)| *a == attr) {
                    state.set_analog(feature, v as f64 / scale);
                }
            }
        }
    }

    fn map_attribute(
        &self,
        _state: &DeviceState,
        target: Target,
        attr: u16,
        value: &ZclValue,
    ) -> Option<ManufWrite> {
        let write = match target {
            Target::Switch(Feature::TemperatureUnit) if attr == on_off_attrs::ON_OFF => {
                (TEMP_UNIT, value.as_bool()?.into())
            }
            Target::Analog(feature) => {
                let &(_, manuf, scale) = CONTROLS.iter().find(|(f, _, _)| *f == feature)?;
                (manuf, ManufValue::Int(scale_to_raw(value.as_float()?, scale)))
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
    let alarm = |ep: u8, feature: Feature| {
        EndpointLayout::new(ep, device_type::SIMPLE_SENSOR).with(ClusterSpec::BinaryInput(feature))
    };

    vec![QuirkDescriptor {
        name: "temperature_sensor",
        models: &[("_TZE200_bq5c8xfe", "TS0601"), ("_TZE200_locansqn", "TS0601")],
        signature: vec![ts0601_endpoint(device_type::SMART_PLUG)],
        replacement: vec![
            EndpointLayout::new(1, device_type::TEMPERATURE_SENSOR)
                .passthrough(&[id::BASIC, id::GROUPS, id::SCENES])
                .with(ClusterSpec::Manufacturer)
                .with(ClusterSpec::PowerConfiguration(Some(BATTERY_2AAA)))
                .with(ClusterSpec::TemperatureMeasurement)
                .with(ClusterSpec::RelativeHumidity)
                .with_out(&[id::TIME, id::OTA]),
            analog(2, Feature::MaxTemperature, &MAX_TEMP_SPEC),
            analog(3, Feature::MinTemperature, &MIN_TEMP_SPEC),
            alarm(4, Feature::TemperatureAlarmLow),
            alarm(5, Feature::TemperatureAlarmHigh),
            analog(6, Feature::MaxHumidity, &MAX_HUMIDITY_SPEC),
            analog(7, Feature::MinHumidity, &MIN_HUMIDITY_SPEC),
            alarm(8, Feature::HumidityAlarmLow),
            alarm(9, Feature::HumidityAlarmHigh),
            analog(10, Feature::TemperatureSensitivity, &TEMP_SENSITIVITY_SPEC),
            analog(11, Feature::HumiditySensitivity, &HUMIDITY_SENSITIVITY_SPEC),
            analog(12, Feature::TemperatureReporting, &TEMP_REPORTING_SPEC),
            analog(13, Feature::HumidityReporting, &HUMIDITY_REPORTING_SPEC),
            EndpointLayout::new(14, device_type::ON_OFF_SWITCH)
                .with(ClusterSpec::OnOff(Feature::TemperatureUnit)),
        ],
        build: |_| Box::new(TemperatureSensor),
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vendors::testing::{attach, sent};
    use zigbee_core::cluster::{
        analog_output_attrs, binary_input_attrs, measurement_attrs, power_config_attrs,
    };

    fn device() -> (crate::QuirkDevice, tokio::sync::mpsc::Receiver<crate::Outbound>) {
        attach(&descriptors()[0], "_TZE200_bq5c8xfe")
    }

    #[test]
    fn test_measurements() {
        let (mut device, _rx) = device();
        device.handle_report(TEMPERATURE, DpValue::Value(202));
        device.handle_report(HUMIDITY, DpValue::Value(65));
        device.handle_report(BATTERY, DpValue::Value(40));

        assert_eq!(
            device.read_attribute(1, id::TEMPERATURE_MEASUREMENT, measurement_attrs::MEASURED_VALUE),
            Some(ZclValue::Int(2020))
        );
        assert_eq!(
            device.read_attribute(1, id::HUMIDITY_MEASUREMENT, measurement_attrs::MEASURED_VALUE),
            Some(ZclValue::Int(6500))
        );
        assert_eq!(
            device.read_attribute(1, id::POWER_CONFIG, power_config_attrs::BATTERY_PERCENTAGE_REMAINING),
            Some(ZclValue::Int(80))
        );
        assert_eq!(
            device.read_attribute(1, id::POWER_CONFIG, power_config_attrs::BATTERY_QUANTITY),
            Some(ZclValue::Int(2))
        );
    }

    #[test]
    fn test_alarms() {
        let (mut device, _rx) = device();
        let alarm = |device: &crate::QuirkDevice, ep: u8| {
            device.read_attribute(ep, id::BINARY_INPUT, binary_input_attrs::PRESENT_VALUE)
        };

        device.handle_report(TEMP_ALARM, DpValue::Enum(0));
        assert_eq!(alarm(&device, 4), Some(ZclValue::Bool(true)));
        assert_eq!(alarm(&device, 5), Some(ZclValue::Bool(false)));

        device.handle_report(TEMP_ALARM, DpValue::Enum(1));
        assert_eq!(alarm(&device, 4), Some(ZclValue::Bool(false)));
        assert_eq!(alarm(&device, 5), Some(ZclValue::Bool(true)));

        device.handle_report(HUMIDITY_ALARM, DpValue::Enum(2));
        assert_eq!(alarm(&device, 8), Some(ZclValue::Bool(false)));
        assert_eq!(alarm(&device, 9), Some(ZclValue::Bool(false)));
    }

    #[test]
    fn test_threshold_reports() {
        let (mut device, _rx) = device();
        device.handle_report(MAX_TEMP, DpValue::Value(254));
        device.handle_report(TEMP_SENSITIVITY, DpValue::Value(6));
        device.handle_report(MIN_HUMIDITY, DpValue::Value(21));

        let state = device.state();
        assert_eq!(state.analog_value(Feature::MaxTemperature), Some(25.4));
        assert_eq!(state.analog_value(Feature::TemperatureSensitivity), Some(3.0));
        assert_eq!(state.analog_value(Feature::MinHumidity), Some(21.0));
    }

    #[tokio::test]
    async fn test_control_writes() {
        let (mut device, mut rx) = device();
        let write = |value: f64| [(analog_output_attrs::PRESENT_VALUE, ZclValue::Float(value))];

        device.write_attributes(3, id::ANALOG_OUTPUT, &write(-5.5)).await.unwrap();
        assert_eq!(sent(&mut rx), vec![(MIN_TEMP, DpValue::Value(-55))]);

        device.write_attributes(10, id::ANALOG_OUTPUT, &write(1.5)).await.unwrap();
        assert_eq!(sent(&mut rx), vec![(TEMP_SENSITIVITY, DpValue::Value(3))]);

        device.write_attributes(13, id::ANALOG_OUTPUT, &write(120.0)).await.unwrap();
        assert_eq!(sent(&mut rx), vec![(HUMIDITY_REPORTING, DpValue::Value(120))]);
    }

    #[tokio::test]
    async fn test_temperature_unit_switch() {
        let (mut device, mut rx) = device();
        device.command(14, id::ON_OFF, 0x01, &[]).await.unwrap();
        assert_eq!(sent(&mut rx), vec![(TEMP_UNIT, DpValue::Enum(1))]);

        device.handle_report(TEMP_UNIT, DpValue::Enum(0));
        assert_eq!(device.state().switch_state(Feature::TemperatureUnit), Some(false));

        let records = device
            .write_attributes(1, id::TEMPERATURE_MEASUREMENT, &[(measurement_attrs::MEASURED_VALUE, ZclValue::Int(0))])
            .await
            .unwrap();
        assert_eq!(records[0].status, zigbee_core::Status::Failure);
    }
}
