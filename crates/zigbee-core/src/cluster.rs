//! ZCL (Zigbee Cluster Library) definitions

/// Common ZCL cluster IDs
pub mod id {
    // General Clusters
    pub const BASIC: u16 = 0x0000;
    pub const POWER_CONFIG: u16 = 0x0001;
    pub const IDENTIFY: u16 = 0x0003;
    pub const GROUPS: u16 = 0x0004;
    pub const SCENES: u16 = 0x0005;
    pub const ON_OFF: u16 = 0x0006;
    pub const TIME: u16 = 0x000A;
    pub const ANALOG_OUTPUT: u16 = 0x000D;
    pub const BINARY_INPUT: u16 = 0x000F;
    pub const OTA: u16 = 0x0019;
    pub const GREEN_POWER: u16 = 0x0021;

    // Measurement Clusters
    pub const TEMPERATURE_MEASUREMENT: u16 = 0x0402;
    pub const HUMIDITY_MEASUREMENT: u16 = 0x0405;

    // HVAC Clusters
    pub const THERMOSTAT: u16 = 0x0201;
    pub const THERMOSTAT_UI: u16 = 0x0204;

    // Manufacturer specific
    pub const TUYA_MANUFACTURER: u16 = 0xEF00;
}

/// Home Automation profile
pub const HA_PROFILE: u16 = 0x0104;

/// Green Power profile
pub const GP_PROFILE: u16 = 0xA1E0;

/// Device IDs within the Home Automation profile
pub mod device_type {
    pub const ON_OFF_SWITCH: u16 = 0x0000;
    pub const SIMPLE_SENSOR: u16 = 0x000C;
    pub const CONSUMPTION_AWARENESS_DEVICE: u16 = 0x000D;
    pub const SMART_PLUG: u16 = 0x0051;
    pub const GREEN_POWER_PROXY_BASIC: u16 = 0x0061;
    pub const THERMOSTAT: u16 = 0x0301;
    pub const TEMPERATURE_SENSOR: u16 = 0x0302;
}

/// Thermostat cluster attributes
pub mod thermostat_attrs {
    pub const LOCAL_TEMPERATURE: u16 = 0x0000;
    pub const OCCUPANCY: u16 = 0x0002;
    pub const LOCAL_TEMPERATURE_CALIBRATION: u16 = 0x0010;
    pub const OCCUPIED_HEATING_SETPOINT: u16 = 0x0012;
    pub const UNOCCUPIED_HEATING_SETPOINT: u16 = 0x0014;
    pub const MIN_HEAT_SETPOINT_LIMIT: u16 = 0x0015;
    pub const MAX_HEAT_SETPOINT_LIMIT: u16 = 0x0016;
    pub const CTRL_SEQUENCE_OF_OPER: u16 = 0x001B;
    pub const SYSTEM_MODE: u16 = 0x001C;
    pub const RUNNING_MODE: u16 = 0x001E;
    pub const PROGRAMING_OPER_MODE: u16 = 0x0025;
    pub const RUNNING_STATE: u16 = 0x0029;

    // Manufacturer extensions
    pub const COMFORT_HEATING_SETPOINT: u16 = 0x4000;
    pub const ECO_HEATING_SETPOINT: u16 = 0x4001;
    pub const OPERATION_PRESET: u16 = 0x4002;
    pub const VALVE_POSITION: u16 = 0x4003;
    pub const BOOST_DURATION_SECONDS: u16 = 0x4004;
    pub const OCCUPIED_HEATING_SETPOINT_AUTO: u16 = 0x4006;
    pub const OCCUPIED_HEATING_SETPOINT_MANUAL: u16 = 0x4007;
    pub const OCCUPIED_HEATING_SETPOINT_AWAY: u16 = 0x4008;
    pub const WINDOW_DETECTION_TEMP: u16 = 0x4009;
    pub const WINDOW_DETECTION_TIME: u16 = 0x4010;
    /// First weekly schedule slot; 17 slots per day, Monday first
    pub const SCHEDULE_BASE: u16 = 0x4100;
}

/// On/Off cluster attributes
pub mod on_off_attrs {
    pub const ON_OFF: u16 = 0x0000;
}

/// Analog Output cluster attributes
pub mod analog_output_attrs {
    pub const DESCRIPTION: u16 = 0x001C;
    pub const MAX_PRESENT_VALUE: u16 = 0x0041;
    pub const MIN_PRESENT_VALUE: u16 = 0x0045;
    pub const PRESENT_VALUE: u16 = 0x0055;
    pub const RESOLUTION: u16 = 0x006A;
    pub const ENGINEERING_UNITS: u16 = 0x0075;
    pub const APPLICATION_TYPE: u16 = 0x0100;
}

/// Binary Input cluster attributes
pub mod binary_input_attrs {
    pub const DESCRIPTION: u16 = 0x001C;
    pub const PRESENT_VALUE: u16 = 0x0055;
}

/// Power Configuration cluster attributes
pub mod power_config_attrs {
    pub const BATTERY_PERCENTAGE_REMAINING: u16 = 0x0021;
    pub const BATTERY_SIZE: u16 = 0x0031;
    pub const BATTERY_QUANTITY: u16 = 0x0033;
    pub const BATTERY_RATED_VOLTAGE: u16 = 0x0034;
}

/// Thermostat User Interface cluster attributes
pub mod user_interface_attrs {
    pub const TEMPERATURE_DISPLAY_MODE: u16 = 0x0000;
    pub const KEYPAD_LOCKOUT: u16 = 0x0001;
}

/// Temperature and humidity measurement attributes
pub mod measurement_attrs {
    pub const MEASURED_VALUE: u16 = 0x0000;
}

/// ZCL status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Success = 0x00,
    Failure = 0x01,
    UnsupClusterCommand = 0x81,
    UnsupportedAttribute = 0x86,
    InvalidValue = 0x87,
    ReadOnly = 0x88,
}

impl TryFrom<u8> for Status {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, u8> {
        match value {
            0x00 => Ok(Status::Success),
            0x01 => Ok(Status::Failure),
            0x81 => Ok(Status::UnsupClusterCommand),
            0x86 => Ok(Status::UnsupportedAttribute),
            0x87 => Ok(Status::InvalidValue),
            0x88 => Ok(Status::ReadOnly),
            _ => Err(value),
        }
    }
}

/// On/Off cluster commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OnOffCommand {
    Off = 0x00,
    On = 0x01,
    Toggle = 0x02,
}

impl TryFrom<u8> for OnOffCommand {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, u8> {
        match value {
            0x00 => Ok(OnOffCommand::Off),
            0x01 => Ok(OnOffCommand::On),
            0x02 => Ok(OnOffCommand::Toggle),
            _ => Err(value),
        }
    }
}

/// Thermostat cluster commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ThermostatCommand {
    SetpointRaiseLower = 0x00,
}

/// Setpoint selector of `setpoint_raise_lower`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SetpointMode {
    Heat = 0x00,
    Cool = 0x01,
    Both = 0x02,
}

impl TryFrom<u8> for SetpointMode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, u8> {
        match value {
            0x00 => Ok(SetpointMode::Heat),
            0x01 => Ok(SetpointMode::Cool),
            0x02 => Ok(SetpointMode::Both),
            _ => Err(value),
        }
    }
}

/// Thermostat system mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SystemMode {
    Off = 0x00,
    Auto = 0x01,
    Cool = 0x03,
    Heat = 0x04,
    EmergencyHeating = 0x05,
    FanOnly = 0x07,
}

impl TryFrom<u8> for SystemMode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, u8> {
        match value {
            0x00 => Ok(SystemMode::Off),
            0x01 => Ok(SystemMode::Auto),
            0x03 => Ok(SystemMode::Cool),
            0x04 => Ok(SystemMode::Heat),
            0x05 => Ok(SystemMode::EmergencyHeating),
            0x07 => Ok(SystemMode::FanOnly),
            _ => Err(value),
        }
    }
}

/// Thermostat running mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RunningMode {
    Off = 0x00,
    Cool = 0x03,
    Heat = 0x04,
}

/// Thermostat running state (bitmap16)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum RunningState {
    Idle = 0x0000,
    HeatStateOn = 0x0001,
}

/// Thermostat programming operation mode (bitmap8)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ProgrammingOperationMode {
    Simple = 0x00,
    ScheduleProgrammingMode = 0x01,
    AutoRecoveryMode = 0x02,
    EconomyMode = 0x04,
}

impl TryFrom<u8> for ProgrammingOperationMode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, u8> {
        match value {
            0x00 => Ok(ProgrammingOperationMode::Simple),
            0x01 => Ok(ProgrammingOperationMode::ScheduleProgrammingMode),
            0x02 => Ok(ProgrammingOperationMode::AutoRecoveryMode),
            0x04 => Ok(ProgrammingOperationMode::EconomyMode),
            _ => Err(value),
        }
    }
}

/// Thermostat occupancy (bitmap8)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Occupancy {
    Unoccupied = 0x00,
    Occupied = 0x01,
}

impl TryFrom<u8> for Occupancy {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, u8> {
        match value {
            0x00 => Ok(Occupancy::Unoccupied),
            0x01 => Ok(Occupancy::Occupied),
            _ => Err(value),
        }
    }
}

/// Thermostat control sequence of operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ControlSequenceOfOperation {
    CoolingOnly = 0x00,
    HeatingOnly = 0x02,
    CoolingAndHeating = 0x04,
}

/// Thermostat UI keypad lockout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum KeypadLockout {
    NoLockout = 0x00,
    Level1Lockout = 0x01,
}

/// Working presets of Tuya thermostats (manufacturer extension)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Preset {
    Away = 0x00,
    Schedule = 0x01,
    Manual = 0x02,
    Comfort = 0x03,
    Eco = 0x04,
    Boost = 0x05,
    Complex = 0x06,
    TempManual = 0x07,
}

impl TryFrom<u8> for Preset {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, u8> {
        match value {
            0x00 => Ok(Preset::Away),
            0x01 => Ok(Preset::Schedule),
            0x02 => Ok(Preset::Manual),
            0x03 => Ok(Preset::Comfort),
            0x04 => Ok(Preset::Eco),
            0x05 => Ok(Preset::Boost),
            0x06 => Ok(Preset::Complex),
            0x07 => Ok(Preset::TempManual),
            _ => Err(value),
        }
    }
}
