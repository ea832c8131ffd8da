//! Tuya quirk adapters
//!
//! Translate the data points of Tuya TS0601 thermostats, radiator valves
//! and sensors into standard ZCL clusters. The host feeds manufacturer
//! cluster commands into a [`QuirkDevice`], reads the synthetic clusters it
//! exposes and drains encoded commands from its outbound channel.

pub mod clusters;
pub mod config;
pub mod convert;
pub mod device;
pub mod error;
pub mod manufacturer;
pub mod quirk;
pub mod registry;
pub mod vendors;

pub use config::{load_config, save_config, QuirkAlias, QuirkConfig};
pub use device::{AttributeEvent, DeviceState, Outbound, OutboundCommand, QuirkDevice};
pub use error::QuirkError;
pub use quirk::{EndpointLayout, Quirk, QuirkDescriptor, Target};
pub use registry::{DeviceHandle, QuirkRegistry, RegistryEvent};
