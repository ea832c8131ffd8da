//! Zigbee abstraction layer
//!
//! Cluster identifiers, attribute values and device descriptions shared by
//! the Tuya quirk adapters.

pub mod attribute;
pub mod cluster;
pub mod device;

pub use attribute::{WriteStatusRecord, ZclValue};
pub use cluster::Status;
pub use device::{format_ieee, Endpoint, ZigbeeDevice};
