//! Tuya data point protocol
//!
//! This crate implements the payloads carried by the Tuya manufacturer
//! specific cluster (0xEF00) that TS0601 devices use instead of standard
//! ZCL clusters.

pub mod commands;
pub mod frame;
pub mod types;

pub use commands::{TimePayload, TuyaCommandId, TUYA_CLUSTER_ID};
pub use frame::TuyaCommand;
pub use types::*;
