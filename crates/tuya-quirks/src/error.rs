//! Error types for the quirk adapters

use thiserror::Error;
use tuya_protocol::ProtocolError;

/// Infrastructure failures
///
/// Unsupported writes and commands are not errors; they come back as ZCL
/// status codes.
#[derive(Error, Debug)]
pub enum QuirkError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Endpoint {0} not found")]
    EndpointNotFound(u8),

    #[error("Cluster {cluster:#06X} not found on endpoint {endpoint}")]
    ClusterNotFound { endpoint: u8, cluster: u16 },

    #[error("Outbound channel closed")]
    ChannelClosed,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
