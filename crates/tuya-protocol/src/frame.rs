//! Tuya command payload structure

use crate::types::{Datapoint, DpType, DpValue, ProtocolError};
use bytes::{Buf, BufMut, BytesMut};

/// Status and sequence bytes in front of the data points
pub const HEADER_SIZE: usize = 2;

/// dp(1) + type(1) + length(2)
pub const DATAPOINT_HEADER_SIZE: usize = 4;

/// Payload of the `set_data`, `get_data`, `set_data_response` and
/// `active_status_report` commands
///
/// Payload format:
/// ```text
/// [Status: 1 byte]
/// [Sequence: 1 byte]
/// repeated:
///   [DP: 1 byte]
///   [Type: 1 byte]
///   [Length: 2 bytes BE]
///   [Data: Length bytes]
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TuyaCommand {
    pub status: u8,
    pub tsn: u8,
    pub datapoints: Vec<Datapoint>,
}

impl TuyaCommand {
    /// Create a new command (for requests, status=0)
    #[must_use]
    pub fn new(tsn: u8, datapoints: Vec<Datapoint>) -> Self {
        Self {
            status: 0,
            tsn,
            datapoints,
        }
    }

    /// Serialize to the cluster command payload
    #[allow(clippy::missing_errors_doc)]
    pub fn serialize(&self) -> Result<Vec<u8>, ProtocolError> {
        let mut buf = BytesMut::with_capacity(HEADER_SIZE + self.datapoints.len() * 8);
        buf.put_u8(self.status);
        buf.put_u8(self.tsn);

        for datapoint in &self.datapoints {
            let data = datapoint.value.encode();
            let len =
                u16::try_from(data.len()).map_err(|_| ProtocolError::PayloadTooLarge(data.len()))?;

            buf.put_u8(datapoint.dp);
            buf.put_u8(datapoint.value.dp_type() as u8);
            buf.put_u16(len);
            buf.put_slice(&data);
        }

        Ok(buf.to_vec())
    }

    /// Deserialize a cluster command payload
    #[allow(clippy::missing_errors_doc)]
    pub fn deserialize(data: &[u8]) -> Result<Self, ProtocolError> {
        if data.len() < HEADER_SIZE + DATAPOINT_HEADER_SIZE {
            return Err(ProtocolError::FrameTooShort(data.len()));
        }

        let mut buf = data;
        let status = buf.get_u8();
        let tsn = buf.get_u8();

        let mut datapoints = Vec::new();
        while buf.has_remaining() {
            if buf.remaining() < DATAPOINT_HEADER_SIZE {
                return Err(ProtocolError::FrameTooShort(data.len()));
            }

            let dp = buf.get_u8();
            let dp_type = DpType::try_from(buf.get_u8()).map_err(ProtocolError::UnknownDpType)?;
            let len = usize::from(buf.get_u16());

            if buf.remaining() < len {
                return Err(ProtocolError::LengthMismatch {
                    dp,
                    declared: len,
                    available: buf.remaining(),
                });
            }

            let value = DpValue::decode(dp_type, &buf[..len])?;
            buf.advance(len);

            tracing::trace!("Decoded dp {} ({:?}): {:?}", dp, dp_type, value);
            datapoints.push(Datapoint::new(dp, value));
        }

        Ok(Self {
            status,
            tsn,
            datapoints,
        })
    }
}
