//! Tuya cluster command definitions

use chrono::{DateTime, TimeZone, Utc};

/// Manufacturer specific cluster used by TS0601 devices
pub const TUYA_CLUSTER_ID: u16 = 0xEF00;

/// Command IDs of the Tuya manufacturer cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TuyaCommandId {
    /// Write data points (coordinator to device)
    SetData = 0x00,
    /// Data point report answering a query
    GetData = 0x01,
    /// Data point report after a write
    SetDataResponse = 0x02,
    /// Unsolicited data point report
    ActiveStatusReport = 0x06,
    /// Query MCU firmware version
    McuVersionRequest = 0x10,
    /// MCU firmware version
    McuVersionResponse = 0x11,
    /// Time request from the device, or our time reply
    SetTime = 0x24,
}

impl TuyaCommandId {
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(TuyaCommandId::SetData),
            0x01 => Some(TuyaCommandId::GetData),
            0x02 => Some(TuyaCommandId::SetDataResponse),
            0x06 => Some(TuyaCommandId::ActiveStatusReport),
            0x10 => Some(TuyaCommandId::McuVersionRequest),
            0x11 => Some(TuyaCommandId::McuVersionResponse),
            0x24 => Some(TuyaCommandId::SetTime),
            _ => None,
        }
    }

    /// Whether the payload is a data point report
    #[must_use]
    pub fn is_report(self) -> bool {
        matches!(
            self,
            TuyaCommandId::GetData
                | TuyaCommandId::SetDataResponse
                | TuyaCommandId::ActiveStatusReport
        )
    }
}

/// Reply to a device time request
///
/// Both timestamps count seconds since January 1st of the offset year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimePayload {
    pub utc_seconds: u32,
    pub local_seconds: u32,
}

impl TimePayload {
    #[must_use]
    pub fn new(utc_seconds: u32, local_seconds: u32) -> Self {
        Self {
            utc_seconds,
            local_seconds,
        }
    }

    /// Build the payload for `now`, given the local UTC offset in seconds
    #[must_use]
    pub fn at(now: DateTime<Utc>, local_offset_secs: i32, offset_year: i32) -> Self {
        let epoch = Utc
            .with_ymd_and_hms(offset_year, 1, 1, 0, 0, 0)
            .single()
            .map_or(0, |t| t.timestamp());

        let utc = now.timestamp() - epoch;
        let local = utc + i64::from(local_offset_secs);

        Self::new(clamp_u32(utc), clamp_u32(local))
    }

    /// Serialize as a length-prefixed list (u16 LE length, then both BE u32s)
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(10);
        data.extend_from_slice(&8u16.to_le_bytes());
        data.extend_from_slice(&self.utc_seconds.to_be_bytes());
        data.extend_from_slice(&self.local_seconds.to_be_bytes());
        data
    }
}

fn clamp_u32(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_ids() {
        assert_eq!(TuyaCommandId::from_u8(0x02), Some(TuyaCommandId::SetDataResponse));
        assert_eq!(TuyaCommandId::from_u8(0x24), Some(TuyaCommandId::SetTime));
        assert_eq!(TuyaCommandId::from_u8(0x42), None);
        assert!(TuyaCommandId::ActiveStatusReport.is_report());
        assert!(!TuyaCommandId::SetTime.is_report());
    }

    #[test]
    fn test_time_payload_offsets() {
        let now = Utc.with_ymd_and_hms(1970, 1, 2, 0, 0, 0).unwrap();
        let payload = TimePayload::at(now, 3600, 1970);

        assert_eq!(payload.utc_seconds, 86_400);
        assert_eq!(payload.local_seconds, 90_000);
    }

    #[test]
    fn test_time_payload_custom_epoch() {
        let now = Utc.with_ymd_and_hms(2000, 1, 1, 0, 1, 0).unwrap();
        let payload = TimePayload::at(now, 0, 2000);
        assert_eq!(payload.utc_seconds, 60);
    }

    #[test]
    fn test_time_payload_serialize() {
        let payload = TimePayload::new(0x0102_0304, 0x0A0B_0C0D);
        assert_eq!(
            payload.serialize(),
            vec![0x08, 0x00, 0x01, 0x02, 0x03, 0x04, 0x0A, 0x0B, 0x0C, 0x0D]
        );
    }
}
