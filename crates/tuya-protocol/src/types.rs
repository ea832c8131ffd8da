//! Common types used throughout the protocol

use thiserror::Error;

/// Protocol errors
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Frame too short: {0} bytes")]
    FrameTooShort(usize),

    #[error("Data point {dp} declares {declared} bytes but only {available} remain")]
    LengthMismatch {
        dp: u8,
        declared: usize,
        available: usize,
    },

    #[error("Unknown data point type: {0:#04X}")]
    UnknownDpType(u8),

    #[error("Invalid {dp_type:?} payload length: {len} bytes")]
    InvalidLength { dp_type: DpType, len: usize },

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Payload too large: {0} bytes")]
    PayloadTooLarge(usize),
}

/// Data point encodings understood by the Tuya MCU
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DpType {
    Raw = 0x00,
    Bool = 0x01,
    /// 4 byte big-endian signed integer
    Value = 0x02,
    String = 0x03,
    Enum = 0x04,
    /// 1, 2 or 4 byte big-endian bitmap
    Bitmap = 0x05,
}

impl TryFrom<u8> for DpType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, u8> {
        match value {
            0x00 => Ok(DpType::Raw),
            0x01 => Ok(DpType::Bool),
            0x02 => Ok(DpType::Value),
            0x03 => Ok(DpType::String),
            0x04 => Ok(DpType::Enum),
            0x05 => Ok(DpType::Bitmap),
            _ => Err(value),
        }
    }
}

impl DpType {
    /// Data point type carried in the high byte of a manufacturer attribute id
    #[allow(clippy::missing_errors_doc)]
    pub fn of_attr(attr_id: u16) -> Result<Self, ProtocolError> {
        Self::try_from((attr_id >> 8) as u8).map_err(ProtocolError::UnknownDpType)
    }
}

/// A decoded data point payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DpValue {
    /// Raw bytes in wire order
    Raw(Vec<u8>),
    Bool(bool),
    Value(i32),
    String(String),
    Enum(u8),
    Bitmap(u32),
}

impl DpValue {
    #[must_use]
    pub fn dp_type(&self) -> DpType {
        match self {
            DpValue::Raw(_) => DpType::Raw,
            DpValue::Bool(_) => DpType::Bool,
            DpValue::Value(_) => DpType::Value,
            DpValue::String(_) => DpType::String,
            DpValue::Enum(_) => DpType::Enum,
            DpValue::Bitmap(_) => DpType::Bitmap,
        }
    }

    /// Encode the payload (without the data point header)
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        match self {
            DpValue::Raw(bytes) => bytes.clone(),
            DpValue::Bool(v) => vec![u8::from(*v)],
            DpValue::Value(v) => v.to_be_bytes().to_vec(),
            DpValue::String(s) => s.as_bytes().to_vec(),
            DpValue::Enum(v) => vec![*v],
            DpValue::Bitmap(v) => {
                if let Ok(byte) = u8::try_from(*v) {
                    vec![byte]
                } else if let Ok(word) = u16::try_from(*v) {
                    word.to_be_bytes().to_vec()
                } else {
                    v.to_be_bytes().to_vec()
                }
            }
        }
    }

    /// Decode a payload of the given type
    #[allow(clippy::missing_errors_doc)]
    pub fn decode(dp_type: DpType, data: &[u8]) -> Result<Self, ProtocolError> {
        let invalid = || ProtocolError::InvalidLength {
            dp_type,
            len: data.len(),
        };

        match dp_type {
            DpType::Raw => Ok(DpValue::Raw(data.to_vec())),
            DpType::Bool => match data {
                [b] => Ok(DpValue::Bool(*b != 0)),
                _ => Err(invalid()),
            },
            DpType::Value => {
                let bytes: [u8; 4] = data.try_into().map_err(|_| invalid())?;
                Ok(DpValue::Value(i32::from_be_bytes(bytes)))
            }
            DpType::String => Ok(DpValue::String(
                String::from_utf8_lossy(data).into_owned(),
            )),
            DpType::Enum => match data {
                [b] => Ok(DpValue::Enum(*b)),
                _ => Err(invalid()),
            },
            DpType::Bitmap => match *data {
                [b] => Ok(DpValue::Bitmap(u32::from(b))),
                [hi, lo] => Ok(DpValue::Bitmap(u32::from(u16::from_be_bytes([hi, lo])))),
                [a, b, c, d] => Ok(DpValue::Bitmap(u32::from_be_bytes([a, b, c, d]))),
                _ => Err(invalid()),
            },
        }
    }

    /// Build the value a data point of `dp_type` carries from an integer
    #[allow(clippy::missing_errors_doc)]
    pub fn from_int(dp_type: DpType, value: i64) -> Result<Self, ProtocolError> {
        let out_of_range = || ProtocolError::InvalidValue(format!("{value} out of range for {dp_type:?}"));

        match dp_type {
            DpType::Bool => Ok(DpValue::Bool(value != 0)),
            DpType::Value => i32::try_from(value)
                .map(DpValue::Value)
                .map_err(|_| out_of_range()),
            DpType::Enum => u8::try_from(value)
                .map(DpValue::Enum)
                .map_err(|_| out_of_range()),
            DpType::Bitmap => u32::try_from(value)
                .map(DpValue::Bitmap)
                .map_err(|_| out_of_range()),
            DpType::Raw | DpType::String => Err(ProtocolError::InvalidValue(format!(
                "{dp_type:?} data points carry bytes, not {value}"
            ))),
        }
    }

    /// Numeric view of the value (booleans are 0/1)
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            DpValue::Bool(v) => Some(i64::from(*v)),
            DpValue::Value(v) => Some(i64::from(*v)),
            DpValue::Enum(v) => Some(i64::from(*v)),
            DpValue::Bitmap(v) => Some(i64::from(*v)),
            DpValue::Raw(_) | DpValue::String(_) => None,
        }
    }

    /// Raw payload bytes, for `Raw` data points only
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            DpValue::Raw(bytes) => Some(bytes),
            _ => None,
        }
    }
}

/// One data point of a Tuya command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datapoint {
    pub dp: u8,
    pub value: DpValue,
}

impl Datapoint {
    #[must_use]
    pub fn new(dp: u8, value: DpValue) -> Self {
        Self { dp, value }
    }

    /// Manufacturer attribute id: `(type << 8) | dp`
    #[must_use]
    pub fn attr_id(&self) -> u16 {
        (u16::from(self.value.dp_type() as u8) << 8) | u16::from(self.dp)
    }

    /// Build a data point for a manufacturer attribute from an integer
    #[allow(clippy::missing_errors_doc)]
    pub fn from_int(attr_id: u16, value: i64) -> Result<Self, ProtocolError> {
        let dp_type = DpType::of_attr(attr_id)?;
        Ok(Self::new((attr_id & 0xFF) as u8, DpValue::from_int(dp_type, value)?))
    }

    /// Build a data point for a raw or string manufacturer attribute
    #[allow(clippy::missing_errors_doc)]
    pub fn from_bytes(attr_id: u16, bytes: Vec<u8>) -> Result<Self, ProtocolError> {
        let value = match DpType::of_attr(attr_id)? {
            DpType::Raw => DpValue::Raw(bytes),
            DpType::String => DpValue::String(String::from_utf8_lossy(&bytes).into_owned()),
            other => DpValue::decode(other, &bytes)?,
        };
        Ok(Self::new((attr_id & 0xFF) as u8, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attr_id_carries_type() {
        let dp = Datapoint::new(0x67, DpValue::Value(215));
        assert_eq!(dp.attr_id(), 0x0267);

        let dp = Datapoint::new(0x02, DpValue::Enum(1));
        assert_eq!(dp.attr_id(), 0x0402);
    }

    #[test]
    fn test_from_int_picks_type_from_attr() {
        let dp = Datapoint::from_int(0x0165, 1).unwrap();
        assert_eq!(dp.dp, 0x65);
        assert_eq!(dp.value, DpValue::Bool(true));

        let dp = Datapoint::from_int(0x021B, -3).unwrap();
        assert_eq!(dp.value, DpValue::Value(-3));
        assert_eq!(dp.value.encode(), vec![0xFF, 0xFF, 0xFF, 0xFD]);
    }

    #[test]
    fn test_from_int_rejects_out_of_range_enum() {
        let result = Datapoint::from_int(0x0402, 300);
        assert!(matches!(result, Err(ProtocolError::InvalidValue(_))));
    }

    #[test]
    fn test_raw_attr_needs_bytes() {
        assert!(Datapoint::from_int(0x0067, 1).is_err());
        let dp = Datapoint::from_bytes(0x0067, vec![24, 1, 2, 3, 4, 34, 0, 5]).unwrap();
        assert_eq!(dp.attr_id(), 0x0067);
    }

    #[test]
    fn test_decode_rejects_bad_lengths() {
        assert!(DpValue::decode(DpType::Value, &[0x00, 0x01]).is_err());
        assert!(DpValue::decode(DpType::Enum, &[]).is_err());
        assert_eq!(
            DpValue::decode(DpType::Bitmap, &[0x01, 0x00]).unwrap(),
            DpValue::Bitmap(0x0100)
        );
    }

    #[test]
    fn test_unknown_type_byte() {
        assert_eq!(DpType::try_from(0x09), Err(0x09));
        assert!(matches!(
            DpType::of_attr(0x0901),
            Err(ProtocolError::UnknownDpType(0x09))
        ));
    }
}
