//! ZCL attribute values

use crate::cluster::Status;
use serde::{Deserialize, Serialize};

/// A ZCL attribute value as seen by the application
///
/// Integer attributes of every width share `Int`; the wire width is the
/// business of the cluster that owns the attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ZclValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl ZclValue {
    /// Integer view; booleans are 0/1 and floats are truncated
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ZclValue::Bool(v) => Some(i64::from(*v)),
            ZclValue::Int(v) => Some(*v),
            ZclValue::Float(v) if v.is_finite() => Some(*v as i64),
            ZclValue::Float(_) | ZclValue::Text(_) => None,
        }
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ZclValue::Bool(v) => Some(f64::from(u8::from(*v))),
            ZclValue::Int(v) => Some(*v as f64),
            ZclValue::Float(v) => Some(*v),
            ZclValue::Text(_) => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ZclValue::Bool(v) => Some(*v),
            ZclValue::Int(v) => Some(*v != 0),
            ZclValue::Float(_) | ZclValue::Text(_) => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ZclValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for ZclValue {
    fn from(value: bool) -> Self {
        ZclValue::Bool(value)
    }
}

impl From<i64> for ZclValue {
    fn from(value: i64) -> Self {
        ZclValue::Int(value)
    }
}

impl From<i32> for ZclValue {
    fn from(value: i32) -> Self {
        ZclValue::Int(i64::from(value))
    }
}

impl From<u8> for ZclValue {
    fn from(value: u8) -> Self {
        ZclValue::Int(i64::from(value))
    }
}

impl From<u16> for ZclValue {
    fn from(value: u16) -> Self {
        ZclValue::Int(i64::from(value))
    }
}

impl From<f64> for ZclValue {
    fn from(value: f64) -> Self {
        ZclValue::Float(value)
    }
}

impl From<&str> for ZclValue {
    fn from(value: &str) -> Self {
        ZclValue::Text(value.to_string())
    }
}

impl From<String> for ZclValue {
    fn from(value: String) -> Self {
        ZclValue::Text(value)
    }
}

/// One record of a Write Attributes response
///
/// A single `Success` record without an attribute id acknowledges the
/// whole request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteStatusRecord {
    pub status: Status,
    pub attr_id: Option<u16>,
}

impl WriteStatusRecord {
    #[must_use]
    pub fn success() -> Self {
        Self {
            status: Status::Success,
            attr_id: None,
        }
    }

    #[must_use]
    pub fn failure(attr_id: u16) -> Self {
        Self {
            status: Status::Failure,
            attr_id: Some(attr_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_views() {
        assert_eq!(ZclValue::Bool(true).as_int(), Some(1));
        assert_eq!(ZclValue::Float(21.7).as_int(), Some(21));
        assert_eq!(ZclValue::Int(0).as_bool(), Some(false));
        assert_eq!(ZclValue::Text("x".into()).as_int(), None);
        assert_eq!(ZclValue::Float(f64::NAN).as_int(), None);
    }

    #[test]
    fn test_untagged_json() {
        let values: Vec<ZclValue> = serde_json::from_str(r#"[true, 2150, 0.5, "Away"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                ZclValue::Bool(true),
                ZclValue::Int(2150),
                ZclValue::Float(0.5),
                ZclValue::Text("Away".into()),
            ]
        );
    }
}
