//! Manufacturer cluster (0xEF00) attribute cache

use std::collections::HashMap;
use tuya_protocol::{Datapoint, DpValue, ProtocolError, TuyaCommand};

/// A data point a vendor firmware is known to report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManufAttr {
    pub id: u16,
    pub name: &'static str,
}

impl ManufAttr {
    #[must_use]
    pub const fn new(id: u16, name: &'static str) -> Self {
        Self { id, name }
    }
}

/// Value written to a manufacturer attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManufValue {
    Int(i64),
    Bytes(Vec<u8>),
}

impl From<i64> for ManufValue {
    fn from(value: i64) -> Self {
        ManufValue::Int(value)
    }
}

impl From<bool> for ManufValue {
    fn from(value: bool) -> Self {
        ManufValue::Int(i64::from(value))
    }
}

impl From<Vec<u8>> for ManufValue {
    fn from(value: Vec<u8>) -> Self {
        ManufValue::Bytes(value)
    }
}

/// Manufacturer attributes to send in one command, in insertion order
pub type ManufWrite = Vec<(u16, ManufValue)>;

/// Merge `extra` into `target`; a later value for the same attribute wins
pub fn merge_write(target: &mut ManufWrite, extra: ManufWrite) {
    for (attr, value) in extra {
        if let Some(slot) = target.iter_mut().find(|(a, _)| *a == attr) {
            slot.1 = value;
        } else {
            target.push((attr, value));
        }
    }
}

/// Raw view of the manufacturer cluster of one device
#[derive(Debug)]
pub struct ManufacturerCluster {
    attributes: &'static [ManufAttr],
    cache: HashMap<u16, DpValue>,
    tsn: u8,
}

impl ManufacturerCluster {
    #[must_use]
    pub fn new(attributes: &'static [ManufAttr]) -> Self {
        Self {
            attributes,
            cache: HashMap::new(),
            tsn: 0,
        }
    }

    /// Name of a known attribute
    #[must_use]
    pub fn name(&self, attr: u16) -> Option<&'static str> {
        self.attributes.iter().find(|a| a.id == attr).map(|a| a.name)
    }

    #[must_use]
    pub fn is_known(&self, attr: u16) -> bool {
        self.name(attr).is_some()
    }

    /// Store a raw report; returns whether the attribute is in the table
    pub fn record(&mut self, attr: u16, value: DpValue) -> bool {
        self.cache.insert(attr, value);
        self.is_known(attr)
    }

    #[must_use]
    pub fn get(&self, attr: u16) -> Option<&DpValue> {
        self.cache.get(&attr)
    }

    #[must_use]
    pub fn get_int(&self, attr: u16) -> Option<i64> {
        self.cache.get(&attr).and_then(DpValue::as_int)
    }

    fn next_tsn(&mut self) -> u8 {
        self.tsn = self.tsn.wrapping_add(1);
        self.tsn
    }

    /// Encode a write as a `set_data` command with the next sequence number
    #[allow(clippy::missing_errors_doc)]
    pub fn encode_write(&mut self, writes: &[(u16, ManufValue)]) -> Result<TuyaCommand, ProtocolError> {
        let datapoints = writes
            .iter()
            .map(|(attr, value)| match value {
                ManufValue::Int(v) => Datapoint::from_int(*attr, *v),
                ManufValue::Bytes(bytes) => Datapoint::from_bytes(*attr, bytes.clone()),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(TuyaCommand::new(self.next_tsn(), datapoints))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static ATTRS: [ManufAttr; 2] = [
        ManufAttr::new(0x0266, "room_temperature"),
        ManufAttr::new(0x0267, "target_temperature"),
    ];

    #[test]
    fn test_unknown_attribute_still_cached() {
        let mut cluster = ManufacturerCluster::new(&ATTRS);
        assert!(cluster.record(0x0266, DpValue::Value(202)));
        assert!(!cluster.record(0x02FF, DpValue::Value(7)));
        assert_eq!(cluster.get_int(0x02FF), Some(7));
        assert_eq!(cluster.name(0x0266), Some("room_temperature"));
    }

    #[test]
    fn test_encode_write_types_from_attr_id() {
        let mut cluster = ManufacturerCluster::new(&ATTRS);
        let cmd = cluster
            .encode_write(&[(0x0267, ManufValue::Int(215)), (0x0165, ManufValue::Int(1))])
            .unwrap();

        assert_eq!(cmd.tsn, 1);
        assert_eq!(cmd.datapoints[0].value, DpValue::Value(215));
        assert_eq!(cmd.datapoints[1].value, DpValue::Bool(true));

        let next = cluster.encode_write(&[(0x0267, ManufValue::Int(200))]).unwrap();
        assert_eq!(next.tsn, 2);
    }

    #[test]
    fn test_merge_keeps_last_value() {
        let mut write: ManufWrite = vec![(0x0401, 1.into()), (0x0104, 0.into())];
        merge_write(&mut write, vec![(0x0104, 1.into()), (0x0202, 200.into())]);
        assert_eq!(
            write,
            vec![(0x0401, 1.into()), (0x0104, 1.into()), (0x0202, 200.into())]
        );
    }
}
