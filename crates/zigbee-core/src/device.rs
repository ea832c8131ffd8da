//! Zigbee device representation

use serde::{Deserialize, Serialize};

/// A Zigbee device as announced on the network
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZigbeeDevice {
    /// IEEE address (EUI-64)
    pub ieee_address: [u8; 8],
    /// Network short address
    pub nwk_address: u16,
    /// Manufacturer name (from Basic cluster)
    pub manufacturer: Option<String>,
    /// Model identifier (from Basic cluster)
    pub model: Option<String>,
    /// Device endpoints
    pub endpoints: Vec<Endpoint>,
}

impl ZigbeeDevice {
    /// Create a new device with just address info
    #[must_use]
    pub fn new(ieee_address: [u8; 8], nwk_address: u16) -> Self {
        Self {
            ieee_address,
            nwk_address,
            manufacturer: None,
            model: None,
            endpoints: Vec::new(),
        }
    }

    /// Set the Basic cluster identity
    #[must_use]
    pub fn with_identity(mut self, manufacturer: &str, model: &str) -> Self {
        self.manufacturer = Some(manufacturer.to_string());
        self.model = Some(model.to_string());
        self
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoints.push(endpoint);
        self
    }

    /// Get IEEE address as hex string
    #[must_use]
    pub fn ieee_address_string(&self) -> String {
        format_ieee(&self.ieee_address)
    }
}

/// Format an IEEE address the way it is usually displayed (reverse byte order)
#[must_use]
pub fn format_ieee(ieee: &[u8; 8]) -> String {
    ieee.iter()
        .rev()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(":")
}

/// A device endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Endpoint ID (1-240, 242 for Green Power)
    pub id: u8,
    /// Profile ID (e.g., 0x0104 for Home Automation)
    pub profile_id: u16,
    /// Device ID within the profile
    pub device_id: u16,
    /// Input (server) clusters
    pub in_clusters: Vec<u16>,
    /// Output (client) clusters
    pub out_clusters: Vec<u16>,
}

impl Endpoint {
    #[must_use]
    pub fn new(id: u8, profile_id: u16, device_id: u16) -> Self {
        Self {
            id,
            profile_id,
            device_id,
            in_clusters: Vec::new(),
            out_clusters: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_in(mut self, clusters: &[u16]) -> Self {
        self.in_clusters.extend_from_slice(clusters);
        self
    }

    #[must_use]
    pub fn with_out(mut self, clusters: &[u16]) -> Self {
        self.out_clusters.extend_from_slice(clusters);
        self
    }

    /// Check if endpoint has a specific cluster
    #[must_use]
    pub fn has_cluster(&self, cluster_id: u16) -> bool {
        self.in_clusters.contains(&cluster_id) || self.out_clusters.contains(&cluster_id)
    }

    /// Same id, profile, device type and cluster sets, ignoring cluster order
    #[must_use]
    pub fn same_layout(&self, other: &Endpoint) -> bool {
        fn sorted(clusters: &[u16]) -> Vec<u16> {
            let mut v = clusters.to_vec();
            v.sort_unstable();
            v.dedup();
            v
        }

        self.id == other.id
            && self.profile_id == other.profile_id
            && self.device_id == other.device_id
            && sorted(&self.in_clusters) == sorted(&other.in_clusters)
            && sorted(&self.out_clusters) == sorted(&other.out_clusters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ieee_string_is_reversed() {
        let device = ZigbeeDevice::new([0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08], 0x1234);
        assert_eq!(device.ieee_address_string(), "08:07:06:05:04:03:02:01");
    }

    #[test]
    fn test_same_layout_ignores_order() {
        let a = Endpoint::new(1, 0x0104, 0x0051).with_in(&[0x0000, 0x0004, 0xEF00]);
        let b = Endpoint::new(1, 0x0104, 0x0051).with_in(&[0xEF00, 0x0000, 0x0004]);
        let c = Endpoint::new(1, 0x0104, 0x0301).with_in(&[0x0000, 0x0004, 0xEF00]);

        assert!(a.same_layout(&b));
        assert!(!a.same_layout(&c));
        assert!(a.has_cluster(0xEF00));
    }
}
