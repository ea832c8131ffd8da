//! Registry of built-in quirks and live device contexts

use crate::config::QuirkConfig;
use crate::device::{Outbound, QuirkDevice};
use crate::quirk::QuirkDescriptor;
use crate::vendors;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, Mutex};
use zigbee_core::{format_ieee, Endpoint, ZigbeeDevice};

/// Device lifecycle events
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegistryEvent {
    /// A device context was created
    Attached { ieee: [u8; 8], quirk: &'static str },
    /// A device context was dropped
    Removed { ieee: [u8; 8] },
}

/// Shared handle to a live device context
pub type DeviceHandle = Arc<Mutex<QuirkDevice>>;

/// Quirk registry
pub struct QuirkRegistry {
    descriptors: Vec<QuirkDescriptor>,
    config: QuirkConfig,
    /// Live devices (keyed by IEEE address)
    devices: Arc<DashMap<[u8; 8], DeviceHandle>>,
    event_tx: broadcast::Sender<RegistryEvent>,
}

impl QuirkRegistry {
    /// Registry with every built-in quirk
    #[must_use]
    pub fn new(config: QuirkConfig) -> Self {
        Self::with_descriptors(config, vendors::descriptors())
    }

    #[must_use]
    pub fn with_descriptors(config: QuirkConfig, descriptors: Vec<QuirkDescriptor>) -> Self {
        let (event_tx, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            descriptors,
            config,
            devices: Arc::new(DashMap::new()),
            event_tx,
        }
    }

    #[must_use]
    pub fn config(&self) -> &QuirkConfig {
        &self.config
    }

    #[must_use]
    pub fn descriptors(&self) -> &[QuirkDescriptor] {
        &self.descriptors
    }

    /// Outbound channel sized from the configuration
    #[must_use]
    pub fn outbound_channel(&self) -> (mpsc::Sender<Outbound>, mpsc::Receiver<Outbound>) {
        mpsc::channel(self.config.outbound_capacity.max(1))
    }

    /// Find the descriptor for a device
    ///
    /// The manufacturer/model pair must be listed by the descriptor or
    /// aliased to it in the configuration, and the advertised endpoints
    /// must match its signature.
    #[must_use]
    pub fn find(
        &self,
        manufacturer: &str,
        model: &str,
        endpoints: &[Endpoint],
    ) -> Option<&QuirkDescriptor> {
        let alias = self.config.alias_for(manufacturer, model);
        self.descriptors
            .iter()
            .filter(|d| !self.config.is_disabled(d.name))
            .filter(|d| alias.map_or_else(|| d.lists(manufacturer, model), |name| d.name == name))
            .find(|d| d.matches_signature(endpoints))
    }

    /// Create the device context for a newly announced device
    ///
    /// Returns `None` when no quirk applies. An existing context for the
    /// same address is replaced.
    pub fn attach(
        &self,
        device: &ZigbeeDevice,
        outbound: mpsc::Sender<Outbound>,
    ) -> Option<DeviceHandle> {
        let manufacturer = device.manufacturer.as_deref()?;
        let model = device.model.as_deref()?;
        let descriptor = self.find(manufacturer, model, &device.endpoints)?;

        let context = QuirkDevice::new(device, descriptor, outbound, &self.config);
        let handle = Arc::new(Mutex::new(context));
        if self
            .devices
            .insert(device.ieee_address, Arc::clone(&handle))
            .is_some()
        {
            tracing::debug!("Replaced stale context for {}", device.ieee_address_string());
            let _ = self.event_tx.send(RegistryEvent::Removed {
                ieee: device.ieee_address,
            });
        }

        tracing::info!(
            "Attached quirk {} to {} ({} / {})",
            descriptor.name,
            device.ieee_address_string(),
            manufacturer,
            model
        );
        let _ = self.event_tx.send(RegistryEvent::Attached {
            ieee: device.ieee_address,
            quirk: descriptor.name,
        });

        Some(handle)
    }

    #[must_use]
    pub fn get(&self, ieee: &[u8; 8]) -> Option<DeviceHandle> {
        self.devices.get(ieee).map(|r| Arc::clone(r.value()))
    }

    /// Drop the context of a device that left the network
    pub fn remove(&self, ieee: &[u8; 8]) -> Option<DeviceHandle> {
        let removed = self.devices.remove(ieee).map(|(_, v)| v);
        if removed.is_some() {
            tracing::info!("Removed quirk context for {}", format_ieee(ieee));
            let _ = self.event_tx.send(RegistryEvent::Removed { ieee: *ieee });
        }
        removed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.event_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QuirkAlias;
    use zigbee_core::cluster::{device_type, id, HA_PROFILE};

    const IEEE: [u8; 8] = [0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88];

    fn tuya_endpoint() -> Endpoint {
        Endpoint::new(1, HA_PROFILE, device_type::SMART_PLUG)
            .with_in(&[id::BASIC, id::GROUPS, id::SCENES, id::TUYA_MANUFACTURER])
            .with_out(&[id::TIME, id::OTA])
    }

    fn saswell_device(manufacturer: &str) -> ZigbeeDevice {
        ZigbeeDevice::new(IEEE, 0x4242)
            .with_identity(manufacturer, "TS0601")
            .with_endpoint(tuya_endpoint())
    }

    #[test]
    fn test_find_by_model_and_layout() {
        let registry = QuirkRegistry::new(QuirkConfig::default());

        let found = registry.find("_TZE200_ye5jkfsb", "TS0601", &[tuya_endpoint()]);
        assert_eq!(found.map(|d| d.name), Some("avatto"));

        let gp = Endpoint::new(242, 0xA1E0, device_type::GREEN_POWER_PROXY_BASIC)
            .with_out(&[id::GREEN_POWER]);
        let found = registry.find("_TZE204_aoclfnxz", "TS0601", &[tuya_endpoint(), gp]);
        assert_eq!(found.map(|d| d.name), Some("beok"));

        assert!(registry.find("_TZE200_ye5jkfsb", "TS0601", &[]).is_none());
        assert!(registry.find("_TZE200_unknown", "TS0601", &[tuya_endpoint()]).is_none());
    }

    #[test]
    fn test_alias_and_disabled() {
        let config = QuirkConfig {
            aliases: vec![QuirkAlias {
                manufacturer: "_TZE200_rebadge".to_string(),
                model: "TS0601".to_string(),
                quirk: "avatto".to_string(),
            }],
            disabled: vec!["electsmart".to_string()],
            ..QuirkConfig::default()
        };
        let registry = QuirkRegistry::new(config);

        let found = registry.find("_TZE200_rebadge", "TS0601", &[tuya_endpoint()]);
        assert_eq!(found.map(|d| d.name), Some("avatto"));
        assert!(registry
            .find("_TZE204_edl8pz1k", "TS0601", &[tuya_endpoint()])
            .is_none());
    }

    #[tokio::test]
    async fn test_attach_get_remove() {
        let registry = QuirkRegistry::new(QuirkConfig::default());
        let mut events = registry.subscribe();
        let (tx, _rx) = registry.outbound_channel();

        let handle = registry
            .attach(&saswell_device("_TZE200_c88teujp"), tx.clone())
            .unwrap();
        assert_eq!(handle.lock().await.quirk_name(), "saswell");
        assert_eq!(registry.len(), 1);
        assert!(registry.get(&IEEE).is_some());
        assert!(matches!(
            events.try_recv().unwrap(),
            RegistryEvent::Attached { quirk: "saswell", .. }
        ));

        assert!(registry.remove(&IEEE).is_some());
        assert!(registry.is_empty());
        assert!(registry.get(&IEEE).is_none());
        assert!(matches!(events.try_recv().unwrap(), RegistryEvent::Removed { .. }));
        assert!(registry.remove(&IEEE).is_none());

        assert!(registry
            .attach(&saswell_device("_TZE200_nomatch"), tx)
            .is_none());
    }

    #[tokio::test]
    async fn test_reattach_reports_removal() {
        let registry = QuirkRegistry::new(QuirkConfig::default());
        let (tx, _rx) = registry.outbound_channel();
        registry
            .attach(&saswell_device("_TZE200_c88teujp"), tx.clone())
            .unwrap();

        let mut events = registry.subscribe();
        registry
            .attach(&saswell_device("_TZE200_c88teujp"), tx)
            .unwrap();

        assert_eq!(registry.len(), 1);
        assert!(matches!(
            events.try_recv().unwrap(),
            RegistryEvent::Removed { ieee: IEEE }
        ));
        assert!(matches!(
            events.try_recv().unwrap(),
            RegistryEvent::Attached { quirk: "saswell", .. }
        ));
    }
}
