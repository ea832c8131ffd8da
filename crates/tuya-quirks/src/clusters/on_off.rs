//! Feature switch exposed as an On/Off cluster

use super::AttributeCache;
use zigbee_core::cluster::on_off_attrs;

#[derive(Debug, Default)]
pub struct OnOffCluster {
    pub(crate) attrs: AttributeCache,
}

impl OnOffCluster {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached switch state, `None` until the device has reported it
    #[must_use]
    pub fn on_off(&self) -> Option<bool> {
        self.attrs
            .get(on_off_attrs::ON_OFF)
            .and_then(zigbee_core::ZclValue::as_bool)
    }

    pub fn set(&mut self, on: bool) {
        self.attrs.set(on_off_attrs::ON_OFF, on);
    }
}
