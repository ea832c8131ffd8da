//! Read-only indicator exposed as a Binary Input cluster

use super::AttributeCache;
use zigbee_core::cluster::binary_input_attrs;

#[derive(Debug, Default)]
pub struct BinaryInputCluster {
    pub(crate) attrs: AttributeCache,
}

impl BinaryInputCluster {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, active: bool) {
        self.attrs.set(binary_input_attrs::PRESENT_VALUE, active);
    }
}
