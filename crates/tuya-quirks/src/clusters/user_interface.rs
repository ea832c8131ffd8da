//! Thermostat User Interface cluster (keypad lockout)

use super::AttributeCache;
use zigbee_core::cluster::{user_interface_attrs, KeypadLockout};

#[derive(Debug, Default)]
pub struct UserInterfaceCluster {
    pub(crate) attrs: AttributeCache,
}

impl UserInterfaceCluster {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn child_lock_change(&mut self, locked: bool) {
        let lockout = if locked {
            KeypadLockout::Level1Lockout
        } else {
            KeypadLockout::NoLockout
        };
        self.attrs
            .set(user_interface_attrs::KEYPAD_LOCKOUT, lockout as u8);
    }
}
