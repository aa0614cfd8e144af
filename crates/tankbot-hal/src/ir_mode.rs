// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Exclusive-mode bookkeeping for infrared sensors
//!
//! An IR sensor runs in exactly one mode at a time. Behaviors claim the mode
//! they need on a port before they start; a claim for the other mode on the
//! same port is refused instead of letting two readers flip the sensor
//! back and forth.

use ahash::AHashMap;
use parking_lot::Mutex;

use crate::error::{DeviceError, DeviceResult};
use crate::hal::IrMode;

#[derive(Debug, Clone)]
struct PortClaim {
    mode: IrMode,
    owners: Vec<String>,
}

/// Which behavior uses which IR port in which mode
#[derive(Debug, Default)]
pub struct IrModeRegistry {
    claims: Mutex<AHashMap<String, PortClaim>>,
}

impl IrModeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `port` in `mode` for `owner`
    ///
    /// Claims in the same mode are shared. Claiming an unclaimed port always
    /// succeeds.
    ///
    /// # Errors
    /// `DeviceError::ModeConflict` if the port is claimed in the other mode.
    pub fn claim(&self, port: &str, mode: IrMode, owner: &str) -> DeviceResult<()> {
        let mut claims = self.claims.lock();

        match claims.get_mut(port) {
            Some(existing) if existing.mode != mode => Err(DeviceError::ModeConflict {
                port: port.to_string(),
                current: existing.mode,
                holder: existing.owners.join(", "),
                requested: mode,
                requester: owner.to_string(),
            }),
            Some(existing) => {
                if !existing.owners.iter().any(|o| o == owner) {
                    existing.owners.push(owner.to_string());
                }
                Ok(())
            }
            None => {
                claims.insert(
                    port.to_string(),
                    PortClaim {
                        mode,
                        owners: vec![owner.to_string()],
                    },
                );
                Ok(())
            }
        }
    }

    /// Drop every claim held by `owner`
    pub fn release_owner(&self, owner: &str) {
        let mut claims = self.claims.lock();
        claims.retain(|_, claim| {
            claim.owners.retain(|o| o != owner);
            !claim.owners.is_empty()
        });
    }

    pub fn mode_of(&self, port: &str) -> Option<IrMode> {
        self.claims.lock().get(port).map(|c| c.mode)
    }

    pub fn clear(&self) {
        self.claims.lock().clear();
    }
}
