// gabble-presence/gabble-presence
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use crate::domain::capabilities::models::CapabilityBits;
use crate::domain::shared::models::StatusRank;

/// Presence of one connected client instance of a contact.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourcePresence {
    pub name: String,
    pub status: StatusRank,
    pub status_message: Option<String>,
    pub priority: i8,
    pub capabilities: CapabilityBits,
    pub caps_generation: u64,
}

impl ResourcePresence {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: StatusRank::Offline,
            status_message: None,
            priority: 0,
            capabilities: CapabilityBits::NONE,
            caps_generation: 0,
        }
    }

    /// Merges `caps` into the resource's capabilities. Capabilities from an older generation are
    /// ignored, a newer generation replaces whatever was known before, capabilities of the same
    /// generation accumulate. Returns true if the capabilities changed.
    pub fn set_capabilities(&mut self, caps: CapabilityBits, generation: u64) -> bool {
        if generation < self.caps_generation {
            return false;
        }

        let previous = self.capabilities;

        if generation > self.caps_generation {
            self.caps_generation = generation;
            self.capabilities = CapabilityBits::NONE;
        }

        self.capabilities |= caps;
        self.capabilities != previous
    }

    /// Returns true if `self` should be preferred over `other` when picking the resource that
    /// represents the contact.
    pub(crate) fn ranks_above(&self, other: &ResourcePresence) -> bool {
        self.status > other.status
            || (self.status == other.status && self.priority > other.priority)
    }
}
