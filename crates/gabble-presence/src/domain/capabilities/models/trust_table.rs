// gabble-presence/gabble-presence
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::domain::capabilities::models::CapabilityBits;
use crate::domain::shared::models::{CapsBundleId, ContactHandle};

/// Number of independent, consistent corroborations after which a capability bundle is trusted.
pub const TRUST_THRESHOLD: u32 = 5;

/// What we believe a capability bundle stands for and how many contacts agree on it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CapabilityTrustEntry {
    pub capabilities: CapabilityBits,
    /// Always equal to the number of `corroborating_handles`.
    pub trust: u32,
    /// Contacts whose disco#info answer matched `capabilities`. These are not strong references,
    /// a handle in here may have been released in the meantime.
    pub corroborating_handles: HashSet<ContactHandle>,
    /// Set once a disco#info answer matched the bundle's XEP-0115 verification hash.
    pub verified: bool,
}

impl CapabilityTrustEntry {
    pub fn is_trusted(&self, threshold: u32) -> bool {
        self.verified || self.trust >= threshold
    }

    pub fn is_corroborated_by(&self, handle: ContactHandle) -> bool {
        self.corroborating_handles.contains(&handle)
    }

    /// Counts `handle`'s report of `caps`. A report contradicting what we knew so far throws away
    /// all previous corroboration and adopts the new claim. Returns the resulting trust.
    pub fn recv_corroboration(&mut self, handle: ContactHandle, caps: CapabilityBits) -> u32 {
        if self.capabilities != caps {
            if self.trust > 0 {
                debug!(
                    "Capabilities reported by {} contradict {} previous report(s), resetting trust.",
                    handle, self.trust
                );
            }
            self.capabilities = caps;
            self.corroborating_handles.clear();
            self.trust = 0;
            self.verified = false;
        }

        if self.corroborating_handles.insert(handle) {
            self.trust += 1;
        }

        self.trust
    }
}

/// Maps capability bundle identifiers to what we know about them. Entries are never removed
/// implicitly.
#[derive(Debug)]
pub struct CapabilityTrustTable {
    entries: HashMap<CapsBundleId, CapabilityTrustEntry>,
    threshold: u32,
}

impl Default for CapabilityTrustTable {
    fn default() -> Self {
        Self::new(TRUST_THRESHOLD)
    }
}

impl CapabilityTrustTable {
    pub fn new(threshold: u32) -> Self {
        Self {
            entries: Default::default(),
            threshold,
        }
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn get(&self, bundle_id: &CapsBundleId) -> Option<&CapabilityTrustEntry> {
        self.entries.get(bundle_id)
    }

    /// Looks up the entry for `bundle_id`, creating an empty one on first sight.
    pub fn entry(&mut self, bundle_id: &CapsBundleId) -> &mut CapabilityTrustEntry {
        self.entries.entry(bundle_id.clone()).or_default()
    }

    pub fn trust(&self, bundle_id: &CapsBundleId) -> u32 {
        self.entries.get(bundle_id).map_or(0, |entry| entry.trust)
    }

    pub fn is_trusted(&self, bundle_id: &CapsBundleId) -> bool {
        self.entries
            .get(bundle_id)
            .map_or(false, |entry| entry.is_trusted(self.threshold))
    }

    /// Returns the bundle's capabilities if `handle` doesn't need to be asked about them, either
    /// because the bundle is trusted or because `handle` already told us.
    pub fn resolved_capabilities(
        &self,
        bundle_id: &CapsBundleId,
        handle: ContactHandle,
    ) -> Option<CapabilityBits> {
        let entry = self.entries.get(bundle_id)?;
        (entry.is_trusted(self.threshold) || entry.is_corroborated_by(handle))
            .then_some(entry.capabilities)
    }

    pub fn recv_corroboration(
        &mut self,
        bundle_id: &CapsBundleId,
        handle: ContactHandle,
        caps: CapabilityBits,
    ) -> u32 {
        self.entry(bundle_id).recv_corroboration(handle, caps)
    }

    /// Adopts `caps` for a bundle whose verification hash matched.
    pub fn mark_verified(&mut self, bundle_id: &CapsBundleId, caps: CapabilityBits) {
        let entry = self.entry(bundle_id);
        if entry.capabilities != caps {
            entry.corroborating_handles.clear();
            entry.trust = 0;
        }
        entry.capabilities = caps;
        entry.verified = true;
    }

    pub fn clear(&mut self) {
        self.entries.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(value: u32) -> ContactHandle {
        ContactHandle::new(value)
    }

    #[test]
    fn test_trust_grows_with_distinct_handles() {
        let bundle = CapsBundleId::from("http://example.org/caps#1.0");
        let mut table = CapabilityTrustTable::new(3);

        assert_eq!(table.recv_corroboration(&bundle, h(1), CapabilityBits::JINGLE), 1);
        assert_eq!(table.recv_corroboration(&bundle, h(1), CapabilityBits::JINGLE), 1);
        assert_eq!(table.recv_corroboration(&bundle, h(2), CapabilityBits::JINGLE), 2);
        assert!(!table.is_trusted(&bundle));
        assert_eq!(table.recv_corroboration(&bundle, h(3), CapabilityBits::JINGLE), 3);
        assert!(table.is_trusted(&bundle));

        let entry = table.get(&bundle).unwrap();
        assert_eq!(entry.trust as usize, entry.corroborating_handles.len());
    }

    #[test]
    fn test_contradiction_resets_trust() {
        let bundle = CapsBundleId::from("http://example.org/caps#1.0");
        let mut table = CapabilityTrustTable::default();

        table.recv_corroboration(&bundle, h(1), CapabilityBits::JINGLE);
        table.recv_corroboration(&bundle, h(2), CapabilityBits::JINGLE);
        assert_eq!(table.recv_corroboration(&bundle, h(3), CapabilityBits::TUBES), 1);

        let entry = table.get(&bundle).unwrap();
        assert_eq!(entry.capabilities, CapabilityBits::TUBES);
        assert_eq!(
            entry.corroborating_handles,
            HashSet::from_iter([h(3)])
        );
    }

    #[test]
    fn test_resolved_capabilities() {
        let bundle = CapsBundleId::from("http://example.org/caps#1.0");
        let mut table = CapabilityTrustTable::new(2);

        assert_eq!(table.resolved_capabilities(&bundle, h(1)), None);

        table.recv_corroboration(&bundle, h(1), CapabilityBits::IBB);
        assert_eq!(
            table.resolved_capabilities(&bundle, h(1)),
            Some(CapabilityBits::IBB)
        );
        assert_eq!(table.resolved_capabilities(&bundle, h(2)), None);

        table.recv_corroboration(&bundle, h(2), CapabilityBits::IBB);
        assert_eq!(
            table.resolved_capabilities(&bundle, h(9)),
            Some(CapabilityBits::IBB)
        );
    }

    #[test]
    fn test_verified_bundle_is_trusted() {
        let bundle = CapsBundleId::from("http://example.org/caps#abc=");
        let mut table = CapabilityTrustTable::default();

        table.mark_verified(&bundle, CapabilityBits::MUC);
        assert!(table.is_trusted(&bundle));
        assert_eq!(table.trust(&bundle), 0);
        assert_eq!(
            table.resolved_capabilities(&bundle, h(4)),
            Some(CapabilityBits::MUC)
        );
    }
}
