// gabble-presence/gabble-presence
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use crate::domain::capabilities::models::CapabilityBits;
use crate::domain::presence::models::ResourcePresence;
use crate::domain::shared::models::StatusRank;

/// Aggregated presence of a contact across all of its connected resources.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContactPresence {
    pub nickname: Option<String>,
    pub avatar_hash: Option<String>,
    /// Set while something other than a presence stanza (e.g. a chat message) tells us that the
    /// contact is around, so that the entry is not evicted before a presence arrives. Cleared by
    /// the first presence update.
    pub keep_unavailable: bool,

    resources: Vec<ResourcePresence>,
    status: StatusRank,
    status_message: Option<String>,
    capabilities: CapabilityBits,
}

impl ContactPresence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> StatusRank {
        self.status
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    /// The union of the capabilities of all resources.
    pub fn capabilities(&self) -> CapabilityBits {
        self.capabilities
    }

    pub fn resources(&self) -> &[ResourcePresence] {
        &self.resources
    }

    pub fn resource(&self, name: &str) -> Option<&ResourcePresence> {
        self.resources.iter().find(|r| r.name == name)
    }

    /// Applies a presence update. `resource` is `None` for presence sent from a bare JID, which
    /// discards all known resources. Returns true if the effective status or status message of
    /// the contact changed.
    pub fn update(
        &mut self,
        resource: Option<&str>,
        status: StatusRank,
        message: Option<&str>,
        priority: i8,
    ) -> bool {
        let previous = (self.status, self.status_message.clone());
        self.keep_unavailable = false;

        match resource {
            None => {
                self.resources.clear();
                self.status = status;
                self.status_message = message.map(ToString::to_string);
                self.capabilities = CapabilityBits::NONE;
            }
            Some(name) if status.is_offline() && message.is_none() => {
                self.resources.retain(|r| r.name != name);
                self.recompute();
            }
            Some(name) => {
                let idx = match self.resources.iter().position(|r| r.name == name) {
                    Some(idx) => idx,
                    None => {
                        self.resources.push(ResourcePresence::new(name));
                        self.resources.len() - 1
                    }
                };

                let entry = &mut self.resources[idx];
                entry.status = status;
                entry.status_message = message.map(ToString::to_string);
                entry.priority = priority;
                self.recompute();
            }
        }

        previous != (self.status, self.status_message.clone())
    }

    /// Merges `caps` into the capabilities of `resource` (see
    /// [`ResourcePresence::set_capabilities`]). Returns false if the resource is unknown or its
    /// capabilities didn't change.
    pub fn set_resource_capabilities(
        &mut self,
        resource: &str,
        caps: CapabilityBits,
        generation: u64,
    ) -> bool {
        let Some(entry) = self.resources.iter_mut().find(|r| r.name == resource) else {
            return false;
        };

        if !entry.set_capabilities(caps, generation) {
            return false;
        }

        self.recompute();
        true
    }

    /// Returns the non-negative priority resource with the highest priority that supports all of
    /// `caps_mask`.
    pub fn pick_resource_by(&self, caps_mask: CapabilityBits) -> Option<&str> {
        self.resources
            .iter()
            .filter(|r| r.priority >= 0 && r.capabilities.contains(caps_mask))
            .max_by_key(|r| r.priority)
            .map(|r| r.name.as_str())
    }

    pub fn set_nickname(&mut self, nickname: Option<String>) -> bool {
        if self.nickname == nickname {
            return false;
        }
        self.nickname = nickname;
        true
    }

    pub fn set_avatar_hash(&mut self, avatar_hash: Option<String>) -> bool {
        if self.avatar_hash == avatar_hash {
            return false;
        }
        self.avatar_hash = avatar_hash;
        true
    }

    /// A contact stays cached while it has a resource, is kept alive by non-presence traffic or
    /// carries a status (message) worth remembering.
    pub fn is_evictable(&self) -> bool {
        self.resources.is_empty()
            && !self.keep_unavailable
            && self.status.is_offline()
            && self.status_message.as_deref().map_or(true, str::is_empty)
    }
}

impl ContactPresence {
    fn recompute(&mut self) {
        let mut best: Option<&ResourcePresence> = None;
        let mut capabilities = CapabilityBits::NONE;

        for resource in self.resources.iter() {
            capabilities |= resource.capabilities;

            if best.map_or(true, |current| resource.ranks_above(current)) {
                best = Some(resource);
            }
        }

        let (status, status_message) = match best {
            Some(resource) => (resource.status, resource.status_message.clone()),
            None => (StatusRank::Offline, None),
        };

        self.status = status;
        self.status_message = status_message;
        self.capabilities = capabilities;
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_update_is_idempotent() {
        let mut presence = ContactPresence::new();

        assert!(presence.update(Some("r1"), StatusRank::Available, Some("hi"), 0));
        assert!(!presence.update(Some("r1"), StatusRank::Available, Some("hi"), 0));
        assert_eq!(presence.status(), StatusRank::Available);
        assert_eq!(presence.status_message(), Some("hi"));
    }

    #[test]
    fn test_status_beats_priority() {
        let mut presence = ContactPresence::new();

        presence.update(Some("a"), StatusRank::Available, Some("from a"), 10);
        presence.update(Some("b"), StatusRank::Chat, Some("from b"), -5);

        assert_eq!(presence.status(), StatusRank::Chat);
        assert_eq!(presence.status_message(), Some("from b"));
    }

    #[test]
    fn test_priority_breaks_status_tie() {
        let mut presence = ContactPresence::new();

        presence.update(Some("a"), StatusRank::Available, Some("from a"), 0);
        assert!(presence.update(Some("b"), StatusRank::Available, Some("from b"), 5));

        assert_eq!(presence.status(), StatusRank::Available);
        assert_eq!(presence.status_message(), Some("from b"));
    }

    #[test]
    fn test_update_with_eq_priority_keeps_first_resource() {
        let mut presence = ContactPresence::new();

        presence.update(Some("r1"), StatusRank::Away, Some("first"), 1);
        assert!(!presence.update(Some("r2"), StatusRank::Away, Some("first"), 1));
        presence.update(Some("r2"), StatusRank::Away, Some("second"), 1);

        assert_eq!(presence.status_message(), Some("first"));
    }

    #[test]
    fn test_update_with_lower_priority() {
        let mut presence = ContactPresence::new();

        presence.update(Some("r1"), StatusRank::Available, Some("r1"), 2);
        assert!(!presence.update(Some("r2"), StatusRank::Available, Some("r2"), 1));
        assert_eq!(presence.status_message(), Some("r1"));
    }

    #[test]
    fn test_update_with_unavailable() {
        let mut presence = ContactPresence::new();

        presence.update(Some("r1"), StatusRank::Away, Some("r1"), 1);
        presence.update(Some("r2"), StatusRank::Away, Some("r2"), 2);
        assert_eq!(presence.status_message(), Some("r2"));

        assert!(presence.update(Some("r2"), StatusRank::Offline, None, 0));
        assert_eq!(presence.status_message(), Some("r1"));
        assert_eq!(presence.resources().len(), 1);

        assert!(presence.update(Some("r1"), StatusRank::Offline, None, 0));
        assert_eq!(presence.status(), StatusRank::Offline);
        assert_eq!(presence.status_message(), None);
        assert!(presence.resources().is_empty());
        assert!(presence.is_evictable());
    }

    #[test]
    fn test_offline_resource_with_message_is_kept() {
        let mut presence = ContactPresence::new();

        presence.update(Some("r1"), StatusRank::Available, None, 0);
        assert!(presence.update(Some("r1"), StatusRank::Offline, Some("gone fishing"), 0));

        assert_eq!(presence.status(), StatusRank::Offline);
        assert_eq!(presence.status_message(), Some("gone fishing"));
        assert_eq!(presence.resources().len(), 1);
        assert!(!presence.is_evictable());
    }

    #[test]
    fn test_bare_jid_update_discards_resources() {
        let mut presence = ContactPresence::new();

        presence.update(Some("r1"), StatusRank::Available, None, 1);
        presence.set_resource_capabilities("r1", CapabilityBits::JINGLE, 1);
        presence.update(Some("r2"), StatusRank::Chat, None, 2);

        assert!(presence.update(None, StatusRank::Away, Some("bare"), 0));
        assert!(presence.resources().is_empty());
        assert_eq!(presence.status(), StatusRank::Away);
        assert_eq!(presence.status_message(), Some("bare"));
        assert_eq!(presence.capabilities(), CapabilityBits::NONE);
        assert!(!presence.is_evictable());
    }

    #[test]
    fn test_full_jid_replaces_bare_jid() {
        let mut presence = ContactPresence::new();

        presence.update(None, StatusRank::Away, Some("bare"), 1);
        presence.update(Some("r1"), StatusRank::DoNotDisturb, None, 2);
        assert_eq!(presence.status(), StatusRank::DoNotDisturb);
        assert_eq!(presence.status_message(), None);

        presence.update(Some("r1"), StatusRank::Offline, None, 0);
        assert_eq!(presence.status(), StatusRank::Offline);
        assert!(presence.is_evictable());
    }

    #[test]
    fn test_capabilities_are_or_of_resources() {
        let mut presence = ContactPresence::new();

        presence.update(Some("desktop"), StatusRank::Available, None, 0);
        presence.update(Some("phone"), StatusRank::Away, None, 0);

        assert!(presence.set_resource_capabilities("desktop", CapabilityBits::JINGLE, 1));
        assert!(presence.set_resource_capabilities("phone", CapabilityBits::CHAT_STATES, 2));
        assert!(!presence.set_resource_capabilities("tablet", CapabilityBits::TUBES, 3));

        assert_eq!(
            presence.capabilities(),
            CapabilityBits::JINGLE | CapabilityBits::CHAT_STATES
        );

        presence.update(Some("desktop"), StatusRank::Offline, None, 0);
        assert_eq!(presence.capabilities(), CapabilityBits::CHAT_STATES);
    }

    #[test]
    fn test_pick_resource_by_caps() {
        let mut presence = ContactPresence::new();

        presence.update(Some("desktop"), StatusRank::Available, None, 5);
        presence.update(Some("laptop"), StatusRank::Available, None, 10);
        presence.update(Some("hidden"), StatusRank::Available, None, -1);

        presence.set_resource_capabilities(
            "desktop",
            CapabilityBits::JINGLE | CapabilityBits::JINGLE_AUDIO,
            1,
        );
        presence.set_resource_capabilities("laptop", CapabilityBits::JINGLE, 2);
        presence.set_resource_capabilities(
            "hidden",
            CapabilityBits::JINGLE | CapabilityBits::JINGLE_AUDIO,
            3,
        );

        assert_eq!(
            presence.pick_resource_by(CapabilityBits::JINGLE | CapabilityBits::JINGLE_AUDIO),
            Some("desktop")
        );
        assert_eq!(presence.pick_resource_by(CapabilityBits::JINGLE), Some("laptop"));
        assert_eq!(presence.pick_resource_by(CapabilityBits::TUBES), None);
    }

    #[test]
    fn test_keep_unavailable_prevents_eviction() {
        let mut presence = ContactPresence::new();
        assert!(presence.is_evictable());

        presence.keep_unavailable = true;
        assert!(!presence.is_evictable());
    }

    #[test]
    fn test_presence_update_clears_keep_unavailable() {
        let mut presence = ContactPresence::new();
        presence.keep_unavailable = true;

        presence.update(Some("r1"), StatusRank::Available, None, 0);
        assert!(!presence.keep_unavailable);

        presence.update(Some("r1"), StatusRank::Offline, None, 0);
        assert!(presence.is_evictable());
    }

    #[test]
    fn test_nickname_and_avatar_changes() {
        let mut presence = ContactPresence::new();

        assert!(presence.set_nickname(Some("Juliet".to_string())));
        assert!(!presence.set_nickname(Some("Juliet".to_string())));
        assert!(presence.set_avatar_hash(Some("a1b2".to_string())));
        assert!(presence.set_avatar_hash(None));
        assert!(!presence.set_avatar_hash(None));
    }
}
