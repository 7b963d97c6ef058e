// gabble-presence/gabble-presence
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::str::FromStr;

use tracing::{debug, info, warn};

pub use disco_requests::DiscoCompletion;

use crate::app::{LivenessEvent, PresenceCacheInput, PresenceEvent};
use crate::config::PresenceCacheConfig;
use crate::domain::capabilities::models::{
    CapabilityBits, CapabilityTrustEntry, CapabilityTrustTable, CapsHash, DiscoWaiterQueue,
};
use crate::domain::capabilities::services::DynDiscoService;
use crate::domain::handles::models::{HandleError, HandleRef};
use crate::domain::handles::repos::DynHandleRepository;
use crate::domain::presence::models::ContactPresence;
use crate::domain::shared::models::{CapsBundleId, ContactHandle, StatusRank};
use crate::presence_cache_builder::PresenceCacheBuilder;
use crate::presence_cache_event::{EventDispatcher, PresenceCacheDelegate, PresenceCacheEvent};

use disco_requests::DiscoRequests;

mod capabilities;
mod disco_requests;

struct CachedContact {
    _handle: HandleRef,
    presence: ContactPresence,
}

/// Presence of all contacts we currently know something about, plus what we learned about the
/// capability bundles their resources advertise.
pub struct PresenceCache {
    config: PresenceCacheConfig,
    handle_repo: DynHandleRepository,
    event_dispatcher: EventDispatcher,
    contacts: HashMap<ContactHandle, CachedContact>,
    trust_table: CapabilityTrustTable,
    waiters: DiscoWaiterQueue,
    requests: DiscoRequests,
    caps_generation: u64,
}

impl PresenceCache {
    pub fn builder() -> PresenceCacheBuilder {
        PresenceCacheBuilder::new()
    }

    pub(crate) fn new(
        config: PresenceCacheConfig,
        handle_repo: DynHandleRepository,
        disco_service: DynDiscoService,
        delegate: Option<Box<dyn PresenceCacheDelegate>>,
    ) -> Self {
        PresenceCache {
            trust_table: CapabilityTrustTable::new(config.trust_threshold),
            requests: DiscoRequests::new(
                disco_service,
                handle_repo.clone(),
                config.disco_timeout,
            ),
            waiters: DiscoWaiterQueue::new(),
            contacts: Default::default(),
            event_dispatcher: EventDispatcher::new(delegate),
            caps_generation: 0,
            handle_repo,
            config,
        }
    }
}

impl PresenceCache {
    pub fn get(&self, handle: ContactHandle) -> Option<&ContactPresence> {
        self.contacts.get(&handle).map(|contact| &contact.presence)
    }

    /// Returns the presence of `handle`, creating an empty one if needed. The cache keeps a
    /// reference on `handle` for as long as the entry exists.
    pub fn insert_or_get_mut(
        &mut self,
        handle: ContactHandle,
    ) -> Result<&mut ContactPresence, HandleError> {
        match self.contacts.entry(handle) {
            Entry::Occupied(entry) => Ok(&mut entry.into_mut().presence),
            Entry::Vacant(entry) => {
                let handle_ref = HandleRef::acquire(&self.handle_repo, handle)?;
                let contact = entry.insert(CachedContact {
                    _handle: handle_ref,
                    presence: ContactPresence::new(),
                });
                Ok(&mut contact.presence)
            }
        }
    }

    /// Removes the entry for `handle` if nothing about it is worth remembering anymore. Returns
    /// true if the entry was removed.
    pub fn maybe_evict(&mut self, handle: ContactHandle) -> bool {
        let evictable = self
            .contacts
            .get(&handle)
            .map_or(false, |contact| contact.presence.is_evictable());

        if !evictable {
            return false;
        }

        debug!("Evicting presence of {}.", handle);
        self.contacts.remove(&handle);
        true
    }

    /// Applies a presence update to `handle` and notifies the delegate about the resulting
    /// changes. Returns true if the effective status or status message of the contact changed.
    pub fn update(
        &mut self,
        handle: ContactHandle,
        resource: Option<&str>,
        status: StatusRank,
        message: Option<&str>,
        priority: i8,
    ) -> bool {
        let (changed, old_caps, new_caps) = {
            let presence = match self.insert_or_get_mut(handle) {
                Ok(presence) => presence,
                Err(err) => {
                    warn!("Ignoring presence of {}: {}", handle, err);
                    return false;
                }
            };

            let old_caps = presence.capabilities();
            let changed = presence.update(resource, status, message, priority);
            (changed, old_caps, presence.capabilities())
        };

        if changed {
            self.event_dispatcher
                .dispatch_event(PresenceCacheEvent::PresenceChanged { handle });
        }

        if old_caps != new_caps {
            self.event_dispatcher
                .dispatch_event(PresenceCacheEvent::CapabilitiesChanged {
                    handle,
                    old_caps,
                    new_caps,
                });
        }

        self.maybe_evict(handle);
        changed
    }

    pub fn handle_presence_event(&mut self, event: PresenceEvent) {
        let handle = event.handle;
        let generation = self.next_caps_generation();

        self.update(
            handle,
            event.resource.as_deref(),
            event.status,
            event.message.as_deref(),
            event.priority,
        );

        if event.bundle_ids.is_empty() || event.status.is_offline() {
            return;
        }

        let Some(resource) = event.resource.as_deref() else {
            warn!(
                "Ignoring capabilities advertised by {} without a resource.",
                handle
            );
            return;
        };

        let hash = event
            .caps_hash
            .as_deref()
            .and_then(|hash| match CapsHash::from_str(hash) {
                Ok(hash) => Some(hash),
                Err(_) => {
                    debug!(
                        "Unsupported caps hash '{}' from {}/{}. Treating bundles as legacy.",
                        hash, handle, resource
                    );
                    None
                }
            });

        self.process_claims(handle, resource, &event.bundle_ids, generation, hash);
    }

    /// Records that `handle` is around even though we haven't seen a presence from it.
    pub fn handle_liveness_event(&mut self, event: LivenessEvent) {
        let handle = event.handle;

        let presence = match self.insert_or_get_mut(handle) {
            Ok(presence) => presence,
            Err(err) => {
                warn!("Ignoring message from {}: {}", handle, err);
                return;
            }
        };

        if presence.resources().is_empty() && presence.status().is_offline() {
            presence.keep_unavailable = true;
        }

        if event.bundle_ids.is_empty() {
            return;
        }

        let Some(resource) = event.resource.as_deref() else {
            warn!(
                "Ignoring capabilities advertised by {} without a resource.",
                handle
            );
            return;
        };

        let generation = self.next_caps_generation();
        self.process_claims(handle, resource, &event.bundle_ids, generation, None);
    }

    /// Sets the nickname of a cached contact. Returns true if it changed.
    pub fn set_nickname(&mut self, handle: ContactHandle, nickname: Option<String>) -> bool {
        let Some(contact) = self.contacts.get_mut(&handle) else {
            debug!("Not storing nickname of {}. No presence known.", handle);
            return false;
        };

        if !contact.presence.set_nickname(nickname) {
            return false;
        }

        self.event_dispatcher
            .dispatch_event(PresenceCacheEvent::NicknameChanged { handle });
        true
    }

    /// Sets the avatar hash of a cached contact. Returns true if it changed.
    pub fn set_avatar_hash(&mut self, handle: ContactHandle, avatar_hash: Option<String>) -> bool {
        let Some(contact) = self.contacts.get_mut(&handle) else {
            debug!("Not storing avatar of {}. No presence known.", handle);
            return false;
        };

        if !contact.presence.set_avatar_hash(avatar_hash) {
            return false;
        }

        self.event_dispatcher
            .dispatch_event(PresenceCacheEvent::AvatarChanged { handle });
        true
    }

    pub fn clear_keep_unavailable(&mut self, handle: ContactHandle) {
        if let Some(contact) = self.contacts.get_mut(&handle) {
            contact.presence.keep_unavailable = false;
        }
        self.maybe_evict(handle);
    }

    /// Drops everything the cache holds for `handle`, including pending capability lookups.
    pub fn forget(&mut self, handle: ContactHandle) {
        if let Some(contact) = self.contacts.remove(&handle) {
            let presence = contact.presence;

            if !presence.status().is_offline() || presence.status_message().is_some() {
                self.event_dispatcher
                    .dispatch_event(PresenceCacheEvent::PresenceChanged { handle });
            }

            if !presence.capabilities().is_empty() {
                self.event_dispatcher
                    .dispatch_event(PresenceCacheEvent::CapabilitiesChanged {
                        handle,
                        old_caps: presence.capabilities(),
                        new_caps: CapabilityBits::NONE,
                    });
            }
        }

        for bundle_id in self.waiters.remove_handle(handle) {
            self.top_up_requests(&bundle_id);
        }
    }

    /// Drops all contacts, waiters and outstanding requests along with everything learned about
    /// capability bundles.
    pub fn reset(&mut self) {
        info!(
            "Resetting presence cache ({} contacts, {} pending requests).",
            self.contacts.len(),
            self.requests.len()
        );
        self.requests.clear();
        self.waiters.clear();
        self.trust_table.clear();
        self.contacts.clear();
    }

    pub fn handle_input(&mut self, input: PresenceCacheInput) {
        match input {
            PresenceCacheInput::Presence(event) => self.handle_presence_event(event),
            PresenceCacheInput::Liveness(event) => self.handle_liveness_event(event),
            PresenceCacheInput::Nickname { handle, nickname } => {
                self.set_nickname(handle, nickname);
            }
            PresenceCacheInput::Avatar {
                handle,
                avatar_hash,
            } => {
                self.set_avatar_hash(handle, avatar_hash);
            }
            PresenceCacheInput::Forget { handle } => self.forget(handle),
            PresenceCacheInput::Reset => self.reset(),
        }
    }
}

impl PresenceCache {
    /// The union of the capabilities of all resources of `handle`.
    pub fn contact_capabilities(&self, handle: ContactHandle) -> CapabilityBits {
        self.get(handle)
            .map_or(CapabilityBits::NONE, ContactPresence::capabilities)
    }

    pub fn resource_capabilities(
        &self,
        handle: ContactHandle,
        resource: &str,
    ) -> Option<CapabilityBits> {
        self.get(handle)?
            .resource(resource)
            .map(|resource| resource.capabilities)
    }

    pub fn pick_resource_by(
        &self,
        handle: ContactHandle,
        caps_mask: CapabilityBits,
    ) -> Option<&str> {
        self.get(handle)?.pick_resource_by(caps_mask)
    }

    pub fn trust_entry(&self, bundle_id: &CapsBundleId) -> Option<&CapabilityTrustEntry> {
        self.trust_table.get(bundle_id)
    }

    pub fn bundle_trust(&self, bundle_id: &CapsBundleId) -> u32 {
        self.trust_table.trust(bundle_id)
    }

    pub fn is_bundle_trusted(&self, bundle_id: &CapsBundleId) -> bool {
        self.trust_table.is_trusted(bundle_id)
    }

    /// Returns true while resources are waiting to learn what `bundle_id` stands for.
    pub fn is_bundle_pending(&self, bundle_id: &CapsBundleId) -> bool {
        self.waiters.is_pending(bundle_id)
    }

    pub fn has_pending_requests(&self) -> bool {
        !self.requests.is_empty()
    }

    pub fn pending_request_count(&self) -> usize {
        self.requests.len()
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
}

impl PresenceCache {
    /// Waits for the next outstanding disco#info request to finish. Returns `None` right away if
    /// there is none.
    pub async fn next_disco_completion(&mut self) -> Option<DiscoCompletion> {
        self.requests.next().await
    }

    /// Waits for the next outstanding disco#info request to finish and applies its result.
    /// Returns false if there was nothing to wait for.
    pub async fn process_next_disco_result(&mut self) -> bool {
        let Some(completion) = self.next_disco_completion().await else {
            return false;
        };
        self.on_disco_result(completion);
        true
    }

    fn next_caps_generation(&mut self) -> u64 {
        self.caps_generation += 1;
        self.caps_generation
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::sync::Arc;

    use jid::BareJid;
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc;

    use crate::domain::handles::repos::HandleRepository;
    use crate::infra::disco::ChannelDiscoService;
    use crate::infra::handles::InMemoryHandleRepository;

    use super::*;

    struct Fixture {
        cache: PresenceCache,
        repo: Arc<InMemoryHandleRepository>,
        events: mpsc::UnboundedReceiver<PresenceCacheEvent>,
    }

    impl Fixture {
        fn new() -> Self {
            let repo = Arc::new(InMemoryHandleRepository::new());
            let (disco, _requests) = ChannelDiscoService::new();
            let (sender, events) = mpsc::unbounded_channel();

            let cache = PresenceCache::builder()
                .set_handle_repository(repo.clone())
                .set_disco_service(disco)
                .set_delegate(Some(Box::new(sender)))
                .build()
                .unwrap();

            Self {
                cache,
                repo,
                events,
            }
        }

        fn contact(&self, jid: &str) -> ContactHandle {
            self.repo.ensure(&BareJid::from_str(jid).unwrap())
        }

        fn events(&mut self) -> Vec<PresenceCacheEvent> {
            let mut events = vec![];
            while let Ok(event) = self.events.try_recv() {
                events.push(event);
            }
            events
        }
    }

    #[test]
    fn test_update_notifies_only_on_change() {
        let mut fixture = Fixture::new();
        let romeo = fixture.contact("romeo@montague.lit");

        assert!(fixture
            .cache
            .update(romeo, Some("orchard"), StatusRank::Available, None, 0));
        assert!(!fixture
            .cache
            .update(romeo, Some("orchard"), StatusRank::Available, None, 0));

        assert_eq!(
            fixture.events(),
            vec![PresenceCacheEvent::PresenceChanged { handle: romeo }]
        );
    }

    #[test]
    fn test_evicts_contact_without_resources() {
        let mut fixture = Fixture::new();
        let romeo = fixture.contact("romeo@montague.lit");

        fixture
            .cache
            .update(romeo, Some("orchard"), StatusRank::Away, None, 0);
        assert_eq!(fixture.repo.refcount(romeo), Some(2));

        fixture
            .cache
            .update(romeo, Some("orchard"), StatusRank::Offline, None, 0);
        assert!(fixture.cache.get(romeo).is_none());
        assert_eq!(fixture.repo.refcount(romeo), Some(1));
    }

    #[test]
    fn test_offline_with_message_is_kept() {
        let mut fixture = Fixture::new();
        let romeo = fixture.contact("romeo@montague.lit");

        fixture
            .cache
            .update(romeo, None, StatusRank::Offline, Some("gone fishing"), 0);

        let presence = fixture.cache.get(romeo).unwrap();
        assert_eq!(presence.status(), StatusRank::Offline);
        assert_eq!(presence.status_message(), Some("gone fishing"));
    }

    #[test]
    fn test_liveness_keeps_contact_until_cleared() {
        let mut fixture = Fixture::new();
        let romeo = fixture.contact("romeo@montague.lit");

        fixture.cache.handle_liveness_event(LivenessEvent {
            handle: romeo,
            resource: None,
            bundle_ids: vec![],
        });
        assert!(fixture.cache.get(romeo).unwrap().keep_unavailable);
        assert_eq!(fixture.repo.refcount(romeo), Some(2));

        fixture.cache.clear_keep_unavailable(romeo);
        assert!(fixture.cache.get(romeo).is_none());
        assert_eq!(fixture.repo.refcount(romeo), Some(1));
    }

    #[test]
    fn test_presence_after_liveness_allows_eviction() {
        let mut fixture = Fixture::new();
        let romeo = fixture.contact("romeo@montague.lit");

        fixture.cache.handle_input(PresenceCacheInput::Liveness(LivenessEvent {
            handle: romeo,
            resource: Some("orchard".to_string()),
            bundle_ids: vec![],
        }));
        fixture.cache.handle_input(PresenceCacheInput::Presence(
            PresenceEvent::new(romeo, Some("orchard"), StatusRank::Available)
                .with_message("under the balcony")
                .with_priority(5),
        ));

        let presence = fixture.cache.get(romeo).unwrap();
        assert!(!presence.keep_unavailable);
        assert_eq!(presence.status_message(), Some("under the balcony"));
        assert_eq!(presence.resource("orchard").map(|r| r.priority), Some(5));

        fixture.cache.handle_input(PresenceCacheInput::Presence(PresenceEvent::new(
            romeo,
            Some("orchard"),
            StatusRank::Offline,
        )));
        assert!(fixture.cache.get(romeo).is_none());
        assert!(fixture.cache.is_empty());
    }

    #[test]
    fn test_nickname_and_avatar_of_cached_contacts() {
        let mut fixture = Fixture::new();
        let romeo = fixture.contact("romeo@montague.lit");

        assert!(!fixture
            .cache
            .set_nickname(romeo, Some("Romeo".to_string())));

        fixture
            .cache
            .update(romeo, Some("orchard"), StatusRank::Available, None, 0);
        fixture.events();

        assert!(fixture
            .cache
            .set_nickname(romeo, Some("Romeo".to_string())));
        assert!(!fixture
            .cache
            .set_nickname(romeo, Some("Romeo".to_string())));
        assert!(fixture
            .cache
            .set_avatar_hash(romeo, Some("a1b2".to_string())));

        assert_eq!(
            fixture.events(),
            vec![
                PresenceCacheEvent::NicknameChanged { handle: romeo },
                PresenceCacheEvent::AvatarChanged { handle: romeo },
            ]
        );
        assert_eq!(
            fixture.cache.get(romeo).unwrap().nickname.as_deref(),
            Some("Romeo")
        );
    }

    #[test]
    fn test_forget_releases_handle() {
        let mut fixture = Fixture::new();
        let romeo = fixture.contact("romeo@montague.lit");

        fixture
            .cache
            .update(romeo, Some("orchard"), StatusRank::Available, None, 0);
        fixture.events();

        fixture.cache.forget(romeo);

        assert!(fixture.cache.is_empty());
        assert_eq!(fixture.repo.refcount(romeo), Some(1));
        assert_eq!(
            fixture.events(),
            vec![PresenceCacheEvent::PresenceChanged { handle: romeo }]
        );
    }

    #[test]
    fn test_presence_with_invalid_handle_is_ignored() {
        let mut fixture = Fixture::new();

        assert!(!fixture.cache.update(
            ContactHandle::new(42),
            Some("orchard"),
            StatusRank::Available,
            None,
            0
        ));
        assert!(fixture.cache.is_empty());
    }
}
