// gabble-presence/gabble-presence
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use tracing::{debug, info, warn};

use crate::domain::capabilities::models::{CapabilityBits, CapsHash, DiscoWaiter};
use crate::domain::handles::models::HandleRef;
use crate::domain::shared::models::{CapsBundleId, ContactHandle};
use crate::presence_cache_event::PresenceCacheEvent;

use super::{DiscoCompletion, PresenceCache};

impl PresenceCache {
    /// Handles `resource` of `handle` claiming to support what each of `bundle_ids` stands for.
    /// Claims for bundles we trust (or that `handle` already told us about) are applied right
    /// away, all others are verified via disco#info first.
    pub fn process_capability_claim(
        &mut self,
        handle: ContactHandle,
        resource: &str,
        bundle_ids: &[CapsBundleId],
        generation: u64,
    ) {
        self.process_claims(handle, resource, bundle_ids, generation, None)
    }

    /// Applies the result of a finished disco#info request.
    pub fn on_disco_result(&mut self, completion: DiscoCompletion) {
        let DiscoCompletion {
            request_id,
            bundle_id,
            handle,
            resource,
            result,
        } = completion;

        let Some(waiter) = self.waiters.remove_request(&bundle_id, request_id) else {
            debug!(
                "Ignoring {} from {}/{} about {}. Nobody is waiting for it anymore.",
                request_id, handle, resource, bundle_id
            );
            return;
        };

        let info = match result {
            Ok(info) => info,
            Err(err) => {
                warn!(
                    "disco#info to {}/{} about {} failed: {}",
                    handle, resource, bundle_id, err
                );
                self.retry_with_another_waiter(&bundle_id);
                return;
            }
        };

        if info.features.is_empty() {
            warn!(
                "{}/{} reported no features for {}. Ignoring answer.",
                handle, resource, bundle_id
            );
            self.retry_with_another_waiter(&bundle_id);
            return;
        }

        let caps = info.capabilities();

        match waiter.hash {
            Some(algorithm) => {
                let hash = info.verification_hash(algorithm);
                if hash != bundle_id.ver() {
                    warn!(
                        "Features reported by {}/{} don't match {} (got {}).",
                        handle, resource, bundle_id, hash
                    );
                    self.retry_with_another_waiter(&bundle_id);
                    return;
                }

                info!("Verified {} via its {} hash.", bundle_id, algorithm);
                self.trust_table.mark_verified(&bundle_id, caps);
            }
            None => {
                let trust = self.trust_table.recv_corroboration(&bundle_id, handle, caps);
                debug!(
                    "{}/{} corroborated {}. Trust is now {}.",
                    handle, resource, bundle_id, trust
                );
            }
        }

        self.apply_capabilities(handle, &waiter.resource, caps, waiter.caps_generation);
        drop(waiter);

        self.resolve_waiters(&bundle_id, handle, caps);
    }
}

impl PresenceCache {
    pub(super) fn process_claims(
        &mut self,
        handle: ContactHandle,
        resource: &str,
        bundle_ids: &[CapsBundleId],
        generation: u64,
        hash: Option<CapsHash>,
    ) {
        for bundle_id in bundle_ids {
            self.process_claim(handle, resource, bundle_id, generation, hash);
        }
    }

    fn process_claim(
        &mut self,
        handle: ContactHandle,
        resource: &str,
        bundle_id: &CapsBundleId,
        generation: u64,
        hash: Option<CapsHash>,
    ) {
        self.trust_table.entry(bundle_id);

        if let Some(caps) = self.trust_table.resolved_capabilities(bundle_id, handle) {
            self.apply_capabilities(handle, resource, caps, generation);
            return;
        }

        if let Some(max_waiters) = self.config.max_waiters_per_bundle {
            if self.waiters.len(bundle_id) >= max_waiters
                && !self.waiters.contains(bundle_id, handle, resource)
            {
                warn!(
                    "Dropping claim of {}/{} for {}. Already {} resources waiting.",
                    handle, resource, bundle_id, max_waiters
                );
                return;
            }
        }

        let handle_ref = match HandleRef::acquire(&self.handle_repo, handle) {
            Ok(handle_ref) => handle_ref,
            Err(err) => {
                warn!("Ignoring claim of {}/{} for {}: {}", handle, resource, bundle_id, err);
                return;
            }
        };

        self.waiters.push(
            bundle_id,
            DiscoWaiter::new(handle_ref, resource, generation, hash),
        );

        let trust = self.trust_table.trust(bundle_id);
        let in_flight = self.waiters.in_flight(bundle_id) as u32;

        if trust + in_flight >= self.trust_table.threshold() {
            debug!(
                "Not asking {}/{} about {}. {} request(s) already in flight.",
                handle, resource, bundle_id, in_flight
            );
            return;
        }

        let requests = &mut self.requests;
        let Some(waiter) = self.waiters.waiters_mut(bundle_id).and_then(|waiters| {
            waiters
                .iter_mut()
                .find(|w| w.contact() == handle && w.resource == resource)
        }) else {
            return;
        };

        if waiter.disco_requested() {
            return;
        }

        if let Some(request_id) = requests.issue(bundle_id, waiter) {
            waiter.request = Some(request_id);
            return;
        }

        self.waiters
            .drain_where(bundle_id, |w| w.contact() == handle && w.resource == resource);
    }

    /// Resolves the waiters that don't need to be asked anymore after `reporter` told us that
    /// `bundle_id` stands for `caps`.
    fn resolve_waiters(
        &mut self,
        bundle_id: &CapsBundleId,
        reporter: ContactHandle,
        caps: CapabilityBits,
    ) {
        let trusted = self.trust_table.is_trusted(bundle_id);

        let resolved = if trusted {
            self.waiters.take(bundle_id)
        } else {
            self.waiters
                .drain_where(bundle_id, |w| w.contact() == reporter)
        };

        for waiter in resolved {
            self.apply_capabilities(
                waiter.contact(),
                &waiter.resource,
                caps,
                waiter.caps_generation,
            );
        }

        if !trusted {
            self.top_up_requests(bundle_id);
        }
    }

    /// Asks every waiting resource of `bundle_id` that wasn't asked yet once those resources
    /// can't bring the bundle up to the trust threshold anymore.
    pub(super) fn top_up_requests(&mut self, bundle_id: &CapsBundleId) {
        if self.trust_table.is_trusted(bundle_id) {
            return;
        }

        let trust = self.trust_table.trust(bundle_id);
        let not_requested = self.waiters.not_requested(bundle_id) as u32;

        if trust + not_requested >= self.trust_table.threshold() {
            return;
        }

        let requests = &mut self.requests;
        let issued = self
            .waiters
            .request_all(bundle_id, |waiter| requests.issue(bundle_id, waiter));

        if issued > 0 {
            debug!(
                "Asked {} more resource(s) about {} (trust {}).",
                issued, bundle_id, trust
            );
        }
    }

    fn retry_with_another_waiter(&mut self, bundle_id: &CapsBundleId) {
        let requests = &mut self.requests;
        if self
            .waiters
            .request_next(bundle_id, |waiter| requests.issue(bundle_id, waiter))
        {
            return;
        }

        if self.waiters.in_flight(bundle_id) == 0 {
            info!(
                "Nobody left to ask about {}. Leaving it unresolved for now.",
                bundle_id
            );
        }
    }

    fn apply_capabilities(
        &mut self,
        handle: ContactHandle,
        resource: &str,
        caps: CapabilityBits,
        generation: u64,
    ) {
        let Some(contact) = self.contacts.get_mut(&handle) else {
            debug!(
                "Not applying capabilities to {}/{}. No presence known.",
                handle, resource
            );
            return;
        };

        let old_caps = contact.presence.capabilities();
        if !contact
            .presence
            .set_resource_capabilities(resource, caps, generation)
        {
            return;
        }

        let new_caps = contact.presence.capabilities();
        if old_caps != new_caps {
            self.event_dispatcher
                .dispatch_event(PresenceCacheEvent::CapabilitiesChanged {
                    handle,
                    old_caps,
                    new_caps,
                });
        }
    }
}
