// gabble-presence/gabble-presence
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use crate::domain::capabilities::models::CapsHash;
use crate::domain::handles::models::HandleRef;
use crate::domain::shared::models::{CapsBundleId, ContactHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiscoRequestId(pub u64);

impl Display for DiscoRequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "disco-{}", self.0)
    }
}

/// A resource waiting to learn what a capability bundle it advertised stands for.
#[derive(Debug)]
pub struct DiscoWaiter {
    pub handle: HandleRef,
    pub resource: String,
    pub caps_generation: u64,
    /// Set for XEP-0115 v1.5 claims whose 'ver' is a verification hash.
    pub hash: Option<CapsHash>,
    /// The request issued on behalf of this waiter, if any.
    pub request: Option<DiscoRequestId>,
}

impl DiscoWaiter {
    pub fn new(
        handle: HandleRef,
        resource: impl Into<String>,
        caps_generation: u64,
        hash: Option<CapsHash>,
    ) -> Self {
        Self {
            handle,
            resource: resource.into(),
            caps_generation,
            hash,
            request: None,
        }
    }

    pub fn contact(&self) -> ContactHandle {
        self.handle.handle()
    }

    pub fn disco_requested(&self) -> bool {
        self.request.is_some()
    }
}

/// Per-bundle queues of resources awaiting verification.
#[derive(Debug, Default)]
pub struct DiscoWaiterQueue {
    pending: HashMap<CapsBundleId, Vec<DiscoWaiter>>,
}

impl DiscoWaiterQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `waiter` for `bundle_id`. If the same resource of the same contact is already
    /// waiting, its generation is refreshed instead. Returns the queued waiter.
    pub fn push(&mut self, bundle_id: &CapsBundleId, waiter: DiscoWaiter) -> &mut DiscoWaiter {
        let waiters = self.pending.entry(bundle_id.clone()).or_default();

        let idx = match waiters
            .iter()
            .position(|w| w.contact() == waiter.contact() && w.resource == waiter.resource)
        {
            Some(idx) => {
                let existing = &mut waiters[idx];
                existing.caps_generation = existing.caps_generation.max(waiter.caps_generation);
                existing.hash = waiter.hash;
                idx
            }
            None => {
                waiters.push(waiter);
                waiters.len() - 1
            }
        };

        &mut waiters[idx]
    }

    pub fn is_pending(&self, bundle_id: &CapsBundleId) -> bool {
        self.pending.contains_key(bundle_id)
    }

    pub fn len(&self, bundle_id: &CapsBundleId) -> usize {
        self.pending.get(bundle_id).map_or(0, Vec::len)
    }

    pub fn contains(
        &self,
        bundle_id: &CapsBundleId,
        handle: ContactHandle,
        resource: &str,
    ) -> bool {
        self.pending.get(bundle_id).map_or(false, |waiters| {
            waiters
                .iter()
                .any(|w| w.contact() == handle && w.resource == resource)
        })
    }

    /// The number of waiters of `bundle_id` whose request is still outstanding.
    pub fn in_flight(&self, bundle_id: &CapsBundleId) -> usize {
        self.pending.get(bundle_id).map_or(0, |waiters| {
            waiters.iter().filter(|w| w.disco_requested()).count()
        })
    }

    /// The number of waiters of `bundle_id` nobody has asked yet.
    pub fn not_requested(&self, bundle_id: &CapsBundleId) -> usize {
        self.len(bundle_id) - self.in_flight(bundle_id)
    }

    pub fn waiters_mut(&mut self, bundle_id: &CapsBundleId) -> Option<&mut Vec<DiscoWaiter>> {
        self.pending.get_mut(bundle_id)
    }

    /// Removes and returns the waiter `request_id` was issued for.
    pub fn remove_request(
        &mut self,
        bundle_id: &CapsBundleId,
        request_id: DiscoRequestId,
    ) -> Option<DiscoWaiter> {
        let waiters = self.pending.get_mut(bundle_id)?;
        let idx = waiters.iter().position(|w| w.request == Some(request_id))?;
        let waiter = waiters.remove(idx);
        self.prune(bundle_id);
        Some(waiter)
    }

    /// Removes and returns every waiter of `bundle_id` matching `predicate`.
    pub fn drain_where(
        &mut self,
        bundle_id: &CapsBundleId,
        predicate: impl Fn(&DiscoWaiter) -> bool,
    ) -> Vec<DiscoWaiter> {
        let Some(waiters) = self.pending.get_mut(bundle_id) else {
            return vec![];
        };

        let (drained, kept): (Vec<_>, Vec<_>) =
            std::mem::take(waiters).into_iter().partition(|w| predicate(w));
        *waiters = kept;
        self.prune(bundle_id);
        drained
    }

    /// Removes and returns all waiters of `bundle_id`.
    pub fn take(&mut self, bundle_id: &CapsBundleId) -> Vec<DiscoWaiter> {
        self.pending.remove(bundle_id).unwrap_or_default()
    }

    /// Issues a request for every waiter of `bundle_id` that doesn't have one yet. Waiters for
    /// which `issue` fails are dropped. Returns the number of issued requests.
    pub fn request_all(
        &mut self,
        bundle_id: &CapsBundleId,
        mut issue: impl FnMut(&DiscoWaiter) -> Option<DiscoRequestId>,
    ) -> usize {
        let Some(waiters) = self.pending.get_mut(bundle_id) else {
            return 0;
        };

        let mut count = 0;
        waiters.retain_mut(|waiter| {
            if waiter.disco_requested() {
                return true;
            }
            match issue(waiter) {
                Some(request_id) => {
                    waiter.request = Some(request_id);
                    count += 1;
                    true
                }
                None => false,
            }
        });

        self.prune(bundle_id);
        count
    }

    /// Issues a request for the first waiter of `bundle_id` that doesn't have one yet. Waiters
    /// for which `issue` fails are dropped. Returns false if no request could be issued.
    pub fn request_next(
        &mut self,
        bundle_id: &CapsBundleId,
        mut issue: impl FnMut(&DiscoWaiter) -> Option<DiscoRequestId>,
    ) -> bool {
        loop {
            let Some(waiters) = self.pending.get_mut(bundle_id) else {
                return false;
            };
            let Some(idx) = waiters.iter().position(|w| !w.disco_requested()) else {
                return false;
            };

            if let Some(request_id) = issue(&waiters[idx]) {
                waiters[idx].request = Some(request_id);
                return true;
            }

            waiters.remove(idx);
            self.prune(bundle_id);
        }
    }

    /// Removes every waiter bound to `handle` and returns the bundles they were waiting for.
    pub fn remove_handle(&mut self, handle: ContactHandle) -> Vec<CapsBundleId> {
        let mut affected = vec![];

        for (bundle_id, waiters) in self.pending.iter_mut() {
            let count = waiters.len();
            waiters.retain(|w| w.contact() != handle);
            if waiters.len() != count {
                affected.push(bundle_id.clone());
            }
        }

        self.pending.retain(|_, waiters| !waiters.is_empty());
        affected
    }

    pub fn clear(&mut self) {
        self.pending.clear()
    }

    fn prune(&mut self, bundle_id: &CapsBundleId) {
        if self
            .pending
            .get(bundle_id)
            .map_or(false, |waiters| waiters.is_empty())
        {
            self.pending.remove(bundle_id);
        }
    }
}
