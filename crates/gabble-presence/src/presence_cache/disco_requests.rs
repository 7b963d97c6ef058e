// gabble-presence/gabble-presence
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::str::FromStr;
use std::time::Duration;

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use gabble_utils::PinnedFuture;
use jid::FullJid;
use tracing::{debug, warn};

use crate::domain::capabilities::models::{DiscoError, DiscoInfo, DiscoRequestId, DiscoWaiter};
use crate::domain::capabilities::services::DynDiscoService;
use crate::domain::handles::repos::DynHandleRepository;
use crate::domain::shared::models::{CapsBundleId, ContactHandle};

/// The outcome of a disco#info request issued by the cache.
#[derive(Debug)]
pub struct DiscoCompletion {
    pub request_id: DiscoRequestId,
    pub bundle_id: CapsBundleId,
    pub handle: ContactHandle,
    pub resource: String,
    pub result: Result<DiscoInfo, DiscoError>,
}

/// Outstanding disco#info requests. Dropping this drops the pending futures, which cancels them.
pub(super) struct DiscoRequests {
    service: DynDiscoService,
    handle_repo: DynHandleRepository,
    timeout: Duration,
    next_id: u64,
    in_flight: FuturesUnordered<PinnedFuture<DiscoCompletion>>,
}

impl DiscoRequests {
    pub fn new(
        service: DynDiscoService,
        handle_repo: DynHandleRepository,
        timeout: Duration,
    ) -> Self {
        Self {
            service,
            handle_repo,
            timeout,
            next_id: 0,
            in_flight: FuturesUnordered::new(),
        }
    }

    /// Asks `waiter`'s resource about `bundle_id`. Returns `None` if the waiter can't be
    /// addressed.
    pub fn issue(
        &mut self,
        bundle_id: &CapsBundleId,
        waiter: &DiscoWaiter,
    ) -> Option<DiscoRequestId> {
        let handle = waiter.contact();

        let Some(jid) = self.handle_repo.inspect(handle) else {
            warn!(
                "Cannot ask {} about {}. The handle is no longer valid.",
                handle, bundle_id
            );
            return None;
        };

        let target = match FullJid::from_str(&format!("{}/{}", jid, waiter.resource)) {
            Ok(target) => target,
            Err(err) => {
                warn!(
                    "Cannot ask {}/{} about {}: {}",
                    jid, waiter.resource, bundle_id, err
                );
                return None;
            }
        };

        self.next_id += 1;
        let request_id = DiscoRequestId(self.next_id);
        debug!("Asking {} about {} ({}).", target, bundle_id, request_id);

        let response = self
            .service
            .request_disco_info(&target, bundle_id, self.timeout);
        let bundle_id = bundle_id.clone();
        let resource = waiter.resource.clone();

        self.in_flight.push(Box::pin(async move {
            DiscoCompletion {
                request_id,
                bundle_id,
                handle,
                resource,
                result: response.await,
            }
        }));

        Some(request_id)
    }

    pub async fn next(&mut self) -> Option<DiscoCompletion> {
        self.in_flight.next().await
    }

    pub fn len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.in_flight.is_empty()
    }

    pub fn clear(&mut self) {
        self.in_flight = FuturesUnordered::new();
    }
}
