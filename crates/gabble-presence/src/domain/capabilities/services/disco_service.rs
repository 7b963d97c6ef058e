// gabble-presence/gabble-presence
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::sync::Arc;
use std::time::Duration;

use gabble_utils::PinnedFuture;
use jid::FullJid;

use crate::domain::capabilities::models::{DiscoError, DiscoInfo};
use crate::domain::shared::models::CapsBundleId;

pub type DynDiscoService = Arc<dyn DiscoService>;
pub type DiscoFuture = PinnedFuture<Result<DiscoInfo, DiscoError>>;

/// XEP-0030 disco#info queries against a contact's resource.
#[cfg_attr(any(test, feature = "test"), mockall::automock)]
pub trait DiscoService: Send + Sync {
    /// Asks `target` about the capability bundle `node`. The request is considered failed with
    /// `DiscoError::Timeout` if no answer arrived within `timeout`. Dropping the returned future
    /// cancels the request.
    fn request_disco_info(
        &self,
        target: &FullJid,
        node: &CapsBundleId,
        timeout: Duration,
    ) -> DiscoFuture;
}
