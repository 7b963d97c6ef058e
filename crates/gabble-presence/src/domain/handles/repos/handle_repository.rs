// gabble-presence/gabble-presence
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::sync::Arc;

use jid::BareJid;

use crate::domain::handles::models::HandleError;
use crate::domain::shared::models::ContactHandle;

pub type DynHandleRepository = Arc<dyn HandleRepository>;

/// Interns contact JIDs as small reference-counted integer handles.
#[cfg_attr(any(test, feature = "test"), mockall::automock)]
pub trait HandleRepository: Send + Sync {
    /// Returns the handle for `jid`, interning it if needed. The caller owns one reference on the
    /// returned handle and must release it with `unref_handle`.
    fn ensure(&self, jid: &BareJid) -> ContactHandle;

    fn ref_handle(&self, handle: ContactHandle) -> Result<(), HandleError>;
    fn unref_handle(&self, handle: ContactHandle) -> Result<(), HandleError>;

    fn inspect(&self, handle: ContactHandle) -> Option<BareJid>;
    fn is_valid(&self, handle: ContactHandle) -> bool;
}
