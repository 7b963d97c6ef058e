// gabble-presence/gabble-presence
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

pub use caps_bundle_id::CapsBundleId;
pub use contact_handle::ContactHandle;
pub use status_rank::StatusRank;

mod caps_bundle_id;
mod contact_handle;
mod status_rank;
