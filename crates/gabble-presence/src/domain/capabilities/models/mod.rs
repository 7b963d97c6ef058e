// gabble-presence/gabble-presence
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

pub use capability_bits::CapabilityBits;
pub use caps_hash::CapsHash;
pub use disco_error::DiscoError;
pub use disco_info::{DiscoIdentity, DiscoInfo};
pub use disco_waiter::{DiscoRequestId, DiscoWaiter, DiscoWaiterQueue};
pub use trust_table::{CapabilityTrustEntry, CapabilityTrustTable, TRUST_THRESHOLD};

mod capability_bits;
mod caps_hash;
mod disco_error;
mod disco_info;
mod disco_waiter;
mod trust_table;
