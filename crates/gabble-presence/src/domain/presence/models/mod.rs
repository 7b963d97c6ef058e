// gabble-presence/gabble-presence
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

pub use contact_presence::ContactPresence;
pub use resource_presence::ResourcePresence;

mod contact_presence;
mod resource_presence;
