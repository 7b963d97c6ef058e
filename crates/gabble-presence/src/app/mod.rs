// gabble-presence/gabble-presence
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

pub use event_loop::run_event_loop;
pub use events::{LivenessEvent, PresenceCacheInput, PresenceEvent};

mod event_loop;
mod events;
