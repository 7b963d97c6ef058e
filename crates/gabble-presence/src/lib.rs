// gabble-presence/gabble-presence
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

pub use app::{run_event_loop, LivenessEvent, PresenceCacheInput, PresenceEvent};
pub use config::PresenceCacheConfig;
pub use presence_cache::{DiscoCompletion, PresenceCache};
pub use presence_cache_builder::PresenceCacheBuilder;
pub use presence_cache_event::{PresenceCacheDelegate, PresenceCacheEvent};

pub mod app;
mod config;
pub mod domain;
pub mod infra;
pub mod ns;
mod presence_cache;
mod presence_cache_builder;
mod presence_cache_event;
