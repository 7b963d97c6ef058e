// gabble-presence/gabble-presence
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

pub use channel_disco_service::{ChannelDiscoService, DiscoRequest};

mod channel_disco_service;
