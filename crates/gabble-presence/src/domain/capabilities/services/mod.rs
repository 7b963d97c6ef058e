// gabble-presence/gabble-presence
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

pub use disco_service::{DiscoFuture, DiscoService, DynDiscoService};

#[cfg(any(test, feature = "test"))]
pub use disco_service::MockDiscoService;

mod disco_service;
