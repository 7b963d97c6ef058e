// gabble-presence/gabble-presence
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

pub use handle_repository::{DynHandleRepository, HandleRepository};

#[cfg(any(test, feature = "test"))]
pub use handle_repository::MockHandleRepository;

mod handle_repository;
