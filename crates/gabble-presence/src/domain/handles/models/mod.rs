// gabble-presence/gabble-presence
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

pub use handle_error::HandleError;
pub use handle_ref::HandleRef;

mod handle_error;
mod handle_ref;
