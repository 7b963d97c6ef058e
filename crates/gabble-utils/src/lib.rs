// gabble-presence/gabble-utils
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::future::Future;
use std::pin::Pin;

mod id_string_macro;

pub type PinnedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
