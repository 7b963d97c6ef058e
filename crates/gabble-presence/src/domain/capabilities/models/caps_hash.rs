// gabble-presence/gabble-presence
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Hash function named in the 'hash' attribute of a XEP-0115 `<c/>` element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
pub enum CapsHash {
    #[strum(serialize = "sha-1")]
    #[serde(rename = "sha-1")]
    Sha1,
}
