// gabble-presence/gabble-presence
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Presence status of a single resource, ordered by ascending availability. A resource with a
/// higher rank always wins over one with a lower rank, regardless of priority.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum StatusRank {
    #[default]
    Offline,
    Unknown,
    Error,
    Hidden,
    #[strum(serialize = "xa")]
    #[serde(rename = "xa")]
    ExtendedAway,
    Away,
    #[strum(serialize = "dnd")]
    #[serde(rename = "dnd")]
    DoNotDisturb,
    Available,
    Chat,
}

impl StatusRank {
    pub fn is_offline(&self) -> bool {
        *self == StatusRank::Offline
    }
}
