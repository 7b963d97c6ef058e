// gabble-presence/gabble-presence
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::capabilities::models::TRUST_THRESHOLD;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenceCacheConfig {
    /// The number of contacts that must independently report the same capabilities for a bundle
    /// before the bundle is trusted without asking anyone else.
    pub trust_threshold: u32,
    /// How long to wait for a disco#info answer.
    #[serde(rename = "disco_timeout_secs", with = "duration_secs")]
    pub disco_timeout: Duration,
    /// Upper bound for the number of resources waiting on a single bundle. `None` means unbounded.
    pub max_waiters_per_bundle: Option<usize>,
}

impl Default for PresenceCacheConfig {
    fn default() -> Self {
        Self {
            trust_threshold: TRUST_THRESHOLD,
            disco_timeout: Duration::from_secs(20),
            max_waiters_per_bundle: None,
        }
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(deserializer)?))
    }
}
