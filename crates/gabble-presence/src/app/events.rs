// gabble-presence/gabble-presence
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use serde::{Deserialize, Serialize};

use crate::domain::shared::models::{CapsBundleId, ContactHandle, StatusRank};

/// A presence stanza, as decoded by the protocol layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceEvent {
    pub handle: ContactHandle,
    #[serde(default)]
    pub resource: Option<String>,
    pub status: StatusRank,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub priority: i8,
    /// 'node#ver' plus legacy 'node#ext' identifiers from the `<c/>` element.
    #[serde(default)]
    pub bundle_ids: Vec<CapsBundleId>,
    /// The 'hash' attribute of the `<c/>` element, if any.
    #[serde(default)]
    pub caps_hash: Option<String>,
}

/// Non-presence evidence that a contact is online, e.g. a chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LivenessEvent {
    pub handle: ContactHandle,
    #[serde(default)]
    pub resource: Option<String>,
    #[serde(default)]
    pub bundle_ids: Vec<CapsBundleId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PresenceCacheInput {
    Presence(PresenceEvent),
    Liveness(LivenessEvent),
    Nickname {
        handle: ContactHandle,
        nickname: Option<String>,
    },
    Avatar {
        handle: ContactHandle,
        avatar_hash: Option<String>,
    },
    Forget {
        handle: ContactHandle,
    },
    Reset,
}

impl PresenceEvent {
    pub fn new(handle: ContactHandle, resource: Option<&str>, status: StatusRank) -> Self {
        Self {
            handle,
            resource: resource.map(ToString::to_string),
            status,
            message: None,
            priority: 0,
            bundle_ids: vec![],
            caps_hash: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_priority(mut self, priority: i8) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_bundles(mut self, bundle_ids: impl IntoIterator<Item = CapsBundleId>) -> Self {
        self.bundle_ids = bundle_ids.into_iter().collect();
        self
    }

    pub fn with_caps_hash(mut self, hash: impl Into<String>) -> Self {
        self.caps_hash = Some(hash.into());
        self
    }
}
