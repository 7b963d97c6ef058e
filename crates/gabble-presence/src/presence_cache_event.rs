// gabble-presence/gabble-presence
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use tokio::sync::mpsc;

use crate::domain::capabilities::models::CapabilityBits;
use crate::domain::shared::models::ContactHandle;

#[derive(Debug, Clone, PartialEq)]
pub enum PresenceCacheEvent {
    /// The effective status or status message of a contact changed.
    PresenceChanged { handle: ContactHandle },
    NicknameChanged { handle: ContactHandle },
    AvatarChanged { handle: ContactHandle },
    /// The union of the capabilities of a contact's resources changed.
    CapabilitiesChanged {
        handle: ContactHandle,
        old_caps: CapabilityBits,
        new_caps: CapabilityBits,
    },
}

pub trait PresenceCacheDelegate: Send + Sync {
    fn handle_event(&self, event: PresenceCacheEvent);
}

impl PresenceCacheDelegate for mpsc::UnboundedSender<PresenceCacheEvent> {
    fn handle_event(&self, event: PresenceCacheEvent) {
        // The receiving end is allowed to go away before the cache does.
        _ = self.send(event);
    }
}

pub(crate) struct EventDispatcher {
    delegate: Option<Box<dyn PresenceCacheDelegate>>,
}

impl EventDispatcher {
    pub fn new(delegate: Option<Box<dyn PresenceCacheDelegate>>) -> Self {
        Self { delegate }
    }

    pub fn dispatch_event(&self, event: PresenceCacheEvent) {
        let Some(ref delegate) = self.delegate else {
            return;
        };
        delegate.handle_event(event)
    }
}
