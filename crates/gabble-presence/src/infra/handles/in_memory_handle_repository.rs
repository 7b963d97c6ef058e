// gabble-presence/gabble-presence
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::collections::HashMap;

use jid::BareJid;
use parking_lot::RwLock;

use crate::domain::handles::models::HandleError;
use crate::domain::handles::repos::HandleRepository;
use crate::domain::shared::models::ContactHandle;

/// Arena of interned contact JIDs. Slots are recycled once their refcount drops to zero.
#[derive(Default)]
pub struct InMemoryHandleRepository {
    inner: RwLock<Arena>,
}

#[derive(Default)]
struct Arena {
    slots: Vec<Option<Slot>>,
    lookup: HashMap<BareJid, ContactHandle>,
    free: Vec<usize>,
}

struct Slot {
    jid: BareJid,
    refcount: usize,
}

impl InMemoryHandleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of live handles.
    pub fn len(&self) -> usize {
        self.inner.read().lookup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn refcount(&self, handle: ContactHandle) -> Option<usize> {
        let inner = self.inner.read();
        inner.slot(handle).map(|slot| slot.refcount)
    }
}

impl Arena {
    fn index(handle: ContactHandle) -> Option<usize> {
        (handle.value() as usize).checked_sub(1)
    }

    fn slot(&self, handle: ContactHandle) -> Option<&Slot> {
        Self::index(handle)
            .and_then(|idx| self.slots.get(idx))
            .and_then(Option::as_ref)
    }

    fn slot_mut(&mut self, handle: ContactHandle) -> Option<&mut Slot> {
        Self::index(handle)
            .and_then(|idx| self.slots.get_mut(idx))
            .and_then(Option::as_mut)
    }

    fn insert(&mut self, jid: &BareJid) -> ContactHandle {
        let slot = Slot {
            jid: jid.clone(),
            refcount: 1,
        };

        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(slot);
                idx
            }
            None => {
                self.slots.push(Some(slot));
                self.slots.len() - 1
            }
        };

        let handle = ContactHandle::new(idx as u32 + 1);
        self.lookup.insert(jid.clone(), handle);
        handle
    }
}

impl HandleRepository for InMemoryHandleRepository {
    fn ensure(&self, jid: &BareJid) -> ContactHandle {
        let mut inner = self.inner.write();

        if let Some(handle) = inner.lookup.get(jid).copied() {
            if let Some(slot) = inner.slot_mut(handle) {
                slot.refcount += 1;
            }
            return handle;
        }

        inner.insert(jid)
    }

    fn ref_handle(&self, handle: ContactHandle) -> Result<(), HandleError> {
        let mut inner = self.inner.write();
        let slot = inner
            .slot_mut(handle)
            .ok_or(HandleError::InvalidHandle(handle))?;
        slot.refcount += 1;
        Ok(())
    }

    fn unref_handle(&self, handle: ContactHandle) -> Result<(), HandleError> {
        let mut inner = self.inner.write();
        let slot = inner
            .slot_mut(handle)
            .ok_or(HandleError::InvalidHandle(handle))?;
        slot.refcount -= 1;

        if slot.refcount > 0 {
            return Ok(());
        }

        let Some(idx) = Arena::index(handle) else {
            return Ok(());
        };
        if let Some(slot) = inner.slots[idx].take() {
            inner.lookup.remove(&slot.jid);
        }
        inner.free.push(idx);
        Ok(())
    }

    fn inspect(&self, handle: ContactHandle) -> Option<BareJid> {
        self.inner.read().slot(handle).map(|slot| slot.jid.clone())
    }

    fn is_valid(&self, handle: ContactHandle) -> bool {
        self.inner.read().slot(handle).is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn jid(s: &str) -> BareJid {
        BareJid::from_str(s).unwrap()
    }

    #[test]
    fn test_interns_jids() {
        let repo = InMemoryHandleRepository::new();

        let a = repo.ensure(&jid("a@example.org"));
        let b = repo.ensure(&jid("b@example.org"));
        let a2 = repo.ensure(&jid("a@example.org"));

        assert_eq!(a, ContactHandle::new(1));
        assert_eq!(b, ContactHandle::new(2));
        assert_eq!(a, a2);
        assert_eq!(repo.refcount(a), Some(2));
        assert_eq!(repo.inspect(b), Some(jid("b@example.org")));
        assert_eq!(repo.len(), 2);
    }

    #[test]
    fn test_recycles_released_handles() {
        let repo = InMemoryHandleRepository::new();

        let a = repo.ensure(&jid("a@example.org"));
        repo.ref_handle(a).unwrap();
        repo.unref_handle(a).unwrap();
        assert!(repo.is_valid(a));

        repo.unref_handle(a).unwrap();
        assert!(!repo.is_valid(a));
        assert_eq!(repo.inspect(a), None);
        assert!(repo.is_empty());

        let b = repo.ensure(&jid("b@example.org"));
        assert_eq!(a, b);
        assert_eq!(repo.inspect(b), Some(jid("b@example.org")));
    }

    #[test]
    fn test_rejects_unknown_handles() {
        let repo = InMemoryHandleRepository::new();
        let unknown = ContactHandle::new(0);

        assert_eq!(
            repo.ref_handle(unknown),
            Err(HandleError::InvalidHandle(unknown))
        );
        assert_eq!(
            repo.unref_handle(ContactHandle::new(7)),
            Err(HandleError::InvalidHandle(ContactHandle::new(7)))
        );
        assert!(!repo.is_valid(unknown));
    }
}
