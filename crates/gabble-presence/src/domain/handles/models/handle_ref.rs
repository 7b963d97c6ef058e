// gabble-presence/gabble-presence
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::fmt::{Debug, Formatter};

use tracing::warn;

use crate::domain::handles::models::HandleError;
use crate::domain::handles::repos::DynHandleRepository;
use crate::domain::shared::models::ContactHandle;

/// A strong reference on a contact handle. The handle cannot be recycled by the repository for as
/// long as a `HandleRef` for it is alive.
pub struct HandleRef {
    handle: ContactHandle,
    repo: DynHandleRepository,
}

impl HandleRef {
    pub fn acquire(repo: &DynHandleRepository, handle: ContactHandle) -> Result<Self, HandleError> {
        repo.ref_handle(handle)?;
        Ok(Self {
            handle,
            repo: repo.clone(),
        })
    }

    pub fn handle(&self) -> ContactHandle {
        self.handle
    }
}

impl Clone for HandleRef {
    fn clone(&self) -> Self {
        if let Err(err) = self.repo.ref_handle(self.handle) {
            warn!("Failed to reference handle {}: {}", self.handle, err);
        }
        Self {
            handle: self.handle,
            repo: self.repo.clone(),
        }
    }
}

impl Drop for HandleRef {
    fn drop(&mut self) {
        if let Err(err) = self.repo.unref_handle(self.handle) {
            warn!("Failed to release handle {}: {}", self.handle, err);
        }
    }
}

impl PartialEq for HandleRef {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl Debug for HandleRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("HandleRef").field(&self.handle).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use mockall::predicate::eq;
    use mockall::Sequence;

    use crate::domain::handles::repos::MockHandleRepository;

    use super::*;

    #[test]
    fn test_refs_on_acquire_and_clone_and_unrefs_on_drop() {
        let handle = ContactHandle::new(3);
        let mut repo = MockHandleRepository::new();
        let mut seq = Sequence::new();

        repo.expect_ref_handle()
            .with(eq(handle))
            .times(2)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        repo.expect_unref_handle()
            .with(eq(handle))
            .times(2)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let repo: DynHandleRepository = Arc::new(repo);
        let first = HandleRef::acquire(&repo, handle).unwrap();
        let second = first.clone();
        assert_eq!(first, second);
        assert_eq!(second.handle(), handle);

        drop(first);
        drop(second);
    }

    #[test]
    fn test_acquire_fails_for_invalid_handle() {
        let handle = ContactHandle::new(9);
        let mut repo = MockHandleRepository::new();
        repo.expect_ref_handle()
            .returning(|h| Err(HandleError::InvalidHandle(h)));
        repo.expect_unref_handle().never();

        let repo: DynHandleRepository = Arc::new(repo);
        assert_eq!(
            HandleRef::acquire(&repo, handle).unwrap_err(),
            HandleError::InvalidHandle(handle)
        );
    }
}
