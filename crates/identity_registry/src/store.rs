//! Identity Store
//!
//! Owner → record table plus the handle → owner index. Every mutation checks
//! all of its preconditions before writing either table, so a rejected call
//! leaves both untouched.

use crate::errors::*;
use crate::types::*;
use eip_identity_types::Principal;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityStore {
    /// Owner → identity record
    records: BTreeMap<Principal, IdentityRecord>,
    /// Handle → owner
    handles: BTreeMap<Handle, Principal>,
}

impl IdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from persisted records, checking that no two records
    /// share an owner or a handle.
    pub fn from_records<I>(records: I) -> std::result::Result<Self, String>
    where
        I: IntoIterator<Item = IdentityRecord>,
    {
        let mut store = Self::new();
        for record in records {
            if store.records.contains_key(&record.owner) {
                return Err(format!("duplicate owner {}", record.owner));
            }
            if store.handles.contains_key(&record.handle) {
                return Err(format!("duplicate handle {}", record.handle));
            }
            store.handles.insert(record.handle.clone(), record.owner);
            store.records.insert(record.owner, record);
        }
        Ok(store)
    }

    pub fn create(&mut self, owner: Principal, handle: Handle, description: String) -> Result<()> {
        if self.records.contains_key(&owner) {
            return Err(RegistryError::IdentityAlreadyExists);
        }
        if self.handles.contains_key(&handle) {
            return Err(RegistryError::HandleTaken {
                handle: handle.as_str().to_string(),
            });
        }

        debug!(owner = %owner, handle = %handle, "identity created");
        self.handles.insert(handle.clone(), owner);
        self.records
            .insert(owner, IdentityRecord::new(owner, handle, description));
        Ok(())
    }

    /// Overwrite handle and description of `owner`'s record. A handle change
    /// drops attestations made for the previous handle.
    pub fn update(&mut self, owner: &Principal, handle: Handle, description: String) -> Result<()> {
        let current = self
            .records
            .get(owner)
            .ok_or(RegistryError::IdentityNotFound)?;

        let handle_changed = current.handle != handle;
        if handle_changed {
            if let Some(holder) = self.handles.get(&handle) {
                if holder != owner {
                    return Err(RegistryError::HandleTaken {
                        handle: handle.as_str().to_string(),
                    });
                }
            }
        }

        let Some(record) = self.records.get_mut(owner) else {
            return Err(RegistryError::IdentityNotFound);
        };
        if handle_changed {
            self.handles.remove(&record.handle);
            self.handles.insert(handle.clone(), *owner);
            record.handle = handle;
            record.attestations.clear();
        }
        record.description = description;

        debug!(owner = %owner, handle = %record.handle, handle_changed, "identity updated");
        Ok(())
    }

    /// Record that `attestor` vouches for `owner`'s identity.
    pub fn attest(&mut self, owner: &Principal, attestor: Principal) -> Result<()> {
        let record = self
            .records
            .get_mut(owner)
            .ok_or(RegistryError::IdentityNotFound)?;
        if record.attestations.insert(attestor) {
            debug!(owner = %owner, attestor = %attestor, "identity attested");
        }
        Ok(())
    }

    pub fn get(&self, owner: &Principal) -> Option<&IdentityRecord> {
        self.records.get(owner)
    }

    /// Resolve handle → owner
    pub fn owner_of(&self, handle: &str) -> Option<Principal> {
        self.handles.get(handle).copied()
    }

    pub fn records(&self) -> impl Iterator<Item = &IdentityRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// True when the handle index exactly mirrors the records.
    pub fn index_consistent(&self) -> bool {
        self.handles.len() == self.records.len()
            && self.records.values().all(|record| {
                self.handles.get(&record.handle) == Some(&record.owner)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Limits;

    fn handle(text: &str) -> Handle {
        Handle::parse(text, &Limits::default()).unwrap()
    }

    fn principal(byte: u8) -> Principal {
        Principal::new([byte; 32])
    }

    #[test]
    fn create_and_lookup() {
        let mut store = IdentityStore::new();
        store
            .create(principal(1), handle("alice"), "first".into())
            .unwrap();

        let record = store.get(&principal(1)).unwrap();
        assert_eq!(record.handle.as_str(), "alice");
        assert_eq!(store.owner_of("alice"), Some(principal(1)));
        assert!(store.get(&principal(2)).is_none());
        assert!(store.index_consistent());
    }

    #[test]
    fn second_create_by_same_owner_rejected() {
        let mut store = IdentityStore::new();
        store
            .create(principal(1), handle("alice"), "first".into())
            .unwrap();
        let before = store.clone();

        let err = store
            .create(principal(1), handle("other"), "second".into())
            .unwrap_err();
        assert_eq!(err, RegistryError::IdentityAlreadyExists);
        assert_eq!(store, before);
    }

    #[test]
    fn handle_collision_across_owners_rejected() {
        let mut store = IdentityStore::new();
        store
            .create(principal(1), handle("alice"), "first".into())
            .unwrap();

        let err = store
            .create(principal(2), handle("alice"), "second".into())
            .unwrap_err();
        assert!(matches!(err, RegistryError::HandleTaken { .. }));
        assert!(store.get(&principal(2)).is_none());
    }

    #[test]
    fn update_moves_index_and_clears_attestations() {
        let mut store = IdentityStore::new();
        store
            .create(principal(1), handle("alice"), "first".into())
            .unwrap();
        store.attest(&principal(1), principal(9)).unwrap();

        store
            .update(&principal(1), handle("alice2"), "second".into())
            .unwrap();

        let record = store.get(&principal(1)).unwrap();
        assert_eq!(record.handle.as_str(), "alice2");
        assert_eq!(record.description, "second");
        assert!(record.attestations.is_empty());
        assert_eq!(store.owner_of("alice"), None);
        assert_eq!(store.owner_of("alice2"), Some(principal(1)));
        assert!(store.index_consistent());
    }

    #[test]
    fn description_only_update_keeps_attestations() {
        let mut store = IdentityStore::new();
        store
            .create(principal(1), handle("alice"), "first".into())
            .unwrap();
        store.attest(&principal(1), principal(9)).unwrap();

        store
            .update(&principal(1), handle("alice"), "second".into())
            .unwrap();

        let record = store.get(&principal(1)).unwrap();
        assert_eq!(record.description, "second");
        assert_eq!(record.attestations.len(), 1);
    }

    #[test]
    fn update_onto_foreign_handle_is_all_or_nothing() {
        let mut store = IdentityStore::new();
        store
            .create(principal(1), handle("alice"), "a".into())
            .unwrap();
        store
            .create(principal(2), handle("bob"), "b".into())
            .unwrap();
        let before = store.clone();

        let err = store
            .update(&principal(1), handle("bob"), "changed".into())
            .unwrap_err();
        assert!(matches!(err, RegistryError::HandleTaken { .. }));
        assert_eq!(store, before);
    }

    #[test]
    fn update_without_record_rejected() {
        let mut store = IdentityStore::new();
        let err = store
            .update(&principal(3), handle("carol"), "c".into())
            .unwrap_err();
        assert_eq!(err, RegistryError::IdentityNotFound);
        assert!(store.is_empty());
    }

    #[test]
    fn from_records_rejects_duplicate_handles() {
        let a = IdentityRecord::new(principal(1), handle("same"), "a".into());
        let b = IdentityRecord::new(principal(2), handle("same"), "b".into());
        assert!(IdentityStore::from_records([a.clone()]).is_ok());
        assert!(IdentityStore::from_records([a, b]).is_err());
    }
}
