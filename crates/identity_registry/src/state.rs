//! Explicit registry state
//!
//! All contract state lives in one [`RegistryState`] value that the host
//! passes into every call. The caller identity is always an argument; there
//! is no process-wide registry.

use crate::attestors::AttestorSet;
use crate::config::{Limits, RegistryConfig};
use crate::errors::*;
use crate::guard::{Guard, Role};
use crate::store::IdentityStore;
use crate::types::*;
use eip_identity_types::Principal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum StateError {
    #[error("inconsistent snapshot: {0}")]
    InconsistentSnapshot(String),
}

/// Serializable form of the whole state, records ordered by owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub administrator: Principal,
    pub identities: Vec<IdentityRecord>,
    pub attestors: Vec<Principal>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryState {
    administrator: Principal,
    limits: Limits,
    identities: IdentityStore,
    attestors: AttestorSet,
}

impl RegistryState {
    /// Fresh deployment: no identities, no attestors.
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            administrator: config.administrator,
            limits: config.limits,
            identities: IdentityStore::new(),
            attestors: AttestorSet::new(),
        }
    }

    pub fn from_snapshot(
        snapshot: StateSnapshot,
        limits: Limits,
    ) -> std::result::Result<Self, StateError> {
        let identities = IdentityStore::from_records(snapshot.identities)
            .map_err(StateError::InconsistentSnapshot)?;
        Ok(Self {
            administrator: snapshot.administrator,
            limits,
            identities,
            attestors: snapshot.attestors.into_iter().collect(),
        })
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            administrator: self.administrator,
            identities: self.identities.records().cloned().collect(),
            attestors: self.attestors.iter().copied().collect(),
        }
    }

    fn guard(&self) -> Guard<'_> {
        Guard::new(&self.administrator, &self.attestors)
    }

    /// Bind `handle` to `caller`. Succeeds at most once per caller.
    pub fn create_identity(
        &mut self,
        caller: &Principal,
        handle: &str,
        description: &str,
    ) -> Result<bool> {
        let handle = Handle::parse(handle, &self.limits)?;
        check_description(description, &self.limits)?;
        self.identities
            .create(*caller, handle, description.to_string())?;
        Ok(true)
    }

    /// Replace handle and description of the caller's own record.
    pub fn update_identity(
        &mut self,
        caller: &Principal,
        handle: &str,
        description: &str,
    ) -> Result<bool> {
        let handle = Handle::parse(handle, &self.limits)?;
        check_description(description, &self.limits)?;
        let owner = self
            .identities
            .get(caller)
            .map(|record| record.owner)
            .ok_or(RegistryError::IdentityNotFound)?;
        // Records are keyed by owner, so a caller can only reach its own
        // record and this check cannot deny. It remains the record gate.
        self.guard().check(caller, Role::Owner(&owner))?;
        self.identities
            .update(&owner, handle, description.to_string())?;
        Ok(true)
    }

    pub fn get_identity(&self, owner: &Principal) -> Option<&IdentityRecord> {
        self.identities.get(owner)
    }

    pub fn resolve_handle(&self, handle: &str) -> Option<Principal> {
        self.identities.owner_of(handle)
    }

    /// Admin only. Re-adding an existing attestor is a successful no-op.
    pub fn add_attestor(&mut self, caller: &Principal, target: &Principal) -> Result<bool> {
        self.guard().check(caller, Role::Administrator)?;
        self.attestors.insert(*target);
        Ok(true)
    }

    /// Admin only. Removing a non-member is a successful no-op.
    pub fn remove_attestor(&mut self, caller: &Principal, target: &Principal) -> Result<bool> {
        self.guard().check(caller, Role::Administrator)?;
        self.attestors.remove(target);
        Ok(true)
    }

    pub fn is_attestor(&self, target: &Principal) -> bool {
        self.attestors.contains(target)
    }

    /// Attestor only. Vouch for `owner`'s current handle binding.
    pub fn attest_identity(&mut self, caller: &Principal, owner: &Principal) -> Result<bool> {
        self.guard().check(caller, Role::Attestor)?;
        self.identities.attest(owner, *caller)?;
        Ok(true)
    }

    pub fn administrator(&self) -> &Principal {
        &self.administrator
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn identities(&self) -> &IdentityStore {
        &self.identities
    }

    pub fn attestors(&self) -> &AttestorSet {
        &self.attestors
    }

    /// SHA-256 commitment over the full state.
    ///
    /// Fields are hashed in a fixed binary order: administrator, record count,
    /// then per record (ascending owner) the owner, length-prefixed handle and
    /// description, and the attestation set; finally the attestor set.
    /// Counts and lengths are little-endian `u64`.
    pub fn state_root(&self) -> [u8; 32] {
        let mut h = Sha256::new();
        h.update(b"EIP_IDENTITY_STATE");
        h.update(self.administrator.as_bytes());

        h.update((self.identities.len() as u64).to_le_bytes());
        for record in self.identities.records() {
            h.update(record.owner.as_bytes());
            hash_text(&mut h, record.handle.as_str());
            hash_text(&mut h, &record.description);
            h.update((record.attestations.len() as u64).to_le_bytes());
            for attestor in &record.attestations {
                h.update(attestor.as_bytes());
            }
        }

        h.update((self.attestors.len() as u64).to_le_bytes());
        for attestor in self.attestors.iter() {
            h.update(attestor.as_bytes());
        }
        h.finalize().into()
    }
}

fn hash_text(h: &mut Sha256, text: &str) {
    h.update((text.len() as u64).to_le_bytes());
    h.update(text.as_bytes());
}
