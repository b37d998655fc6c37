//! Access Control Guard
//!
//! Stateless check run before any mutation. A denial short-circuits the call
//! with no state change.

use crate::attestors::AttestorSet;
use crate::errors::{RegistryError, Result};
use eip_identity_types::Principal;
use tracing::debug;

/// Role a caller must hold for an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role<'a> {
    /// Owner of the given record.
    Owner(&'a Principal),
    Administrator,
    Attestor,
}

/// Read-only view over the authorization inputs.
#[derive(Debug, Clone, Copy)]
pub struct Guard<'a> {
    administrator: &'a Principal,
    attestors: &'a AttestorSet,
}

impl<'a> Guard<'a> {
    pub fn new(administrator: &'a Principal, attestors: &'a AttestorSet) -> Self {
        Self {
            administrator,
            attestors,
        }
    }

    pub fn allows(&self, caller: &Principal, role: Role<'_>) -> bool {
        match role {
            Role::Owner(owner) => caller == owner,
            Role::Administrator => caller == self.administrator,
            Role::Attestor => self.attestors.contains(caller),
        }
    }

    pub fn check(&self, caller: &Principal, role: Role<'_>) -> Result<()> {
        if self.allows(caller, role) {
            Ok(())
        } else {
            debug!(caller = %caller, ?role, "access denied");
            Err(RegistryError::Unauthorized)
        }
    }
}
