//! Types for the identity registry

use crate::config::Limits;
use crate::errors::{RegistryError, Result};
use eip_identity_types::{Principal, Value};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;

/// Human-readable handle. Uniqueness is case-sensitive byte equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(String);

impl Handle {
    /// Validate `text` against `limits` and wrap it.
    pub fn parse(text: impl Into<String>, limits: &Limits) -> Result<Self> {
        let text = text.into();
        check_text("handle", &text, limits.max_handle_bytes)?;
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Handle {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validate a free-form description against `limits`.
pub fn check_description(description: &str, limits: &Limits) -> Result<()> {
    check_text("description", description, limits.max_description_bytes)
}

fn check_text(field: &str, text: &str, max_bytes: usize) -> Result<()> {
    if text.is_empty() {
        return Err(RegistryError::malformed(format!("{field} must not be empty")));
    }
    if text.len() > max_bytes {
        return Err(RegistryError::malformed(format!(
            "{field} is {} bytes, limit is {max_bytes}",
            text.len()
        )));
    }
    Ok(())
}

/// Identity bound to exactly one owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub owner: Principal,
    pub handle: Handle,
    pub description: String,
    /// Attestors that vouched for the current handle binding.
    #[serde(default)]
    pub attestations: BTreeSet<Principal>,
}

impl IdentityRecord {
    pub fn new(owner: Principal, handle: Handle, description: String) -> Self {
        Self {
            owner,
            handle,
            description,
            attestations: BTreeSet::new(),
        }
    }

    /// Tuple form returned by `get-identity`.
    pub fn to_value(&self) -> Value {
        Value::tuple([
            ("handle", Value::utf8(self.handle.as_str())),
            ("description", Value::utf8(self.description.as_str())),
            ("attestations", Value::UInt(self.attestations.len() as u64)),
        ])
    }
}
