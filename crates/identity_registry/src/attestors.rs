//! Attestor Registry
//!
//! Membership set only. Admin gating happens in [`crate::guard`] before any
//! of these methods are reached.

use eip_identity_types::Principal;
use std::collections::BTreeSet;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttestorSet {
    members: BTreeSet<Principal>,
}

impl AttestorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when `target` was already a member.
    pub fn insert(&mut self, target: Principal) -> bool {
        let added = self.members.insert(target);
        if added {
            info!(attestor = %target, "attestor added");
        }
        added
    }

    /// Returns `false` when `target` was not a member.
    pub fn remove(&mut self, target: &Principal) -> bool {
        let removed = self.members.remove(target);
        if removed {
            info!(attestor = %target, "attestor removed");
        }
        removed
    }

    pub fn contains(&self, target: &Principal) -> bool {
        self.members.contains(target)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Principal> {
        self.members.iter()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl FromIterator<Principal> for AttestorSet {
    fn from_iter<T: IntoIterator<Item = Principal>>(iter: T) -> Self {
        Self {
            members: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_is_idempotent() {
        let mut set = AttestorSet::new();
        let w = Principal::new([3u8; 32]);
        assert!(set.insert(w));
        assert!(!set.insert(w));
        assert_eq!(set.len(), 1);
        assert!(set.contains(&w));
    }

    #[test]
    fn remove_non_member_is_noop() {
        let mut set = AttestorSet::new();
        let w = Principal::new([3u8; 32]);
        assert!(!set.remove(&w));
        set.insert(w);
        assert!(set.remove(&w));
        assert!(set.is_empty());
    }
}
