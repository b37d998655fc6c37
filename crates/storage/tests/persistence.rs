//! Integration tests for storage backends (Sled and in-memory).
//! Covers snapshot commit/load, stale row removal, height tracking and
//! administrator pinning.

use eip_identity_registry::{RegistryConfig, RegistryState};
use eip_identity_storage::{load_or_deploy, MemoryStorage, RegistryStorage, SledStorage};
use eip_identity_types::Principal;
use tempfile::TempDir;

fn principal(byte: u8) -> Principal {
    Principal::new([byte; 32])
}

/// Helper to build a state with two identities, one attestor and one attestation
fn populated_state() -> RegistryState {
    let admin = principal(0);
    let mut state = RegistryState::new(RegistryConfig::new(admin));
    state.create_identity(&principal(1), "alice", "first").unwrap();
    state.create_identity(&principal(2), "bob", "second").unwrap();
    state.add_attestor(&admin, &principal(9)).unwrap();
    state.attest_identity(&principal(9), &principal(1)).unwrap();
    state
}

#[test]
fn fresh_storage_deploys_empty_registry() {
    let temp_dir = TempDir::new().unwrap();
    let storage = SledStorage::new(temp_dir.path()).unwrap();
    let config = RegistryConfig::new(principal(0));

    assert!(storage.load().unwrap().is_none());
    assert_eq!(storage.height().unwrap(), 0);

    let state = load_or_deploy(&storage, &config).unwrap();
    assert!(state.identities().is_empty());
    assert_eq!(state.administrator(), &principal(0));
}

#[test]
fn sled_commit_and_reload() {
    let temp_dir = TempDir::new().unwrap();
    let state = populated_state();
    let config = RegistryConfig::new(principal(0));

    {
        let storage = SledStorage::new(temp_dir.path()).unwrap();
        storage.commit(&state.snapshot(), 7).unwrap();
        storage.flush().unwrap();
    }

    let storage = SledStorage::new(temp_dir.path()).unwrap();
    assert_eq!(storage.height().unwrap(), 7);

    let restored = load_or_deploy(&storage, &config).unwrap();
    assert_eq!(restored, state);
    assert_eq!(restored.state_root(), state.state_root());
    assert_eq!(restored.resolve_handle("bob"), Some(principal(2)));
}

#[test]
fn sled_commit_drops_stale_rows() {
    let temp_dir = TempDir::new().unwrap();
    let storage = SledStorage::new(temp_dir.path()).unwrap();
    let config = RegistryConfig::new(principal(0));

    let mut state = populated_state();
    storage.commit(&state.snapshot(), 1).unwrap();

    state
        .update_identity(&principal(1), "alice2", "renamed")
        .unwrap();
    state.remove_attestor(&principal(0), &principal(9)).unwrap();
    storage.commit(&state.snapshot(), 2).unwrap();

    let restored = load_or_deploy(&storage, &config).unwrap();
    assert_eq!(restored.resolve_handle("alice"), None);
    assert_eq!(restored.resolve_handle("alice2"), Some(principal(1)));
    assert!(!restored.is_attestor(&principal(9)));
    assert!(restored.identities().index_consistent());
    assert_eq!(restored, state);
}

#[test]
fn administrator_is_pinned_at_deployment() {
    let storage = MemoryStorage::new();
    storage.commit(&populated_state().snapshot(), 3).unwrap();

    let other = RegistryConfig::new(principal(42));
    let err = load_or_deploy(&storage, &other).unwrap_err();
    assert!(err.to_string().contains("Administrator mismatch"));
}

#[test]
fn memory_storage_roundtrip() {
    let storage = MemoryStorage::new();
    let state = populated_state();
    storage.commit(&state.snapshot(), 5).unwrap();

    assert_eq!(storage.height().unwrap(), 5);
    let restored = load_or_deploy(&storage, &RegistryConfig::new(principal(0))).unwrap();
    assert_eq!(restored, state);
}
