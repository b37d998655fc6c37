//! Persistence for the identity registry.
//!
//! Layout: `identities` (owner → record), `handles` (handle → owner),
//! `attestors` (principal → ()), `metadata` (administrator, height).

use anyhow::Result;
use eip_identity_registry::{IdentityRecord, RegistryConfig, RegistryState, StateSnapshot};
use eip_identity_types::{Principal, PRINCIPAL_BYTES};
use parking_lot::RwLock;
use sled::transaction::{ConflictableTransactionError, TransactionError, Transactional};
use sled::{Db, IVec, Tree};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::info;

const ADMINISTRATOR_KEY: &[u8] = b"administrator";
const HEIGHT_KEY: &[u8] = b"height";

/// Storage errors
#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Corrupt state: {0}")]
    Corrupt(String),
    #[error("Administrator mismatch: stored {stored}, configured {configured}")]
    AdministratorMismatch {
        stored: Principal,
        configured: Principal,
    },
}

/// Abstract storage trait
pub trait RegistryStorage {
    /// Last committed state, or `None` before the first commit.
    fn load(&self) -> Result<Option<StateSnapshot>>;
    /// Replace the persisted state and height in one atomic write.
    fn commit(&self, snapshot: &StateSnapshot, height: u64) -> Result<()>;
    fn height(&self) -> Result<u64>;
}

/// Restore committed state, or deploy a fresh registry if nothing is stored.
pub fn load_or_deploy<S: RegistryStorage + ?Sized>(
    storage: &S,
    config: &RegistryConfig,
) -> Result<RegistryState> {
    let Some(snapshot) = storage.load()? else {
        info!(administrator = %config.administrator, "deploying fresh registry");
        return Ok(RegistryState::new(config.clone()));
    };

    if snapshot.administrator != config.administrator {
        return Err(StorageError::AdministratorMismatch {
            stored: snapshot.administrator,
            configured: config.administrator,
        }
        .into());
    }

    let state = RegistryState::from_snapshot(snapshot, config.limits)?;
    info!(
        identities = state.identities().len(),
        attestors = state.attestors().len(),
        "registry state restored"
    );
    Ok(state)
}

/// Sled-backed implementation
pub struct SledStorage {
    db: Db,
    identities: Tree,
    handles: Tree,
    attestors: Tree,
    metadata: Tree,
}

impl SledStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path)?;
        let identities = db.open_tree("identities")?;
        let handles = db.open_tree("handles")?;
        let attestors = db.open_tree("attestors")?;
        let metadata = db.open_tree("metadata")?;

        Ok(Self {
            db,
            identities,
            handles,
            attestors,
            metadata,
        })
    }

    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }

    fn load_records(&self) -> Result<Vec<IdentityRecord>> {
        let mut records = Vec::new();
        for item in self.identities.iter() {
            let (_, value) = item?;
            let record: IdentityRecord = serde_json::from_slice(&value)?;
            records.push(record);
        }
        Ok(records)
    }

    /// Every record must be reachable through the handle index and the index
    /// must hold nothing else.
    fn check_index(&self, records: &[IdentityRecord]) -> Result<()> {
        if self.handles.len() != records.len() {
            return Err(StorageError::Corrupt(format!(
                "{} handle entries for {} identities",
                self.handles.len(),
                records.len()
            ))
            .into());
        }
        for record in records {
            let indexed = self.handles.get(record.handle.as_str().as_bytes())?;
            if indexed.as_deref() != Some(record.owner.as_bytes().as_slice()) {
                return Err(StorageError::Corrupt(format!(
                    "handle {} not indexed to {}",
                    record.handle, record.owner
                ))
                .into());
            }
        }
        Ok(())
    }
}

fn principal_from(bytes: &[u8]) -> Result<Principal> {
    let raw: [u8; PRINCIPAL_BYTES] = bytes
        .try_into()
        .map_err(|_| StorageError::Corrupt(format!("principal key of {} bytes", bytes.len())))?;
    Ok(Principal::new(raw))
}

fn stale_keys(tree: &Tree, keep: &BTreeSet<Vec<u8>>) -> Result<Vec<IVec>> {
    let mut stale = Vec::new();
    for key in tree.iter().keys() {
        let key = key?;
        if !keep.contains(&key[..]) {
            stale.push(key);
        }
    }
    Ok(stale)
}

impl RegistryStorage for SledStorage {
    fn load(&self) -> Result<Option<StateSnapshot>> {
        let Some(admin) = self.metadata.get(ADMINISTRATOR_KEY)? else {
            return Ok(None);
        };
        let administrator = principal_from(&admin)?;

        let identities = self.load_records()?;
        self.check_index(&identities)?;

        let mut attestors = Vec::new();
        for key in self.attestors.iter().keys() {
            attestors.push(principal_from(&key?)?);
        }

        Ok(Some(StateSnapshot {
            administrator,
            identities,
            attestors,
        }))
    }

    fn commit(&self, snapshot: &StateSnapshot, height: u64) -> Result<()> {
        let mut identity_rows = Vec::with_capacity(snapshot.identities.len());
        let mut handle_rows = Vec::with_capacity(snapshot.identities.len());
        for record in &snapshot.identities {
            identity_rows.push((record.owner.as_bytes().to_vec(), serde_json::to_vec(record)?));
            handle_rows.push((
                record.handle.as_str().as_bytes().to_vec(),
                record.owner.as_bytes().to_vec(),
            ));
        }
        let attestor_rows: Vec<Vec<u8>> = snapshot
            .attestors
            .iter()
            .map(|p| p.as_bytes().to_vec())
            .collect();

        let keep = |rows: &[(Vec<u8>, Vec<u8>)]| -> BTreeSet<Vec<u8>> {
            rows.iter().map(|(k, _)| k.clone()).collect()
        };
        let stale_identities = stale_keys(&self.identities, &keep(&identity_rows))?;
        let stale_handles = stale_keys(&self.handles, &keep(&handle_rows))?;
        let stale_attestors =
            stale_keys(&self.attestors, &attestor_rows.iter().cloned().collect())?;

        (&self.identities, &self.handles, &self.attestors, &self.metadata)
            .transaction(|(identities, handles, attestors, metadata)| {
                for key in &stale_identities {
                    identities.remove(key.clone())?;
                }
                for key in &stale_handles {
                    handles.remove(key.clone())?;
                }
                for key in &stale_attestors {
                    attestors.remove(key.clone())?;
                }
                for (key, value) in &identity_rows {
                    identities.insert(key.as_slice(), value.as_slice())?;
                }
                for (key, value) in &handle_rows {
                    handles.insert(key.as_slice(), value.as_slice())?;
                }
                for key in &attestor_rows {
                    attestors.insert(key.as_slice(), &[] as &[u8])?;
                }
                metadata.insert(ADMINISTRATOR_KEY, snapshot.administrator.as_bytes().as_slice())?;
                metadata.insert(HEIGHT_KEY, &height.to_be_bytes()[..])?;
                Ok::<(), ConflictableTransactionError<StorageError>>(())
            })
            .map_err(|err| match err {
                TransactionError::Abort(err) => err,
                TransactionError::Storage(err) => StorageError::Database(err),
            })?;

        info!(
            height,
            identities = snapshot.identities.len(),
            attestors = snapshot.attestors.len(),
            "registry state committed"
        );
        Ok(())
    }

    fn height(&self) -> Result<u64> {
        let Some(raw) = self.metadata.get(HEIGHT_KEY)? else {
            return Ok(0);
        };
        let bytes: [u8; 8] = raw
            .as_ref()
            .try_into()
            .map_err(|_| StorageError::Corrupt("height is not 8 bytes".into()))?;
        Ok(u64::from_be_bytes(bytes))
    }
}

/// In-memory implementation for tests and ephemeral hosts.
#[derive(Default)]
pub struct MemoryStorage {
    state: RwLock<Option<StateSnapshot>>,
    height: RwLock<u64>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RegistryStorage for MemoryStorage {
    fn load(&self) -> Result<Option<StateSnapshot>> {
        Ok(self.state.read().clone())
    }

    fn commit(&self, snapshot: &StateSnapshot, height: u64) -> Result<()> {
        // Both locks held so readers never see a snapshot/height mismatch.
        let mut state = self.state.write();
        let mut current = self.height.write();
        *state = Some(snapshot.clone());
        *current = height;
        Ok(())
    }

    fn height(&self) -> Result<u64> {
        Ok(*self.height.read())
    }
}
