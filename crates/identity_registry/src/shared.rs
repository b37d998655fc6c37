//! Shared registry handle for hosts that accept calls from several tasks.
//!
//! Writes take the single lock for the whole call, which gives the
//! serialized, one-call-at-a-time execution the state transitions assume.

use crate::dispatcher::Dispatcher;
use crate::state::{RegistryState, StateSnapshot};
use eip_identity_types::{BlockReceipts, ContractCall, Receipt};
use parking_lot::RwLock;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct SharedRegistry {
    state: Arc<RwLock<RegistryState>>,
}

impl SharedRegistry {
    pub fn new(state: RegistryState) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    pub fn submit(&self, call: &ContractCall) -> Receipt {
        let mut state = self.state.write();
        Dispatcher::execute(&mut state, call)
    }

    pub fn submit_block(&self, height: u64, calls: &[ContractCall]) -> BlockReceipts {
        let mut state = self.state.write();
        Dispatcher::execute_block(&mut state, height, calls)
    }

    pub fn query(&self, call: &ContractCall) -> Receipt {
        let state = self.state.read();
        Dispatcher::query(&state, call)
    }

    /// Run `f` with read access to the state.
    pub fn read<T>(&self, f: impl FnOnce(&RegistryState) -> T) -> T {
        f(&self.state.read())
    }

    pub fn snapshot(&self) -> StateSnapshot {
        self.state.read().snapshot()
    }
}
