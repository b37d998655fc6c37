//! Identity registry state-transition core.
//!
//! An account binds one unique handle to its principal, may later update that
//! binding, and an administrator fixed at deployment manages a set of
//! attestors who can vouch for identities. Every entry point takes the caller
//! explicitly and either fully applies its effect or leaves state untouched.

pub mod attestors;
pub mod config;
pub mod dispatcher;
pub mod errors;
pub mod guard;
pub mod shared;
pub mod state;
pub mod store;
pub mod types;

pub use attestors::AttestorSet;
pub use config::*;
pub use dispatcher::{functions, Dispatcher, Operation};
pub use errors::*;
pub use guard::{Guard, Role};
pub use shared::SharedRegistry;
pub use state::{RegistryState, StateError, StateSnapshot};
pub use store::IdentityStore;
pub use types::*;
