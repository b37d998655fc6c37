//! Shared types for the identity registry: caller principals, call argument
//! values, contract calls and their receipts.

pub mod call;
pub mod principal;
pub mod value;

pub use call::*;
pub use principal::*;
pub use value::*;
