//! Error types for the identity registry

use thiserror::Error;

/// Stable numeric error codes. External callers branch on these, so they
/// must never be renumbered.
pub mod codes {
    pub const ERR_UNAUTHORIZED: u32 = 100;
    pub const ERR_IDENTITY_EXISTS: u32 = 201;
    pub const ERR_IDENTITY_NOT_FOUND: u32 = 202;
    pub const ERR_HANDLE_TAKEN: u32 = 203;
    pub const ERR_MALFORMED_INPUT: u32 = 204;
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Unauthorized: caller lacks the required role")]
    Unauthorized,

    #[error("Identity already exists for caller")]
    IdentityAlreadyExists,

    #[error("Identity not found")]
    IdentityNotFound,

    #[error("Handle already taken: {handle}")]
    HandleTaken { handle: String },

    #[error("Malformed input: {0}")]
    MalformedInput(String),
}

impl RegistryError {
    pub fn code(&self) -> u32 {
        match self {
            RegistryError::Unauthorized => codes::ERR_UNAUTHORIZED,
            RegistryError::IdentityAlreadyExists => codes::ERR_IDENTITY_EXISTS,
            RegistryError::IdentityNotFound => codes::ERR_IDENTITY_NOT_FOUND,
            RegistryError::HandleTaken { .. } => codes::ERR_HANDLE_TAKEN,
            RegistryError::MalformedInput(_) => codes::ERR_MALFORMED_INPUT,
        }
    }

    /// Contract-style constant name for the error.
    pub fn name(&self) -> &'static str {
        match self {
            RegistryError::Unauthorized => "ERR-UNAUTHORIZED",
            RegistryError::IdentityAlreadyExists => "ERR-IDENTITY-EXISTS",
            RegistryError::IdentityNotFound => "ERR-IDENTITY-NOT-FOUND",
            RegistryError::HandleTaken { .. } => "ERR-HANDLE-TAKEN",
            RegistryError::MalformedInput(_) => "ERR-MALFORMED-INPUT",
        }
    }

    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        RegistryError::MalformedInput(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;
