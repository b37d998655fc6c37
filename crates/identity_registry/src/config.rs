//! Deployment configuration for the registry

use eip_identity_types::Principal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_MAX_HANDLE_BYTES: usize = 64;
pub const DEFAULT_MAX_DESCRIPTION_BYTES: usize = 256;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("limit {0} must be greater than zero")]
    ZeroLimit(&'static str),
}

/// Byte bounds applied to call arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub max_handle_bytes: usize,
    pub max_description_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_handle_bytes: DEFAULT_MAX_HANDLE_BYTES,
            max_description_bytes: DEFAULT_MAX_DESCRIPTION_BYTES,
        }
    }
}

impl Limits {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_handle_bytes == 0 {
            return Err(ConfigError::ZeroLimit("max_handle_bytes"));
        }
        if self.max_description_bytes == 0 {
            return Err(ConfigError::ZeroLimit("max_description_bytes"));
        }
        Ok(())
    }
}

/// Fixed at deployment; the administrator never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    pub administrator: Principal,
    #[serde(default)]
    pub limits: Limits,
}

impl RegistryConfig {
    pub fn new(administrator: Principal) -> Self {
        Self {
            administrator,
            limits: Limits::default(),
        }
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.limits.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_limits_rejected() {
        let limits = Limits {
            max_handle_bytes: 0,
            ..Limits::default()
        };
        assert_eq!(
            limits.validate(),
            Err(ConfigError::ZeroLimit("max_handle_bytes"))
        );
        assert!(Limits::default().validate().is_ok());
    }

    #[test]
    fn limits_default_when_absent() {
        let admin = Principal::new([9u8; 32]);
        let raw = format!(r#"{{"administrator":"{admin}"}}"#);
        let config: RegistryConfig = serde_json::from_str(&raw).unwrap();
        assert_eq!(config, RegistryConfig::new(admin));
    }
}
