use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of raw bytes contained in a principal.
pub const PRINCIPAL_BYTES: usize = 32;

const PREFIX: char = 'p';

/// Rejections produced when reading a principal from text.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PrincipalError {
    #[error("principal {0:?} does not start with 'p'")]
    MissingPrefix(String),
    #[error("principal body is {0} characters, expected 64")]
    BodyLength(usize),
    #[error("principal body is not hex: {0}")]
    NotHex(#[from] hex::FromHexError),
}

/// Caller identity as asserted by the execution environment.
///
/// Text form is `p` followed by 64 lowercase hex digits. Every registry
/// operation receives the caller explicitly; there is no ambient sender.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Principal(pub [u8; PRINCIPAL_BYTES]);

impl Principal {
    pub const fn new(bytes: [u8; PRINCIPAL_BYTES]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; PRINCIPAL_BYTES] {
        &self.0
    }
}

impl From<[u8; PRINCIPAL_BYTES]> for Principal {
    fn from(value: [u8; PRINCIPAL_BYTES]) -> Self {
        Principal(value)
    }
}

impl FromStr for Principal {
    type Err = PrincipalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let body = s
            .strip_prefix(PREFIX)
            .ok_or_else(|| PrincipalError::MissingPrefix(s.to_string()))?;
        if body.len() != PRINCIPAL_BYTES * 2 {
            return Err(PrincipalError::BodyLength(body.len()));
        }

        let mut bytes = [0u8; PRINCIPAL_BYTES];
        hex::decode_to_slice(body, &mut bytes)?;
        Ok(Principal(bytes))
    }
}

impl TryFrom<String> for Principal {
    type Error = PrincipalError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Principal> for String {
    fn from(value: Principal) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PREFIX}{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form keeps tracing output readable.
        write!(f, "Principal({PREFIX}{}..)", hex::encode(&self.0[..4]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_for(byte: &str) -> String {
        format!("p{}", byte.repeat(PRINCIPAL_BYTES))
    }

    #[test]
    fn display_parses_back_to_same_principal() {
        let wallet = Principal::new([0xAB; PRINCIPAL_BYTES]);
        let text = wallet.to_string();
        assert_eq!(text, text_for("ab"));
        assert_eq!(text.parse::<Principal>().unwrap(), wallet);
    }

    #[test]
    fn parse_tolerates_whitespace_and_uppercase_hex() {
        let parsed: Principal = format!("  {}\n", text_for("CD")).parse().unwrap();
        assert_eq!(parsed, Principal::new([0xCD; PRINCIPAL_BYTES]));
        assert_eq!(parsed.to_string(), text_for("cd"));
    }

    #[test]
    fn wrong_prefix_is_reported_with_input() {
        let err = text_for("00").replacen('p', "i", 1).parse::<Principal>().unwrap_err();
        assert!(matches!(err, PrincipalError::MissingPrefix(ref s) if s.starts_with('i')));
    }

    #[test]
    fn short_and_long_bodies_rejected() {
        let short = format!("p{}", "00".repeat(PRINCIPAL_BYTES - 1));
        assert_eq!(
            short.parse::<Principal>().unwrap_err(),
            PrincipalError::BodyLength(62)
        );
        let long = format!("{}0", text_for("00"));
        assert_eq!(
            long.parse::<Principal>().unwrap_err(),
            PrincipalError::BodyLength(65)
        );
    }

    #[test]
    fn non_hex_body_rejected() {
        let err = text_for("zz").parse::<Principal>().unwrap_err();
        assert!(matches!(err, PrincipalError::NotHex(_)));
    }

    #[test]
    fn debug_is_abbreviated() {
        let wallet = Principal::new([0x01; PRINCIPAL_BYTES]);
        assert_eq!(format!("{wallet:?}"), "Principal(p01010101..)");
    }

    #[test]
    fn json_uses_text_form() {
        let principal = Principal::new([7u8; PRINCIPAL_BYTES]);
        let json = serde_json::to_string(&principal).unwrap();
        assert_eq!(json, format!("\"{principal}\""));
        assert_eq!(serde_json::from_str::<Principal>(&json).unwrap(), principal);

        let bad: Result<Principal, _> = serde_json::from_str("\"not-a-principal\"");
        assert!(bad.is_err());
    }
}
