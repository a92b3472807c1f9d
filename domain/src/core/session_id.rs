//! Session identifier value object.

use super::error::DomainError;
use serde::{Deserialize, Serialize};

/// Stable external identifier of one end-to-end task execution.
///
/// Session ids name a directory in file-backed stores, so they must be a
/// single non-empty path component.
///
/// # Example
///
/// ```
/// use maker_domain::SessionId;
///
/// assert!(SessionId::parse("run-2024-01").is_ok());
/// assert!(SessionId::parse("../etc").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
    /// Validate and wrap a session id.
    pub fn parse(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        let invalid = id.is_empty()
            || id == "."
            || id == ".."
            || id.contains(['/', '\\', '\0'])
            || id.chars().any(char::is_control);
        if invalid {
            return Err(DomainError::InvalidSessionId(id));
        }
        Ok(Self(id))
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SessionId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

impl std::str::FromStr for SessionId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_plain_ids() {
        assert_eq!(SessionId::parse("abc").unwrap().as_str(), "abc");
        assert_eq!(SessionId::parse("hanoi_10.disks").unwrap().as_str(), "hanoi_10.disks");
    }

    #[test]
    fn test_rejects_path_like_ids() {
        for bad in ["", ".", "..", "a/b", "a\\b", "x\ny"] {
            assert!(SessionId::parse(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_serde_roundtrip_validates() {
        let id: SessionId = serde_json::from_str("\"s1\"").unwrap();
        assert_eq!(id.to_string(), "s1");
        assert!(serde_json::from_str::<SessionId>("\"a/b\"").is_err());
    }
}
