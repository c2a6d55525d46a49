//! Session identifier type.

use std::fmt;
use std::str::FromStr;

use crate::error::StoreError;

/// Server-assigned identifier of a session.
///
/// Displayed as `0x` followed by 16 hexadecimal digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    /// Get the raw u64 value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Create a SessionId from a raw u64 value.
    pub fn from_raw(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016x}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix("0x")
            .filter(|hex| !hex.is_empty())
            .and_then(|hex| u64::from_str_radix(hex, 16).ok())
            .map(SessionId)
            .ok_or_else(|| StoreError::BadArguments(format!("session id {s:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_display_format() {
        assert_eq!(SessionId::from_raw(255).to_string(), "0x00000000000000ff");
        assert_eq!(
            SessionId::from_raw(0x1000_0000_0000_0001).to_string(),
            "0x1000000000000001"
        );
    }

    #[test]
    fn test_parse_valid() {
        let id: SessionId = "0x00000000000000ff".parse().unwrap();
        assert_eq!(id.as_u64(), 255);

        let short: SessionId = "0x2a".parse().unwrap();
        assert_eq!(short.as_u64(), 42);
    }

    #[test]
    fn test_parse_invalid() {
        assert!("ff".parse::<SessionId>().is_err());
        assert!("0x".parse::<SessionId>().is_err());
        assert!("0xzz".parse::<SessionId>().is_err());
        assert!("".parse::<SessionId>().is_err());
    }

    #[test]
    fn test_roundtrip() {
        let original = SessionId::from_raw(0xdead_beef_0000_0007);
        let parsed: SessionId = original.to_string().parse().unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_hash_eq() {
        let mut set = HashSet::new();
        set.insert(SessionId::from_raw(42));
        assert!(set.contains(&SessionId::from_raw(42)));
        assert!(!set.contains(&SessionId::from_raw(43)));
    }
}
