//! Transaction References
//!
//! Short identifiers correlating a widget instance with server-side
//! transaction state.
//!
//! A reference is eight lowercase hex digits taken from the random bytes of
//! a v4 UUID, with the fifth digit forced into `8..=b` like a UUID variant
//! marker. The hosted surface expects exactly this shape. Thirty-odd bits of
//! randomness are NOT collision-resistant: two references may coincide and
//! must never be used as a security token.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Length of a reference in characters
pub const REFERENCE_LEN: usize = 8;

const VARIANT_NIBBLE: usize = 4;

/// Transaction reference (formatted: `xxxxyxxx`, `y` in `8..=b`)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionReference(String);

impl TransactionReference {
    /// Generate a new reference
    pub fn generate() -> Self {
        let bytes = Uuid::new_v4().into_bytes();
        let reference = bytes[..REFERENCE_LEN / 2]
            .iter()
            .flat_map(|b| [b >> 4, b & 0x0f])
            .enumerate()
            .map(|(i, nibble)| {
                let nibble = if i == VARIANT_NIBBLE {
                    0x8 | (nibble & 0x3)
                } else {
                    nibble
                };
                char::from_digit(u32::from(nibble), 16).unwrap_or('0')
            })
            .collect();
        Self(reference)
    }

    /// Generate a reference guaranteed to differ from `previous`
    pub fn generate_distinct(previous: &str) -> Self {
        loop {
            let reference = Self::generate();
            if reference.as_str() != previous {
                return reference;
            }
        }
    }

    /// Wrap an existing value without validation
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Whether `s` has the shape produced by [`TransactionReference::generate`]
    pub fn is_well_formed(s: &str) -> bool {
        s.len() == REFERENCE_LEN
            && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
            && matches!(s.as_bytes()[VARIANT_NIBBLE], b'8' | b'9' | b'a' | b'b')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TransactionReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_shape() {
        for _ in 0..200 {
            let reference = TransactionReference::generate();
            assert_eq!(reference.as_str().len(), REFERENCE_LEN);
            assert!(
                TransactionReference::is_well_formed(reference.as_str()),
                "bad reference {reference}"
            );
        }
    }

    #[test]
    fn test_generate_distinct() {
        let previous = TransactionReference::generate();
        for _ in 0..50 {
            let next = TransactionReference::generate_distinct(previous.as_str());
            assert_ne!(next, previous);
        }
    }

    #[test]
    fn test_well_formed_rejects() {
        assert!(!TransactionReference::is_well_formed("abcd8ef"));
        assert!(!TransactionReference::is_well_formed("ABCD8EF0"));
        assert!(!TransactionReference::is_well_formed("abcd7ef0"));
        assert!(TransactionReference::is_well_formed("abcdbef0"));
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let reference = TransactionReference::from_string("1234a678");
        assert_eq!(serde_json::to_string(&reference).unwrap(), "\"1234a678\"");
    }
}
