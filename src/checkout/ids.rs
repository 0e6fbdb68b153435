//! Client-generated identifiers

use serde::{Deserialize, Serialize};

use crate::errors::{CheckoutError, CheckoutResult};

/// Booking correlation identifier.
///
/// Generated client-side before the server assigns a canonical booking id,
/// and sent with every confirmation attempt for the same draft so the server
/// can deduplicate retries. Canonical hyphenated UUID form on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Generates a fresh identifier from the platform's secure random source.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Parses an identifier, rejecting anything not in canonical form.
    pub fn parse(raw: &str) -> CheckoutResult<Self> {
        if !Self::is_canonical(raw) {
            return Err(CheckoutError::MalformedIdentifier("correlation"));
        }
        Ok(Self(raw.to_ascii_lowercase()))
    }

    /// Whether a string is a canonical hyphenated UUID (case-insensitive).
    ///
    /// Generation cannot produce anything else; this is a defensive check
    /// run before an identifier goes on the wire.
    #[must_use]
    pub fn is_canonical(raw: &str) -> bool {
        let bytes = raw.as_bytes();
        if bytes.len() != 36 {
            return false;
        }
        bytes.iter().enumerate().all(|(i, b)| match i {
            8 | 13 | 18 | 23 => *b == b'-',
            _ => b.is_ascii_hexdigit(),
        })
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Client-side identifier of an in-progress booking draft.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DraftId(String);

impl DraftId {
    /// Generates a new draft ID.
    #[must_use]
    pub fn new() -> Self {
        Self(format!("draft-{}", uuid::Uuid::new_v4()))
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for DraftId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DraftId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
