use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::OperationError;

/// Hex object identifier of a Git object.
///
/// Accepts full 40-digit ids as well as abbreviated ids of at least
/// [`ObjectId::MIN_ABBREV_LEN`] digits. Stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId(String);

impl ObjectId {
    pub const FULL_LEN: usize = 40;
    pub const MIN_ABBREV_LEN: usize = 4;

    pub fn parse(value: &str) -> Result<Self, OperationError> {
        let trimmed = value.trim();
        let valid_len = (Self::MIN_ABBREV_LEN..=Self::FULL_LEN).contains(&trimmed.len());
        if !valid_len || !trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(OperationError::InvalidObjectId {
                value: value.to_string(),
            });
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_abbreviated(&self) -> bool {
        self.0.len() < Self::FULL_LEN
    }

    /// First `len` digits, for display
    pub fn short(&self, len: usize) -> &str {
        &self.0[..len.min(self.0.len())]
    }
}

impl FromStr for ObjectId {
    type Err = OperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Git commit information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    pub id: ObjectId,
    pub author: Author,
    /// First line of the message
    pub summary: String,
    pub message: String,
    pub timestamp: Timestamp,
    pub parent_ids: Vec<ObjectId>,
}

impl Commit {
    pub fn is_merge(&self) -> bool {
        self.parent_ids.len() > 1
    }
}

/// Commit author information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub email: String,
}

/// Commit timestamp (Unix timestamp with timezone offset in minutes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamp {
    pub seconds: i64,
    pub offset_minutes: i32,
}

impl Timestamp {
    pub fn new(seconds: i64, offset_minutes: i32) -> Self {
        Self {
            seconds,
            offset_minutes,
        }
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Simple display - the TUI formats dates with chrono
        write!(f, "{}", self.seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_id_parse_full() {
        let id = ObjectId::parse("0123456789ABCDEF0123456789abcdef01234567").unwrap();
        assert_eq!(id.as_str(), "0123456789abcdef0123456789abcdef01234567");
        assert!(!id.is_abbreviated());
        assert_eq!(id.short(7), "0123456");
    }

    #[test]
    fn test_object_id_parse_abbreviated() {
        let id: ObjectId = "abcd12".parse().unwrap();
        assert!(id.is_abbreviated());
        assert_eq!(id.short(40), "abcd12");
    }

    #[test]
    fn test_object_id_rejects_garbage() {
        for bad in ["", "abc", "xyz12345", "0123456789abcdef0123456789abcdef012345678"] {
            assert!(
                matches!(ObjectId::parse(bad), Err(OperationError::InvalidObjectId { .. })),
                "{bad:?} should be rejected"
            );
        }
    }
}
