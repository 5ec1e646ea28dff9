//! Pagination cursor.

use serde::{Deserialize, Serialize};

use crate::error::{Error, InvalidInputError};

/// Describes the next page to request: records `[skip, skip + limit)`.
///
/// `limit` is always positive; this is checked at construction and on
/// deserialization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawCursor")]
pub struct Cursor {
    skip: u64,
    limit: u64,
}

#[derive(Deserialize)]
struct RawCursor {
    skip: u64,
    limit: u64,
}

impl TryFrom<RawCursor> for Cursor {
    type Error = Error;

    fn try_from(raw: RawCursor) -> Result<Self, Self::Error> {
        Cursor::new(raw.skip, raw.limit)
    }
}

impl Cursor {
    /// Create a cursor.
    ///
    /// # Errors
    ///
    /// Returns an error if `limit` is zero.
    pub fn new(skip: u64, limit: u64) -> Result<Self, Error> {
        if limit == 0 {
            return Err(InvalidInputError::Cursor {
                reason: "limit must be greater than zero".to_string(),
            }
            .into());
        }
        Ok(Self { skip, limit })
    }

    /// The initial cursor for a page size.
    pub fn first(limit: u64) -> Result<Self, Error> {
        Self::new(0, limit)
    }

    pub fn skip(&self) -> u64 {
        self.skip
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// One past the last index this cursor covers.
    pub fn end(&self) -> u64 {
        self.skip.saturating_add(self.limit)
    }

    /// The cursor for the following page.
    pub fn advance(&self) -> Self {
        Self {
            skip: self.end(),
            limit: self.limit,
        }
    }

    /// Whether this is the first page.
    pub fn is_first(&self) -> bool {
        self.skip == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_cursor_starts_at_zero() {
        let cursor = Cursor::first(25).unwrap();
        assert_eq!(cursor.skip(), 0);
        assert_eq!(cursor.limit(), 25);
        assert!(cursor.is_first());
    }

    #[test]
    fn advance_moves_by_limit() {
        let cursor = Cursor::first(25).unwrap().advance().advance();
        assert_eq!(cursor.skip(), 50);
        assert_eq!(cursor.end(), 75);
        assert!(!cursor.is_first());
    }

    #[test]
    fn zero_limit_rejected() {
        assert!(Cursor::new(10, 0).is_err());
        assert!(serde_json::from_str::<Cursor>(r#"{"skip":0,"limit":0}"#).is_err());
    }

    #[test]
    fn serializes_as_request_body() {
        let cursor = Cursor::new(25, 25).unwrap();
        assert_eq!(
            serde_json::to_value(cursor).unwrap(),
            serde_json::json!({"skip": 25, "limit": 25})
        );
    }
}
