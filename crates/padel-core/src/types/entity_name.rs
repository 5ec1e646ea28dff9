//! Entity name type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, InvalidInputError};

const MAX_LEN: usize = 64;

/// A validated backend entity name.
///
/// Entity names select both the REST path segment (`/sale/skip`) and the
/// push stream (`sale`) for a collection of records.
///
/// # Example
///
/// ```
/// use padel_core::EntityName;
///
/// let entity = EntityName::new("sale").unwrap();
/// assert_eq!(entity.as_str(), "sale");
/// assert!(EntityName::new("Sale").is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityName(String);

impl EntityName {
    /// Create a new entity name, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty, too long, or contains anything
    /// other than lowercase ASCII letters, digits, `-` and `_`.
    pub fn new(s: impl Into<String>) -> Result<Self, Error> {
        let s = s.into();
        Self::validate(&s)?;
        Ok(Self(s))
    }

    /// Sales.
    pub fn sale() -> Self {
        Self("sale".to_string())
    }

    /// Staff users.
    pub fn user() -> Self {
        Self("user".to_string())
    }

    /// Roles and their permissions.
    pub fn role() -> Self {
        Self("role".to_string())
    }

    /// Products sold at the front desk.
    pub fn product() -> Self {
        Self("product".to_string())
    }

    /// Returns the entity name string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(s: &str) -> Result<(), Error> {
        if s.is_empty() {
            return Err(InvalidInputError::EntityName {
                value: s.to_string(),
                reason: "cannot be empty".to_string(),
            }
            .into());
        }

        if s.len() > MAX_LEN {
            return Err(InvalidInputError::EntityName {
                value: s.to_string(),
                reason: format!("exceeds maximum length of {} characters", MAX_LEN),
            }
            .into());
        }

        if let Some(c) = s
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-' || *c == '_'))
        {
            return Err(InvalidInputError::EntityName {
                value: s.to_string(),
                reason: format!("contains invalid character '{}'", c),
            }
            .into());
        }

        Ok(())
    }
}

impl fmt::Display for EntityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntityName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for EntityName {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<EntityName> for String {
    fn from(name: EntityName) -> Self {
        name.0
    }
}

impl AsRef<str> for EntityName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
