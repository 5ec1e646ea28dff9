//! Bearer token type.

use std::fmt;

const BEARER_PREFIX: &str = "Bearer ";

/// The access token the backend expects in `Authorization: Bearer ...`.
///
/// Tokens are often copied from a browser session, so surrounding
/// whitespace and a leading `Bearer ` are dropped on construction. The
/// value never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        let token = token.into();
        let trimmed = token.trim();
        let bare = trimmed.strip_prefix(BEARER_PREFIX).unwrap_or(trimmed);
        Self(bare.trim_start().to_string())
    }

    /// The raw token, for headers and the saved configuration only.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The full `Authorization` header value.
    pub fn bearer(&self) -> String {
        format!("{}{}", BEARER_PREFIX, self.0)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(..)")
    }
}
