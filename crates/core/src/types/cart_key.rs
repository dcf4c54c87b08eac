//! Cart key type.

use core::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Errors that can occur when parsing a [`CartKey`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartKeyError {
    /// The input string is empty.
    #[error("cart key cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("cart key must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input has leading/trailing whitespace or control characters.
    #[error("cart key contains whitespace or control characters")]
    InvalidCharacters,
}

/// Opaque identifier grouping cart rows into one shopping cart.
///
/// Usually the visitor's session key, but any short string works: the
/// checkout layer never interprets it.
///
/// ## Constraints
///
/// - Length: 1-40 characters (the `VARCHAR(40)` column)
/// - No whitespace or control characters
///
/// ## Examples
///
/// ```
/// use cartwright_core::CartKey;
///
/// assert!(CartKey::parse("s3ss10nk3y").is_ok());
/// assert!(CartKey::parse("").is_err());
/// assert!(CartKey::parse("has space").is_err());
///
/// let fresh = CartKey::generate();
/// assert_eq!(fresh.as_str().len(), 32);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct CartKey(String);

impl CartKey {
    /// Maximum length of a cart key.
    pub const MAX_LENGTH: usize = 40;

    /// Parse a `CartKey` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, longer than 40 characters, or
    /// contains whitespace or control characters.
    pub fn parse(s: &str) -> Result<Self, CartKeyError> {
        if s.is_empty() {
            return Err(CartKeyError::Empty);
        }

        if s.chars().count() > Self::MAX_LENGTH {
            return Err(CartKeyError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if s.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(CartKeyError::InvalidCharacters);
        }

        Ok(Self(s.to_owned()))
    }

    /// Generate a fresh random key (32 lowercase hex characters).
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `CartKey` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for CartKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for CartKey {
    type Err = CartKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CartKey {
    type Error = CartKeyError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<CartKey> for String {
    fn from(key: CartKey) -> Self {
        key.0
    }
}

impl AsRef<str> for CartKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for CartKey {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for CartKey {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // Database values are assumed valid
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for CartKey {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_keys() {
        assert!(CartKey::parse("a").is_ok());
        assert!(CartKey::parse("8f14e45fceea167a5a36dedd4bea2543").is_ok());
        assert!(CartKey::parse(&"k".repeat(40)).is_ok());
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(CartKey::parse(""), Err(CartKeyError::Empty));
    }

    #[test]
    fn test_parse_too_long() {
        assert!(matches!(
            CartKey::parse(&"k".repeat(41)),
            Err(CartKeyError::TooLong { max: 40 })
        ));
    }

    #[test]
    fn test_parse_whitespace() {
        assert_eq!(
            CartKey::parse(" padded"),
            Err(CartKeyError::InvalidCharacters)
        );
        assert_eq!(
            CartKey::parse("tab\there"),
            Err(CartKeyError::InvalidCharacters)
        );
    }

    #[test]
    fn test_generate_is_unique_and_valid() {
        let a = CartKey::generate();
        let b = CartKey::generate();
        assert_ne!(a, b);
        assert!(CartKey::parse(a.as_str()).is_ok());
    }

    #[test]
    fn test_deserialize_validates() {
        let result: Result<CartKey, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());

        let key: CartKey = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(key.as_str(), "abc");
    }
}
