//! Value objects: equality by value, not identity.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values. An
/// `Email` is a value object; a `User` (identified by `UserId`) is an entity.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

/// A syntactically valid e-mail address.
///
/// Checks shape only: one `@`, a non-empty local part, a dotted domain and
/// no whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl ValueObject for Email {}

impl Email {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let value = raw.trim();
        if value.is_empty() {
            return Err(DomainError::validation("email is required"));
        }
        if value.chars().any(char::is_whitespace) {
            return Err(DomainError::validation("email must not contain spaces"));
        }

        let (local, domain) = value
            .split_once('@')
            .ok_or_else(|| DomainError::validation("email must contain '@'"))?;

        let domain_ok = !domain.contains('@')
            && domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.')
            && !domain.contains("..");

        if local.is_empty() || !domain_ok {
            return Err(DomainError::validation("enter a valid email address"));
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Email {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Email {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}
