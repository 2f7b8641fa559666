//! Entity key - the composite `<Type>.<id>` identity of a stored entity
//!
//! Examples:
//! - `State.4f2a7c1e-0d7b-4f0a-9d59-0a3e5d8a9e11`
//! - `Place.c9b1...`

use crate::entity::EntityKind;
use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Composite key addressing exactly one entity within a store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey {
    pub kind: EntityKind,
    pub id: String,
}

impl EntityKey {
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self { kind, id: id.into() }
    }

    /// Parse a `Type.id` string.
    ///
    /// The type segment must name a registered kind; the id must be non-empty.
    pub fn parse(key: &str) -> Result<Self> {
        let (kind_str, id) = key
            .split_once('.')
            .ok_or_else(|| Error::InvalidKey(format!("{} is not of the form Type.id", key)))?;

        if id.is_empty() {
            return Err(Error::InvalidKey(format!("{} has an empty id", key)));
        }

        let kind = EntityKind::from_str(kind_str)?;
        Ok(Self::new(kind, id))
    }

    /// Type segment of a raw key string, without validating it
    pub fn type_segment(key: &str) -> &str {
        key.split_once('.').map_or(key, |(kind, _)| kind)
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.kind.as_str(), self.id)
    }
}

impl FromStr for EntityKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_format() {
        let key = EntityKey::new(EntityKind::State, "abc-123");
        assert_eq!(key.to_string(), "State.abc-123");
        assert_eq!(EntityKey::parse("State.abc-123").unwrap(), key);
    }

    #[test]
    fn test_key_parse_errors() {
        assert!(matches!(EntityKey::parse("State"), Err(Error::InvalidKey(_))));
        assert!(matches!(EntityKey::parse("State."), Err(Error::InvalidKey(_))));
        assert!(matches!(EntityKey::parse("Ghost.1"), Err(Error::UnknownType(_))));
    }

    #[test]
    fn test_type_segment() {
        assert_eq!(EntityKey::type_segment("City.42"), "City");
        assert_eq!(EntityKey::type_segment("ClassName"), "ClassName");
    }
}
