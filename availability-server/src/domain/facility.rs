//! Facility identifiers.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Error returned when parsing an invalid facility identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid facility id: {reason}")]
pub struct InvalidFacilityId {
    reason: &'static str,
}

/// Opaque identifier for one facility or sub-facility (e.g. "1060a").
///
/// Identifiers are non-empty, at most 64 characters, and contain no
/// whitespace, `_` or path separators, since they become part of storage
/// ids and file names.
///
/// # Examples
///
/// ```
/// use availability_server::domain::FacilityId;
///
/// let id = FacilityId::parse("1060a").unwrap();
/// assert_eq!(id.as_str(), "1060a");
///
/// assert!(FacilityId::parse("").is_err());
/// assert!(FacilityId::parse("10 60").is_err());
/// assert!(FacilityId::parse("a_b").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FacilityId(String);

impl FacilityId {
    /// Parse a facility identifier. Surrounding whitespace is trimmed.
    pub fn parse(s: &str) -> Result<Self, InvalidFacilityId> {
        let s = s.trim();

        if s.is_empty() {
            return Err(InvalidFacilityId {
                reason: "must not be empty",
            });
        }

        if s.chars().count() > 64 {
            return Err(InvalidFacilityId {
                reason: "must be at most 64 characters",
            });
        }

        if s
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '_' | '/' | '\\' | '.'))
        {
            return Err(InvalidFacilityId {
                reason: "must not contain whitespace, '_', '.', or path separators",
            });
        }

        Ok(Self(s.to_string()))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for FacilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FacilityId({})", self.0)
    }
}

impl fmt::Display for FacilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for FacilityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for FacilityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        FacilityId::parse(&s).map_err(serde::de::Error::custom)
    }
}
