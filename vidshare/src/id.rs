use std::{fmt, sync::LazyLock};

use nanoid::nanoid;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::RepoError;

/// Canonical alphabet for entity identifiers (no ambiguous glyphs).
const ENTITY_ID_ALPHABET: &[char] = &[
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'J', 'K', 'L', 'M', 'N', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y',
    'Z', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'j', 'm', 'n', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];
/// Default entity id length.
const ENTITY_ID_LENGTH: usize = 20;

// Character class mirrors ENTITY_ID_ALPHABET.
static ENTITY_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-HJ-NP-Za-hjmnp-z]{20}$").expect("entity id pattern is valid"));

/// Generates a new entity identifier using the configured alphabet and length.
pub fn generate_entity_id() -> String {
    nanoid!(ENTITY_ID_LENGTH, ENTITY_ID_ALPHABET)
}

/// Returns `true` if `value` has the shape of an identifier produced by [`generate_entity_id`].
pub fn is_well_formed(value: &str) -> bool {
    ENTITY_ID_PATTERN.is_match(value)
}

/// A well-formed entity identifier.
///
/// Construction always validates, including deserialization, so a malformed
/// id never reaches a store call.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId(String);

impl EntityId {
    /// Generate a fresh id.
    pub fn generate() -> Self {
        Self(generate_entity_id())
    }

    /// Parse a caller-supplied id. `field` names the parameter in the error.
    pub fn parse(field: &'static str, value: &str) -> Result<Self, RepoError> {
        if is_well_formed(value) {
            Ok(Self(value.to_string()))
        } else {
            Err(RepoError::invalid(field, format!("malformed id `{value}`")))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EntityId {
    type Error = RepoError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if is_well_formed(&value) {
            Ok(Self(value))
        } else {
            Err(RepoError::invalid("id", format!("malformed id `{value}`")))
        }
    }
}

impl From<EntityId> for String {
    fn from(value: EntityId) -> Self {
        value.0
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The authenticated actor performing an operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Principal(EntityId);

impl Principal {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }

    /// Build a principal from the authentication context. An absent or
    /// malformed principal is an invalid argument, never "owner = null".
    pub fn require(value: Option<&str>) -> Result<Self, RepoError> {
        let raw = value.ok_or_else(|| RepoError::invalid("principal", "no authenticated principal"))?;
        EntityId::parse("principal", raw).map(Self)
    }

    pub fn id(&self) -> &EntityId {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<EntityId> for Principal {
    fn from(value: EntityId) -> Self {
        Self(value)
    }
}
