//! Stable identifier newtypes for persisted entities.
//!
//! All identifiers are distinct newtype wrappers over `i64`, providing type
//! safety so that a `PersonId` cannot be accidentally used where an
//! `AddressId` is expected. An entity carries no identifier until the store
//! assigns one at insert time; the inner `i64` aligns with SQLite's
//! `INTEGER PRIMARY KEY`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a persisted person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PersonId(pub i64);

/// Identifier of a persisted address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AddressId(pub i64);

// Display implementations -- just print the inner value.

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for AddressId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Bridges to and from the store's raw rowid type.

impl From<i64> for PersonId {
    fn from(raw: i64) -> Self {
        PersonId(raw)
    }
}

impl From<PersonId> for i64 {
    fn from(id: PersonId) -> Self {
        id.0
    }
}

impl From<i64> for AddressId {
    fn from(raw: i64) -> Self {
        AddressId(raw)
    }
}

impl From<AddressId> for i64 {
    fn from(id: AddressId) -> Self {
        id.0
    }
}
