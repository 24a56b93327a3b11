//! The parent entity of the kindred data model.
//!
//! [`Person`] is a plain value container: the storage layer owns all mapping
//! logic. A person optionally owns two one-to-one address associations, a
//! back-reference to its parent (as an identifier, not an owning pointer),
//! and a set-like collection of child people.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::id::PersonId;

/// A person record.
///
/// Equality is identity equality: the identifier plus the naming scalars
/// (`first_name`, `last_name`, `dob`). Salary and associations are excluded,
/// so a freshly reloaded person compares equal to the instance it was saved
/// from even before its associations are hydrated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    /// Assigned by the store at insert time; `None` until then.
    pub id: Option<PersonId>,
    pub first_name: String,
    pub last_name: String,
    pub dob: DateTime<Utc>,
    pub salary: f64,
    pub email: Option<String>,
    /// One-to-one associations, owned by value.
    pub home_address: Option<Address>,
    pub business_address: Option<Address>,
    /// Back-reference to the owning parent.
    pub parent_id: Option<PersonId>,
    /// Owned children. Set semantics by identifier; see [`Person::add_child`].
    pub children: Vec<Person>,
}

impl Person {
    /// Creates a transient person with no identifier and no associations.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        dob: DateTime<Utc>,
    ) -> Self {
        Person {
            id: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
            dob,
            salary: 0.0,
            email: None,
            home_address: None,
            business_address: None,
            parent_id: None,
            children: Vec::new(),
        }
    }

    /// Adds a child to the owned collection.
    ///
    /// Children form a set keyed by identifier: re-adding a child whose
    /// identifier is already present is a no-op. Children without an
    /// identifier are always appended.
    pub fn add_child(&mut self, child: Person) {
        if child.id.is_some() && self.children.iter().any(|c| c.id == child.id) {
            return;
        }
        self.children.push(child);
    }
}

impl PartialEq for Person {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.first_name == other.first_name
            && self.last_name == other.last_name
            && self.dob == other.dob
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample(first: &str) -> Person {
        Person::new(
            first,
            "smith",
            Utc.with_ymd_and_hms(1980, 11, 15, 15, 15, 0).unwrap(),
        )
    }

    #[test]
    fn add_child_collapses_duplicate_identifiers() {
        let mut parent = sample("pat");
        let mut child = sample("kim");
        child.id = Some(PersonId(7));

        parent.add_child(child.clone());
        parent.add_child(child);
        assert_eq!(parent.children.len(), 1);
    }

    #[test]
    fn add_child_keeps_transient_children() {
        let mut parent = sample("pat");
        parent.add_child(sample("kim"));
        parent.add_child(sample("kim"));
        // No identifier yet, so there is no identity to collapse on.
        assert_eq!(parent.children.len(), 2);
    }

    #[test]
    fn equality_ignores_salary_and_associations() {
        let mut a = sample("pat");
        a.id = Some(PersonId(1));
        let mut b = a.clone();
        b.salary = 50_000.0;
        b.email = Some("pat@example.com".into());
        b.add_child(sample("kim"));
        assert_eq!(a, b);
    }

    #[test]
    fn equality_distinguishes_identifiers() {
        let mut a = sample("pat");
        a.id = Some(PersonId(1));
        let mut b = a.clone();
        b.id = Some(PersonId(2));
        assert_ne!(a, b);
    }

    #[test]
    fn serde_roundtrip() {
        let mut person = sample("pat");
        person.id = Some(PersonId(3));
        person.email = Some("pat@example.com".into());

        let json = serde_json::to_string(&person).unwrap();
        let back: Person = serde_json::from_str(&json).unwrap();
        assert_eq!(person, back);
        assert_eq!(person.email, back.email);
    }
}
