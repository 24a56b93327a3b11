//! Entity data model for kindred.
//!
//! Plain value containers with no persistence behavior: people, their
//! addresses, and the identifier newtypes the storage layer assigns. All
//! mapping to and from the relational store lives in `kindred-storage`;
//! these types can be constructed, compared, and serialized without any
//! database in sight.
//!
//! # Modules
//!
//! - [`id`]: PersonId and AddressId identifier newtypes
//! - [`person`]: the Person entity (parent of the object graph)
//! - [`address`]: the Address sub-entity and its Region enumeration

pub mod address;
pub mod id;
pub mod person;

pub use address::{Address, Region};
pub use id::{AddressId, PersonId};
pub use person::Person;
