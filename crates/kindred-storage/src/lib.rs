//! Persistence engine for the kindred data model.
//!
//! A minimal object-relational layer over SQLite: generic CRUD operations
//! (save, find-by-id, find-all, count, delete, delete-many, update)
//! parameterized over an entity kind, plus the entity-graph reconstructor
//! that folds a flattened outer-join cursor back into one hydrated parent
//! entity per call.
//!
//! # Architecture
//!
//! - [`CrudRepository`] carries the six operations as provided trait
//!   methods; concrete repositories supply their connection, statement
//!   registry, and alias cache, and may override the save hooks.
//! - Statement text is resolved per operation through a
//!   [`StatementRegistry`]: declared statements first, built-in defaults
//!   second, and a lazy error when neither exists.
//! - Find queries are materialized into a scrollable [`RowCursor`]; entity
//!   kinds extract themselves from it through the [`Entity`] capability
//!   contract.
//!
//! # Modules
//!
//! - [`error`]: StorageError enum with all failure modes
//! - [`statement`]: CrudOperation and the per-repository statement registry
//! - [`cursor`]: RowCursor adapter and the alias-to-index cache
//! - [`entity`]: the Entity capability contract
//! - [`repository`]: the generic CRUD engine and its error policy
//! - [`schema`]: SQLite setup and embedded migrations
//! - [`person`]: PersonRepository and the graph reconstructor
//! - [`address`]: AddressRepository, the nested one-to-one sub-repository

pub mod address;
pub mod cursor;
pub mod entity;
pub mod error;
pub mod person;
pub mod repository;
pub mod schema;
pub mod statement;

// Re-export key types for ergonomic use.
pub use address::AddressRepository;
pub use cursor::{AliasIndexCache, RowCursor};
pub use entity::Entity;
pub use error::StorageError;
pub use person::PersonRepository;
pub use repository::{CrudRepository, ErrorPolicy};
pub use statement::{CrudOperation, StatementRegistry};
