//! The generic repository engine.
//!
//! [`CrudRepository`] carries the six CRUD operations as provided trait
//! methods; a concrete repository supplies its connection, statement
//! registry, and alias cache, and may override the save hooks and the error
//! policy. This trait is the whole engine -- repositories contribute
//! statements and mapping, never operation plumbing.
//!
//! The engine never starts or ends transactions; commit and rollback
//! boundaries belong to the caller. Recursive saves are plain sequences of
//! statement executions inside whatever transaction the caller established.

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Params};

use crate::cursor::{AliasIndexCache, RowCursor};
use crate::entity::Entity;
use crate::error::StorageError;
use crate::statement::{CrudOperation, StatementRegistry};

/// How store-execution failures in read and delete operations surface.
///
/// Configuration errors ([`StorageError::StatementNotDefined`]) and
/// integrity errors ([`StorageError::MissingIdentifier`]) are fatal under
/// either policy, and `save`/`update` always propagate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// `find_by_id`, `find_all`, `count`, `delete`, and `delete_many`
    /// degrade to an empty/zero/no-op result with a logged warning.
    #[default]
    Lenient,
    /// Every store failure propagates to the caller.
    Strict,
}

/// Generic CRUD operations over any [`Entity`] kind.
pub trait CrudRepository {
    type Entity: Entity;

    /// The single logical session this repository executes against.
    fn connection(&self) -> &Connection;

    /// Statement resolution table, built at construction.
    fn statements(&self) -> &StatementRegistry;

    /// Alias-to-index cache scoped to this repository instance.
    fn aliases(&self) -> &AliasIndexCache;

    /// See [`ErrorPolicy`].
    fn error_policy(&self) -> ErrorPolicy {
        ErrorPolicy::default()
    }

    /// Runs before the entity's insert parameters are read. Parent
    /// repositories persist one-to-one associations here so the generated
    /// identifiers are available as foreign keys.
    fn before_save(&self, entity: &mut Self::Entity) -> Result<(), StorageError> {
        let _ = entity;
        Ok(())
    }

    /// Runs after the identifier has been assigned. Parent repositories
    /// save children here, once the foreign key they need exists.
    fn post_save(&self, entity: &mut Self::Entity) -> Result<(), StorageError> {
        let _ = entity;
        Ok(())
    }

    /// Inserts the entity and returns it carrying its store-assigned
    /// identifier.
    ///
    /// Every failure past statement resolution is wrapped as
    /// [`StorageError::UnableToSave`] with the entity's description.
    fn save(&self, mut entity: Self::Entity) -> Result<Self::Entity, StorageError> {
        let sql = self.statements().resolve(CrudOperation::Save)?;
        if let Err(err) = self.before_save(&mut entity) {
            return Err(unable_to_save(&entity, err));
        }
        let executed = self
            .connection()
            .prepare_cached(sql)
            .and_then(|mut stmt| stmt.execute(params_from_iter(entity.insert_params())));
        if let Err(err) = executed {
            return Err(unable_to_save(&entity, err.into()));
        }
        let id = self.connection().last_insert_rowid();
        entity.assign_id(id.into());
        if let Err(err) = self.post_save(&mut entity) {
            return Err(unable_to_save(&entity, err));
        }
        Ok(entity)
    }

    /// Fetches one entity by identifier; `None` when no row matches.
    fn find_by_id(
        &self,
        id: <Self::Entity as Entity>::Id,
    ) -> Result<Option<Self::Entity>, StorageError> {
        let sql = self.statements().resolve(CrudOperation::FindById)?;
        let raw: i64 = id.into();
        let fetched = query(self.connection(), sql, params![raw]).and_then(|mut cursor| {
            if cursor.advance() {
                Self::Entity::from_cursor(&mut cursor, self.aliases())
            } else {
                Ok(None)
            }
        });
        match fetched {
            Ok(found) => Ok(found),
            Err(err) => degrade(self.error_policy(), "find_by_id", err, None),
        }
    }

    /// Fetches every entity the FindAll statement produces, in cursor order.
    fn find_all(&self) -> Result<Vec<Self::Entity>, StorageError> {
        let sql = self.statements().resolve(CrudOperation::FindAll)?;
        let mut entities = Vec::new();
        let mut cursor = match query(self.connection(), sql, []) {
            Ok(cursor) => cursor,
            Err(err) => return degrade(self.error_policy(), "find_all", err, entities),
        };
        while cursor.advance() {
            match Self::Entity::from_cursor(&mut cursor, self.aliases()) {
                Ok(Some(entity)) => entities.push(entity),
                Ok(None) => break,
                // Under the lenient policy the entities accumulated so far
                // are still returned.
                Err(err) => return degrade(self.error_policy(), "find_all", err, entities),
            }
        }
        Ok(entities)
    }

    /// Number of stored entities; 0 when the count query yields no row.
    fn count(&self) -> Result<i64, StorageError> {
        let sql = self.statements().resolve(CrudOperation::AllCount)?;
        let counted = self.connection().prepare_cached(sql).and_then(|mut stmt| {
            let mut rows = stmt.query([])?;
            match rows.next()? {
                Some(row) => row.get(0),
                None => Ok(0),
            }
        });
        match counted {
            Ok(count) => Ok(count),
            Err(err) => degrade(self.error_policy(), "count", err.into(), 0),
        }
    }

    /// Deletes one entity by identifier.
    ///
    /// The caller's in-memory instance keeps its identifier; discarding the
    /// stale reference is the caller's responsibility.
    fn delete(&self, entity: &Self::Entity) -> Result<(), StorageError> {
        let sql = self.statements().resolve(CrudOperation::Delete)?;
        let id = require_id(entity)?;
        let executed = self
            .connection()
            .prepare_cached(sql)
            .and_then(|mut stmt| stmt.execute(params![id]));
        match executed {
            Ok(_) => Ok(()),
            Err(err) => degrade(self.error_policy(), "delete", err.into(), ()),
        }
    }

    /// Deletes all given entities with a single batched statement.
    ///
    /// The DeleteMany template's literal `:ids` token is substituted with
    /// the comma-joined identifiers rather than bound as parameters. The
    /// interpolated values are store-generated integers, never user input;
    /// that constraint is part of the statement contract.
    fn delete_many(&self, entities: &[Self::Entity]) -> Result<(), StorageError> {
        let template = self.statements().resolve(CrudOperation::DeleteMany)?;
        let mut ids = Vec::with_capacity(entities.len());
        for entity in entities {
            ids.push(require_id(entity)?.to_string());
        }
        let sql = template.replace(":ids", &ids.join(","));
        match self.connection().execute(&sql, []) {
            Ok(_) => Ok(()),
            Err(err) => degrade(self.error_policy(), "delete_many", err.into(), ()),
        }
    }

    /// Rewrites the fields the Update statement targets; every other column
    /// is untouched. Propagates failures.
    fn update(&self, entity: &Self::Entity) -> Result<(), StorageError> {
        let sql = self.statements().resolve(CrudOperation::Update)?;
        let id = require_id(entity)?;
        let mut params = entity.update_params();
        params.push(Value::Integer(id));
        let mut stmt = self.connection().prepare_cached(sql)?;
        stmt.execute(params_from_iter(params))?;
        Ok(())
    }
}

/// Materializes a statement's result into a [`RowCursor`].
fn query(conn: &Connection, sql: &str, params: impl Params) -> Result<RowCursor, StorageError> {
    let mut stmt = conn.prepare_cached(sql)?;
    RowCursor::from_stmt(&mut stmt, params)
}

fn require_id<T: Entity>(entity: &T) -> Result<i64, StorageError> {
    entity
        .id()
        .map(Into::into)
        .ok_or_else(|| StorageError::MissingIdentifier {
            entity: entity.describe(),
        })
}

fn unable_to_save<T: Entity>(entity: &T, source: StorageError) -> StorageError {
    StorageError::UnableToSave {
        entity: entity.describe(),
        source: Box::new(source),
    }
}

/// Applies the repository's [`ErrorPolicy`] to a failed read or delete.
fn degrade<T>(
    policy: ErrorPolicy,
    operation: &str,
    err: StorageError,
    fallback: T,
) -> Result<T, StorageError> {
    match policy {
        ErrorPolicy::Strict => Err(err),
        ErrorPolicy::Lenient => {
            tracing::warn!("{} degraded after store error: {}", operation, err);
            Ok(fallback)
        }
    }
}
