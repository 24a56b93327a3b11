//! Operation kinds and the per-repository statement registry.
//!
//! Every repository resolves an operation to concrete statement text through
//! a [`StatementRegistry`]: explicitly declared statements are consulted
//! first (in declaration order), then built-in defaults supplied by the
//! repository implementation. A repository need not define statements for
//! operations it never invokes -- the lookup fails lazily, at first use.

use std::collections::HashMap;
use std::fmt;

use crate::error::StorageError;

/// The closed set of operations a repository can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrudOperation {
    Save,
    FindById,
    FindAll,
    AllCount,
    Delete,
    DeleteMany,
    Update,
}

impl fmt::Display for CrudOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CrudOperation::Save => "save",
            CrudOperation::FindById => "find-by-id",
            CrudOperation::FindAll => "find-all",
            CrudOperation::AllCount => "count",
            CrudOperation::Delete => "delete",
            CrudOperation::DeleteMany => "delete-many",
            CrudOperation::Update => "update",
        };
        f.write_str(label)
    }
}

/// Per-repository table mapping operations to statement text.
///
/// Built once at repository construction -- a static configuration table,
/// not runtime introspection. Declared statements take precedence over
/// defaults; among multiple declarations for the same operation the first
/// wins.
#[derive(Debug, Clone)]
pub struct StatementRegistry {
    entity: &'static str,
    declared: Vec<(CrudOperation, String)>,
    defaults: HashMap<CrudOperation, String>,
}

impl StatementRegistry {
    /// Creates an empty registry for the named entity kind.
    pub fn new(entity: &'static str) -> Self {
        StatementRegistry {
            entity,
            declared: Vec::new(),
            defaults: HashMap::new(),
        }
    }

    /// Declares statement text for an operation, overriding any default.
    pub fn declare(mut self, operation: CrudOperation, sql: impl Into<String>) -> Self {
        self.declared.push((operation, sql.into()));
        self
    }

    /// Registers the built-in default for an operation, used only when no
    /// statement was declared for it.
    pub fn default_statement(mut self, operation: CrudOperation, sql: impl Into<String>) -> Self {
        self.defaults.insert(operation, sql.into());
        self
    }

    /// The entity kind this registry serves.
    pub fn entity(&self) -> &'static str {
        self.entity
    }

    /// Resolves an operation to statement text.
    ///
    /// Fails with [`StorageError::StatementNotDefined`] when the operation
    /// has neither a declaration nor a default.
    pub fn resolve(&self, operation: CrudOperation) -> Result<&str, StorageError> {
        self.declared
            .iter()
            .find(|(op, _)| *op == operation)
            .map(|(_, sql)| sql.as_str())
            .or_else(|| self.defaults.get(&operation).map(String::as_str))
            .ok_or(StorageError::StatementNotDefined {
                entity: self.entity,
                operation,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_statement_overrides_default() {
        let registry = StatementRegistry::new("person")
            .declare(CrudOperation::AllCount, "SELECT 1")
            .default_statement(CrudOperation::AllCount, "SELECT 2");
        assert_eq!(registry.resolve(CrudOperation::AllCount).unwrap(), "SELECT 1");
    }

    #[test]
    fn first_declaration_wins() {
        let registry = StatementRegistry::new("person")
            .declare(CrudOperation::Delete, "DELETE A")
            .declare(CrudOperation::Delete, "DELETE B");
        assert_eq!(registry.resolve(CrudOperation::Delete).unwrap(), "DELETE A");
    }

    #[test]
    fn default_used_when_nothing_declared() {
        let registry = StatementRegistry::new("person")
            .default_statement(CrudOperation::FindAll, "SELECT *");
        assert_eq!(registry.resolve(CrudOperation::FindAll).unwrap(), "SELECT *");
    }

    #[test]
    fn unresolved_operation_is_an_error() {
        let registry = StatementRegistry::new("person").declare(CrudOperation::Save, "INSERT");

        // Operations the repository does define still resolve.
        assert!(registry.resolve(CrudOperation::Save).is_ok());

        let err = registry.resolve(CrudOperation::Update).unwrap_err();
        match err {
            StorageError::StatementNotDefined { entity, operation } => {
                assert_eq!(entity, "person");
                assert_eq!(operation, CrudOperation::Update);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
