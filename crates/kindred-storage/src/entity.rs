//! The capability contract entity kinds expose to the repository engine.

use std::fmt;

use rusqlite::types::Value;

use crate::cursor::{AliasIndexCache, RowCursor};
use crate::error::StorageError;

/// Capability set the generic repository engine requires of an entity kind.
///
/// Implementations are resolved at compile time through generics; there is
/// no runtime discovery of identifier fields or mapping logic. Identifiers
/// are nullable until the store assigns one at insert time and are treated
/// as immutable afterwards.
pub trait Entity: fmt::Debug + Sized {
    /// Identifier newtype; bridges to the store's raw `i64` rowid.
    type Id: Copy + Eq + fmt::Debug + From<i64> + Into<i64>;

    /// Entity kind name, used in statement-resolution errors.
    const KIND: &'static str;

    /// The identifier, if the store has assigned one.
    fn id(&self) -> Option<Self::Id>;

    /// Records the store-assigned identifier after a successful insert.
    fn assign_id(&mut self, id: Self::Id);

    /// Human-readable rendering carried inside save failures.
    fn describe(&self) -> String {
        format!("{self:?}")
    }

    /// Positional parameters for the Save statement, in placeholder order.
    fn insert_params(&self) -> Vec<Value>;

    /// Positional parameters for the Update statement, in placeholder order.
    /// The engine binds the identifier immediately after these.
    fn update_params(&self) -> Vec<Value>;

    /// Extracts one entity starting at the cursor's current row.
    ///
    /// Multi-row entity kinds consume every contiguous row belonging to the
    /// extracted entity and retreat past the first row that does not, so the
    /// caller's next `advance` lands on it. Returns `None` when the current
    /// row holds no entity.
    fn from_cursor(
        cursor: &mut RowCursor,
        aliases: &AliasIndexCache,
    ) -> Result<Option<Self>, StorageError>;
}

/// The value itself, or SQL NULL when absent.
pub(crate) fn nullable<T: Into<Value>>(value: Option<T>) -> Value {
    value.map(Into::into).unwrap_or(Value::Null)
}
