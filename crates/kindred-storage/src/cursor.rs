//! Scrollable row cursor and the alias-to-column-index cache.
//!
//! SQLite result rows are forward-only and borrow their statement, so
//! [`RowCursor`] materializes the whole result up front: owned column labels
//! plus owned [`Value`] cells. Materialization is what makes the cursor
//! scrollable -- the entity-graph reconstructor retreats by one row whenever
//! it consumes a row that belongs to the next parent.

use std::cell::RefCell;
use std::collections::HashMap;

use rusqlite::types::{FromSql, Value, ValueRef};
use rusqlite::{Params, Statement};

use crate::error::StorageError;

/// A materialized, rewindable sequence of named-column rows.
///
/// The cursor starts positioned before the first row; the first
/// [`advance`](RowCursor::advance) moves onto row 0.
#[derive(Debug)]
pub struct RowCursor {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    pos: Option<usize>,
}

impl RowCursor {
    /// Builds a cursor from raw parts, positioned before the first row.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        RowCursor {
            columns,
            rows,
            pos: None,
        }
    }

    /// Executes a prepared statement and materializes every row.
    pub fn from_stmt(stmt: &mut Statement<'_>, params: impl Params) -> Result<Self, StorageError> {
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
        let width = columns.len();
        let mut rows = stmt.query(params)?;
        let mut data = Vec::new();
        while let Some(row) = rows.next()? {
            let mut cells = Vec::with_capacity(width);
            for index in 0..width {
                cells.push(row.get::<_, Value>(index)?);
            }
            data.push(cells);
        }
        Ok(RowCursor::new(columns, data))
    }

    /// Moves to the next row. Returns false, staying put, when exhausted.
    pub fn advance(&mut self) -> bool {
        let next = match self.pos {
            None => 0,
            Some(at) => at + 1,
        };
        if next < self.rows.len() {
            self.pos = Some(next);
            true
        } else {
            false
        }
    }

    /// Moves back exactly one row, saturating at the before-first position.
    pub fn retreat(&mut self) {
        self.pos = match self.pos {
            Some(at) if at > 0 => Some(at - 1),
            _ => None,
        };
    }

    /// Number of columns in the result shape.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// All column labels, in positional order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// The label of the column at `index`, if within the shape.
    pub fn column_label(&self, index: usize) -> Option<&str> {
        self.columns.get(index).map(String::as_str)
    }

    /// Reads the cell at `index` of the current row, converted to `T`.
    ///
    /// Use `Option<T>` for `T` to read a column that may hold SQL NULL.
    pub fn get<T: FromSql>(&self, index: usize) -> Result<T, StorageError> {
        let row = self
            .pos
            .and_then(|at| self.rows.get(at))
            .ok_or(StorageError::CursorNotPositioned)?;
        let cell = row
            .get(index)
            .ok_or(rusqlite::Error::InvalidColumnIndex(index))?;
        T::column_result(ValueRef::from(cell)).map_err(|err| {
            rusqlite::Error::FromSqlConversionFailure(index, cell.data_type(), Box::new(err))
                .into()
        })
    }
}

/// Per-repository cache of column alias to positional index.
///
/// Populated lazily: the first lookup against a given result shape scans the
/// full label list once and caches every label it sees, plus the miss
/// itself. An absent alias resolves to `None` ("column not present"), never
/// an error -- callers distinguish a missing column from a NULL value. The
/// map is keyed to the column shape it was built against and is rebuilt when
/// a differently shaped cursor arrives, since one repository serves both
/// wide join queries and narrow projections.
///
/// Interior mutability keeps lookups usable behind `&self`; the cache is
/// intentionally not `Sync`. One repository instance per thread.
#[derive(Debug, Default)]
pub struct AliasIndexCache {
    inner: RefCell<CacheInner>,
}

#[derive(Debug, Default)]
struct CacheInner {
    shape: Vec<String>,
    indices: HashMap<String, Option<usize>>,
}

impl AliasIndexCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        AliasIndexCache::default()
    }

    /// Resolves `alias` to its column index in `cursor`, or `None` when the
    /// column is not part of the result shape.
    pub fn resolve(&self, cursor: &RowCursor, alias: &str) -> Option<usize> {
        let mut inner = self.inner.borrow_mut();
        if inner.shape.as_slice() != cursor.columns() {
            inner.shape = cursor.columns().to_vec();
            inner.indices.clear();
        }
        if let Some(cached) = inner.indices.get(alias) {
            return *cached;
        }
        // One scan caches every label of this shape, not just the alias
        // asked for.
        for (index, label) in cursor.columns().iter().enumerate() {
            inner.indices.entry(label.clone()).or_insert(Some(index));
        }
        let found = inner.indices.get(alias).copied().flatten();
        inner.indices.insert(alias.to_string(), found);
        found
    }
}

/// Reads the labeled column from the cursor's current row, resolving the
/// label through the alias cache.
///
/// `None` covers both "column not part of this result shape" and SQL NULL;
/// entity extraction treats either as absence.
pub fn value_by_alias<T: FromSql>(
    cursor: &RowCursor,
    aliases: &AliasIndexCache,
    label: &str,
) -> Result<Option<T>, StorageError> {
    match aliases.resolve(cursor, label) {
        Some(index) => cursor.get::<Option<T>>(index),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_cursor() -> RowCursor {
        RowCursor::new(
            vec!["id".to_string(), "name".to_string()],
            vec![
                vec![Value::Integer(1), Value::Text("ada".to_string())],
                vec![Value::Integer(2), Value::Null],
            ],
        )
    }

    #[test]
    fn advance_and_retreat_walk_the_rows() {
        let mut cursor = sample_cursor();
        assert!(cursor.advance());
        assert_eq!(cursor.get::<i64>(0).unwrap(), 1);
        assert!(cursor.advance());
        assert_eq!(cursor.get::<i64>(0).unwrap(), 2);
        assert!(!cursor.advance());

        cursor.retreat();
        assert_eq!(cursor.get::<i64>(0).unwrap(), 1);
    }

    #[test]
    fn retreat_saturates_before_first() {
        let mut cursor = sample_cursor();
        cursor.retreat();
        assert!(matches!(
            cursor.get::<i64>(0),
            Err(StorageError::CursorNotPositioned)
        ));
        // The first advance still lands on row 0.
        assert!(cursor.advance());
        assert_eq!(cursor.get::<i64>(0).unwrap(), 1);
    }

    #[test]
    fn nullable_reads_distinguish_null() {
        let mut cursor = sample_cursor();
        cursor.advance();
        assert_eq!(cursor.get::<Option<String>>(1).unwrap().as_deref(), Some("ada"));
        cursor.advance();
        assert_eq!(cursor.get::<Option<String>>(1).unwrap(), None);
    }

    #[test]
    fn column_labels_are_positional() {
        let cursor = sample_cursor();
        assert_eq!(cursor.column_count(), 2);
        assert_eq!(cursor.column_label(1), Some("name"));
        assert_eq!(cursor.column_label(2), None);
    }

    #[test]
    fn alias_cache_resolves_and_caches_misses() {
        let mut cursor = sample_cursor();
        cursor.advance();
        let aliases = AliasIndexCache::new();

        assert_eq!(aliases.resolve(&cursor, "name"), Some(1));
        assert_eq!(aliases.resolve(&cursor, "absent"), None);
        // Second lookup of the miss is served from the cache.
        assert_eq!(aliases.resolve(&cursor, "absent"), None);
    }

    #[test]
    fn alias_cache_rebuilds_on_shape_change() {
        let aliases = AliasIndexCache::new();
        let wide = RowCursor::new(
            vec!["a".to_string(), "b".to_string()],
            vec![vec![Value::Integer(1), Value::Integer(2)]],
        );
        assert_eq!(aliases.resolve(&wide, "b"), Some(1));

        let narrow = RowCursor::new(vec!["b".to_string()], vec![vec![Value::Integer(2)]]);
        assert_eq!(aliases.resolve(&narrow, "b"), Some(0));
        assert_eq!(aliases.resolve(&narrow, "a"), None);
    }

    #[test]
    fn value_by_alias_treats_missing_column_as_absent() {
        let mut cursor = sample_cursor();
        cursor.advance();
        let aliases = AliasIndexCache::new();
        let missing: Option<i64> = value_by_alias(&cursor, &aliases, "nope").unwrap();
        assert_eq!(missing, None);
    }
}
