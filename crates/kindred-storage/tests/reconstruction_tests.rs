//! Reconstructor segmentation tests over synthetic cursors.
//!
//! These bypass SQLite entirely: rows are built by hand so segmentation
//! behavior (retreat positioning, set-collapse of children, absent blocks)
//! is observable row by row. Address aliases are deliberately left out of
//! the shape -- the reconstructor must treat them as absent columns, not
//! errors.

use proptest::prelude::*;
use rusqlite::types::Value;

use kindred_core::Person;
use kindred_storage::{AliasIndexCache, Entity, RowCursor};

/// Minimal parent+child join shape.
fn columns() -> Vec<String> {
    [
        "parent_id",
        "parent_first_name",
        "parent_last_name",
        "child_id",
        "child_first_name",
    ]
    .iter()
    .map(|label| label.to_string())
    .collect()
}

fn row(parent: i64, parent_name: &str, child: Option<(i64, &str)>) -> Vec<Value> {
    vec![
        Value::Integer(parent),
        Value::Text(parent_name.to_string()),
        Value::Text("x".to_string()),
        child
            .map(|(id, _)| Value::Integer(id))
            .unwrap_or(Value::Null),
        child
            .map(|(_, name)| Value::Text(name.to_string()))
            .unwrap_or(Value::Null),
    ]
}

#[test]
fn two_parents_segment_on_anchor_change() {
    // [P1,C1], [P1,C2], [P2,C1]
    let mut cursor = RowCursor::new(
        columns(),
        vec![
            row(1, "p1", Some((10, "c1"))),
            row(1, "p1", Some((11, "c2"))),
            row(2, "p2", Some((12, "c1"))),
        ],
    );
    let aliases = AliasIndexCache::new();

    assert!(cursor.advance());
    let p1 = Person::from_cursor(&mut cursor, &aliases).unwrap().unwrap();
    assert_eq!(p1.id.unwrap().0, 1);
    let names: Vec<&str> = p1.children.iter().map(|c| c.first_name.as_str()).collect();
    assert_eq!(names, ["c1", "c2"]);

    // The P2 row was handed back; the next advance must land exactly on it.
    assert!(cursor.advance());
    let p2 = Person::from_cursor(&mut cursor, &aliases).unwrap().unwrap();
    assert_eq!(p2.id.unwrap().0, 2);
    assert_eq!(p2.children.len(), 1);
    assert_eq!(p2.children[0].first_name, "c1");

    assert!(!cursor.advance());
}

#[test]
fn parent_with_null_child_block_yields_one_bare_entity() {
    let mut cursor = RowCursor::new(columns(), vec![row(1, "p1", None)]);
    let aliases = AliasIndexCache::new();

    assert!(cursor.advance());
    let p1 = Person::from_cursor(&mut cursor, &aliases).unwrap().unwrap();
    assert!(p1.children.is_empty());
    assert!(p1.home_address.is_none());
    assert!(p1.business_address.is_none());
    assert!(!cursor.advance());
}

#[test]
fn duplicate_child_rows_collapse_by_identifier() {
    let mut cursor = RowCursor::new(
        columns(),
        vec![
            row(1, "p1", Some((10, "c1"))),
            row(1, "p1", Some((10, "c1"))),
        ],
    );
    let aliases = AliasIndexCache::new();

    assert!(cursor.advance());
    let p1 = Person::from_cursor(&mut cursor, &aliases).unwrap().unwrap();
    assert_eq!(p1.children.len(), 1);
}

#[test]
fn null_anchor_yields_no_entity() {
    let rows = vec![vec![
        Value::Null,
        Value::Null,
        Value::Null,
        Value::Null,
        Value::Null,
    ]];
    let mut cursor = RowCursor::new(columns(), rows);
    let aliases = AliasIndexCache::new();

    assert!(cursor.advance());
    assert!(Person::from_cursor(&mut cursor, &aliases)
        .unwrap()
        .is_none());
}

proptest! {
    /// For any contiguous grouping of parents (0..4 children each), repeated
    /// reconstruction calls partition the cursor exactly into those groups:
    /// no row skipped, no row consumed twice.
    #[test]
    fn segmentation_matches_any_contiguous_grouping(
        child_counts in prop::collection::vec(0usize..4, 1..8),
    ) {
        let mut rows = Vec::new();
        let mut expected: Vec<(i64, Vec<i64>)> = Vec::new();
        let mut next_child = 1000i64;
        for (index, &count) in child_counts.iter().enumerate() {
            let parent = index as i64 + 1;
            let mut kids = Vec::new();
            if count == 0 {
                rows.push(row(parent, "p", None));
            } else {
                for _ in 0..count {
                    rows.push(row(parent, "p", Some((next_child, "c"))));
                    kids.push(next_child);
                    next_child += 1;
                }
            }
            expected.push((parent, kids));
        }

        let mut cursor = RowCursor::new(columns(), rows);
        let aliases = AliasIndexCache::new();
        let mut produced: Vec<(i64, Vec<i64>)> = Vec::new();
        while cursor.advance() {
            let Some(parent) = Person::from_cursor(&mut cursor, &aliases).unwrap() else {
                break;
            };
            produced.push((
                parent.id.unwrap().0,
                parent.children.iter().map(|c| c.id.unwrap().0).collect(),
            ));
        }

        prop_assert_eq!(produced, expected);
    }
}
