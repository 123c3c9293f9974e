//! Schema Diff Engine
//!
//! Compares the current catalog against the desired one and records only
//! what has to be added. Nothing that exists solely in the current catalog
//! ever shows up in the result.
//!
//! Equality policy: columns and indexes are matched by name alone (see
//! [`column_key`] and [`index_key`]). Data type, nullability and primary key
//! changes on an existing table are not detected.

use crate::model::{Catalog, Column, Index, Table, TableName};
use serde::Serialize;
use std::collections::HashSet;
use std::hash::Hash;

/// Columns to add to a table that already exists
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDelta {
    pub table: TableName,
    pub added_columns: Vec<Column>,
}

/// An index to create on a table that already exists
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewIndex {
    /// Taken from the current catalog
    pub table: TableName,
    pub index: Index,
}

/// Additive deltas produced by [`DiffEngine::diff`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeInfo {
    pub new_schemas: Vec<String>,
    pub new_tables: Vec<Table>,
    pub modified_tables: Vec<TableDelta>,
    pub new_indexes: Vec<NewIndex>,
}

impl UpgradeInfo {
    pub fn is_empty(&self) -> bool {
        self.new_schemas.is_empty()
            && self.new_tables.is_empty()
            && self.modified_tables.is_empty()
            && self.new_indexes.is_empty()
    }

    pub fn added_column_count(&self) -> usize {
        self.modified_tables.iter().map(|d| d.added_columns.len()).sum()
    }
}

/// Identity of a column for diffing purposes
pub fn column_key(column: &Column) -> &str {
    column.name()
}

/// Identity of an index for diffing purposes
pub fn index_key(index: &Index) -> &str {
    index.name()
}

/// Items of `desired` whose key does not occur in `current`, in `desired` order.
pub fn difference_by_key<'a, T, K, F>(desired: &'a [T], current: &'a [T], key: F) -> Vec<&'a T>
where
    K: Eq + Hash,
    F: Fn(&'a T) -> K,
{
    let existing: HashSet<K> = current.iter().map(&key).collect();
    desired
        .iter()
        .filter(|item| !existing.contains(&key(*item)))
        .collect()
}

/// The diff engine that compares catalogs
pub struct DiffEngine;

impl DiffEngine {
    /// Compute what must be added to `current` to reach `desired`.
    ///
    /// Schemas and tables are visited in sorted order; added columns and
    /// indexes keep the desired declaration order.
    pub fn diff(current: &Catalog, desired: &Catalog) -> UpgradeInfo {
        let mut info = UpgradeInfo::default();

        let desired_schemas = desired.schemas();
        let current_schemas = current.schemas();
        info.new_schemas = difference_by_key(&desired_schemas, &current_schemas, |s| *s)
            .into_iter()
            .map(|s| s.to_string())
            .collect();

        for schema in desired_schemas {
            for desired_table in desired.tables_of_schema(schema) {
                match current.table(schema, desired_table.name()) {
                    None => info.new_tables.push(desired_table.clone()),
                    Some(current_table) => {
                        Self::diff_table(current_table, desired_table, &mut info)
                    }
                }
            }
        }

        info
    }

    fn diff_table(current: &Table, desired: &Table, info: &mut UpgradeInfo) {
        let added_columns: Vec<Column> =
            difference_by_key(desired.columns(), current.columns(), column_key)
                .into_iter()
                .cloned()
                .collect();

        if !added_columns.is_empty() {
            info.modified_tables.push(TableDelta {
                table: desired.qualified_name(),
                added_columns,
            });
        }

        for index in difference_by_key(desired.indexes(), current.indexes(), index_key) {
            info.new_indexes.push(NewIndex {
                table: current.qualified_name(),
                index: index.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn persons(columns: &[&str]) -> Table {
        Table::with_columns(
            "crm",
            "persons",
            columns.iter().map(|c| Column::new(*c, "varchar")),
        )
    }

    fn catalog(tables: Vec<Table>) -> Catalog {
        let mut catalog = Catalog::new();
        for table in tables {
            catalog.add_table(table).unwrap();
        }
        catalog
    }

    #[test]
    fn test_identical_catalogs_produce_empty_diff() {
        let desired = catalog(vec![
            persons(&["id", "name"]).index(Index::new("ix_name", "(name)")),
            Table::new("sales", "orders").column(Column::new("id", "uuid")),
        ]);
        let current = desired.clone();

        let info = DiffEngine::diff(&current, &desired);
        assert!(info.is_empty());
    }

    #[test]
    fn test_new_schema_and_table() {
        let current = Catalog::new();
        let desired = catalog(vec![persons(&["id", "name"])]);

        let info = DiffEngine::diff(&current, &desired);
        assert_eq!(info.new_schemas, vec!["crm".to_string()]);
        assert_eq!(info.new_tables, vec![persons(&["id", "name"])]);
        assert!(info.modified_tables.is_empty());
        assert!(info.new_indexes.is_empty());
    }

    #[test]
    fn test_existing_schema_new_table() {
        let current = catalog(vec![persons(&["id"])]);
        let desired = catalog(vec![
            persons(&["id"]),
            Table::new("crm", "accounts").column(Column::new("id", "uuid")),
        ]);

        let info = DiffEngine::diff(&current, &desired);
        assert!(info.new_schemas.is_empty());
        assert_eq!(info.new_tables.len(), 1);
        assert_eq!(info.new_tables[0].name(), "accounts");
    }

    #[test]
    fn test_added_columns_only_carry_new_ones() {
        let current = catalog(vec![persons(&["id"])]);
        let desired = catalog(vec![persons(&["id", "name", "email"])]);

        let info = DiffEngine::diff(&current, &desired);
        assert_eq!(
            info.modified_tables,
            vec![TableDelta {
                table: TableName::new("crm", "persons"),
                added_columns: vec![
                    Column::new("name", "varchar"),
                    Column::new("email", "varchar"),
                ],
            }]
        );
        assert_eq!(info.added_column_count(), 2);
    }

    #[test]
    fn test_type_and_nullability_changes_are_invisible() {
        let current = catalog(vec![Table::new("crm", "persons").column(Column::new("id", "unknown"))]);
        let desired = catalog(vec![Table::new("crm", "persons")
            .column(Column::new("id", "uuid").with_nullable(true))
            .primary_key("id")
            .unwrap()]);

        assert!(DiffEngine::diff(&current, &desired).is_empty());
    }

    #[test]
    fn test_removals_are_never_reported() {
        let current = catalog(vec![
            persons(&["id", "legacy"]).index(Index::new("ix_legacy", "")),
            Table::new("old", "audit"),
        ]);
        let desired = catalog(vec![persons(&["id"])]);

        assert!(DiffEngine::diff(&current, &desired).is_empty());
    }

    #[test]
    fn test_new_index_references_current_table() {
        let current = catalog(vec![persons(&["id", "name"]).index(Index::new("ix_old", ""))]);
        let desired = catalog(vec![persons(&["id", "name"])
            .index(Index::new("ix_old", "(id)"))
            .index(Index::new("ix_name", "(name)"))]);

        let info = DiffEngine::diff(&current, &desired);
        assert_eq!(
            info.new_indexes,
            vec![NewIndex {
                table: TableName::new("crm", "persons"),
                index: Index::new("ix_name", "(name)"),
            }]
        );
    }

    #[test]
    fn test_diff_is_deterministic() {
        let desired = catalog(vec![
            Table::new("zeta", "b").column(Column::new("x", "int")),
            Table::new("alpha", "z").column(Column::new("x", "int")),
            Table::new("alpha", "a").column(Column::new("x", "int")),
        ]);
        let current = Catalog::new();

        let first = DiffEngine::diff(&current, &desired);
        let second = DiffEngine::diff(&current, &desired.clone());
        assert_eq!(first, second);

        assert_eq!(first.new_schemas, vec!["alpha".to_string(), "zeta".to_string()]);
        let order: Vec<String> = first.new_tables.iter().map(|t| t.qualified_name().to_string()).collect();
        assert_eq!(order, vec!["alpha.a", "alpha.z", "zeta.b"]);
    }

    #[test]
    fn test_difference_by_key_keeps_desired_order() {
        let desired = ["c", "a", "b"];
        let current = ["a"];
        assert_eq!(difference_by_key(&desired, &current, |s| *s), vec![&"c", &"b"]);
    }
}
