//! Catalog of tables grouped by schema name
//!
//! Schemas and the tables inside them are kept in sorted maps so every
//! traversal (diffing, scripting, serialization) sees the same order.

use super::Table;
use crate::error::{integrity_error, Result};
use serde::Serialize;
use std::collections::BTreeMap;

/// Schema name -> (table name -> table)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Catalog {
    schemas: BTreeMap<String, BTreeMap<String, Table>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table to its schema, creating the schema entry if absent.
    ///
    /// Inserting a second table with the same (schema, name), or a table
    /// failing [`Table::validate`], is a data integrity error.
    pub fn add_table(&mut self, table: Table) -> Result<()> {
        table.validate()?;

        let tables = self.schemas.entry(table.schema().to_string()).or_default();

        if tables.contains_key(table.name()) {
            return Err(integrity_error(format!(
                "table {}.{} is already present in the catalog",
                table.schema(),
                table.name()
            )));
        }

        tables.insert(table.name().to_string(), table);
        Ok(())
    }

    /// Builder-style variant of [`Catalog::add_table`]
    pub fn with_table(mut self, table: Table) -> Result<Self> {
        self.add_table(table)?;
        Ok(self)
    }

    pub fn table(&self, schema: &str, name: &str) -> Option<&Table> {
        self.schemas.get(schema).and_then(|tables| tables.get(name))
    }

    /// All schema names, sorted
    pub fn schemas(&self) -> Vec<&str> {
        self.schemas.keys().map(String::as_str).collect()
    }

    pub fn contains_schema(&self, schema: &str) -> bool {
        self.schemas.contains_key(schema)
    }

    /// Tables of `schema` sorted by name; empty when the schema is unknown
    pub fn tables_of_schema(&self, schema: &str) -> Vec<&Table> {
        self.schemas
            .get(schema)
            .map(|tables| tables.values().collect())
            .unwrap_or_default()
    }

    /// Every table, ordered by schema then name
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.schemas.values().flat_map(|tables| tables.values())
    }

    pub fn table_count(&self) -> usize {
        self.schemas.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.table_count() == 0
    }

    /// Attach a primary key to an already inserted table.
    ///
    /// Returns `Ok(false)` when the table is unknown.
    pub(crate) fn set_primary_key(&mut self, schema: &str, table: &str, column: &str) -> Result<bool> {
        match self.schemas.get_mut(schema).and_then(|tables| tables.get_mut(table)) {
            Some(table) => {
                table.set_primary_key(column)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UpgradeError;
    use crate::model::Column;

    #[test]
    fn test_add_and_get_table() {
        let mut catalog = Catalog::new();
        catalog
            .add_table(Table::new("crm", "persons").column(Column::new("id", "uuid")))
            .unwrap();

        assert!(catalog.table("crm", "persons").is_some());
        assert!(catalog.table("crm", "orders").is_none());
        assert!(catalog.table("sales", "persons").is_none());
        assert_eq!(catalog.table_count(), 1);
    }

    #[test]
    fn test_duplicate_table_is_rejected() {
        let mut catalog = Catalog::new();
        catalog.add_table(Table::new("crm", "persons")).unwrap();

        let err = catalog.add_table(Table::new("crm", "persons")).unwrap_err();
        assert!(matches!(err, UpgradeError::DataIntegrity(_)));

        // Same name in another schema is fine
        catalog.add_table(Table::new("sales", "persons")).unwrap();
        assert_eq!(catalog.table_count(), 2);
    }

    #[test]
    fn test_table_with_duplicate_columns_is_rejected() {
        let mut catalog = Catalog::new();
        let table = Table::new("crm", "persons")
            .column(Column::new("name", "varchar"))
            .column(Column::new("Name", "text"));

        let err = catalog.add_table(table).unwrap_err();
        assert!(matches!(err, UpgradeError::DataIntegrity(_)));
        assert!(catalog.is_empty());
        assert!(!catalog.contains_schema("crm"));
    }

    #[test]
    fn test_schemas_and_tables_are_sorted() {
        let catalog = Catalog::new()
            .with_table(Table::new("sales", "orders"))
            .and_then(|c| c.with_table(Table::new("crm", "persons")))
            .and_then(|c| c.with_table(Table::new("crm", "accounts")))
            .unwrap();

        assert_eq!(catalog.schemas(), vec!["crm", "sales"]);

        let names: Vec<&str> = catalog.tables_of_schema("crm").iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["accounts", "persons"]);
        assert!(catalog.tables_of_schema("missing").is_empty());
    }

    #[test]
    fn test_set_primary_key_on_unknown_table() {
        let mut catalog = Catalog::new();
        assert!(!catalog.set_primary_key("crm", "persons", "id").unwrap());
    }
}
