//! Table definition

use super::{Column, Index};
use crate::error::{integrity_error, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Schema-qualified table name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TableName {
    pub schema: String,
    pub name: String,
}

impl TableName {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

/// A table: ordered columns, indexes and an optional single-column primary key.
///
/// Column order is declaration order and is preserved in `CREATE TABLE`
/// output. The primary key, when set, always names one of the table's own
/// columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    schema: String,
    name: String,
    columns: Vec<Column>,
    indexes: Vec<Index>,
    #[serde(skip_serializing_if = "Option::is_none")]
    primary_key: Option<String>,
}

impl Table {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            columns: Vec::new(),
            indexes: Vec::new(),
            primary_key: None,
        }
    }

    /// Create a table with the given columns in declaration order
    pub fn with_columns(
        schema: impl Into<String>,
        name: impl Into<String>,
        columns: impl IntoIterator<Item = Column>,
    ) -> Self {
        let mut table = Self::new(schema, name);
        table.columns.extend(columns);
        table
    }

    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }

    /// Declare `column` as the primary key.
    ///
    /// Fails with a data integrity error when no column of that name exists.
    pub fn primary_key(mut self, column: &str) -> Result<Self> {
        self.set_primary_key(column)?;
        Ok(self)
    }

    pub(crate) fn set_primary_key(&mut self, column: &str) -> Result<()> {
        if self.find_column(column).is_none() {
            return Err(integrity_error(format!(
                "primary key column '{}' is not a column of table {}.{}",
                column, self.schema, self.name
            )));
        }
        self.primary_key = Some(column.to_string());
        Ok(())
    }

    /// Check that column names are unique once lowercased (as rendered in
    /// DDL) and that index names are unique.
    pub fn validate(&self) -> Result<()> {
        let mut columns = HashSet::new();
        for column in &self.columns {
            if !columns.insert(column.name().to_lowercase()) {
                return Err(integrity_error(format!(
                    "column '{}' is declared more than once in table {}.{}",
                    column.name(),
                    self.schema,
                    self.name
                )));
            }
        }

        let mut indexes = HashSet::new();
        for index in &self.indexes {
            if !indexes.insert(index.name()) {
                return Err(integrity_error(format!(
                    "index '{}' is declared more than once on table {}.{}",
                    index.name(),
                    self.schema,
                    self.name
                )));
            }
        }

        Ok(())
    }

    pub(crate) fn push_column(&mut self, column: Column) {
        self.columns.push(column);
    }

    pub(crate) fn push_index(&mut self, index: Index) {
        self.indexes.push(index);
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn qualified_name(&self) -> TableName {
        TableName::new(self.schema.clone(), self.name.clone())
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn indexes(&self) -> &[Index] {
        &self.indexes
    }

    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// The primary key column, if one is declared
    pub fn primary_key_column(&self) -> Option<&Column> {
        self.primary_key
            .as_deref()
            .and_then(|name| self.find_column(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UpgradeError;

    fn persons() -> Table {
        Table::new("crm", "persons")
            .column(Column::new("id", "uuid"))
            .column(Column::new("name", "varchar"))
    }

    #[test]
    fn test_primary_key_must_be_own_column() {
        let table = persons().primary_key("id").unwrap();
        assert_eq!(table.primary_key_column().map(Column::name), Some("id"));

        let err = persons().primary_key("email").unwrap_err();
        assert!(matches!(err, UpgradeError::DataIntegrity(_)));
    }

    #[test]
    fn test_columns_keep_declaration_order() {
        let table = persons().column(Column::new("age", "int"));
        let names: Vec<&str> = table.columns().iter().map(Column::name).collect();
        assert_eq!(names, vec!["id", "name", "age"]);
    }

    #[test]
    fn test_duplicate_columns_differing_in_case_are_rejected() {
        let table = persons().column(Column::new("Name", "text"));

        let err = table.validate().unwrap_err();
        assert!(matches!(err, UpgradeError::DataIntegrity(_)));
    }

    #[test]
    fn test_duplicate_index_names_are_rejected() {
        let table = persons()
            .index(Index::new("ix", "(id)"))
            .index(Index::new("ix", "(name)"));

        assert!(matches!(table.validate(), Err(UpgradeError::DataIntegrity(_))));
        assert!(persons().index(Index::new("ix", "(id)")).validate().is_ok());
    }

    #[test]
    fn test_qualified_name_display() {
        assert_eq!(persons().qualified_name().to_string(), "crm.persons");
    }
}
