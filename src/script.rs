//! DDL script generator
//!
//! Turns a catalog (full rebuild) or an [`UpgradeInfo`] (incremental
//! upgrade) into PostgreSQL statements. Every statement is self-contained
//! and carries no terminator, so callers run them one at a time.

use crate::config::ServerSettings;
use crate::diff::{DiffEngine, TableDelta, UpgradeInfo};
use crate::error::Result;
use crate::introspection::{Introspector, PostgresIntrospector};
use crate::model::{Catalog, Column, Index, Table, TableName};
use tracing::info;

pub struct ScriptBuilder;

impl ScriptBuilder {
    /// `Create Schema If Not Exists "<schema>"`
    pub fn create_schema(schema: &str) -> String {
        format!("Create Schema If Not Exists \"{}\"", strip_quotes(schema))
    }

    /// `Drop Table If Exists "<table>"`, only used for full rebuilds
    pub fn drop_table(table: &Table) -> String {
        format!("Drop Table If Exists \"{}\"", strip_quotes(table.name()))
    }

    /// The `CREATE TABLE` statement alone, without indexes
    pub fn create_table_statement(table: &Table) -> String {
        let mut clauses: Vec<String> = table.columns().iter().map(Self::column_clause).collect();

        if let Some(pk) = table.primary_key_column() {
            clauses.push(format!(
                "CONSTRAINT PK_{} PRIMARY KEY ({})",
                table.name(),
                pk.name()
            ));
        }

        format!(
            "Create Table {}.{} ({})",
            table.schema(),
            table.name(),
            clauses.join(", ")
        )
    }

    /// Optional drop, then create, then one statement per declared index
    pub fn create_table(table: &Table, include_drop: bool) -> Vec<String> {
        let mut scripts = Vec::with_capacity(table.indexes().len() + 2);

        if include_drop {
            scripts.push(Self::drop_table(table));
        }
        scripts.push(Self::create_table_statement(table));
        scripts.extend(Self::table_indexes(table));

        scripts
    }

    /// `CREATE INDEX <name> on <schema>.<table> (<expression>)`
    pub fn create_index(table: &TableName, index: &Index) -> String {
        format!(
            "CREATE INDEX {} on {}.{} ({})",
            index.name(),
            table.schema,
            table.name,
            index.expression()
        )
    }

    /// One `ALTER TABLE` adding every new column of the delta
    pub fn add_columns(delta: &TableDelta) -> String {
        let clauses: Vec<String> = delta.added_columns.iter().map(Self::column_clause).collect();

        format!(
            "Alter Table {}.{} Add {}",
            delta.table.schema,
            delta.table.name,
            clauses.join(", ")
        )
    }

    /// Full rebuild of every schema and table in the catalog
    pub fn create_catalog(catalog: &Catalog) -> Vec<String> {
        let mut scripts = Vec::new();

        for schema in catalog.schemas() {
            scripts.push(Self::create_schema(schema));

            for table in catalog.tables_of_schema(schema) {
                scripts.extend(Self::create_table(table, true));
            }
        }

        scripts
    }

    /// Statements for an incremental upgrade, in the fixed order: schemas,
    /// new tables, added columns, indexes.
    ///
    /// Indexes declared on brand new tables are emitted at the start of the
    /// index phase, ahead of indexes added to existing tables.
    pub fn upgrade(info: &UpgradeInfo) -> Vec<String> {
        let mut scripts = Vec::new();

        scripts.extend(info.new_schemas.iter().map(|s| Self::create_schema(s)));
        scripts.extend(info.new_tables.iter().map(Self::create_table_statement));
        scripts.extend(info.modified_tables.iter().map(Self::add_columns));
        scripts.extend(info.new_tables.iter().flat_map(Self::table_indexes));
        scripts.extend(
            info.new_indexes
                .iter()
                .map(|entry| Self::create_index(&entry.table, &entry.index)),
        );

        scripts
    }

    fn table_indexes(table: &Table) -> Vec<String> {
        let name = table.qualified_name();
        table
            .indexes()
            .iter()
            .map(|index| Self::create_index(&name, index))
            .collect()
    }

    fn column_clause(column: &Column) -> String {
        let mut clause = format!("{} {}", column.name().to_lowercase(), column.data_type());
        if !column.is_nullable() {
            clause.push_str(" NOT NULL");
        }
        clause
    }
}

fn strip_quotes(identifier: &str) -> String {
    identifier.replace('"', "")
}

/// Diff `desired` against the catalog read by `introspector`
pub async fn plan_upgrade<I: Introspector>(desired: &Catalog, introspector: &I) -> Result<UpgradeInfo> {
    let current = introspector.read_catalog().await?;
    let info = DiffEngine::diff(&current, desired);

    info!(
        "Upgrade plan: {} new schemas, {} new tables, {} added columns in {} tables, {} new indexes",
        info.new_schemas.len(),
        info.new_tables.len(),
        info.added_column_count(),
        info.modified_tables.len(),
        info.new_indexes.len()
    );

    Ok(info)
}

/// Upgrade statements bringing the introspected database up to `desired`
pub async fn generate_upgrade_scripts_with<I: Introspector>(
    desired: &Catalog,
    introspector: &I,
) -> Result<Vec<String>> {
    let info = plan_upgrade(desired, introspector).await?;
    Ok(ScriptBuilder::upgrade(&info))
}

/// Upgrade statements bringing the live database described by `settings`
/// up to `desired`.
///
/// Settings are validated before any connection is attempted.
pub async fn generate_upgrade_scripts(desired: &Catalog, settings: &ServerSettings) -> Result<Vec<String>> {
    let introspector = PostgresIntrospector::from_settings(settings)?;
    generate_upgrade_scripts_with(desired, &introspector).await
}
