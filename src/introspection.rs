//! Schema Introspection Module
//!
//! Reads the live schema of a PostgreSQL database back into a [`Catalog`].
//!
//! Only names are recovered: every column gets the placeholder type
//! [`INTROSPECTED_DATA_TYPE`], indexes get an empty expression, and only the
//! first column of a primary key is attached.

use crate::config::ServerSettings;
use crate::db::create_pool;
use crate::error::{Result, UpgradeError};
use crate::model::{Catalog, Column, Index, Table};
use deadpool_postgres::Pool;
use std::collections::BTreeMap;
use std::future::Future;
use tracing::debug;

/// Data type given to every introspected column
pub const INTROSPECTED_DATA_TYPE: &str = "unknown";

const LIST_COLUMNS: &str = r#"
    SELECT
        c.table_schema::text AS schema_name,
        c.table_name::text AS table_name,
        c.column_name::text AS item_name
    FROM information_schema.tables t
    JOIN information_schema.columns c
        ON c.table_schema = t.table_schema
        AND c.table_name = t.table_name
    WHERE t.table_schema NOT IN ('information_schema', 'pg_catalog')
    ORDER BY c.table_schema, c.table_name, c.ordinal_position
"#;

const LIST_INDEXES: &str = r#"
    SELECT
        schemaname::text AS schema_name,
        tablename::text AS table_name,
        indexname::text AS item_name
    FROM pg_catalog.pg_indexes
    WHERE schemaname NOT IN ('information_schema', 'pg_catalog')
    ORDER BY schemaname, tablename, indexname
"#;

const LIST_PRIMARY_KEYS: &str = r#"
    SELECT
        ku.table_schema::text AS schema_name,
        ku.table_name::text AS table_name,
        ku.column_name::text AS item_name
    FROM information_schema.table_constraints tc
    JOIN information_schema.key_column_usage ku
        ON tc.constraint_type = 'PRIMARY KEY'
        AND tc.constraint_schema = ku.constraint_schema
        AND tc.constraint_name = ku.constraint_name
    ORDER BY ku.table_schema, ku.table_name, ku.ordinal_position
"#;

/// One (schema, table, item) triple read from the metadata views.
///
/// `item` is a column name or an index name depending on the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRow {
    pub schema: String,
    pub table: String,
    pub item: String,
}

impl MetadataRow {
    pub fn new(schema: impl Into<String>, table: impl Into<String>, item: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
            item: item.into(),
        }
    }

    fn from_row(row: &tokio_postgres::Row) -> Self {
        Self {
            schema: row.get("schema_name"),
            table: row.get("table_name"),
            item: row.get("item_name"),
        }
    }
}

/// Source of the current catalog
pub trait Introspector {
    fn read_catalog(&self) -> impl Future<Output = Result<Catalog>> + Send;
}

/// Introspector over a pre-supplied catalog
#[derive(Debug, Clone, Default)]
pub struct StaticIntrospector {
    catalog: Catalog,
}

impl StaticIntrospector {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }
}

impl Introspector for StaticIntrospector {
    async fn read_catalog(&self) -> Result<Catalog> {
        Ok(self.catalog.clone())
    }
}

/// Schema introspector for PostgreSQL
#[derive(Debug)]
pub struct PostgresIntrospector {
    pool: Pool,
}

impl PostgresIntrospector {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Validate `settings` and build a pool; does not connect yet
    pub fn from_settings(settings: &ServerSettings) -> Result<Self> {
        Ok(Self::new(create_pool(settings)?))
    }

    async fn query_rows(client: &deadpool_postgres::Client, query: &str) -> Result<Vec<MetadataRow>> {
        let rows = client
            .query(query, &[])
            .await
            .map_err(UpgradeError::introspection)?;

        Ok(rows.iter().map(MetadataRow::from_row).collect())
    }
}

impl Introspector for PostgresIntrospector {
    async fn read_catalog(&self) -> Result<Catalog> {
        let client = self.pool.get().await.map_err(UpgradeError::introspection)?;

        let columns = Self::query_rows(&client, LIST_COLUMNS).await?;
        let indexes = Self::query_rows(&client, LIST_INDEXES).await?;
        let primary_keys = Self::query_rows(&client, LIST_PRIMARY_KEYS).await?;

        debug!(
            "Introspected {} columns, {} indexes, {} primary key columns",
            columns.len(),
            indexes.len(),
            primary_keys.len()
        );

        assemble_catalog(columns, indexes, primary_keys)
    }
}

/// Build a catalog from the three metadata reads.
///
/// Columns keep the order in which they were read. Index and primary key
/// rows pointing at unknown tables or columns are skipped; the first
/// primary key row of a table wins.
pub fn assemble_catalog(
    columns: Vec<MetadataRow>,
    indexes: Vec<MetadataRow>,
    primary_keys: Vec<MetadataRow>,
) -> Result<Catalog> {
    let mut tables: BTreeMap<(String, String), Table> = BTreeMap::new();

    for row in columns {
        tables
            .entry((row.schema.clone(), row.table.clone()))
            .or_insert_with(|| Table::new(row.schema, row.table))
            .push_column(Column::new(row.item, INTROSPECTED_DATA_TYPE));
    }

    for row in indexes {
        if let Some(table) = tables.get_mut(&(row.schema, row.table)) {
            table.push_index(Index::new(row.item, String::new()));
        }
    }

    let mut catalog = Catalog::new();
    for table in tables.into_values() {
        catalog.add_table(table)?;
    }

    for row in primary_keys {
        let attachable = catalog
            .table(&row.schema, &row.table)
            .is_some_and(|t| t.primary_key_column().is_none() && t.find_column(&row.item).is_some());

        if attachable {
            catalog.set_primary_key(&row.schema, &row.table, &row.item)?;
        }
    }

    debug!(
        "Assembled catalog with {} schemas and {} tables",
        catalog.schemas().len(),
        catalog.table_count()
    );

    Ok(catalog)
}
