//! Declarative, forward-only PostgreSQL schema upgrades.
//!
//! Describe the schema you want as a [`Catalog`], and the crate works out
//! which statements bring a live database up to it:
//!
//! - Stage 1 (Introspect): read the live schema into a current [`Catalog`]
//! - Stage 2 (Diff): compute additive deltas with [`DiffEngine`]
//! - Stage 3 (Script): turn the deltas into ordered DDL with [`ScriptBuilder`]
//! - Stage 4 (Apply): run the statements one by one with [`apply_statements`]
//!
//! Upgrades only ever add: schemas, tables, columns and indexes that the
//! desired catalog omits are left alone.

pub mod config;
pub mod db;
pub mod diff;
pub mod error;
pub mod executor;
pub mod introspection;
pub mod model;
pub mod script;

pub use config::ServerSettings;
pub use diff::{DiffEngine, NewIndex, TableDelta, UpgradeInfo};
pub use error::{Result, UpgradeError};
pub use executor::{apply_statements, PostgresExecutor, StatementExecutor};
pub use introspection::{Introspector, PostgresIntrospector, StaticIntrospector};
pub use model::{Catalog, Column, Index, Table, TableName};
pub use script::{generate_upgrade_scripts, generate_upgrade_scripts_with, plan_upgrade, ScriptBuilder};
