//! Sample upgrade runner
//!
//! Declares a small desired schema, diffs it against the database described
//! by the environment (`DATABASE_URL` or `DB_*` variables) and applies the
//! resulting statements.
//!
//! - `SCHEMA_UPGRADER_CREATE_DATABASE=1` creates the database first if missing
//! - `SCHEMA_UPGRADER_DRY_RUN=1` prints the statements without applying them

use pg_schema_upgrader::db::{create_database, create_pool};
use pg_schema_upgrader::{
    apply_statements, plan_upgrade, Catalog, Column, Index, PostgresExecutor, PostgresIntrospector,
    ScriptBuilder, ServerSettings, Table,
};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let settings = ServerSettings::from_env()?;
    // Fail on missing connection fields before doing anything else
    settings.connection_string()?;
    info!("Upgrading {}", settings.display_name());

    if env_flag("SCHEMA_UPGRADER_CREATE_DATABASE") && create_database(&settings).await? {
        info!("Database {} created", settings.database);
    }

    let desired = desired_catalog()?;

    let pool = create_pool(&settings)?;
    let info = plan_upgrade(&desired, &PostgresIntrospector::new(pool.clone())).await?;
    info!("Plan: {}", serde_json::to_string(&info)?);

    let scripts = ScriptBuilder::upgrade(&info);
    if scripts.is_empty() {
        info!("Schema is up to date");
        return Ok(());
    }

    for script in &scripts {
        println!("{}", script);
    }

    if env_flag("SCHEMA_UPGRADER_DRY_RUN") {
        info!("Dry run: {} statements not applied", scripts.len());
        return Ok(());
    }

    let applied = apply_statements(&PostgresExecutor::new(pool), &scripts).await?;
    info!("Upgrade complete ({} statements)", applied);
    Ok(())
}

/// The schema this sample keeps the database at
fn desired_catalog() -> pg_schema_upgrader::Result<Catalog> {
    let persons = Table::with_columns(
        "crm",
        "persons",
        [Column::new("id", "uuid"), Column::new("name", "varchar")],
    )
    .index(Index::new("ix_persons_name", "(name)"))
    .primary_key("id")?;

    Catalog::new().with_table(persons)
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Initialize tracing with structured logging
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,pg_schema_upgrader=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();
}
