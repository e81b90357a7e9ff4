//! Database connection pool management.

use anyhow::{Context, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info};

/// Tables read by the PostgreSQL collaborators.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS site (
    id BIGINT PRIMARY KEY,
    domain TEXT NOT NULL DEFAULT '',
    name TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS content_type (
    id BIGSERIAL PRIMARY KEY,
    type_name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS content_item (
    id UUID PRIMARY KEY,
    plugin_type TEXT NOT NULL,
    placeholder TEXT NOT NULL,
    language TEXT NOT NULL DEFAULT 'en',
    sort_order INTEGER NOT NULL DEFAULT 0,
    fields JSONB NOT NULL DEFAULT '{}'::jsonb
);

CREATE INDEX IF NOT EXISTS content_item_plugin_type_idx ON content_item (plugin_type);
"#;

/// Create a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .context("failed to connect to PostgreSQL")?;

    debug!(max_connections, "database pool created");
    Ok(pool)
}

/// Create the tables if they do not exist yet.
pub async fn install_schema(pool: &PgPool) -> Result<()> {
    // raw_sql: the schema holds several statements
    sqlx::raw_sql(SCHEMA)
        .execute(pool)
        .await
        .context("failed to install schema")?;

    info!("database schema installed");
    Ok(())
}
