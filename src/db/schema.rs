//! Idempotent DDL for the product and order tables.

use sqlx::postgres::PgConnectOptions;
use sqlx::{ConnectOptions, PgPool};

/// Statements run in order. Unqualified names land in the first schema of the
/// connection's `search_path`.
const SCHEMA_DDL: &[&str] = &[
    r#"
    DO $$ BEGIN
        CREATE TYPE order_status AS ENUM ('IN_PROGRESS', 'SHIPPED', 'DELIVERED');
    EXCEPTION WHEN duplicate_object THEN NULL;
    END $$
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS products (
        id BIGSERIAL PRIMARY KEY,
        name VARCHAR(255) NOT NULL,
        description VARCHAR(500),
        price DOUBLE PRECISION NOT NULL CHECK (price > 0),
        stock_quantity INTEGER NOT NULL CHECK (stock_quantity >= 0)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS orders (
        id BIGSERIAL PRIMARY KEY,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        status order_status NOT NULL DEFAULT 'IN_PROGRESS'
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS order_items (
        id BIGSERIAL PRIMARY KEY,
        order_id BIGINT NOT NULL REFERENCES orders (id),
        product_id BIGINT NOT NULL REFERENCES products (id),
        quantity INTEGER NOT NULL CHECK (quantity > 0)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS order_items_order_id_idx ON order_items (order_id)",
    "CREATE INDEX IF NOT EXISTS order_items_product_id_idx ON order_items (product_id)",
];

pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    for ddl in SCHEMA_DDL {
        sqlx::query(ddl).execute(pool).await?;
    }
    tracing::info!("schema ready");
    Ok(())
}

/// Connect to the `postgres` maintenance database and create the target
/// database named in `options` when it does not exist yet.
pub async fn ensure_database_exists(options: &PgConnectOptions) -> Result<(), sqlx::Error> {
    let db_name = match options.get_database() {
        Some(name) if !name.is_empty() && name != "postgres" => name.to_string(),
        _ => return Ok(()),
    };
    let mut conn = options.clone().database("postgres").connect().await?;
    let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists {
        sqlx::query(&format!("CREATE DATABASE {}", crate::sql::quoted(&db_name)))
            .execute(&mut conn)
            .await?;
        tracing::info!(database = %db_name, "created database");
    }
    Ok(())
}
