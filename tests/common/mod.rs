#![allow(dead_code)]

use sqlx::postgres::PgConnectOptions;
use sqlx::{ConnectOptions, Connection};
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use storefront::models::{Product, ProductCreate};
use storefront::{ensure_schema, Database, FulfillmentPolicy, OrderRepository, ProductRepository};

static NEXT_SCHEMA: AtomicU32 = AtomicU32::new(0);

/// A database whose tables live in a schema private to one test.
pub struct TestDb {
    pub db: Database,
    admin: PgConnectOptions,
    schema: String,
}

impl TestDb {
    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.db.clone())
    }

    pub fn orders(&self) -> OrderRepository {
        OrderRepository::new(self.db.clone(), FulfillmentPolicy::default())
    }

    pub fn orders_with(&self, policy: FulfillmentPolicy) -> OrderRepository {
        OrderRepository::new(self.db.clone(), policy)
    }

    pub async fn product(&self, name: &str, price: f64, stock_quantity: i32) -> Product {
        self.products()
            .create_product(ProductCreate {
                name: name.to_string(),
                description: None,
                price,
                stock_quantity,
            })
            .await
            .expect("create product")
    }

    pub async fn stock_of(&self, product_id: i64) -> i32 {
        self.products()
            .read_product(product_id)
            .await
            .expect("read product")
            .expect("product exists")
            .stock_quantity
    }

    /// Drop the test schema. Skipped when a test panics before reaching it.
    pub async fn teardown(self) {
        self.db.close().await;
        let mut conn = self.admin.connect().await.expect("admin connection");
        sqlx::query(&format!("DROP SCHEMA IF EXISTS {} CASCADE", storefront::sql::quoted(&self.schema)))
            .execute(&mut conn)
            .await
            .expect("drop schema");
        let _ = conn.close().await;
    }
}

/// `None` when `DATABASE_URL` is unset, so the database tests skip instead of failing.
pub async fn test_db() -> Option<TestDb> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let admin = PgConnectOptions::from_str(&url).expect("valid DATABASE_URL");
    let schema = format!(
        "storefront_test_{}_{}",
        std::process::id(),
        NEXT_SCHEMA.fetch_add(1, Ordering::SeqCst)
    );

    let mut conn = admin.connect().await.expect("connect to DATABASE_URL");
    sqlx::query(&format!("CREATE SCHEMA {}", storefront::sql::quoted(&schema)))
        .execute(&mut conn)
        .await
        .expect("create schema");
    let _ = conn.close().await;

    let options = admin.clone().options([("search_path", schema.as_str())]);
    let db = Database::connect_with(options, 5).await.expect("connect pool");
    ensure_schema(db.pool()).await.expect("schema");
    Some(TestDb { db, admin, schema })
}

macro_rules! require_db {
    () => {
        match common::test_db().await {
            Some(db) => db,
            None => {
                eprintln!("DATABASE_URL not set; skipping");
                return;
            }
        }
    };
}
