use super::session::{Scope, Session};
use crate::config::DatabaseSettings;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::time::Duration;

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Owns the connection pool and hands out sessions. Constructed once at
/// startup, passed to whoever needs it, closed at shutdown.
#[derive(Clone, Debug)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn connect(settings: &DatabaseSettings) -> Result<Self, sqlx::Error> {
        Self::connect_with(settings.options.clone(), settings.max_connections).await
    }

    pub async fn connect_with(options: PgConnectOptions, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = pool_options(max_connections).connect_with(options).await?;
        tracing::debug!(max_connections, "database pool ready");
        Ok(Database { pool })
    }

    /// Builds the pool without opening a connection; the first query connects.
    pub fn connect_lazy(settings: &DatabaseSettings) -> Self {
        let pool = pool_options(settings.max_connections).connect_lazy_with(settings.options.clone());
        Database { pool }
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Database { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// A fresh session. Nothing is acquired until the session is first used.
    pub fn session(&self) -> Session {
        Session::new(self.pool.clone())
    }

    /// Reuse `session` when the caller supplied one, else open a fresh one for the call.
    pub fn scope<'s>(&self, session: Option<&'s mut Session>) -> Scope<'s> {
        match session {
            Some(s) => Scope::Borrowed(s),
            None => Scope::Owned(self.session()),
        }
    }

    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        tracing::debug!("database pool closed");
    }
}

fn pool_options(max_connections: u32) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .test_before_acquire(true)
}
