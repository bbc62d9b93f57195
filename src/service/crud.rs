//! Generic CRUD execution against PostgreSQL, parameterized by record kind.

use super::model::{ListQuery, Model};
use crate::db::{Database, Session};
use crate::error::AppError;
use crate::sql::{delete, insert, select, update, Condition, QueryBuf, Select, Values};
use sqlx::PgConnection;
use std::collections::HashSet;

/// Every call runs on the supplied session, or on a fresh one when `session`
/// is `None`. Writes take `commit`: `true` commits the session at the end of
/// the call, `false` leaves the transaction open for the caller to extend.
#[derive(Clone, Debug)]
pub struct CrudService {
    db: Database,
}

impl CrudService {
    pub fn new(db: Database) -> Self {
        CrudService { db }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Records matching every present condition, deduplicated by primary key.
    pub async fn list<M: Model>(
        &self,
        query: ListQuery<M>,
        session: Option<&mut Session>,
    ) -> Result<Vec<M>, AppError> {
        let mut scope = self.db.scope(session);
        let conn = scope.conn().await?;
        let q = select(&Select {
            table: M::TABLE,
            columns: M::COLUMNS,
            conditions: &query.conditions,
            joins: &query.joins,
            order_by: &query.order_by,
            limit: query.limit,
            offset: query.offset,
            for_update: query.for_update,
        });
        let rows: Vec<M> = Self::query_many(conn, &q).await?;

        let mut seen = HashSet::with_capacity(rows.len());
        let mut rows: Vec<M> = rows.into_iter().filter(|r| seen.insert(r.primary_key())).collect();
        for directive in &query.eager {
            directive.load(&mut *conn, &mut rows).await?;
        }
        Ok(rows)
    }

    /// First record of `list`, or `None` when nothing matches.
    pub async fn get<M: Model>(
        &self,
        query: ListQuery<M>,
        session: Option<&mut Session>,
    ) -> Result<Option<M>, AppError> {
        Ok(self.list(query, session).await?.into_iter().next())
    }

    /// Insert one record and return it as stored, generated id and defaults included.
    pub async fn create<M: Model>(
        &self,
        values: Values,
        session: Option<&mut Session>,
        commit: bool,
    ) -> Result<M, AppError> {
        let mut scope = self.db.scope(session);
        let q = insert(M::TABLE, M::COLUMNS, &values);
        let row = Self::query_optional(scope.conn().await?, &q)
            .await?
            .ok_or(AppError::Db(sqlx::Error::RowNotFound))?;
        scope.finish(commit).await?;
        Ok(row)
    }

    /// Update rows matching `condition`; returns the first updated record, or
    /// `None` when nothing matched.
    pub async fn update<M: Model>(
        &self,
        condition: Condition,
        values: Values,
        session: Option<&mut Session>,
        commit: bool,
    ) -> Result<Option<M>, AppError> {
        Ok(self
            .update_many(condition, values, session, commit)
            .await?
            .into_iter()
            .next())
    }

    /// Update rows matching `condition`; returns every updated record.
    pub async fn update_many<M: Model>(
        &self,
        condition: Condition,
        values: Values,
        session: Option<&mut Session>,
        commit: bool,
    ) -> Result<Vec<M>, AppError> {
        let mut scope = self.db.scope(session);
        let q = update(M::TABLE, M::COLUMNS, &condition, &values);
        let rows = Self::query_many(scope.conn().await?, &q).await?;
        scope.finish(commit).await?;
        Ok(rows)
    }

    /// Delete every row matching `condition`.
    pub async fn delete<M: Model>(
        &self,
        condition: Condition,
        session: Option<&mut Session>,
        commit: bool,
    ) -> Result<(), AppError> {
        let mut scope = self.db.scope(session);
        let q = delete(M::TABLE, &condition);
        Self::execute(scope.conn().await?, &q).await?;
        scope.finish(commit).await?;
        Ok(())
    }

    async fn query_many<M: Model>(conn: &mut PgConnection, q: &QueryBuf) -> Result<Vec<M>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query_as::<_, M>(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        Ok(query.fetch_all(conn).await?)
    }

    async fn query_optional<M: Model>(conn: &mut PgConnection, q: &QueryBuf) -> Result<Option<M>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query_as::<_, M>(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        Ok(query.fetch_optional(conn).await?)
    }

    async fn execute(conn: &mut PgConnection, q: &QueryBuf) -> Result<u64, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "execute");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        Ok(query.execute(conn).await?.rows_affected())
    }
}
