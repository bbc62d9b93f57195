//! Record kinds, list queries, and eager loading of child collections.

use crate::sql::{select, Column, Condition, Join, OrderBy, Select};
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgConnection};
use std::collections::HashMap;

/// A record kind stored in one table with a single integer primary key.
pub trait Model: for<'r> FromRow<'r, PgRow> + Send + Unpin + 'static {
    const TABLE: &'static str;
    /// Every persisted column, in SELECT order.
    const COLUMNS: &'static [Column];
    const PRIMARY_KEY: Column;

    fn primary_key(&self) -> i64;
}

/// Fetches a related collection for a batch of already-loaded parents.
#[async_trait]
pub trait EagerLoad<P>: Send + Sync {
    async fn load(&self, conn: &mut PgConnection, parents: &mut [P]) -> Result<(), sqlx::Error>;
}

/// One-to-many relation: children whose `foreign_key` equals the parent key.
pub struct HasMany<P, C> {
    pub foreign_key: Column,
    pub parent_key: fn(&P) -> i64,
    pub child_key: fn(&C) -> i64,
    pub attach: fn(&mut P, Vec<C>),
}

#[async_trait]
impl<P, C> EagerLoad<P> for HasMany<P, C>
where
    P: Send + Sync + 'static,
    C: Model,
{
    async fn load(&self, conn: &mut PgConnection, parents: &mut [P]) -> Result<(), sqlx::Error> {
        if parents.is_empty() {
            return Ok(());
        }
        let mut keys: Vec<i64> = parents.iter().map(self.parent_key).collect();
        keys.sort_unstable();
        keys.dedup();
        let conditions = [Some(self.foreign_key.is_in(keys))];
        let order = [C::PRIMARY_KEY.asc()];
        let q = select(&Select {
            conditions: &conditions,
            order_by: &order,
            ..Select::new(C::TABLE, C::COLUMNS)
        });
        tracing::debug!(sql = %q.sql, params = ?q.params, "eager load");
        let mut query = sqlx::query_as::<_, C>(&q.sql);
        for p in q.params {
            query = query.bind(p);
        }
        let children = query.fetch_all(&mut *conn).await?;

        let mut grouped: HashMap<i64, Vec<C>> = HashMap::new();
        for child in children {
            grouped.entry((self.child_key)(&child)).or_default().push(child);
        }
        for parent in parents.iter_mut() {
            let key = (self.parent_key)(parent);
            (self.attach)(parent, grouped.remove(&key).unwrap_or_default());
        }
        Ok(())
    }
}

/// Declarative description of a list over record kind `M`.
pub struct ListQuery<M> {
    pub conditions: Vec<Option<Condition>>,
    pub joins: Vec<Join>,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub eager: Vec<Box<dyn EagerLoad<M>>>,
    pub for_update: bool,
}

impl<M> Default for ListQuery<M> {
    fn default() -> Self {
        ListQuery {
            conditions: Vec::new(),
            joins: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
            eager: Vec::new(),
            for_update: false,
        }
    }
}

impl<M> ListQuery<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a predicate. `None` is accepted and ignored, so optional filters compose.
    pub fn filter(mut self, condition: impl Into<Option<Condition>>) -> Self {
        self.conditions.push(condition.into());
        self
    }

    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn eager<E: EagerLoad<M> + 'static>(mut self, directive: E) -> Self {
        self.eager.push(Box::new(directive));
        self
    }

    /// Lock the returned rows until the session's transaction ends.
    pub fn for_update(mut self) -> Self {
        self.for_update = true;
        self
    }
}
