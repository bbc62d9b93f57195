use sqlx::{PgConnection, PgPool, Postgres, Transaction};

/// Transactional handle for one unit of work.
///
/// The transaction begins on first use. `commit` ends it; the next use begins
/// a new one. Work that was never committed is rolled back when the session
/// is dropped.
pub struct Session {
    pool: PgPool,
    tx: Option<Transaction<'static, Postgres>>,
}

impl Session {
    pub(crate) fn new(pool: PgPool) -> Self {
        Session { pool, tx: None }
    }

    pub async fn conn(&mut self) -> Result<&mut PgConnection, sqlx::Error> {
        let tx = match self.tx.take() {
            Some(tx) => tx,
            None => self.pool.begin().await?,
        };
        Ok(&mut **self.tx.insert(tx))
    }

    pub fn in_transaction(&self) -> bool {
        self.tx.is_some()
    }

    pub async fn commit(&mut self) -> Result<(), sqlx::Error> {
        if let Some(tx) = self.tx.take() {
            tx.commit().await?;
        }
        Ok(())
    }

    pub async fn rollback(&mut self) -> Result<(), sqlx::Error> {
        if let Some(tx) = self.tx.take() {
            tx.rollback().await?;
        }
        Ok(())
    }
}

/// Either a caller-supplied session or one opened for a single engine call.
pub enum Scope<'s> {
    Borrowed(&'s mut Session),
    Owned(Session),
}

impl Scope<'_> {
    pub fn session(&mut self) -> &mut Session {
        match self {
            Scope::Borrowed(s) => s,
            Scope::Owned(s) => s,
        }
    }

    pub async fn conn(&mut self) -> Result<&mut PgConnection, sqlx::Error> {
        self.session().conn().await
    }

    /// Commit when asked to. An owned session left uncommitted rolls back on drop.
    pub async fn finish(mut self, commit: bool) -> Result<(), sqlx::Error> {
        if commit {
            self.session().commit().await?;
        }
        Ok(())
    }
}
