//! Connection pool, scoped sessions, and schema bootstrap.

mod pool;
mod schema;
mod session;

pub use pool::Database;
pub use schema::{ensure_database_exists, ensure_schema};
pub use session::{Scope, Session};
