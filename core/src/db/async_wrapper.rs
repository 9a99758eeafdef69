//! Async bridge for the synchronous SQLite layer.
//!
//! SQLite calls block, so async callers hand a closure to
//! [`with_connection`], which runs it on Tokio's blocking thread pool with a
//! pooled connection.

use super::{DbError, DbPool, Result};
use rusqlite::Connection;

/// Run a synchronous database operation from async code.
///
/// # Example
/// ```rust,no_run
/// # use pmtrack_core::db::{with_connection, DbPool};
/// # async fn example(pool: &DbPool) -> pmtrack_core::db::Result<()> {
/// let programs = with_connection(pool, |conn| {
///     pmtrack_core::db::repo::programs::list(conn)
/// })
/// .await?;
/// # Ok(())
/// # }
/// ```
pub async fn with_connection<F, T>(pool: &DbPool, f: F) -> Result<T>
where
    F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let pool = pool.clone();

    tokio::task::spawn_blocking(move || {
        let mut conn = pool
            .get()
            .map_err(|e| DbError::Pool(format!("Failed to get connection: {e}")))?;

        f(&mut conn)
    })
    .await
    .map_err(|e| DbError::Transaction(format!("Task join error: {e}")))?
}
