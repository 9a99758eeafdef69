//! Connection pooling and pragma configuration

use std::path::Path;
use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use super::{DbError, Result};

pub type DbPool = Pool<SqliteConnectionManager>;

/// Negative values are KiB: -32000 is roughly 32 MB of page cache.
const CACHE_SIZE_KIB: i32 = -32000;

const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Open a pool on `db_path`, creating the parent directory if needed.
///
/// Every pooled connection runs in WAL mode with foreign keys enforced,
/// `synchronous = NORMAL`, a 5 s busy timeout and a 32 MB page cache.
pub fn initialize_pool(db_path: &Path, pool_size: u32) -> Result<DbPool> {
    if let Some(parent) = db_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| {
            DbError::Pool(format!("cannot create {}: {e}", parent.display()))
        })?;
    }

    let manager = SqliteConnectionManager::file(db_path).with_init(apply_pragmas);
    let pool = Pool::builder()
        .max_size(pool_size)
        .build(manager)
        .map_err(|e| DbError::Pool(format!("Failed to build pool: {e}")))?;

    let conn = pool
        .get()
        .map_err(|e| DbError::Pool(format!("Failed to get connection: {e}")))?;
    verify_pragmas(&conn)?;

    tracing::debug!(path = %db_path.display(), pool_size, "sqlite pool ready");
    Ok(pool)
}

/// A private in-memory database with the same pragmas as pooled
/// connections (journal mode aside, which SQLite pins to `memory`).
pub fn open_in_memory() -> Result<Connection> {
    let mut conn = Connection::open_in_memory()?;
    apply_pragmas(&mut conn)?;
    Ok(conn)
}

fn apply_pragmas(conn: &mut Connection) -> rusqlite::Result<()> {
    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
    conn.pragma_update(None, "foreign_keys", true)?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "cache_size", CACHE_SIZE_KIB)?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;
    conn.busy_timeout(BUSY_TIMEOUT)
}

fn verify_pragmas(conn: &Connection) -> Result<()> {
    let journal_mode: String = conn.pragma_query_value(None, "journal_mode", |row| row.get(0))?;
    if !journal_mode.eq_ignore_ascii_case("wal") {
        return Err(DbError::Pool(format!(
            "expected WAL journal mode, got {journal_mode}"
        )));
    }
    let foreign_keys: i32 = conn.pragma_query_value(None, "foreign_keys", |row| row.get(0))?;
    if foreign_keys != 1 {
        return Err(DbError::Pool("foreign key enforcement is off".to_string()));
    }
    Ok(())
}
