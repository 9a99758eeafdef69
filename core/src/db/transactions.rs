//! Transaction helpers

use super::Result;
use rusqlite::{Connection, Transaction, TransactionBehavior};

/// Execute `operation` inside a transaction.
///
/// Commits when the closure returns `Ok`. On `Err` the transaction is
/// dropped, which rolls it back.
///
/// # Example
/// ```rust,no_run
/// # use pmtrack_core::db::execute_in_transaction;
/// # use rusqlite::{Connection, TransactionBehavior};
/// # fn example(conn: &mut Connection) -> pmtrack_core::db::Result<()> {
/// execute_in_transaction(conn, TransactionBehavior::Immediate, |tx| {
///     tx.execute("DELETE FROM work_item_part_numbers WHERE work_item_id = ?1", [7])?;
///     Ok(())
/// })?;
/// # Ok(())
/// # }
/// ```
pub fn execute_in_transaction<F, T>(
    conn: &mut Connection,
    behavior: TransactionBehavior,
    operation: F,
) -> Result<T>
where
    F: FnOnce(&Transaction) -> Result<T>,
{
    let tx = conn.transaction_with_behavior(behavior)?;

    match operation(&tx) {
        Ok(result) => {
            tx.commit()?;
            Ok(result)
        }
        // Rollback happens via Drop
        Err(e) => Err(e),
    }
}

/// Shorthand for the write path: an IMMEDIATE transaction takes the write
/// lock up front so concurrent writers queue on `busy_timeout` instead of
/// failing at commit.
pub fn write<F, T>(conn: &mut Connection, operation: F) -> Result<T>
where
    F: FnOnce(&Transaction) -> Result<T>,
{
    execute_in_transaction(conn, TransactionBehavior::Immediate, operation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbError;

    fn scratch() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE t (value INTEGER)", [])
            .unwrap();
        conn
    }

    fn count(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM t", [], |row| row.get(0))
            .unwrap_or(-1)
    }

    #[test]
    fn commits_on_ok() {
        let mut conn = scratch();
        let inserted = write(&mut conn, |tx| {
            tx.execute("INSERT INTO t (value) VALUES (1)", [])?;
            tx.execute("INSERT INTO t (value) VALUES (2)", [])?;
            Ok(2)
        });
        assert_eq!(inserted.ok(), Some(2));
        assert_eq!(count(&conn), 2);
    }

    #[test]
    fn rolls_back_on_err() {
        let mut conn = scratch();
        let result: Result<()> = execute_in_transaction(
            &mut conn,
            TransactionBehavior::Deferred,
            |tx| {
                tx.execute("INSERT INTO t (value) VALUES (1)", [])?;
                Err(DbError::Invalid("abort".to_string()))
            },
        );
        assert!(matches!(result, Err(DbError::Invalid(_))));
        assert_eq!(count(&conn), 0);
    }
}
