//! Enum <-> TEXT column mapping.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

use crate::pm::{DeliverableType, IssueType, PartState, Priority, Status, WorkItemType};

macro_rules! text_column {
    ($($ty:ty),+ $(,)?) => {$(
        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                let text: &str = self.as_ref();
                Ok(ToSqlOutput::from(text))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: strum::ParseError| FromSqlError::Other(Box::new(e)))
            }
        }
    )+};
}

text_column!(
    WorkItemType,
    Status,
    Priority,
    PartState,
    IssueType,
    DeliverableType,
);

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn round_trips_through_text_column() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (status TEXT NOT NULL)")
            .unwrap();
        conn.execute("INSERT INTO t (status) VALUES (?1)", [Status::UnderReview])
            .unwrap();

        let raw: String = conn
            .query_row("SELECT status FROM t", [], |row| row.get(0))
            .unwrap();
        assert_eq!(raw, "UnderReview");
        let parsed: Option<Status> = conn
            .query_row("SELECT status FROM t", [], |row| row.get(0))
            .ok();
        assert_eq!(parsed, Some(Status::UnderReview));
    }

    #[test]
    fn unknown_text_is_a_conversion_error() {
        let conn = Connection::open_in_memory().unwrap();
        let parsed = conn.query_row("SELECT 'Finished'", [], |row| row.get::<_, Status>(0));
        assert!(matches!(
            parsed,
            Err(rusqlite::Error::FromSqlConversionFailure(..))
        ));
    }
}
