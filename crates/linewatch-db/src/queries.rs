use crate::Database;
use crate::models::{ReportRow, UserRow};
use anyhow::Result;
use rusqlite::Connection;

impl Database {
    // -- Users --

    pub fn create_user(&self, id: &str, email: &str, password_hash: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, email, password) VALUES (?1, ?2, ?3)",
                (id, email, password_hash),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_email(conn, email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    // -- Reports --

    pub fn insert_report(
        &self,
        id: &str,
        author_id: Option<&str>,
        location: &str,
        line_number: Option<i64>,
        description: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO reports (id, author_id, location, line_number, description) VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, author_id, location, line_number, description],
            )?;
            Ok(())
        })
    }

    /// Newest-first page of reports. `before` is an exclusive cursor: the
    /// id of the last row of the previous page. A cursor that matches no
    /// row reads as the end of the feed.
    pub fn get_reports(&self, limit: u32, before: Option<&str>) -> Result<Vec<ReportRow>> {
        self.with_conn(|conn| query_reports(conn, limit, before))
    }

    /// All reports created at or after `cutoff` (a datetime('now')-style
    /// string). Feeds the per-line outlook aggregation.
    pub fn get_reports_since(&self, cutoff: &str) -> Result<Vec<ReportRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, author_id, location, line_number, description, created_at
                 FROM reports
                 WHERE created_at >= ?1",
            )?;

            let rows = stmt
                .query_map([cutoff], map_report_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

fn query_user_by_email(conn: &Connection, email: &str) -> Result<Option<UserRow>> {
    let mut stmt =
        conn.prepare("SELECT id, email, password, created_at FROM users WHERE email = ?1")?;

    let row = stmt
        .query_row([email], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                email: row.get(1)?,
                password: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_user_by_id(conn: &Connection, id: &str) -> Result<Option<UserRow>> {
    let mut stmt =
        conn.prepare("SELECT id, email, password, created_at FROM users WHERE id = ?1")?;

    let row = stmt
        .query_row([id], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                email: row.get(1)?,
                password: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_reports(conn: &Connection, limit: u32, before: Option<&str>) -> Result<Vec<ReportRow>> {
    // rowid breaks ties between rows stamped in the same second, in both
    // the ordering and the cursor comparison
    let rows = match before {
        Some(cursor_id) => {
            let anchor: Option<(String, i64)> = conn
                .query_row(
                    "SELECT created_at, rowid FROM reports WHERE id = ?1",
                    [cursor_id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            let (created_at, rowid) = match anchor {
                Some(a) => a,
                None => return Ok(vec![]),
            };

            let mut stmt = conn.prepare(
                "SELECT id, author_id, location, line_number, description, created_at
                 FROM reports
                 WHERE created_at < ?1 OR (created_at = ?1 AND rowid < ?2)
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT ?3",
            )?;
            stmt.query_map(rusqlite::params![created_at, rowid, limit], map_report_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
        None => {
            let mut stmt = conn.prepare(
                "SELECT id, author_id, location, line_number, description, created_at
                 FROM reports
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT ?1",
            )?;
            stmt.query_map([limit], map_report_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };

    Ok(rows)
}

fn map_report_row(row: &rusqlite::Row) -> rusqlite::Result<ReportRow> {
    Ok(ReportRow {
        id: row.get(0)?,
        author_id: row.get(1)?,
        location: row.get(2)?,
        line_number: row.get(3)?,
        description: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Extension trait for optional query results
pub(crate) trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
