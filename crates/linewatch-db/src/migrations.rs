use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);"
    )?;

    let version: i64 = conn
        .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id          TEXT PRIMARY KEY,
                email       TEXT NOT NULL UNIQUE,
                password    TEXT NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE reports (
                id          TEXT PRIMARY KEY,
                author_id   TEXT REFERENCES users(id),
                location    TEXT NOT NULL,
                line_number INTEGER,
                description TEXT NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_reports_created
                ON reports(created_at);
            CREATE INDEX idx_reports_author
                ON reports(author_id);

            -- One vote per (report, user); polarity flips rewrite the row
            CREATE TABLE votes (
                report_id   TEXT NOT NULL REFERENCES reports(id) ON DELETE CASCADE,
                user_id     TEXT NOT NULL REFERENCES users(id),
                polarity    TEXT NOT NULL CHECK (polarity IN ('up', 'down')),
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (report_id, user_id)
            );

            INSERT INTO schema_version (version) VALUES (1);
            "
        )?;
    }

    Ok(())
}
