//! Database row types. These map directly to SQLite rows and stay
//! distinct from the linewatch-types API models so the DB layer does not
//! leak serialization concerns.

use anyhow::{Result, anyhow};
use chrono::{DateTime, NaiveDateTime, Utc};
use linewatch_types::models::Polarity;

pub struct UserRow {
    pub id: String,
    pub email: String,
    pub password: String,
    pub created_at: String,
}

pub struct ReportRow {
    pub id: String,
    pub author_id: Option<String>,
    pub location: String,
    pub line_number: Option<i64>,
    pub description: String,
    pub created_at: String,
}

/// Up/down counts for one report, aggregated from the votes table.
pub struct TallyRow {
    pub report_id: String,
    pub upvotes: i64,
    pub downvotes: i64,
}

impl TallyRow {
    pub fn score(&self) -> i64 {
        self.upvotes - self.downvotes
    }
}

pub struct UserVoteRow {
    pub report_id: String,
    pub polarity: Polarity,
}

/// Parses a polarity string coming out of the votes table. The CHECK
/// constraint keeps anything else out, so a failure here means the file
/// was modified outside this process.
pub fn parse_polarity(s: &str) -> Result<Polarity> {
    match s {
        "up" => Ok(Polarity::Up),
        "down" => Ok(Polarity::Down),
        other => Err(anyhow!("Invalid polarity in votes table: {}", other)),
    }
}

/// SQLite's datetime('now') writes "YYYY-MM-DD HH:MM:SS" in UTC. Accept
/// RFC 3339 too in case rows were imported from elsewhere.
pub fn parse_created_at(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = s.parse::<DateTime<Utc>>() {
        return Some(dt);
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|n| n.and_utc())
}
