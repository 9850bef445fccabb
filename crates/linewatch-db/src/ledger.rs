//! The vote ledger: one row per (report, user) pair, with the transition
//! rules applied inside a single transaction on the writer connection.
//!
//! Transitions from the caller's current vote:
//!   no vote + up/down    -> insert            ("upvoted"/"downvoted")
//!   opposite polarity    -> delete + insert   ("switched")
//!   same polarity again  -> delete            ("removed")
//!
//! The score is always recomputed from the table inside the same
//! transaction, never adjusted incrementally, so it cannot drift from the
//! rows that produced it.

use crate::Database;
use crate::models::{TallyRow, UserVoteRow, parse_polarity};
use crate::queries::OptionalExt;
use anyhow::Result;
use linewatch_types::models::{Polarity, VoteStatus};
use rusqlite::Connection;

/// What a vote request did, plus the post-transition aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteOutcome {
    pub status: VoteStatus,
    pub score: i64,
    pub user_vote: Option<Polarity>,
}

/// Score and caller's standing vote for one report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteAggregate {
    pub score: i64,
    pub user_vote: Option<Polarity>,
}

impl Database {
    /// Applies one vote request against the ledger. Returns `Ok(None)` when
    /// the report does not exist; nothing is written in that case.
    ///
    /// The writer mutex serializes all calls, and the delete + insert of a
    /// polarity switch commits as one transaction, so readers never observe
    /// a pair with the old vote gone and the new one missing.
    pub fn cast_vote(
        &self,
        user_id: &str,
        report_id: &str,
        polarity: Polarity,
    ) -> Result<Option<VoteOutcome>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let report_exists: Option<i64> = tx
                .query_row("SELECT 1 FROM reports WHERE id = ?1", [report_id], |row| {
                    row.get(0)
                })
                .optional()?;
            if report_exists.is_none() {
                return Ok(None);
            }

            let current: Option<String> = tx
                .query_row(
                    "SELECT polarity FROM votes WHERE report_id = ?1 AND user_id = ?2",
                    [report_id, user_id],
                    |row| row.get(0),
                )
                .optional()?;
            let current = current.as_deref().map(parse_polarity).transpose()?;

            let (status, user_vote) = match current {
                None => {
                    tx.execute(
                        "INSERT INTO votes (report_id, user_id, polarity) VALUES (?1, ?2, ?3)",
                        [report_id, user_id, polarity.as_str()],
                    )?;
                    let status = match polarity {
                        Polarity::Up => VoteStatus::Upvoted,
                        Polarity::Down => VoteStatus::Downvoted,
                    };
                    (status, Some(polarity))
                }
                Some(existing) if existing == polarity.flipped() => {
                    // Switch: drop the opposing vote, then record the new one
                    tx.execute(
                        "DELETE FROM votes WHERE report_id = ?1 AND user_id = ?2",
                        [report_id, user_id],
                    )?;
                    tx.execute(
                        "INSERT INTO votes (report_id, user_id, polarity) VALUES (?1, ?2, ?3)",
                        [report_id, user_id, polarity.as_str()],
                    )?;
                    (VoteStatus::Switched, Some(polarity))
                }
                Some(_) => {
                    tx.execute(
                        "DELETE FROM votes WHERE report_id = ?1 AND user_id = ?2",
                        [report_id, user_id],
                    )?;
                    (VoteStatus::Removed, None)
                }
            };

            let score = score_for_report(&tx, report_id)?;
            tx.commit()?;

            Ok(Some(VoteOutcome {
                status,
                score,
                user_vote,
            }))
        })
    }

    /// Score and the caller's standing vote for one report, read from a
    /// pool connection. Pass `user_id = None` for anonymous callers.
    pub fn vote_aggregate(&self, report_id: &str, user_id: Option<&str>) -> Result<VoteAggregate> {
        self.with_conn(|conn| {
            let score = score_for_report(conn, report_id)?;
            let user_vote = match user_id {
                Some(uid) => {
                    let raw: Option<String> = conn
                        .query_row(
                            "SELECT polarity FROM votes WHERE report_id = ?1 AND user_id = ?2",
                            [report_id, uid],
                            |row| row.get(0),
                        )
                        .optional()?;
                    raw.as_deref().map(parse_polarity).transpose()?
                }
                None => None,
            };
            Ok(VoteAggregate { score, user_vote })
        })
    }

    /// Batch-fetch vote tallies for a set of report IDs.
    pub fn vote_tallies_for_reports(&self, report_ids: &[String]) -> Result<Vec<TallyRow>> {
        if report_ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> =
                (1..=report_ids.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT report_id,
                        COUNT(CASE WHEN polarity = 'up' THEN 1 END),
                        COUNT(CASE WHEN polarity = 'down' THEN 1 END)
                 FROM votes WHERE report_id IN ({})
                 GROUP BY report_id",
                placeholders.join(", ")
            );

            let mut stmt = conn.prepare(&sql)?;
            let params: Vec<&dyn rusqlite::types::ToSql> = report_ids
                .iter()
                .map(|id| id as &dyn rusqlite::types::ToSql)
                .collect();

            let rows = stmt
                .query_map(params.as_slice(), |row| {
                    Ok(TallyRow {
                        report_id: row.get(0)?,
                        upvotes: row.get(1)?,
                        downvotes: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Batch-fetch one user's standing votes across a set of report IDs.
    pub fn user_votes_for_reports(
        &self,
        user_id: &str,
        report_ids: &[String],
    ) -> Result<Vec<UserVoteRow>> {
        if report_ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> =
                (2..=report_ids.len() + 1).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT report_id, polarity FROM votes
                 WHERE user_id = ?1 AND report_id IN ({})",
                placeholders.join(", ")
            );

            let mut stmt = conn.prepare(&sql)?;
            let mut params: Vec<&dyn rusqlite::types::ToSql> = vec![&user_id];
            params.extend(
                report_ids
                    .iter()
                    .map(|id| id as &dyn rusqlite::types::ToSql),
            );

            let raw = stmt
                .query_map(params.as_slice(), |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })?
                .collect::<std::result::Result<Vec<(String, String)>, _>>()?;

            raw.into_iter()
                .map(|(report_id, polarity)| {
                    Ok(UserVoteRow {
                        report_id,
                        polarity: parse_polarity(&polarity)?,
                    })
                })
                .collect()
        })
    }

    /// Net votes received across every report the user authored. Derived
    /// on read so it always matches the ledger.
    pub fn user_reputation(&self, user_id: &str) -> Result<i64> {
        self.with_conn(|conn| {
            let reputation: i64 = conn.query_row(
                "SELECT COALESCE(SUM(CASE v.polarity WHEN 'up' THEN 1 ELSE -1 END), 0)
                 FROM votes v
                 JOIN reports r ON r.id = v.report_id
                 WHERE r.author_id = ?1",
                [user_id],
                |row| row.get(0),
            )?;
            Ok(reputation)
        })
    }
}

fn score_for_report(conn: &Connection, report_id: &str) -> Result<i64> {
    let (ups, downs): (i64, i64) = conn.query_row(
        "SELECT COUNT(CASE WHEN polarity = 'up' THEN 1 END),
                COUNT(CASE WHEN polarity = 'down' THEN 1 END)
         FROM votes WHERE report_id = ?1",
        [report_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    Ok(ups - downs)
}
