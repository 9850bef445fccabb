use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Polarity, VoteStatus};

// -- JWT Claims --

/// JWT claims carried by every signed bearer token. Both the required
/// and optional auth paths decode into this shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub email: String,
    pub token: String,
}

/// Account view for the dashboard. Reputation is derived from the vote
/// ledger on every read, never stored.
#[derive(Debug, Serialize)]
pub struct UserInfoResponse {
    pub user_id: Uuid,
    pub email: String,
    pub reputation: i64,
}

// -- Reports --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateReportRequest {
    /// Free-form location string; the mobile client sends "lat,lon" from
    /// a dropped map pin. The server never interprets it.
    pub location: String,
    pub line_number: Option<i64>,
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub id: Uuid,
    /// None for system-authored reports.
    pub author_id: Option<Uuid>,
    pub location: String,
    pub line_number: Option<i64>,
    pub description: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// Upvotes minus downvotes, recomputed from the ledger.
    pub score: i64,
    /// The requesting user's current vote, when the request carried a
    /// credential; null otherwise.
    pub user_vote: Option<Polarity>,
}

// -- Votes --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CastVoteRequest {
    pub polarity: Polarity,
}

#[derive(Debug, Serialize)]
pub struct CastVoteResponse {
    pub status: VoteStatus,
    pub score: i64,
    pub user_vote: Option<Polarity>,
}

// -- Predictions --

/// One weekday's slice of a line's delay outlook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayOutlook {
    /// "Mon" .. "Sun".
    pub weekday: &'static str,
    /// Reports seen on this weekday within the lookback window.
    pub count: u32,
    /// Projected delay probability for the same weekday next week:
    /// 100 when the weekday saw at least one report, else 0.
    pub percent: u8,
}

/// Per-line outlook derived from the last week's reports.
#[derive(Debug, Clone, Serialize)]
pub struct LineOutlook {
    /// None groups the reports that carried no line number.
    pub line_number: Option<i64>,
    pub total_reports: u32,
    /// Always seven entries, Monday first.
    pub days: Vec<DayOutlook>,
}
