use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use linewatch_db::models::{ReportRow, parse_created_at};
use linewatch_types::api::{Claims, CreateReportRequest, ReportResponse};
use linewatch_types::models::Polarity;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::optional_claims;

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Cursor-based pagination: pass the id of the oldest report from the
    /// previous page to fetch older ones.
    pub before: Option<Uuid>,
}

fn default_limit() -> u32 {
    50
}

pub async fn create_report(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateReportRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.location.trim().is_empty() {
        return Err(ApiError::Invalid("location must not be empty"));
    }

    let report_id = Uuid::new_v4();

    // Run blocking DB insert off the async runtime
    let st = state.clone();
    let rid = report_id.to_string();
    let author_id = claims.sub.to_string();
    let location = req.location.clone();
    let line_number = req.line_number;
    let description = req.description.clone();
    tokio::task::spawn_blocking(move || {
        st.db
            .insert_report(&rid, Some(&author_id), &location, line_number, &description)
    })
    .await
    .map_err(|e| ApiError::Internal(anyhow::anyhow!("spawn_blocking join error: {}", e)))??;

    Ok((
        StatusCode::CREATED,
        Json(ReportResponse {
            id: report_id,
            author_id: Some(claims.sub),
            location: req.location,
            line_number: req.line_number,
            description: req.description,
            created_at: chrono::Utc::now(),
            score: 0,
            user_vote: None,
        }),
    ))
}

pub async fn list_reports(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    // Anonymous callers get null user_vote; a credential that is present
    // but invalid is rejected, not ignored
    let claims = optional_claims(&headers, &state.jwt_secret)?;
    let caller = claims.map(|c| c.sub.to_string());

    // Run all blocking DB queries off the async runtime
    let st = state.clone();
    let limit = query.limit.min(200);
    let before = query.before.map(|id| id.to_string());

    let (rows, tallies, caller_votes) = tokio::task::spawn_blocking(move || {
        let rows = st.db.get_reports(limit, before.as_deref())?;

        let report_ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
        let tallies = st.db.vote_tallies_for_reports(&report_ids)?;
        let caller_votes = match &caller {
            Some(uid) => st.db.user_votes_for_reports(uid, &report_ids)?,
            None => vec![],
        };

        Ok::<_, ApiError>((rows, tallies, caller_votes))
    })
    .await
    .map_err(|e| ApiError::Internal(anyhow::anyhow!("spawn_blocking join error: {}", e)))??;

    // Cheap in-memory joins, fine on the async thread
    let mut score_map: HashMap<String, i64> = HashMap::new();
    for t in &tallies {
        score_map.insert(t.report_id.clone(), t.score());
    }
    let mut vote_map: HashMap<String, Polarity> = HashMap::new();
    for v in &caller_votes {
        vote_map.insert(v.report_id.clone(), v.polarity);
    }

    let reports: Vec<ReportResponse> = rows
        .into_iter()
        .map(|row| to_response(row, &score_map, &vote_map))
        .collect();

    Ok(Json(reports))
}

fn to_response(
    row: ReportRow,
    score_map: &HashMap<String, i64>,
    vote_map: &HashMap<String, Polarity>,
) -> ReportResponse {
    let id = row.id.parse().unwrap_or_else(|e| {
        warn!("Corrupt report id '{}': {}", row.id, e);
        Uuid::default()
    });

    let author_id = row.author_id.as_ref().and_then(|aid| match aid.parse() {
        Ok(uid) => Some(uid),
        Err(e) => {
            warn!("Corrupt author_id '{}' on report '{}': {}", aid, row.id, e);
            None
        }
    });

    let created_at = parse_created_at(&row.created_at).unwrap_or_else(|| {
        warn!(
            "Corrupt created_at '{}' on report '{}'",
            row.created_at, row.id
        );
        chrono::DateTime::default()
    });

    // A report with no votes has no tally row; that is a zero score
    let score = score_map.get(&row.id).copied().unwrap_or(0);
    let user_vote = vote_map.get(&row.id).copied();

    ReportResponse {
        id,
        author_id,
        location: row.location,
        line_number: row.line_number,
        description: row.description,
        created_at,
        score,
        user_vote,
    }
}
