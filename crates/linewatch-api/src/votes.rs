use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

use linewatch_types::api::{CastVoteRequest, CastVoteResponse, Claims};

use crate::auth::AppState;
use crate::error::ApiError;

pub async fn cast_vote(
    State(state): State<AppState>,
    Path(report_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CastVoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let st = state.clone();
    let rid = report_id.to_string();
    let user_id = claims.sub.to_string();

    let outcome = tokio::task::spawn_blocking(move || st.db.cast_vote(&user_id, &rid, req.polarity))
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("spawn_blocking join error: {}", e)))??
        .ok_or(ApiError::NotFound("report"))?;

    Ok(Json(CastVoteResponse {
        status: outcome.status,
        score: outcome.score,
        user_vote: outcome.user_vote,
    }))
}
