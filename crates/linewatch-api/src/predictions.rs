use std::collections::HashMap;

use axum::{Json, extract::State, response::IntoResponse};
use chrono::{DateTime, Datelike, Duration, Utc};
use tracing::warn;

use linewatch_db::models::{ReportRow, parse_created_at};
use linewatch_types::api::{DayOutlook, LineOutlook};

use crate::auth::AppState;
use crate::error::ApiError;

/// Weekday labels in outlook order.
pub const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// How far back the outlook window reaches.
const LOOKBACK_DAYS: i64 = 7;

pub async fn get_predictions(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let now = Utc::now();
    let cutoff = (now - Duration::days(LOOKBACK_DAYS))
        .format("%Y-%m-%d %H:%M:%S")
        .to_string();

    let st = state.clone();
    let rows = tokio::task::spawn_blocking(move || st.db.get_reports_since(&cutoff))
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("spawn_blocking join error: {}", e)))??;

    Ok(Json(build_outlook(&rows, now)))
}

/// Buckets the last week of reports by line and weekday. A weekday with at
/// least one report projects a 100 percent delay outlook for the same
/// weekday next week, otherwise 0.
pub fn build_outlook(rows: &[ReportRow], now: DateTime<Utc>) -> Vec<LineOutlook> {
    let window_start = now - Duration::days(LOOKBACK_DAYS);

    let mut per_line: HashMap<Option<i64>, [u32; 7]> = HashMap::new();
    for row in rows {
        let Some(created) = parse_created_at(&row.created_at) else {
            warn!(
                "Corrupt created_at '{}' on report '{}'",
                row.created_at, row.id
            );
            continue;
        };
        // The SQL cutoff is coarse; re-check the window against `now`
        if created < window_start || created > now {
            continue;
        }

        let weekday = created.weekday().num_days_from_monday() as usize;
        per_line.entry(row.line_number).or_default()[weekday] += 1;
    }

    let mut outlooks: Vec<LineOutlook> = per_line
        .into_iter()
        .map(|(line_number, counts)| {
            let days = WEEKDAYS
                .into_iter()
                .zip(counts)
                .map(|(weekday, count)| DayOutlook {
                    weekday,
                    count,
                    percent: if count > 0 { 100 } else { 0 },
                })
                .collect();

            LineOutlook {
                line_number,
                total_reports: counts.iter().sum(),
                days,
            }
        })
        .collect();

    // Busiest lines first; the no-line bucket sorts ahead on ties
    outlooks.sort_by(|a, b| {
        b.total_reports
            .cmp(&a.total_reports)
            .then(a.line_number.cmp(&b.line_number))
    });

    outlooks
}
