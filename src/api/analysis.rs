use axum::extract::{Path, State};
use std::time::Instant;

use super::{error::ApiError, response::ApiResponse};
use crate::auth::AuthBearer;
use crate::domain::{PowerSeries, SystemId, SystemScore};
use crate::state::AppState;

/// GET /systems/:id/power-estimates
///
/// A system without usable data answers 200 with a `no_data` payload.
pub async fn power_estimates(
    State(st): State<AppState>,
    _auth: AuthBearer,
    Path(id): Path<SystemId>,
) -> Result<ApiResponse<PowerSeries>, ApiError> {
    let started = Instant::now();
    let series = st.engine.estimate_power_series(id).await?;
    let count = series.estimates().map(<[_]>::len);
    let response = match count {
        Some(count) => ApiResponse::success(series).with_count(count),
        None => ApiResponse::success(series),
    };
    Ok(response.timed(started))
}

/// GET /scores - fleet leaderboard in ascending system id order
pub async fn scores(
    State(st): State<AppState>,
    _auth: AuthBearer,
) -> Result<ApiResponse<Vec<SystemScore>>, ApiError> {
    let started = Instant::now();
    let scores = st.engine.score_all_systems().await?;
    let count = scores.len();
    Ok(ApiResponse::success(scores).with_count(count).timed(started))
}
