use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{error::ApiError, response::ApiResponse};
use crate::auth::AuthBearer;
use crate::domain::{ElectricalReading, MeteorologicalReading, SystemId, TimeRange};
use crate::ingest::{read_electrical, read_meteorological};
use crate::state::AppState;

/// Optional inclusive bounds; a missing side is unbounded
#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl RangeQuery {
    pub fn range(&self) -> Result<TimeRange, ApiError> {
        let all = TimeRange::all();
        TimeRange::new(self.from.unwrap_or(all.start), self.to.unwrap_or(all.end))
            .ok_or_else(|| ApiError::BadRequest("`from` must not be after `to`".to_string()))
    }

    /// Range for deletions, which must name at least one bound
    pub fn bounded_range(&self) -> Result<TimeRange, ApiError> {
        if self.from.is_none() && self.to.is_none() {
            return Err(ApiError::BadRequest(
                "deleting readings requires `from` or `to`".to_string(),
            ));
        }
        self.range()
    }
}

/// Electrical row as posted by a client; the system comes from the path
#[derive(Debug, Clone, Deserialize)]
pub struct NewElectricalReading {
    pub time: DateTime<Utc>,
    pub adresse: Option<i64>,
    pub i1: Option<f64>,
    pub u_dc: Option<f64>,
    pub p_dc: Option<f64>,
    pub t1: Option<f64>,
    pub t2: Option<f64>,
    pub i_sum: Option<f64>,
}

impl NewElectricalReading {
    fn into_reading(self, system_id: SystemId) -> ElectricalReading {
        ElectricalReading {
            system_id,
            time: self.time,
            adresse: self.adresse,
            i1: self.i1,
            u_dc: self.u_dc,
            p_dc: self.p_dc,
            t1: self.t1,
            t2: self.t2,
            i_sum: self.i_sum,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Inserted {
    pub inserted: usize,
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub deleted: usize,
}

async fn require_system(st: &AppState, id: SystemId) -> Result<(), ApiError> {
    match st.store().get_system(id).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::NotFound(format!("system {id}"))),
    }
}

/// GET /systems/:id/electrical?from&to
pub async fn list_electrical(
    State(st): State<AppState>,
    _auth: AuthBearer,
    Path(id): Path<SystemId>,
    Query(q): Query<RangeQuery>,
) -> Result<ApiResponse<Vec<ElectricalReading>>, ApiError> {
    let range = q.range()?;
    require_system(&st, id).await?;
    let rows = st.store().fetch_electrical(id, range).await?;
    let count = rows.len();
    Ok(ApiResponse::success(rows).with_count(count))
}

/// POST /systems/:id/electrical
pub async fn create_electrical(
    State(st): State<AppState>,
    _auth: AuthBearer,
    Path(id): Path<SystemId>,
    Json(body): Json<Vec<NewElectricalReading>>,
) -> Result<ApiResponse<Inserted>, ApiError> {
    require_system(&st, id).await?;
    let rows = body.into_iter().map(|r| r.into_reading(id)).collect();
    let inserted = st.store().insert_electrical(rows).await?;
    Ok(ApiResponse::created(Inserted { inserted }))
}

/// DELETE /systems/:id/electrical?from&to
pub async fn delete_electrical(
    State(st): State<AppState>,
    _auth: AuthBearer,
    Path(id): Path<SystemId>,
    Query(q): Query<RangeQuery>,
) -> Result<ApiResponse<Deleted>, ApiError> {
    let range = q.bounded_range()?;
    require_system(&st, id).await?;
    let deleted = st.store().delete_electrical(id, range).await?;
    tracing::info!(system_id = id, deleted, %range, "electrical readings deleted");
    Ok(ApiResponse::success(Deleted { deleted }))
}

/// POST /systems/:id/electrical/csv with a logger export as the body
pub async fn upload_electrical_csv(
    State(st): State<AppState>,
    _auth: AuthBearer,
    Path(id): Path<SystemId>,
    body: String,
) -> Result<ApiResponse<Inserted>, ApiError> {
    require_system(&st, id).await?;
    let offset = st.cfg.data.timezone_offset()?;
    let rows = read_electrical(body.as_bytes(), id, offset)?;
    let inserted = st.store().insert_electrical(rows).await?;
    tracing::info!(system_id = id, inserted, "electrical CSV uploaded");
    Ok(ApiResponse::created(Inserted { inserted }))
}

/// GET /meteorological?from&to
pub async fn list_meteorological(
    State(st): State<AppState>,
    _auth: AuthBearer,
    Query(q): Query<RangeQuery>,
) -> Result<ApiResponse<Vec<MeteorologicalReading>>, ApiError> {
    let rows = st.store().fetch_meteorological(q.range()?).await?;
    let count = rows.len();
    Ok(ApiResponse::success(rows).with_count(count))
}

/// POST /meteorological
pub async fn create_meteorological(
    State(st): State<AppState>,
    _auth: AuthBearer,
    Json(body): Json<Vec<MeteorologicalReading>>,
) -> Result<ApiResponse<Inserted>, ApiError> {
    let inserted = st.store().insert_meteorological(body).await?;
    Ok(ApiResponse::created(Inserted { inserted }))
}

/// DELETE /meteorological?from&to
pub async fn delete_meteorological(
    State(st): State<AppState>,
    _auth: AuthBearer,
    Query(q): Query<RangeQuery>,
) -> Result<ApiResponse<Deleted>, ApiError> {
    let range = q.bounded_range()?;
    let deleted = st.store().delete_meteorological(range).await?;
    tracing::info!(deleted, %range, "meteorological readings deleted");
    Ok(ApiResponse::success(Deleted { deleted }))
}

/// POST /meteorological/csv with a weather-station export as the body
pub async fn upload_meteorological_csv(
    State(st): State<AppState>,
    _auth: AuthBearer,
    body: String,
) -> Result<ApiResponse<Inserted>, ApiError> {
    let offset = st.cfg.data.timezone_offset()?;
    let rows = read_meteorological(body.as_bytes(), offset)?;
    let inserted = st.store().insert_meteorological(rows).await?;
    tracing::info!(inserted, "meteorological CSV uploaded");
    Ok(ApiResponse::created(Inserted { inserted }))
}
