use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use validator::Validate;

use super::{error::ApiError, response::ApiResponse};
use crate::auth::AuthBearer;
use crate::domain::{NewPvSystem, PvSystem, SystemId};
use crate::state::AppState;

/// GET /systems
pub async fn list_systems(
    State(st): State<AppState>,
    _auth: AuthBearer,
) -> Result<ApiResponse<Vec<PvSystem>>, ApiError> {
    let systems = st.store().list_systems().await?;
    let count = systems.len();
    Ok(ApiResponse::success(systems).with_count(count))
}

/// GET /systems/:id
pub async fn get_system(
    State(st): State<AppState>,
    _auth: AuthBearer,
    Path(id): Path<SystemId>,
) -> Result<ApiResponse<PvSystem>, ApiError> {
    st.store()
        .get_system(id)
        .await?
        .map(ApiResponse::success)
        .ok_or_else(|| ApiError::NotFound(format!("system {id}")))
}

/// POST /systems
pub async fn create_system(
    State(st): State<AppState>,
    _auth: AuthBearer,
    Json(body): Json<NewPvSystem>,
) -> Result<ApiResponse<PvSystem>, ApiError> {
    body.validate()?;
    let system = st.store().create_system(body).await?;
    tracing::info!(system_id = system.id, name = %system.name, "system registered");
    Ok(ApiResponse::created(system))
}

/// Partial update; absent fields keep their stored value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SystemPatch {
    pub name: Option<String>,
    pub capacity_kw: Option<f64>,
    pub inverter_type: Option<String>,
    pub number_of_panels: Option<i32>,
    pub technology: Option<String>,
    pub year_of_installation: Option<i32>,
}

impl SystemPatch {
    fn apply(self, current: PvSystem) -> NewPvSystem {
        NewPvSystem {
            name: self.name.unwrap_or(current.name),
            capacity_kw: self.capacity_kw.unwrap_or(current.capacity_kw),
            inverter_type: self.inverter_type.unwrap_or(current.inverter_type),
            number_of_panels: self.number_of_panels.unwrap_or(current.number_of_panels),
            technology: self.technology.unwrap_or(current.technology),
            year_of_installation: self
                .year_of_installation
                .unwrap_or(current.year_of_installation),
        }
    }
}

async fn replace(st: &AppState, id: SystemId, body: NewPvSystem) -> Result<PvSystem, ApiError> {
    body.validate()?;
    let system = st
        .store()
        .update_system(body.with_id(id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("system {id}")))?;
    tracing::info!(system_id = id, name = %system.name, "system updated");
    Ok(system)
}

/// PUT /systems/:id
pub async fn update_system(
    State(st): State<AppState>,
    _auth: AuthBearer,
    Path(id): Path<SystemId>,
    Json(body): Json<NewPvSystem>,
) -> Result<ApiResponse<PvSystem>, ApiError> {
    Ok(ApiResponse::success(replace(&st, id, body).await?))
}

/// PATCH /systems/:id
///
/// The merged record must pass the same rules as a new registration.
pub async fn patch_system(
    State(st): State<AppState>,
    _auth: AuthBearer,
    Path(id): Path<SystemId>,
    Json(patch): Json<SystemPatch>,
) -> Result<ApiResponse<PvSystem>, ApiError> {
    let current = st
        .store()
        .get_system(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("system {id}")))?;
    Ok(ApiResponse::success(replace(&st, id, patch.apply(current)).await?))
}

/// DELETE /systems/:id, removing its electrical readings as well
pub async fn delete_system(
    State(st): State<AppState>,
    _auth: AuthBearer,
    Path(id): Path<SystemId>,
) -> Result<ApiResponse<PvSystem>, ApiError> {
    let system = st
        .store()
        .delete_system(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("system {id}")))?;
    tracing::info!(system_id = id, "system deleted");
    Ok(ApiResponse::success(system))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_keeps_unset_fields() {
        let current = PvSystem {
            id: 2,
            name: "System 2".to_string(),
            capacity_kw: 0.0,
            inverter_type: "Inverter Type 2".to_string(),
            number_of_panels: 10,
            technology: "Half-cut Mono-Si".to_string(),
            year_of_installation: 2021,
        };
        let patch = SystemPatch {
            capacity_kw: Some(5.25),
            ..SystemPatch::default()
        };

        let merged = patch.apply(current);
        assert_eq!(merged.capacity_kw, 5.25);
        assert_eq!(merged.name, "System 2");
        assert_eq!(merged.number_of_panels, 10);
        assert!(merged.validate().is_ok());
    }
}
