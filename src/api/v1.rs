use axum::{
    routing::{get, post},
    Router,
};

use super::{analysis, health, readings, systems};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/systems", get(systems::list_systems).post(systems::create_system))
        .route(
            "/systems/:id",
            get(systems::get_system)
                .put(systems::update_system)
                .patch(systems::patch_system)
                .delete(systems::delete_system),
        )
        .route(
            "/systems/:id/electrical",
            get(readings::list_electrical)
                .post(readings::create_electrical)
                .delete(readings::delete_electrical),
        )
        .route("/systems/:id/electrical/csv", post(readings::upload_electrical_csv))
        .route(
            "/meteorological",
            get(readings::list_meteorological)
                .post(readings::create_meteorological)
                .delete(readings::delete_meteorological),
        )
        .route("/meteorological/csv", post(readings::upload_meteorological_csv))
        .route("/systems/:id/power-estimates", get(analysis::power_estimates))
        .route("/scores", get(analysis::scores))
        .with_state(state)
}
