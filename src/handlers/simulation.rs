use axum::{
    extract::{Path, State},
    Extension, Json,
};
use std::sync::Arc;
use uuid::Uuid;

use super::{ApiError, ApiJson, ApiResult};
use crate::middleware::auth::AuthUser;
use crate::models::simulation::SimulationRequest;
use crate::models::SimulationResult;
use crate::services::AppState;

pub async fn run_simulation(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ApiJson(request): ApiJson<SimulationRequest>,
) -> ApiResult<Json<SimulationResult>> {
    let params = request.validate()?;
    tracing::info!(user = %user.username, "Simulation requested");
    let result = state.simulation.run(params, user.id).await?;
    Ok(Json(result))
}

pub async fn history(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<SimulationResult>>> {
    Ok(Json(state.simulation.history().await?))
}

pub async fn my_history(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<Vec<SimulationResult>>> {
    Ok(Json(state.simulation.history_for_user(user.id).await?))
}

pub async fn latest(State(state): State<Arc<AppState>>) -> ApiResult<Json<SimulationResult>> {
    let result = state
        .simulation
        .latest()
        .await?
        .ok_or_else(|| ApiError::NotFound("No simulation results yet".to_string()))?;
    Ok(Json(result))
}

pub async fn get_result(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SimulationResult>> {
    let result = state
        .simulation
        .find(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Simulation result", id))?;
    Ok(Json(result))
}
