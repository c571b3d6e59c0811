use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use super::{ApiError, ApiJson, ApiResult};
use crate::models::driver::DriverInput;
use crate::models::Driver;
use crate::services::AppState;

pub async fn list_drivers(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Driver>>> {
    Ok(Json(state.stores.drivers.list().await?))
}

pub async fn list_active_drivers(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Driver>>> {
    Ok(Json(state.stores.drivers.list_active().await?))
}

pub async fn count_active_drivers(State(state): State<Arc<AppState>>) -> ApiResult<Json<Value>> {
    let count = state.stores.drivers.count_active().await?;
    Ok(Json(json!({ "count": count })))
}

pub async fn get_driver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Driver>> {
    let driver = state
        .stores
        .drivers
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Driver", id))?;
    Ok(Json(driver))
}

pub async fn create_driver(
    State(state): State<Arc<AppState>>,
    ApiJson(input): ApiJson<DriverInput>,
) -> ApiResult<(StatusCode, Json<Driver>)> {
    input.validate()?;
    let driver = input.into_driver();
    state.stores.drivers.save(&driver).await?;
    tracing::info!(driver_id = %driver.id, name = %driver.name, "Driver created");
    Ok((StatusCode::CREATED, Json(driver)))
}

pub async fn update_driver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    ApiJson(input): ApiJson<DriverInput>,
) -> ApiResult<Json<Driver>> {
    input.validate()?;
    let mut driver = state
        .stores
        .drivers
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Driver", id))?;
    driver.apply(input);
    state.stores.drivers.save(&driver).await?;
    Ok(Json(driver))
}

/// Soft delete: the driver stays on record but is no longer active.
pub async fn delete_driver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let mut driver = state
        .stores
        .drivers
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Driver", id))?;
    driver.deactivate();
    state.stores.drivers.save(&driver).await?;
    tracing::info!(driver_id = %id, "Driver deactivated");
    Ok(StatusCode::NO_CONTENT)
}
