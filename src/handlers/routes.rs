use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use super::{ApiError, ApiJson, ApiResult};
use crate::models::route::RouteInput;
use crate::models::{Route, TrafficLevel};
use crate::services::AppState;

pub async fn list_routes(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Route>>> {
    Ok(Json(state.stores.routes.list().await?))
}

pub async fn list_active_routes(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Route>>> {
    Ok(Json(state.stores.routes.list_active().await?))
}

pub async fn get_route(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Route>> {
    let route = state
        .stores
        .routes
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Route", id))?;
    Ok(Json(route))
}

pub async fn get_route_by_route_id(
    State(state): State<Arc<AppState>>,
    Path(route_id): Path<String>,
) -> ApiResult<Json<Route>> {
    let route = state
        .stores
        .routes
        .find_by_route_id(&route_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Route", &route_id))?;
    Ok(Json(route))
}

pub async fn list_routes_by_traffic(
    State(state): State<Arc<AppState>>,
    Path(level): Path<String>,
) -> ApiResult<Json<Vec<Route>>> {
    let level: TrafficLevel = level.parse()?;
    Ok(Json(state.stores.routes.by_traffic_level(level).await?))
}

pub async fn create_route(
    State(state): State<Arc<AppState>>,
    ApiJson(input): ApiJson<RouteInput>,
) -> ApiResult<(StatusCode, Json<Route>)> {
    input.validate()?;
    let route = input.into_route();
    state.stores.routes.save(&route).await?;
    tracing::info!(route_id = %route.route_id, "Route created");
    Ok((StatusCode::CREATED, Json(route)))
}

pub async fn update_route(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    ApiJson(input): ApiJson<RouteInput>,
) -> ApiResult<Json<Route>> {
    input.validate()?;
    let mut route = state
        .stores
        .routes
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Route", id))?;
    route.apply(input);
    state.stores.routes.save(&route).await?;
    Ok(Json(route))
}

pub async fn delete_route(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let mut route = state
        .stores
        .routes
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Route", id))?;
    route.deactivate();
    state.stores.routes.save(&route).await?;
    tracing::info!(route_id = %route.route_id, "Route deactivated");
    Ok(StatusCode::NO_CONTENT)
}
