use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use super::{ApiError, ApiJson, ApiResult};
use crate::models::order::{DeliveryStats, OrderInput};
use crate::models::{Order, OrderStatus};
use crate::services::AppState;

pub async fn list_orders(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Order>>> {
    Ok(Json(state.stores.orders.list().await?))
}

pub async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Order>> {
    let order = state
        .stores
        .orders
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order", id))?;
    Ok(Json(order))
}

pub async fn get_order_by_order_id(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<String>,
) -> ApiResult<Json<Order>> {
    let order = state
        .stores
        .orders
        .find_by_order_id(&order_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order", &order_id))?;
    Ok(Json(order))
}

pub async fn list_orders_by_status(
    State(state): State<Arc<AppState>>,
    Path(status): Path<String>,
) -> ApiResult<Json<Vec<Order>>> {
    let status: OrderStatus = status.to_uppercase().parse()?;
    Ok(Json(state.stores.orders.by_status(status).await?))
}

pub async fn list_orders_by_driver(
    State(state): State<Arc<AppState>>,
    Path(driver_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Order>>> {
    Ok(Json(state.stores.orders.by_driver(driver_id).await?))
}

pub async fn list_orders_by_route(
    State(state): State<Arc<AppState>>,
    Path(route_id): Path<String>,
) -> ApiResult<Json<Vec<Order>>> {
    Ok(Json(state.stores.orders.by_route(&route_id).await?))
}

pub async fn delivery_performance(State(state): State<Arc<AppState>>) -> ApiResult<Json<DeliveryStats>> {
    let (on_time, late) = state.stores.orders.delivery_counts().await?;
    Ok(Json(DeliveryStats::new(on_time, late)))
}

pub async fn create_order(
    State(state): State<Arc<AppState>>,
    ApiJson(input): ApiJson<OrderInput>,
) -> ApiResult<(StatusCode, Json<Order>)> {
    input.validate()?;
    if state.stores.orders.find_by_order_id(&input.order_id).await?.is_some() {
        return Err(ApiError::Conflict(format!("Order ID already exists: {}", input.order_id)));
    }

    let order = input.into_order();
    state.stores.orders.save(&order).await?;
    tracing::info!(order_id = %order.order_id, value = order.value_rs, "Order created");
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn update_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    ApiJson(input): ApiJson<OrderInput>,
) -> ApiResult<Json<Order>> {
    input.validate()?;
    let mut order = state
        .stores
        .orders
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order", id))?;

    if input.order_id != order.order_id {
        if let Some(other) = state.stores.orders.find_by_order_id(&input.order_id).await? {
            if other.id != id {
                return Err(ApiError::Conflict(format!("Order ID already exists: {}", input.order_id)));
            }
        }
    }

    order.apply(input);
    state.stores.orders.save(&order).await?;
    Ok(Json(order))
}

pub async fn delete_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !state.stores.orders.delete(id).await? {
        return Err(ApiError::not_found("Order", id));
    }
    tracing::info!(order_id = %id, "Order deleted");
    Ok(StatusCode::NO_CONTENT)
}
