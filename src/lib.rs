//! Delivery fleet backend: drivers, routes, orders and the delivery
//! simulation that allocates pending orders and reports KPIs.

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod services;
pub mod validation;

use axum::{
    http::HeaderValue,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::middleware::auth::{require_auth, require_manager};
use crate::services::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let drivers = Router::new()
        .route("/", get(handlers::drivers::list_drivers).post(handlers::drivers::create_driver))
        .route("/active", get(handlers::drivers::list_active_drivers))
        .route("/count", get(handlers::drivers::count_active_drivers))
        .route(
            "/:id",
            get(handlers::drivers::get_driver)
                .put(handlers::drivers::update_driver)
                .delete(handlers::drivers::delete_driver),
        );

    let routes = Router::new()
        .route("/", get(handlers::routes::list_routes).post(handlers::routes::create_route))
        .route("/active", get(handlers::routes::list_active_routes))
        .route("/route/:route_id", get(handlers::routes::get_route_by_route_id))
        .route("/traffic/:level", get(handlers::routes::list_routes_by_traffic))
        .route(
            "/:id",
            get(handlers::routes::get_route)
                .put(handlers::routes::update_route)
                .delete(handlers::routes::delete_route),
        )
        .route_layer(from_fn(require_manager));

    let orders = Router::new()
        .route("/", get(handlers::orders::list_orders).post(handlers::orders::create_order))
        .route("/order/:order_id", get(handlers::orders::get_order_by_order_id))
        .route("/status/:status", get(handlers::orders::list_orders_by_status))
        .route("/driver/:driver_id", get(handlers::orders::list_orders_by_driver))
        .route("/route/:route_id", get(handlers::orders::list_orders_by_route))
        .route("/stats/delivery-performance", get(handlers::orders::delivery_performance))
        .route(
            "/:id",
            get(handlers::orders::get_order)
                .put(handlers::orders::update_order)
                .delete(handlers::orders::delete_order),
        );

    let simulation = Router::new()
        .route("/run", post(handlers::simulation::run_simulation))
        .route("/history", get(handlers::simulation::history))
        .route("/history/my", get(handlers::simulation::my_history))
        .route("/latest", get(handlers::simulation::latest))
        .route("/:id", get(handlers::simulation::get_result))
        .route_layer(from_fn(require_manager));

    let protected = Router::new()
        .nest("/drivers", drivers)
        .nest("/routes", routes)
        .nest("/orders", orders)
        .nest("/simulation", simulation)
        .route("/auth/validate", get(handlers::auth::validate))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/api/auth/signin", post(handlers::auth::signin))
        .route("/api/auth/initialize", post(handlers::auth::initialize))
        .nest("/api", protected)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match config.cors_origin.as_deref() {
        None => layer.allow_origin(Any),
        Some(origin) => match origin.parse::<HeaderValue>() {
            Ok(value) => layer.allow_origin(AllowOrigin::exact(value)),
            Err(_) => {
                tracing::warn!(origin, "Invalid CORS_ORIGIN, cross-origin requests disabled");
                layer
            }
        },
    }
}
