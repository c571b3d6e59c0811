//! Store contracts and their backends.
//!
//! Handlers and the simulation service only see the traits below. The
//! Postgres backend lives in the `*_repo` modules; `memory` backs tests and
//! database-less deployments.

pub mod driver_repo;
pub mod memory;
pub mod order_repo;
pub mod route_repo;
pub mod simulation_repo;
pub mod user_repo;

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{Driver, Order, OrderStatus, Route, SimulationResult, TrafficLevel, User};

#[async_trait]
pub trait DriverStore: Send + Sync {
    async fn list(&self) -> anyhow::Result<Vec<Driver>>;
    async fn list_active(&self) -> anyhow::Result<Vec<Driver>>;
    /// Active drivers, fewest current shift hours first. Ties keep creation order.
    async fn active_by_shift_hours(&self) -> anyhow::Result<Vec<Driver>>;
    async fn count_active(&self) -> anyhow::Result<u64>;
    async fn count(&self) -> anyhow::Result<u64>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Driver>>;
    /// Insert or replace by id.
    async fn save(&self, driver: &Driver) -> anyhow::Result<()>;
}

#[async_trait]
pub trait RouteStore: Send + Sync {
    async fn list(&self) -> anyhow::Result<Vec<Route>>;
    async fn list_active(&self) -> anyhow::Result<Vec<Route>>;
    async fn by_traffic_level(&self, level: TrafficLevel) -> anyhow::Result<Vec<Route>>;
    async fn count(&self) -> anyhow::Result<u64>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Route>>;
    async fn find_by_route_id(&self, route_id: &str) -> anyhow::Result<Option<Route>>;
    async fn save(&self, route: &Route) -> anyhow::Result<()>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn list(&self) -> anyhow::Result<Vec<Order>>;
    async fn by_status(&self, status: OrderStatus) -> anyhow::Result<Vec<Order>>;
    async fn by_driver(&self, driver_id: Uuid) -> anyhow::Result<Vec<Order>>;
    async fn by_route(&self, route_id: &str) -> anyhow::Result<Vec<Order>>;
    async fn count(&self) -> anyhow::Result<u64>;
    /// (on time, late) among delivered orders.
    async fn delivery_counts(&self) -> anyhow::Result<(u64, u64)>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Order>>;
    async fn find_by_order_id(&self, order_id: &str) -> anyhow::Result<Option<Order>>;
    async fn save(&self, order: &Order) -> anyhow::Result<()>;
    /// Returns false when nothing was deleted.
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
}

#[async_trait]
pub trait SimulationResultStore: Send + Sync {
    async fn insert(&self, result: &SimulationResult) -> anyhow::Result<()>;
    async fn list_newest_first(&self) -> anyhow::Result<Vec<SimulationResult>>;
    async fn by_user_newest_first(&self, user_id: Uuid) -> anyhow::Result<Vec<SimulationResult>>;
    async fn latest(&self) -> anyhow::Result<Option<SimulationResult>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<SimulationResult>>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn count(&self) -> anyhow::Result<u64>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;
    async fn save(&self, user: &User) -> anyhow::Result<()>;
}

/// One handle per collection, shared across handlers and services.
#[derive(Clone)]
pub struct Stores {
    pub drivers: Arc<dyn DriverStore>,
    pub routes: Arc<dyn RouteStore>,
    pub orders: Arc<dyn OrderStore>,
    pub results: Arc<dyn SimulationResultStore>,
    pub users: Arc<dyn UserStore>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            drivers: Arc::new(memory::MemoryDriverStore::default()),
            routes: Arc::new(memory::MemoryRouteStore::default()),
            orders: Arc::new(memory::MemoryOrderStore::default()),
            results: Arc::new(memory::MemorySimulationResultStore::default()),
            users: Arc::new(memory::MemoryUserStore::default()),
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self {
            drivers: Arc::new(driver_repo::DriverRepository::new(pool.clone())),
            routes: Arc::new(route_repo::RouteRepository::new(pool.clone())),
            orders: Arc::new(order_repo::OrderRepository::new(pool.clone())),
            results: Arc::new(simulation_repo::SimulationResultRepository::new(pool.clone())),
            users: Arc::new(user_repo::UserRepository::new(pool)),
        }
    }
}

/// Postgres counts come back as i64.
pub(crate) fn to_count(value: i64) -> u64 {
    value.max(0) as u64
}
