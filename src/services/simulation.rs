//! Order allocation and KPI calculation for a simulation run.
//!
//! A run validates its preconditions, assigns pending orders to the least
//! loaded drivers round-robin within an hour budget, persists each
//! delivered order, then aggregates KPIs from the store and records a
//! [`SimulationResult`].

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use thiserror::Error;
use uuid::Uuid;

use super::jitter::DeliveryJitter;
use crate::models::simulation::{RunKpis, SimulationParams};
use crate::models::{Driver, Order, OrderStatus, Route, SimulationResult, TrafficLevel};
use crate::repository::Stores;
use crate::validation::ValidationError;

/// Minutes past the base route time before a delivery counts as late.
pub const LATE_THRESHOLD_MINUTES: i64 = 10;
pub const LATE_PENALTY: f64 = 50.0;
pub const HIGH_VALUE_THRESHOLD: f64 = 1000.0;
pub const HIGH_VALUE_BONUS_RATE: f64 = 0.10;
/// Fatigued drivers take 30% longer.
pub const FATIGUE_SLOWDOWN: f64 = 1.3;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("{0}")]
    Invalid(#[from] ValidationError),

    #[error("Not enough active drivers available. Available: {available}, Required: {requested}")]
    InsufficientDrivers { available: usize, requested: u32 },

    #[error("No active routes available for simulation")]
    NoActiveRoutes,

    #[error("No pending orders available for simulation")]
    NoPendingOrders,

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl SimulationError {
    /// True for business-rule failures detected before any order is touched.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            SimulationError::InsufficientDrivers { .. }
                | SimulationError::NoActiveRoutes
                | SimulationError::NoPendingOrders
        )
    }
}

pub fn is_on_time(actual_minutes: i64, base_minutes: i64) -> bool {
    actual_minutes <= base_minutes + LATE_THRESHOLD_MINUTES
}

pub fn late_penalty(on_time: bool) -> f64 {
    if on_time {
        0.0
    } else {
        LATE_PENALTY
    }
}

pub fn high_value_bonus(value: f64, on_time: bool) -> f64 {
    if value > HIGH_VALUE_THRESHOLD && on_time {
        value * HIGH_VALUE_BONUS_RATE
    } else {
        0.0
    }
}

/// Hours a driver is expected to spend on `route`.
pub fn estimated_hours(route: &Route, driver: &Driver) -> f64 {
    let hours = route.base_time_minutes as f64 / 60.0;
    if driver.has_fatigue_penalty {
        hours * FATIGUE_SLOWDOWN
    } else {
        hours
    }
}

/// Outcome of the allocation pass, before anything is persisted.
#[derive(Debug, Default)]
pub struct Allocation {
    pub delivered: Vec<Order>,
    pub processed_order_ids: Vec<String>,
    pub fuel_cost_breakdown: BTreeMap<TrafficLevel, f64>,
    pub skipped_missing_route: usize,
    pub skipped_over_hours: usize,
}

/// Single pass over `orders` in their given order.
///
/// `drivers` must already be the selected subset. Orders whose route is
/// missing are skipped without consuming a driver slot; orders that would
/// push their driver past `max_hours` consume the slot and stay pending.
pub fn allocate(
    drivers: &[Driver],
    routes: &[Route],
    orders: Vec<Order>,
    params: &SimulationParams,
    jitter: &mut dyn DeliveryJitter,
    run_date: NaiveDate,
) -> Allocation {
    let mut allocation = Allocation::default();
    if drivers.is_empty() {
        return allocation;
    }

    let mut route_map: HashMap<&str, &Route> = HashMap::new();
    for route in routes {
        route_map.entry(route.route_id.as_str()).or_insert(route);
    }

    let max_hours = params.max_hours_per_driver as f64;
    let mut driver_hours: HashMap<Uuid, f64> = HashMap::new();
    let mut driver_index = 0usize;

    for mut order in orders {
        let route = match route_map.get(order.assigned_route_id.as_str()) {
            Some(route) => *route,
            None => {
                tracing::warn!(
                    order_id = %order.order_id,
                    route_id = %order.assigned_route_id,
                    "Route not found for order, skipping"
                );
                allocation.skipped_missing_route += 1;
                continue;
            }
        };

        let driver = &drivers[driver_index % drivers.len()];
        driver_index += 1;

        let current_hours = driver_hours.get(&driver.id).copied().unwrap_or(0.0);
        let estimate = estimated_hours(route, driver);
        if current_hours + estimate > max_hours {
            tracing::debug!(
                order_id = %order.order_id,
                driver_id = %driver.id,
                current_hours,
                estimate,
                "Driver hour budget exceeded, order left pending"
            );
            allocation.skipped_over_hours += 1;
            continue;
        }

        order.assigned_driver_id = Some(driver.id);
        order.status = OrderStatus::Assigned;

        let departure = departure_time(run_date, params.route_start_time, current_hours);
        deliver(&mut order, route, departure, jitter.offset_minutes());

        driver_hours.insert(driver.id, current_hours + estimate);
        *allocation
            .fuel_cost_breakdown
            .entry(route.traffic_level)
            .or_insert(0.0) += order.fuel_cost;
        allocation.processed_order_ids.push(order.order_id.clone());
        allocation.delivered.push(order);
    }

    allocation
}

/// Shift start on `run_date` plus the minutes the driver has already worked.
fn departure_time(run_date: NaiveDate, start: NaiveTime, worked_hours: f64) -> DateTime<Utc> {
    let shift_start = Utc.from_utc_datetime(&run_date.and_time(start));
    shift_start + Duration::minutes((worked_hours * 60.0) as i64)
}

/// Applies the delivery rules to an order that has been assigned a driver.
fn deliver(order: &mut Order, route: &Route, departure: DateTime<Utc>, jitter_minutes: i32) {
    let base_minutes = route.base_time_minutes as i64;
    let actual_minutes = (base_minutes + jitter_minutes as i64).max(0);
    let on_time = is_on_time(actual_minutes, base_minutes);

    order.delivery_timestamp = Some(departure + Duration::minutes(actual_minutes));
    order.status = OrderStatus::Delivered;
    order.is_delivered_on_time = on_time;
    order.penalty = late_penalty(on_time);
    order.bonus = high_value_bonus(order.value_rs, on_time);
    order.fuel_cost = route.fuel_cost();
    order.calculate_profit();

    tracing::debug!(
        order_id = %order.order_id,
        value = order.value_rs,
        on_time,
        penalty = order.penalty,
        bonus = order.bonus,
        profit = order.profit,
        "Order delivered"
    );
}

pub struct SimulationService {
    stores: Stores,
    jitter: Mutex<Box<dyn DeliveryJitter>>,
}

impl SimulationService {
    pub fn new(stores: Stores, jitter: Box<dyn DeliveryJitter>) -> Self {
        Self {
            stores,
            jitter: Mutex::new(jitter),
        }
    }

    pub async fn run(&self, params: SimulationParams, simulated_by: Uuid) -> Result<SimulationResult, SimulationError> {
        self.run_at(params, simulated_by, Utc::now()).await
    }

    /// Runs a simulation as if it started at `now`.
    pub async fn run_at(
        &self,
        params: SimulationParams,
        simulated_by: Uuid,
        now: DateTime<Utc>,
    ) -> Result<SimulationResult, SimulationError> {
        params.validate()?;
        tracing::info!(
            drivers = params.number_of_drivers,
            start_time = %params.route_start_time,
            max_hours = params.max_hours_per_driver,
            "Starting simulation"
        );

        let mut drivers = self.stores.drivers.active_by_shift_hours().await?;
        let requested = params.number_of_drivers;
        if drivers.len() < requested as usize {
            return Err(SimulationError::InsufficientDrivers {
                available: drivers.len(),
                requested,
            });
        }
        drivers.truncate(requested as usize);

        let routes = self.stores.routes.list_active().await?;
        if routes.is_empty() {
            return Err(SimulationError::NoActiveRoutes);
        }

        let pending = self.stores.orders.by_status(OrderStatus::Pending).await?;
        if pending.is_empty() {
            return Err(SimulationError::NoPendingOrders);
        }

        let mut result = SimulationResult::new(&params, simulated_by, now);

        let allocation = {
            let mut jitter = self.jitter.lock();
            allocate(&drivers, &routes, pending, &params, &mut **jitter, now.date_naive())
        };

        for order in &allocation.delivered {
            self.stores.orders.save(order).await?;
        }
        if allocation.skipped_missing_route > 0 || allocation.skipped_over_hours > 0 {
            tracing::info!(
                missing_route = allocation.skipped_missing_route,
                over_hours = allocation.skipped_over_hours,
                "Some pending orders were not allocated"
            );
        }

        result.processed_order_ids = allocation.processed_order_ids;
        result.fuel_cost_breakdown = allocation.fuel_cost_breakdown;

        let processed: HashSet<&str> = result.processed_order_ids.iter().map(String::as_str).collect();
        let delivered = self.stores.orders.by_status(OrderStatus::Delivered).await?;
        let kpis = RunKpis::from_orders(
            delivered
                .iter()
                .filter(|o| processed.contains(o.order_id.as_str())),
        );
        result.apply_kpis(&kpis);

        self.stores.results.insert(&result).await?;

        tracing::info!(
            simulation_id = %result.id,
            total_profit = result.total_profit,
            efficiency = result.efficiency_score,
            deliveries = result.total_deliveries,
            "Simulation completed"
        );
        Ok(result)
    }

    pub async fn history(&self) -> anyhow::Result<Vec<SimulationResult>> {
        self.stores.results.list_newest_first().await
    }

    pub async fn history_for_user(&self, user_id: Uuid) -> anyhow::Result<Vec<SimulationResult>> {
        self.stores.results.by_user_newest_first(user_id).await
    }

    pub async fn latest(&self) -> anyhow::Result<Option<SimulationResult>> {
        self.stores.results.latest().await
    }

    pub async fn find(&self, id: Uuid) -> anyhow::Result<Option<SimulationResult>> {
        self.stores.results.find_by_id(id).await
    }
}
