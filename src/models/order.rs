use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::validation::{require_non_blank, require_non_negative, ValidationError, ValidationResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Assigned,
    InTransit,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Assigned => "ASSIGNED",
            OrderStatus::InTransit => "IN_TRANSIT",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(OrderStatus::Pending),
            "ASSIGNED" => Ok(OrderStatus::Assigned),
            "IN_TRANSIT" => Ok(OrderStatus::InTransit),
            "DELIVERED" => Ok(OrderStatus::Delivered),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            other => Err(ValidationError::new(format!("Unknown order status '{}'", other))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub order_id: String,
    pub value_rs: f64,
    /// Business id of the route (`Route::route_id`), not its uuid.
    pub assigned_route_id: String,
    pub assigned_driver_id: Option<Uuid>,
    pub delivery_timestamp: Option<DateTime<Utc>>,
    pub status: OrderStatus,
    pub is_delivered_on_time: bool,
    pub penalty: f64,
    pub bonus: f64,
    pub fuel_cost: f64,
    pub profit: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new(order_id: &str, value_rs: f64, assigned_route_id: &str) -> Self {
        let now = Utc::now();
        let mut order = Self {
            id: Uuid::new_v4(),
            order_id: order_id.to_string(),
            value_rs,
            assigned_route_id: assigned_route_id.to_string(),
            assigned_driver_id: None,
            delivery_timestamp: None,
            status: OrderStatus::Pending,
            is_delivered_on_time: false,
            penalty: 0.0,
            bonus: 0.0,
            fuel_cost: 0.0,
            profit: 0.0,
            created_at: now,
            updated_at: now,
        };
        order.calculate_profit();
        order
    }

    /// profit = value + bonus - penalty - fuel cost
    pub fn calculate_profit(&mut self) {
        self.profit = self.value_rs + self.bonus - self.penalty - self.fuel_cost;
        self.updated_at = Utc::now();
    }

    pub fn apply(&mut self, input: OrderInput) {
        self.order_id = input.order_id;
        self.value_rs = input.value_rs;
        self.assigned_route_id = input.assigned_route_id;
        self.assigned_driver_id = input.assigned_driver_id;
        self.delivery_timestamp = input.delivery_timestamp;
        self.status = input.status.unwrap_or(self.status);
        self.is_delivered_on_time = input.is_delivered_on_time;
        self.penalty = input.penalty;
        self.bonus = input.bonus;
        self.fuel_cost = input.fuel_cost;
        self.calculate_profit();
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderInput {
    pub order_id: String,
    pub value_rs: f64,
    pub assigned_route_id: String,
    pub assigned_driver_id: Option<Uuid>,
    pub delivery_timestamp: Option<DateTime<Utc>>,
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub is_delivered_on_time: bool,
    #[serde(default)]
    pub penalty: f64,
    #[serde(default)]
    pub bonus: f64,
    #[serde(default)]
    pub fuel_cost: f64,
}

impl OrderInput {
    pub fn validate(&self) -> ValidationResult {
        require_non_blank("Order ID", &self.order_id)?;
        require_non_blank("Assigned route", &self.assigned_route_id)?;
        require_non_negative("Order value", self.value_rs)?;
        require_non_negative("Penalty", self.penalty)?;
        require_non_negative("Bonus", self.bonus)?;
        require_non_negative("Fuel cost", self.fuel_cost)?;
        Ok(())
    }

    pub fn into_order(self) -> Order {
        let mut order = Order::new(&self.order_id, self.value_rs, &self.assigned_route_id);
        order.apply(self);
        order
    }
}

/// On-time vs late counts across delivered orders.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryStats {
    pub on_time_deliveries: u64,
    pub late_deliveries: u64,
    pub total_deliveries: u64,
    pub efficiency_score: f64,
}

impl DeliveryStats {
    pub fn new(on_time_deliveries: u64, late_deliveries: u64) -> Self {
        let total_deliveries = on_time_deliveries + late_deliveries;
        Self {
            on_time_deliveries,
            late_deliveries,
            total_deliveries,
            efficiency_score: efficiency_score(on_time_deliveries, total_deliveries),
        }
    }
}

/// Percentage of on-time deliveries; 0 when nothing was delivered.
pub fn efficiency_score(on_time: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    on_time as f64 / total as f64 * 100.0
}
