use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::order::{efficiency_score, Order};
use super::route::TrafficLevel;
use crate::validation::{ValidationError, ValidationResult};

pub const MAX_HOURS_PER_DRIVER: u32 = 24;

/// Raw body of a simulation run request.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRequest {
    pub number_of_drivers: Option<i64>,
    pub route_start_time: Option<String>,
    pub max_hours_per_driver: Option<i64>,
    pub notes: Option<String>,
}

/// Run parameters after validation.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationParams {
    pub number_of_drivers: u32,
    pub route_start_time: NaiveTime,
    pub max_hours_per_driver: u32,
    pub notes: Option<String>,
}

impl SimulationRequest {
    pub fn validate(self) -> Result<SimulationParams, ValidationError> {
        let number_of_drivers = self
            .number_of_drivers
            .ok_or_else(|| ValidationError::new("Number of drivers is required"))?;
        if number_of_drivers <= 0 || number_of_drivers > u32::MAX as i64 {
            return Err(ValidationError::new("Number of drivers must be greater than 0"));
        }

        let raw_time = self
            .route_start_time
            .ok_or_else(|| ValidationError::new("Route start time is required"))?;
        let route_start_time = parse_time_of_day(&raw_time)?;

        let max_hours = self
            .max_hours_per_driver
            .ok_or_else(|| ValidationError::new("Max hours per driver is required"))?;
        if max_hours <= 0 || max_hours > MAX_HOURS_PER_DRIVER as i64 {
            return Err(ValidationError::new("Max hours per driver must be between 1 and 24"));
        }

        let notes = self.notes.filter(|n| !n.trim().is_empty());

        Ok(SimulationParams {
            number_of_drivers: number_of_drivers as u32,
            route_start_time,
            max_hours_per_driver: max_hours as u32,
            notes,
        })
    }
}

/// Accepts `HH:MM` and `HH:MM:SS`.
pub fn parse_time_of_day(raw: &str) -> Result<NaiveTime, ValidationError> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| ValidationError::new(format!("Route start time '{}' is not a valid HH:MM time", raw)))
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub id: Uuid,
    pub number_of_drivers: u32,
    pub route_start_time: NaiveTime,
    pub max_hours_per_driver: u32,
    pub total_profit: f64,
    pub efficiency_score: f64,
    pub on_time_deliveries: u32,
    pub late_deliveries: u32,
    pub total_deliveries: u32,
    pub total_fuel_cost: f64,
    pub total_penalties: f64,
    pub total_bonuses: f64,
    pub fuel_cost_breakdown: BTreeMap<TrafficLevel, f64>,
    pub processed_order_ids: Vec<String>,
    pub simulated_by: Uuid,
    pub simulation_timestamp: DateTime<Utc>,
    pub notes: Option<String>,
}

impl SimulationResult {
    pub fn new(params: &SimulationParams, simulated_by: Uuid, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            number_of_drivers: params.number_of_drivers,
            route_start_time: params.route_start_time,
            max_hours_per_driver: params.max_hours_per_driver,
            total_profit: 0.0,
            efficiency_score: 0.0,
            on_time_deliveries: 0,
            late_deliveries: 0,
            total_deliveries: 0,
            total_fuel_cost: 0.0,
            total_penalties: 0.0,
            total_bonuses: 0.0,
            fuel_cost_breakdown: BTreeMap::new(),
            processed_order_ids: Vec::new(),
            simulated_by,
            simulation_timestamp: timestamp,
            notes: params.notes.clone(),
        }
    }

    pub fn apply_kpis(&mut self, kpis: &RunKpis) {
        self.total_profit = kpis.total_profit;
        self.total_penalties = kpis.total_penalties;
        self.total_bonuses = kpis.total_bonuses;
        self.total_fuel_cost = kpis.total_fuel_cost;
        self.on_time_deliveries = kpis.on_time;
        self.late_deliveries = kpis.late;
        self.total_deliveries = kpis.total;
        self.efficiency_score = kpis.efficiency_score;
    }
}

/// Totals over the orders delivered in one run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunKpis {
    pub total_profit: f64,
    pub total_penalties: f64,
    pub total_bonuses: f64,
    pub total_fuel_cost: f64,
    pub on_time: u32,
    pub late: u32,
    pub total: u32,
    pub efficiency_score: f64,
}

impl RunKpis {
    pub fn from_orders<'a>(orders: impl IntoIterator<Item = &'a Order>) -> Self {
        let mut kpis = RunKpis::default();
        for order in orders {
            kpis.total_profit += order.profit;
            kpis.total_penalties += order.penalty;
            kpis.total_bonuses += order.bonus;
            kpis.total_fuel_cost += order.fuel_cost;
            if order.is_delivered_on_time {
                kpis.on_time += 1;
            } else {
                kpis.late += 1;
            }
            kpis.total += 1;
        }
        kpis.efficiency_score = efficiency_score(kpis.on_time as u64, kpis.total as u64);
        kpis
    }
}

impl SimulationParams {
    pub fn validate(&self) -> ValidationResult {
        if self.number_of_drivers == 0 {
            return Err(ValidationError::new("Number of drivers must be greater than 0"));
        }
        if self.max_hours_per_driver == 0 || self.max_hours_per_driver > MAX_HOURS_PER_DRIVER {
            return Err(ValidationError::new("Max hours per driver must be between 1 and 24"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(drivers: Option<i64>, time: Option<&str>, hours: Option<i64>) -> SimulationRequest {
        SimulationRequest {
            number_of_drivers: drivers,
            route_start_time: time.map(str::to_string),
            max_hours_per_driver: hours,
            notes: None,
        }
    }

    #[test]
    fn test_accepts_hour_minute_start_time() {
        let params = request(Some(3), Some("09:30"), Some(8)).validate().unwrap();
        assert_eq!(params.route_start_time, NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert_eq!(params.number_of_drivers, 3);
    }

    #[test]
    fn test_rejects_zero_drivers() {
        let err = request(Some(0), Some("09:00"), Some(8)).validate().unwrap_err();
        assert_eq!(err.to_string(), "Number of drivers must be greater than 0");
    }

    #[test]
    fn test_rejects_max_hours_over_24() {
        let err = request(Some(2), Some("09:00"), Some(25)).validate().unwrap_err();
        assert_eq!(err.to_string(), "Max hours per driver must be between 1 and 24");
    }

    #[test]
    fn test_rejects_missing_and_malformed_time() {
        assert!(request(Some(2), None, Some(8)).validate().is_err());
        assert!(request(Some(2), Some("9am"), Some(8)).validate().is_err());
    }

    #[test]
    fn test_kpis_from_no_orders_has_zero_efficiency() {
        let kpis = RunKpis::from_orders(&Vec::<Order>::new());
        assert_eq!(kpis.total, 0);
        assert_eq!(kpis.efficiency_score, 0.0);
    }

    #[test]
    fn test_kpis_count_late_orders() {
        let mut on_time = Order::new("A", 100.0, "R1");
        on_time.is_delivered_on_time = true;
        let mut late = Order::new("B", 100.0, "R1");
        late.penalty = 50.0;
        late.calculate_profit();

        let kpis = RunKpis::from_orders(&[on_time, late]);
        assert_eq!(kpis.on_time, 1);
        assert_eq!(kpis.late, 1);
        assert_eq!(kpis.efficiency_score, 50.0);
        assert_eq!(kpis.total_penalties, 50.0);
        assert_eq!(kpis.total_profit, 150.0);
    }

    #[test]
    fn test_breakdown_serializes_traffic_names() {
        let params = request(Some(1), Some("08:00"), Some(8)).validate().unwrap();
        let mut result = SimulationResult::new(&params, Uuid::new_v4(), Utc::now());
        result.fuel_cost_breakdown.insert(TrafficLevel::High, 84.0);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["fuelCostBreakdown"]["High"], 84.0);
        assert_eq!(json["routeStartTime"], "08:00:00");
    }
}
