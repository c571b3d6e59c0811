use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::validation::{
    require_non_blank, require_non_negative, require_range, ValidationError, ValidationResult,
};

/// Fuel cost per kilometre, in rupees.
pub const BASE_FUEL_COST_PER_KM: f64 = 5.0;
/// Surcharge per kilometre on high-traffic routes.
pub const HIGH_TRAFFIC_SURCHARGE_PER_KM: f64 = 2.0;
/// Longest accepted base time for a single route: one day.
pub const MAX_BASE_TIME_MINUTES: u32 = 24 * 60;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TrafficLevel {
    Low,
    Medium,
    High,
}

impl TrafficLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrafficLevel::Low => "Low",
            TrafficLevel::Medium => "Medium",
            TrafficLevel::High => "High",
        }
    }
}

impl fmt::Display for TrafficLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrafficLevel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Low" => Ok(TrafficLevel::Low),
            "Medium" => Ok(TrafficLevel::Medium),
            "High" => Ok(TrafficLevel::High),
            other => Err(ValidationError::new(format!(
                "Traffic level must be Low, Medium, or High (got '{}')",
                other
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub id: Uuid,
    pub route_id: String,
    pub distance_km: f64,
    pub traffic_level: TrafficLevel,
    pub base_time_minutes: u32,
    pub start_location: Option<String>,
    pub end_location: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Route {
    pub fn new(route_id: &str, distance_km: f64, traffic_level: TrafficLevel, base_time_minutes: u32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            route_id: route_id.to_string(),
            distance_km,
            traffic_level,
            base_time_minutes,
            start_location: None,
            end_location: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn between(mut self, start: &str, end: &str) -> Self {
        self.start_location = Some(start.to_string());
        self.end_location = Some(end.to_string());
        self
    }

    pub fn fuel_cost(&self) -> f64 {
        fuel_cost(self.distance_km, self.traffic_level)
    }

    pub fn apply(&mut self, input: RouteInput) {
        self.route_id = input.route_id;
        self.distance_km = input.distance_km;
        self.traffic_level = input.traffic_level;
        self.base_time_minutes = input.base_time_minutes;
        self.start_location = input.start_location;
        self.end_location = input.end_location;
        self.is_active = input.is_active.unwrap_or(self.is_active);
        self.updated_at = Utc::now();
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.updated_at = Utc::now();
    }
}

/// Fuel cost of driving `distance_km` under `traffic`.
pub fn fuel_cost(distance_km: f64, traffic: TrafficLevel) -> f64 {
    let mut cost = distance_km * BASE_FUEL_COST_PER_KM;
    if traffic == TrafficLevel::High {
        cost += distance_km * HIGH_TRAFFIC_SURCHARGE_PER_KM;
    }
    cost
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteInput {
    pub route_id: String,
    pub distance_km: f64,
    pub traffic_level: TrafficLevel,
    pub base_time_minutes: u32,
    pub start_location: Option<String>,
    pub end_location: Option<String>,
    pub is_active: Option<bool>,
}

impl RouteInput {
    pub fn validate(&self) -> ValidationResult {
        require_non_blank("Route ID", &self.route_id)?;
        require_non_negative("Distance", self.distance_km)?;
        require_range(
            "Base time",
            f64::from(self.base_time_minutes),
            0.0,
            f64::from(MAX_BASE_TIME_MINUTES),
        )?;
        Ok(())
    }

    pub fn into_route(self) -> Route {
        let mut route = Route::new(&self.route_id, self.distance_km, self.traffic_level, self.base_time_minutes);
        route.apply(self);
        route
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_high_traffic_fuel_cost_includes_surcharge() {
        let route = Route::new("R001", 12.0, TrafficLevel::High, 40);
        assert_eq!(route.fuel_cost(), 84.0);
    }

    #[test]
    fn test_low_and_medium_fuel_cost_is_base_rate() {
        assert_eq!(fuel_cost(10.0, TrafficLevel::Low), 50.0);
        assert_eq!(fuel_cost(10.0, TrafficLevel::Medium), 50.0);
    }

    #[test]
    fn test_traffic_level_parse() {
        assert_eq!("High".parse::<TrafficLevel>().unwrap(), TrafficLevel::High);
        assert!("high".parse::<TrafficLevel>().is_err());
    }

    #[test]
    fn test_unknown_traffic_level_rejected_in_json() {
        let result: Result<RouteInput, _> = serde_json::from_str(
            r#"{"routeId":"R9","distanceKm":3.0,"trafficLevel":"Jammed","baseTimeMinutes":20}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_base_time_longer_than_a_day_rejected() {
        let mut input: RouteInput = serde_json::from_str(
            r#"{"routeId":"R9","distanceKm":3.0,"trafficLevel":"Low","baseTimeMinutes":1440}"#,
        )
        .unwrap();
        assert!(input.validate().is_ok());

        input.base_time_minutes = u32::MAX;
        let err = input.validate().unwrap_err();
        assert_eq!(err.0, "Base time must be between 0 and 1440");
    }
}
