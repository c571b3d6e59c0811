use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::validation::{require_non_blank, require_non_negative, require_range, ValidationResult};

pub const MAX_SHIFT_HOURS: f64 = 24.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub id: Uuid,
    pub name: String,
    pub current_shift_hours: f64,
    pub past_7_day_work_hours: f64,
    pub is_active: bool,
    /// Set when the driver worked more than 8 hours the previous day.
    pub has_fatigue_penalty: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Driver {
    pub fn new(name: &str, current_shift_hours: f64, past_7_day_work_hours: f64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            current_shift_hours,
            past_7_day_work_hours,
            is_active: true,
            has_fatigue_penalty: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_fatigue(mut self) -> Self {
        self.has_fatigue_penalty = true;
        self
    }

    pub fn apply(&mut self, input: DriverInput) {
        self.name = input.name;
        self.current_shift_hours = input.current_shift_hours;
        self.past_7_day_work_hours = input.past_7_day_work_hours;
        self.is_active = input.is_active.unwrap_or(self.is_active);
        self.has_fatigue_penalty = input.has_fatigue_penalty.unwrap_or(self.has_fatigue_penalty);
        self.updated_at = Utc::now();
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.updated_at = Utc::now();
    }
}

/// Create/update payload for a driver.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverInput {
    pub name: String,
    #[serde(default)]
    pub current_shift_hours: f64,
    #[serde(default)]
    pub past_7_day_work_hours: f64,
    pub is_active: Option<bool>,
    pub has_fatigue_penalty: Option<bool>,
}

impl DriverInput {
    pub fn validate(&self) -> ValidationResult {
        require_non_blank("Driver name", &self.name)?;
        require_range("Current shift hours", self.current_shift_hours, 0.0, MAX_SHIFT_HOURS)?;
        require_non_negative("Past 7-day work hours", self.past_7_day_work_hours)?;
        Ok(())
    }

    pub fn into_driver(self) -> Driver {
        let mut driver = Driver::new(&self.name, self.current_shift_hours, self.past_7_day_work_hours);
        driver.apply(self);
        driver
    }
}
