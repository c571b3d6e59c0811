use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use std::collections::BTreeMap;
use uuid::Uuid;

use super::SimulationResultStore;
use crate::models::{SimulationResult, TrafficLevel};

const SELECT_RESULT: &str = "SELECT id, number_of_drivers, route_start_time, max_hours_per_driver, \
     total_profit, efficiency_score, on_time_deliveries, late_deliveries, total_deliveries, \
     total_fuel_cost, total_penalties, total_bonuses, fuel_cost_breakdown, processed_order_ids, \
     simulated_by, simulation_timestamp, notes FROM simulation_results";

#[derive(sqlx::FromRow)]
struct SimulationResultRow {
    id: Uuid,
    number_of_drivers: i32,
    route_start_time: NaiveTime,
    max_hours_per_driver: i32,
    total_profit: f64,
    efficiency_score: f64,
    on_time_deliveries: i32,
    late_deliveries: i32,
    total_deliveries: i32,
    total_fuel_cost: f64,
    total_penalties: f64,
    total_bonuses: f64,
    fuel_cost_breakdown: Json<BTreeMap<TrafficLevel, f64>>,
    processed_order_ids: Json<Vec<String>>,
    simulated_by: Uuid,
    simulation_timestamp: DateTime<Utc>,
    notes: Option<String>,
}

impl TryFrom<SimulationResultRow> for SimulationResult {
    type Error = anyhow::Error;

    fn try_from(row: SimulationResultRow) -> Result<Self, Self::Error> {
        Ok(SimulationResult {
            id: row.id,
            number_of_drivers: u32::try_from(row.number_of_drivers)?,
            route_start_time: row.route_start_time,
            max_hours_per_driver: u32::try_from(row.max_hours_per_driver)?,
            total_profit: row.total_profit,
            efficiency_score: row.efficiency_score,
            on_time_deliveries: u32::try_from(row.on_time_deliveries)?,
            late_deliveries: u32::try_from(row.late_deliveries)?,
            total_deliveries: u32::try_from(row.total_deliveries)?,
            total_fuel_cost: row.total_fuel_cost,
            total_penalties: row.total_penalties,
            total_bonuses: row.total_bonuses,
            fuel_cost_breakdown: row.fuel_cost_breakdown.0,
            processed_order_ids: row.processed_order_ids.0,
            simulated_by: row.simulated_by,
            simulation_timestamp: row.simulation_timestamp,
            notes: row.notes,
        })
    }
}

pub struct SimulationResultRepository {
    pool: PgPool,
}

impl SimulationResultRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn convert(rows: Vec<SimulationResultRow>) -> anyhow::Result<Vec<SimulationResult>> {
        rows.into_iter().map(SimulationResult::try_from).collect()
    }
}

#[async_trait]
impl SimulationResultStore for SimulationResultRepository {
    async fn insert(&self, result: &SimulationResult) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO simulation_results (id, number_of_drivers, route_start_time,
                max_hours_per_driver, total_profit, efficiency_score, on_time_deliveries,
                late_deliveries, total_deliveries, total_fuel_cost, total_penalties, total_bonuses,
                fuel_cost_breakdown, processed_order_ids, simulated_by, simulation_timestamp, notes)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)",
        )
        .bind(result.id)
        .bind(i32::try_from(result.number_of_drivers)?)
        .bind(result.route_start_time)
        .bind(i32::try_from(result.max_hours_per_driver)?)
        .bind(result.total_profit)
        .bind(result.efficiency_score)
        .bind(i32::try_from(result.on_time_deliveries)?)
        .bind(i32::try_from(result.late_deliveries)?)
        .bind(i32::try_from(result.total_deliveries)?)
        .bind(result.total_fuel_cost)
        .bind(result.total_penalties)
        .bind(result.total_bonuses)
        .bind(Json(&result.fuel_cost_breakdown))
        .bind(Json(&result.processed_order_ids))
        .bind(result.simulated_by)
        .bind(result.simulation_timestamp)
        .bind(&result.notes)
        .execute(&self.pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to save simulation result {}: {}", result.id, e))?;
        Ok(())
    }

    async fn list_newest_first(&self) -> anyhow::Result<Vec<SimulationResult>> {
        let rows = sqlx::query_as::<_, SimulationResultRow>(&format!(
            "{} ORDER BY simulation_timestamp DESC",
            SELECT_RESULT
        ))
        .fetch_all(&self.pool)
        .await?;
        Self::convert(rows)
    }

    async fn by_user_newest_first(&self, user_id: Uuid) -> anyhow::Result<Vec<SimulationResult>> {
        let rows = sqlx::query_as::<_, SimulationResultRow>(&format!(
            "{} WHERE simulated_by = $1 ORDER BY simulation_timestamp DESC",
            SELECT_RESULT
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Self::convert(rows)
    }

    async fn latest(&self) -> anyhow::Result<Option<SimulationResult>> {
        let row = sqlx::query_as::<_, SimulationResultRow>(&format!(
            "{} ORDER BY simulation_timestamp DESC LIMIT 1",
            SELECT_RESULT
        ))
        .fetch_optional(&self.pool)
        .await?;
        row.map(SimulationResult::try_from).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<SimulationResult>> {
        let row = sqlx::query_as::<_, SimulationResultRow>(&format!("{} WHERE id = $1", SELECT_RESULT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(SimulationResult::try_from).transpose()
    }
}
