use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{to_count, DriverStore};
use crate::models::Driver;

const SELECT_DRIVER: &str = "SELECT id, name, current_shift_hours, past_7_day_work_hours, is_active, \
     has_fatigue_penalty, created_at, updated_at FROM drivers";

#[derive(sqlx::FromRow)]
struct DriverRow {
    id: Uuid,
    name: String,
    current_shift_hours: f64,
    past_7_day_work_hours: f64,
    is_active: bool,
    has_fatigue_penalty: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<DriverRow> for Driver {
    fn from(row: DriverRow) -> Self {
        Driver {
            id: row.id,
            name: row.name,
            current_shift_hours: row.current_shift_hours,
            past_7_day_work_hours: row.past_7_day_work_hours,
            is_active: row.is_active,
            has_fatigue_penalty: row.has_fatigue_penalty,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub struct DriverRepository {
    pool: PgPool,
}

impl DriverRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch(&self, sql: &str) -> anyhow::Result<Vec<Driver>> {
        let rows = sqlx::query_as::<_, DriverRow>(sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Driver::from).collect())
    }
}

#[async_trait]
impl DriverStore for DriverRepository {
    async fn list(&self) -> anyhow::Result<Vec<Driver>> {
        self.fetch(&format!("{} ORDER BY created_at, id", SELECT_DRIVER)).await
    }

    async fn list_active(&self) -> anyhow::Result<Vec<Driver>> {
        self.fetch(&format!("{} WHERE is_active ORDER BY created_at, id", SELECT_DRIVER))
            .await
    }

    async fn active_by_shift_hours(&self) -> anyhow::Result<Vec<Driver>> {
        self.fetch(&format!(
            "{} WHERE is_active ORDER BY current_shift_hours ASC, created_at, id",
            SELECT_DRIVER
        ))
        .await
    }

    async fn count_active(&self) -> anyhow::Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM drivers WHERE is_active")
            .fetch_one(&self.pool)
            .await?;
        Ok(to_count(count))
    }

    async fn count(&self) -> anyhow::Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM drivers")
            .fetch_one(&self.pool)
            .await?;
        Ok(to_count(count))
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Driver>> {
        let row = sqlx::query_as::<_, DriverRow>(&format!("{} WHERE id = $1", SELECT_DRIVER))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Driver::from))
    }

    async fn save(&self, driver: &Driver) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO drivers (id, name, current_shift_hours, past_7_day_work_hours, is_active,
                                  has_fatigue_penalty, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                current_shift_hours = EXCLUDED.current_shift_hours,
                past_7_day_work_hours = EXCLUDED.past_7_day_work_hours,
                is_active = EXCLUDED.is_active,
                has_fatigue_penalty = EXCLUDED.has_fatigue_penalty,
                updated_at = EXCLUDED.updated_at",
        )
        .bind(driver.id)
        .bind(&driver.name)
        .bind(driver.current_shift_hours)
        .bind(driver.past_7_day_work_hours)
        .bind(driver.is_active)
        .bind(driver.has_fatigue_penalty)
        .bind(driver.created_at)
        .bind(driver.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to save driver {}: {}", driver.id, e))?;
        Ok(())
    }
}
