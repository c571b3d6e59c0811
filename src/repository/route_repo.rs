use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{to_count, RouteStore};
use crate::models::{Route, TrafficLevel};

const SELECT_ROUTE: &str = "SELECT id, route_id, distance_km, traffic_level, base_time_minutes, \
     start_location, end_location, is_active, created_at, updated_at FROM routes";

#[derive(sqlx::FromRow)]
struct RouteRow {
    id: Uuid,
    route_id: String,
    distance_km: f64,
    traffic_level: String,
    base_time_minutes: i32,
    start_location: Option<String>,
    end_location: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RouteRow> for Route {
    type Error = anyhow::Error;

    fn try_from(row: RouteRow) -> Result<Self, Self::Error> {
        Ok(Route {
            id: row.id,
            route_id: row.route_id,
            distance_km: row.distance_km,
            traffic_level: row.traffic_level.parse()?,
            base_time_minutes: u32::try_from(row.base_time_minutes)?,
            start_location: row.start_location,
            end_location: row.end_location,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub struct RouteRepository {
    pool: PgPool,
}

impl RouteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn convert(rows: Vec<RouteRow>) -> anyhow::Result<Vec<Route>> {
        rows.into_iter().map(Route::try_from).collect()
    }
}

#[async_trait]
impl RouteStore for RouteRepository {
    async fn list(&self) -> anyhow::Result<Vec<Route>> {
        let rows = sqlx::query_as::<_, RouteRow>(&format!("{} ORDER BY created_at, id", SELECT_ROUTE))
            .fetch_all(&self.pool)
            .await?;
        Self::convert(rows)
    }

    async fn list_active(&self) -> anyhow::Result<Vec<Route>> {
        let rows = sqlx::query_as::<_, RouteRow>(&format!(
            "{} WHERE is_active ORDER BY created_at, id",
            SELECT_ROUTE
        ))
        .fetch_all(&self.pool)
        .await?;
        Self::convert(rows)
    }

    async fn by_traffic_level(&self, level: TrafficLevel) -> anyhow::Result<Vec<Route>> {
        let rows = sqlx::query_as::<_, RouteRow>(&format!(
            "{} WHERE traffic_level = $1 ORDER BY created_at, id",
            SELECT_ROUTE
        ))
        .bind(level.as_str())
        .fetch_all(&self.pool)
        .await?;
        Self::convert(rows)
    }

    async fn count(&self) -> anyhow::Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM routes")
            .fetch_one(&self.pool)
            .await?;
        Ok(to_count(count))
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Route>> {
        let row = sqlx::query_as::<_, RouteRow>(&format!("{} WHERE id = $1", SELECT_ROUTE))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Route::try_from).transpose()
    }

    async fn find_by_route_id(&self, route_id: &str) -> anyhow::Result<Option<Route>> {
        let row = sqlx::query_as::<_, RouteRow>(&format!(
            "{} WHERE route_id = $1 ORDER BY created_at LIMIT 1",
            SELECT_ROUTE
        ))
        .bind(route_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Route::try_from).transpose()
    }

    async fn save(&self, route: &Route) -> anyhow::Result<()> {
        let base_time = i32::try_from(route.base_time_minutes)?;
        sqlx::query(
            "INSERT INTO routes (id, route_id, distance_km, traffic_level, base_time_minutes,
                                 start_location, end_location, is_active, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             ON CONFLICT (id) DO UPDATE SET
                route_id = EXCLUDED.route_id,
                distance_km = EXCLUDED.distance_km,
                traffic_level = EXCLUDED.traffic_level,
                base_time_minutes = EXCLUDED.base_time_minutes,
                start_location = EXCLUDED.start_location,
                end_location = EXCLUDED.end_location,
                is_active = EXCLUDED.is_active,
                updated_at = EXCLUDED.updated_at",
        )
        .bind(route.id)
        .bind(&route.route_id)
        .bind(route.distance_km)
        .bind(route.traffic_level.as_str())
        .bind(base_time)
        .bind(&route.start_location)
        .bind(&route.end_location)
        .bind(route.is_active)
        .bind(route.created_at)
        .bind(route.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to save route {}: {}", route.route_id, e))?;
        Ok(())
    }
}
