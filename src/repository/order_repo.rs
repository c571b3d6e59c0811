use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{to_count, OrderStore};
use crate::models::{Order, OrderStatus};

const SELECT_ORDER: &str = "SELECT id, order_id, value_rs, assigned_route_id, assigned_driver_id, \
     delivery_timestamp, status, is_delivered_on_time, penalty, bonus, fuel_cost, profit, \
     created_at, updated_at FROM orders";

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    order_id: String,
    value_rs: f64,
    assigned_route_id: String,
    assigned_driver_id: Option<Uuid>,
    delivery_timestamp: Option<DateTime<Utc>>,
    status: String,
    is_delivered_on_time: bool,
    penalty: f64,
    bonus: f64,
    fuel_cost: f64,
    profit: f64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = anyhow::Error;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Order {
            id: row.id,
            order_id: row.order_id,
            value_rs: row.value_rs,
            assigned_route_id: row.assigned_route_id,
            assigned_driver_id: row.assigned_driver_id,
            delivery_timestamp: row.delivery_timestamp,
            status: row.status.parse()?,
            is_delivered_on_time: row.is_delivered_on_time,
            penalty: row.penalty,
            bonus: row.bonus,
            fuel_cost: row.fuel_cost,
            profit: row.profit,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn convert(rows: Vec<OrderRow>) -> anyhow::Result<Vec<Order>> {
        rows.into_iter().map(Order::try_from).collect()
    }
}

#[async_trait]
impl OrderStore for OrderRepository {
    async fn list(&self) -> anyhow::Result<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!("{} ORDER BY created_at, id", SELECT_ORDER))
            .fetch_all(&self.pool)
            .await?;
        Self::convert(rows)
    }

    async fn by_status(&self, status: OrderStatus) -> anyhow::Result<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "{} WHERE status = $1 ORDER BY created_at, id",
            SELECT_ORDER
        ))
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;
        Self::convert(rows)
    }

    async fn by_driver(&self, driver_id: Uuid) -> anyhow::Result<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "{} WHERE assigned_driver_id = $1 ORDER BY created_at, id",
            SELECT_ORDER
        ))
        .bind(driver_id)
        .fetch_all(&self.pool)
        .await?;
        Self::convert(rows)
    }

    async fn by_route(&self, route_id: &str) -> anyhow::Result<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "{} WHERE assigned_route_id = $1 ORDER BY created_at, id",
            SELECT_ORDER
        ))
        .bind(route_id)
        .fetch_all(&self.pool)
        .await?;
        Self::convert(rows)
    }

    async fn count(&self) -> anyhow::Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;
        Ok(to_count(count))
    }

    async fn delivery_counts(&self) -> anyhow::Result<(u64, u64)> {
        let (on_time, late): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*) FILTER (WHERE is_delivered_on_time),
                    COUNT(*) FILTER (WHERE NOT is_delivered_on_time)
             FROM orders WHERE status = $1",
        )
        .bind(OrderStatus::Delivered.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok((to_count(on_time), to_count(late)))
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!("{} WHERE id = $1", SELECT_ORDER))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Order::try_from).transpose()
    }

    async fn find_by_order_id(&self, order_id: &str) -> anyhow::Result<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!("{} WHERE order_id = $1", SELECT_ORDER))
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Order::try_from).transpose()
    }

    async fn save(&self, order: &Order) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO orders (id, order_id, value_rs, assigned_route_id, assigned_driver_id,
                                 delivery_timestamp, status, is_delivered_on_time, penalty, bonus,
                                 fuel_cost, profit, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
             ON CONFLICT (id) DO UPDATE SET
                order_id = EXCLUDED.order_id,
                value_rs = EXCLUDED.value_rs,
                assigned_route_id = EXCLUDED.assigned_route_id,
                assigned_driver_id = EXCLUDED.assigned_driver_id,
                delivery_timestamp = EXCLUDED.delivery_timestamp,
                status = EXCLUDED.status,
                is_delivered_on_time = EXCLUDED.is_delivered_on_time,
                penalty = EXCLUDED.penalty,
                bonus = EXCLUDED.bonus,
                fuel_cost = EXCLUDED.fuel_cost,
                profit = EXCLUDED.profit,
                updated_at = EXCLUDED.updated_at",
        )
        .bind(order.id)
        .bind(&order.order_id)
        .bind(order.value_rs)
        .bind(&order.assigned_route_id)
        .bind(order.assigned_driver_id)
        .bind(order.delivery_timestamp)
        .bind(order.status.as_str())
        .bind(order.is_delivered_on_time)
        .bind(order.penalty)
        .bind(order.bonus)
        .bind(order.fuel_cost)
        .bind(order.profit)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to save order {}: {}", order.order_id, e))?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
