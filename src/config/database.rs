use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

pub async fn create_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .test_before_acquire(true)
        .connect(database_url)
        .await?;

    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Database connection validation failed: {}", e))?;

    Ok(pool)
}

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS drivers (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        current_shift_hours DOUBLE PRECISION NOT NULL,
        past_7_day_work_hours DOUBLE PRECISION NOT NULL,
        is_active BOOLEAN NOT NULL,
        has_fatigue_penalty BOOLEAN NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS routes (
        id UUID PRIMARY KEY,
        route_id TEXT NOT NULL,
        distance_km DOUBLE PRECISION NOT NULL,
        traffic_level TEXT NOT NULL,
        base_time_minutes INTEGER NOT NULL,
        start_location TEXT,
        end_location TEXT,
        is_active BOOLEAN NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS orders (
        id UUID PRIMARY KEY,
        order_id TEXT NOT NULL UNIQUE,
        value_rs DOUBLE PRECISION NOT NULL,
        assigned_route_id TEXT NOT NULL,
        assigned_driver_id UUID,
        delivery_timestamp TIMESTAMPTZ,
        status TEXT NOT NULL,
        is_delivered_on_time BOOLEAN NOT NULL,
        penalty DOUBLE PRECISION NOT NULL,
        bonus DOUBLE PRECISION NOT NULL,
        fuel_cost DOUBLE PRECISION NOT NULL,
        profit DOUBLE PRECISION NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS orders_status_idx ON orders (status)",
    "CREATE TABLE IF NOT EXISTS simulation_results (
        id UUID PRIMARY KEY,
        number_of_drivers INTEGER NOT NULL,
        route_start_time TIME NOT NULL,
        max_hours_per_driver INTEGER NOT NULL,
        total_profit DOUBLE PRECISION NOT NULL,
        efficiency_score DOUBLE PRECISION NOT NULL,
        on_time_deliveries INTEGER NOT NULL,
        late_deliveries INTEGER NOT NULL,
        total_deliveries INTEGER NOT NULL,
        total_fuel_cost DOUBLE PRECISION NOT NULL,
        total_penalties DOUBLE PRECISION NOT NULL,
        total_bonuses DOUBLE PRECISION NOT NULL,
        fuel_cost_breakdown JSONB NOT NULL,
        processed_order_ids JSONB NOT NULL,
        simulated_by UUID NOT NULL,
        simulation_timestamp TIMESTAMPTZ NOT NULL,
        notes TEXT
    )",
    "CREATE INDEX IF NOT EXISTS simulation_results_ts_idx ON simulation_results (simulation_timestamp DESC)",
    "CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL,
        password_hash TEXT NOT NULL,
        roles TEXT[] NOT NULL,
        is_active BOOLEAN NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        last_login_at TIMESTAMPTZ
    )",
];

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| anyhow::anyhow!("Schema initialization failed: {}", e))?;
    }
    tracing::info!(tables = 5, "Database schema ready");
    Ok(())
}
