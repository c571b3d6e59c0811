pub mod database;

use anyhow::{anyhow, Context};
use serde::Deserialize;
use std::env;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Accepted token lifetimes, from one hour to one year.
pub const JWT_EXPIRATION_HOURS_RANGE: RangeInclusive<i64> = 1..=8760;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Postgres connection string; the in-memory store is used when unset.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub port: u16,
    /// Allowed CORS origin; any origin when unset.
    pub cors_origin: Option<String>,
    pub seed_sample_data: bool,
    pub simulation_jitter_minutes: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt_secret = env::var("JWT_SECRET").map_err(|_| anyhow!("JWT_SECRET must be set"))?;
        if jwt_secret.trim().is_empty() {
            return Err(anyhow!("JWT_SECRET must not be empty"));
        }

        let jwt_expiration_hours: i64 = parse_var("JWT_EXPIRATION_HOURS", 24)?;
        if !JWT_EXPIRATION_HOURS_RANGE.contains(&jwt_expiration_hours) {
            return Err(anyhow!(
                "JWT_EXPIRATION_HOURS must be between {} and {}, got {}",
                JWT_EXPIRATION_HOURS_RANGE.start(),
                JWT_EXPIRATION_HOURS_RANGE.end(),
                jwt_expiration_hours
            ));
        }

        Ok(Config {
            database_url: optional_var("DATABASE_URL"),
            database_max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 10)?,
            jwt_secret,
            jwt_expiration_hours,
            port: parse_var("PORT", 8080)?,
            cors_origin: optional_var("CORS_ORIGIN"),
            seed_sample_data: parse_var("SEED_SAMPLE_DATA", false)?,
            simulation_jitter_minutes: parse_var("SIMULATION_JITTER_MINUTES", 5)?,
        })
    }

    /// Settings for tests and local tooling; never read from the environment.
    pub fn for_tests(jwt_secret: &str) -> Self {
        Config {
            database_url: None,
            database_max_connections: 1,
            jwt_secret: jwt_secret.to_string(),
            jwt_expiration_hours: 1,
            port: 0,
            cors_origin: None,
            seed_sample_data: false,
            simulation_jitter_minutes: 5,
        }
    }
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_var(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {} value: {}", name, raw)),
        None => Ok(default),
    }
}
