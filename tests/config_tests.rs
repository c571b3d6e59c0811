//! Environment-driven configuration.
//!
//! These tests mutate process environment variables, so they run serially.

use routewise::config::Config;
use serial_test::serial;

const VARS: &[&str] = &[
    "DATABASE_URL",
    "DATABASE_MAX_CONNECTIONS",
    "JWT_SECRET",
    "JWT_EXPIRATION_HOURS",
    "PORT",
    "CORS_ORIGIN",
    "SEED_SAMPLE_DATA",
    "SIMULATION_JITTER_MINUTES",
];

fn clear_env() {
    for var in VARS {
        std::env::remove_var(var);
    }
}

// ===== Defaults =====

#[test]
#[serial]
fn test_defaults_with_only_secret() {
    clear_env();
    std::env::set_var("JWT_SECRET", "test-secret");

    let config = Config::from_env().expect("Config must load with only JWT_SECRET set");
    assert_eq!(config.database_url, None, "Missing DATABASE_URL selects the in-memory store");
    assert_eq!(config.port, 8080);
    assert_eq!(config.jwt_expiration_hours, 24);
    assert_eq!(config.database_max_connections, 10);
    assert_eq!(config.simulation_jitter_minutes, 5);
    assert!(!config.seed_sample_data);
    assert_eq!(config.cors_origin, None);

    clear_env();
}

#[test]
#[serial]
fn test_overrides_are_parsed() {
    clear_env();
    std::env::set_var("JWT_SECRET", "test-secret");
    std::env::set_var("DATABASE_URL", "postgres://localhost/routewise");
    std::env::set_var("PORT", "9090");
    std::env::set_var("SEED_SAMPLE_DATA", "true");
    std::env::set_var("SIMULATION_JITTER_MINUTES", "0");

    let config = Config::from_env().unwrap();
    assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/routewise"));
    assert_eq!(config.port, 9090);
    assert!(config.seed_sample_data);
    assert_eq!(config.simulation_jitter_minutes, 0);

    clear_env();
}

// ===== Failures =====

#[test]
#[serial]
fn test_missing_secret_is_error() {
    clear_env();
    let err = Config::from_env().unwrap_err();
    assert!(err.to_string().contains("JWT_SECRET"), "Error must name the missing variable: {}", err);

    std::env::set_var("JWT_SECRET", "   ");
    assert!(Config::from_env().is_err(), "Blank JWT_SECRET must be rejected");
    clear_env();
}

#[test]
#[serial]
fn test_invalid_number_is_error_not_panic() {
    clear_env();
    std::env::set_var("JWT_SECRET", "test-secret");
    std::env::set_var("PORT", "not_a_number");

    let result = std::panic::catch_unwind(Config::from_env);
    assert!(result.is_ok(), "Config::from_env must not panic on invalid PORT");
    let err = result.unwrap().unwrap_err();
    assert!(err.to_string().contains("PORT"), "Error must name the bad variable: {}", err);

    clear_env();
}

#[test]
#[serial]
fn test_token_lifetime_out_of_range_is_error() {
    clear_env();
    std::env::set_var("JWT_SECRET", "test-secret");

    for raw in ["0", "-5", "8761", "100000000000"] {
        std::env::set_var("JWT_EXPIRATION_HOURS", raw);
        let err = Config::from_env().unwrap_err();
        assert!(
            err.to_string().contains("JWT_EXPIRATION_HOURS"),
            "Lifetime {} must be rejected naming the variable: {}",
            raw,
            err
        );
    }

    std::env::set_var("JWT_EXPIRATION_HOURS", "8760");
    assert_eq!(Config::from_env().unwrap().jwt_expiration_hours, 8760);

    clear_env();
}
