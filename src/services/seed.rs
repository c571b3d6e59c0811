//! Sample fleet for demos and local development.
//!
//! Each collection is only filled when it is empty, so seeding is safe to
//! run on every start.

use crate::models::{Driver, Order, Route, TrafficLevel};
use crate::repository::Stores;

use super::auth::AuthService;

const DRIVERS: &[(&str, f64, f64, bool)] = &[
    ("Rajesh Kumar", 6.5, 42.0, false),
    ("Priya Sharma", 4.2, 38.5, false),
    ("Amit Singh", 7.8, 45.2, true),
    ("Sunita Devi", 5.1, 35.8, false),
    ("Vikram Patel", 8.2, 48.7, true),
    ("Meera Gupta", 3.9, 32.4, false),
    ("Ravi Yadav", 6.8, 41.6, false),
    ("Kavita Joshi", 5.5, 39.2, false),
];

const ROUTES: &[(&str, f64, TrafficLevel, u32)] = &[
    ("R001", 12.5, TrafficLevel::Low, 45),
    ("R002", 8.3, TrafficLevel::Medium, 35),
    ("R003", 15.7, TrafficLevel::High, 65),
    ("R004", 6.2, TrafficLevel::Low, 25),
    ("R005", 18.9, TrafficLevel::High, 75),
    ("R006", 10.1, TrafficLevel::Medium, 40),
    ("R007", 22.3, TrafficLevel::High, 85),
    ("R008", 7.8, TrafficLevel::Low, 30),
    ("R009", 13.6, TrafficLevel::Medium, 50),
    ("R010", 9.4, TrafficLevel::Low, 35),
];

const NAMED_STOPS: &[(&str, &str)] = &[
    ("Warehouse A", "Sector 15, Noida"),
    ("Warehouse B", "Connaught Place, Delhi"),
    ("Warehouse A", "Gurgaon Cyber City"),
    ("Warehouse C", "Lajpat Nagar, Delhi"),
    ("Warehouse A", "Faridabad Industrial Area"),
];

const ORDERS: &[(&str, f64, &str)] = &[
    ("ORD001", 1250.0, "R001"),
    ("ORD002", 875.0, "R002"),
    ("ORD003", 1580.0, "R003"),
    ("ORD004", 650.0, "R004"),
    ("ORD005", 2100.0, "R005"),
    ("ORD006", 920.0, "R006"),
    ("ORD007", 1750.0, "R007"),
    ("ORD008", 480.0, "R008"),
    ("ORD009", 1320.0, "R009"),
    ("ORD010", 760.0, "R010"),
    ("ORD011", 1890.0, "R001"),
    ("ORD012", 540.0, "R002"),
    ("ORD013", 2250.0, "R003"),
    ("ORD014", 1100.0, "R004"),
    ("ORD015", 890.0, "R005"),
];

pub fn sample_drivers() -> Vec<Driver> {
    DRIVERS
        .iter()
        .map(|&(name, shift, week, fatigued)| {
            let driver = Driver::new(name, shift, week);
            if fatigued {
                driver.with_fatigue()
            } else {
                driver
            }
        })
        .collect()
}

pub fn sample_routes() -> Vec<Route> {
    ROUTES
        .iter()
        .enumerate()
        .map(|(i, &(route_id, distance, traffic, minutes))| {
            let route = Route::new(route_id, distance, traffic, minutes);
            match NAMED_STOPS.get(i) {
                Some(&(start, end)) => route.between(start, end),
                None => {
                    let warehouse = char::from(b'A' + (i % 3) as u8);
                    route.between(&format!("Warehouse {}", warehouse), &format!("Location {}", i + 1))
                }
            }
        })
        .collect()
}

pub fn sample_orders() -> Vec<Order> {
    ORDERS
        .iter()
        .map(|&(order_id, value, route_id)| Order::new(order_id, value, route_id))
        .collect()
}

pub async fn seed_sample_data(stores: &Stores, auth: &AuthService) -> anyhow::Result<()> {
    tracing::info!("Seeding sample data");
    auth.initialize_default_users().await?;

    if stores.drivers.count().await? == 0 {
        let drivers = sample_drivers();
        for driver in &drivers {
            stores.drivers.save(driver).await?;
        }
        tracing::info!(count = drivers.len(), "Created sample drivers");
    }

    if stores.routes.count().await? == 0 {
        let routes = sample_routes();
        for route in &routes {
            stores.routes.save(route).await?;
        }
        tracing::info!(count = routes.len(), "Created sample routes");
    }

    if stores.orders.count().await? == 0 {
        let orders = sample_orders();
        for order in &orders {
            stores.orders.save(order).await?;
        }
        tracing::info!(count = orders.len(), "Created sample orders");
    }

    Ok(())
}
