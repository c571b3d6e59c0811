//! Simulation runs against the in-memory stores.
//!
//! Coverage:
//! - preconditions abort before any order or driver is touched
//! - least-loaded drivers are selected and used round-robin
//! - hour budgets leave orders pending for the next run
//! - KPIs only count the orders delivered by the run
//! - history queries are newest first

use chrono::{NaiveTime, TimeZone, Utc};
use routewise::models::simulation::SimulationParams;
use routewise::models::{Driver, Order, OrderStatus, Route, TrafficLevel};
use routewise::repository::Stores;
use routewise::services::jitter::{FixedJitter, SequenceJitter};
use routewise::services::simulation::{SimulationError, SimulationService};
use uuid::Uuid;

fn params(drivers: u32, max_hours: u32) -> SimulationParams {
    SimulationParams {
        number_of_drivers: drivers,
        route_start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        max_hours_per_driver: max_hours,
        notes: Some("test run".to_string()),
    }
}

async fn stores_with(drivers: &[Driver], routes: &[Route], orders: &[Order]) -> Stores {
    let stores = Stores::in_memory();
    for d in drivers {
        stores.drivers.save(d).await.unwrap();
    }
    for r in routes {
        stores.routes.save(r).await.unwrap();
    }
    for o in orders {
        stores.orders.save(o).await.unwrap();
    }
    stores
}

// ===== Preconditions =====

#[tokio::test]
async fn test_insufficient_drivers_names_both_counts() {
    let drivers = vec![Driver::new("A", 1.0, 10.0), Driver::new("B", 2.0, 10.0)];
    let routes = vec![Route::new("R1", 10.0, TrafficLevel::Low, 30)];
    let orders = vec![Order::new("O1", 500.0, "R1")];
    let stores = stores_with(&drivers, &routes, &orders).await;
    let service = SimulationService::new(stores.clone(), Box::new(FixedJitter(0)));

    let err = service.run(params(3, 8), Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, SimulationError::InsufficientDrivers { available: 2, requested: 3 }));
    assert_eq!(err.to_string(), "Not enough active drivers available. Available: 2, Required: 3");

    let order = stores.orders.find_by_order_id("O1").await.unwrap().unwrap();
    assert_eq!(order, orders[0], "Orders must not change when a precondition fails");
    assert!(stores.results.latest().await.unwrap().is_none(), "No result is stored for a failed run");
}

#[tokio::test]
async fn test_inactive_drivers_do_not_count() {
    let mut off_duty = Driver::new("Off", 0.0, 0.0);
    off_duty.deactivate();
    let drivers = vec![Driver::new("A", 1.0, 10.0), off_duty];
    let routes = vec![Route::new("R1", 10.0, TrafficLevel::Low, 30)];
    let orders = vec![Order::new("O1", 500.0, "R1")];
    let stores = stores_with(&drivers, &routes, &orders).await;
    let service = SimulationService::new(stores, Box::new(FixedJitter(0)));

    let err = service.run(params(2, 8), Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, SimulationError::InsufficientDrivers { available: 1, requested: 2 }));
}

#[tokio::test]
async fn test_no_active_routes() {
    let mut closed = Route::new("R1", 10.0, TrafficLevel::Low, 30);
    closed.deactivate();
    let stores = stores_with(&[Driver::new("A", 0.0, 0.0)], &[closed], &[Order::new("O1", 100.0, "R1")]).await;
    let service = SimulationService::new(stores, Box::new(FixedJitter(0)));

    let err = service.run(params(1, 8), Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, SimulationError::NoActiveRoutes));
    assert!(err.is_precondition());
}

#[tokio::test]
async fn test_no_pending_orders() {
    let mut done = Order::new("O1", 100.0, "R1");
    done.status = OrderStatus::Delivered;
    let stores = stores_with(
        &[Driver::new("A", 0.0, 0.0)],
        &[Route::new("R1", 10.0, TrafficLevel::Low, 30)],
        &[done],
    )
    .await;
    let service = SimulationService::new(stores, Box::new(FixedJitter(0)));

    let err = service.run(params(1, 8), Uuid::new_v4()).await.unwrap_err();
    assert_eq!(err.to_string(), "No pending orders available for simulation");
}

#[tokio::test]
async fn test_zero_drivers_rejected_as_invalid() {
    let service = SimulationService::new(Stores::in_memory(), Box::new(FixedJitter(0)));
    let err = service.run(params(0, 8), Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, SimulationError::Invalid(_)));
}

// ===== Allocation =====

#[tokio::test]
async fn test_least_loaded_drivers_are_selected() {
    let busy = Driver::new("Busy", 7.0, 40.0);
    let fresh = Driver::new("Fresh", 1.0, 10.0);
    let mid = Driver::new("Mid", 3.0, 20.0);
    let routes = vec![Route::new("R1", 10.0, TrafficLevel::Low, 30)];
    let orders = vec![
        Order::new("O1", 100.0, "R1"),
        Order::new("O2", 100.0, "R1"),
        Order::new("O3", 100.0, "R1"),
    ];
    let stores = stores_with(&[busy.clone(), fresh.clone(), mid.clone()], &routes, &orders).await;
    let service = SimulationService::new(stores.clone(), Box::new(FixedJitter(0)));

    service.run(params(2, 8), Uuid::new_v4()).await.unwrap();

    let mut assigned = Vec::new();
    for id in ["O1", "O2", "O3"] {
        let order = stores.orders.find_by_order_id(id).await.unwrap().unwrap();
        assigned.push(order.assigned_driver_id);
    }
    assert_eq!(assigned, vec![Some(fresh.id), Some(mid.id), Some(fresh.id)]);
    assert!(!assigned.contains(&Some(busy.id)), "Most loaded driver must be left out");
}

#[tokio::test]
async fn test_every_delivered_order_satisfies_profit_identity() {
    let drivers = vec![Driver::new("A", 0.0, 0.0), Driver::new("B", 0.0, 0.0).with_fatigue()];
    let routes = vec![
        Route::new("R1", 12.0, TrafficLevel::High, 40),
        Route::new("R2", 8.0, TrafficLevel::Medium, 25),
    ];
    let orders = vec![
        Order::new("O1", 1500.0, "R1"),
        Order::new("O2", 900.0, "R2"),
        Order::new("O3", 2500.0, "R2"),
        Order::new("O4", 300.0, "R1"),
    ];
    let stores = stores_with(&drivers, &routes, &orders).await;
    let jitter = SequenceJitter::new(vec![-5, 15, 3, 11]);
    let service = SimulationService::new(stores.clone(), Box::new(jitter));

    let result = service.run(params(2, 8), Uuid::new_v4()).await.unwrap();
    assert_eq!(result.total_deliveries, 4);

    for order in stores.orders.by_status(OrderStatus::Delivered).await.unwrap() {
        let expected = order.value_rs + order.bonus - order.penalty - order.fuel_cost;
        assert!((order.profit - expected).abs() < 1e-9, "profit identity broken for {}", order.order_id);
        assert!(order.assigned_driver_id.is_some());
        assert!(order.delivery_timestamp.is_some());
    }
}

#[tokio::test]
async fn test_hour_budget_leaves_orders_pending() {
    let drivers = vec![Driver::new("A", 0.0, 0.0)];
    let routes = vec![Route::new("R1", 5.0, TrafficLevel::Low, 90)];
    let orders = vec![
        Order::new("O1", 100.0, "R1"),
        Order::new("O2", 100.0, "R1"),
        Order::new("O3", 100.0, "R1"),
    ];
    let stores = stores_with(&drivers, &routes, &orders).await;
    let service = SimulationService::new(stores.clone(), Box::new(FixedJitter(0)));

    // 1.5h each, 3h budget: two fit, the third stays pending.
    let first = service.run(params(1, 3), Uuid::new_v4()).await.unwrap();
    assert_eq!(first.processed_order_ids, vec!["O1", "O2"]);
    let pending = stores.orders.by_status(OrderStatus::Pending).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].order_id, "O3");
    assert_eq!(pending[0].assigned_driver_id, None);

    let second = service.run(params(1, 3), Uuid::new_v4()).await.unwrap();
    assert_eq!(second.processed_order_ids, vec!["O3"], "Skipped orders are picked up by the next run");
}

#[tokio::test]
async fn test_missing_route_is_skipped() {
    let drivers = vec![Driver::new("A", 0.0, 0.0)];
    let routes = vec![Route::new("R1", 5.0, TrafficLevel::Low, 20)];
    let orders = vec![Order::new("O1", 100.0, "R999"), Order::new("O2", 100.0, "R1")];
    let stores = stores_with(&drivers, &routes, &orders).await;
    let service = SimulationService::new(stores.clone(), Box::new(FixedJitter(0)));

    let result = service.run(params(1, 8), Uuid::new_v4()).await.unwrap();
    assert_eq!(result.processed_order_ids, vec!["O2"]);
    let orphan = stores.orders.find_by_order_id("O1").await.unwrap().unwrap();
    assert_eq!(orphan.status, OrderStatus::Pending);
}

// ===== KPIs =====

#[tokio::test]
async fn test_kpis_cover_only_this_run() {
    let mut earlier = Order::new("OLD", 5000.0, "R1");
    earlier.status = OrderStatus::Delivered;
    earlier.is_delivered_on_time = true;
    earlier.calculate_profit();

    let drivers = vec![Driver::new("A", 0.0, 0.0)];
    let routes = vec![Route::new("R1", 12.0, TrafficLevel::High, 30)];
    let orders = vec![earlier, Order::new("O1", 1500.0, "R1"), Order::new("O2", 400.0, "R1")];
    let stores = stores_with(&drivers, &routes, &orders).await;
    // O1 on time, O2 late.
    let service = SimulationService::new(stores, Box::new(SequenceJitter::new(vec![0, 12])));

    let result = service.run(params(1, 8), Uuid::new_v4()).await.unwrap();

    assert_eq!(result.total_deliveries, 2);
    assert_eq!(result.on_time_deliveries, 1);
    assert_eq!(result.late_deliveries, 1);
    assert_eq!(result.efficiency_score, 50.0);
    assert_eq!(result.total_bonuses, 150.0);
    assert_eq!(result.total_penalties, 50.0);
    assert_eq!(result.total_fuel_cost, 168.0);
    assert_eq!(result.total_profit, (1500.0 + 150.0 - 84.0) + (400.0 - 50.0 - 84.0));
    assert_eq!(result.fuel_cost_breakdown.get(&TrafficLevel::High), Some(&168.0));
    assert_eq!(result.notes.as_deref(), Some("test run"));
}

#[tokio::test]
async fn test_delivery_timestamp_follows_start_time_and_worked_hours() {
    let drivers = vec![Driver::new("A", 0.0, 0.0)];
    let routes = vec![Route::new("R1", 5.0, TrafficLevel::Low, 60)];
    let orders = vec![Order::new("O1", 100.0, "R1"), Order::new("O2", 100.0, "R1")];
    let stores = stores_with(&drivers, &routes, &orders).await;
    let service = SimulationService::new(stores.clone(), Box::new(FixedJitter(5)));
    let now = Utc.with_ymd_and_hms(2024, 5, 10, 6, 30, 0).unwrap();

    service.run_at(params(1, 8), Uuid::new_v4(), now).await.unwrap();

    let second = stores.orders.find_by_order_id("O2").await.unwrap().unwrap();
    // 09:00 start + 60 worked minutes + 65 actual minutes.
    assert_eq!(second.delivery_timestamp, Some(Utc.with_ymd_and_hms(2024, 5, 10, 11, 5, 0).unwrap()));
    assert!(second.is_delivered_on_time);
}

// ===== History =====

#[tokio::test]
async fn test_history_newest_first_and_per_user() {
    let drivers = vec![Driver::new("A", 0.0, 0.0)];
    // 45 minutes per order against a 1h budget: one order per run.
    let routes = vec![Route::new("R1", 5.0, TrafficLevel::Low, 45)];
    let orders = vec![Order::new("O1", 100.0, "R1"), Order::new("O2", 100.0, "R1")];
    let stores = stores_with(&drivers, &routes, &orders).await;
    let service = SimulationService::new(stores.clone(), Box::new(FixedJitter(0)));
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    let first = service
        .run_at(params(1, 1), alice, Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap())
        .await
        .unwrap();
    let second = service
        .run_at(params(1, 1), bob, Utc.with_ymd_and_hms(2024, 1, 2, 8, 0, 0).unwrap())
        .await
        .unwrap();

    let ids: Vec<Uuid> = service.history().await.unwrap().into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
    assert_eq!(service.latest().await.unwrap().map(|r| r.id), Some(second.id));

    let mine = service.history_for_user(alice).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, first.id);
    assert_eq!(service.find(first.id).await.unwrap(), Some(first));
}
