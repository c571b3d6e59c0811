//! In-process stores.
//!
//! Collections keep insertion order so list queries are stable, matching
//! the `ORDER BY created_at` of the Postgres backend.

use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use parking_lot::RwLock;
use uuid::Uuid;

use super::{DriverStore, OrderStore, RouteStore, SimulationResultStore, UserStore};
use crate::models::{Driver, Order, OrderStatus, Route, SimulationResult, TrafficLevel, User};

/// Ordered table keyed by a uuid, replaced in place on save.
struct Table<T> {
    rows: RwLock<Vec<T>>,
    key: fn(&T) -> Uuid,
}

impl<T: Clone> Table<T> {
    fn new(key: fn(&T) -> Uuid) -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
            key,
        }
    }

    fn all(&self) -> Vec<T> {
        self.rows.read().clone()
    }

    fn filter(&self, pred: impl Fn(&T) -> bool) -> Vec<T> {
        self.rows.read().iter().filter(|r| pred(r)).cloned().collect()
    }

    fn find(&self, pred: impl Fn(&T) -> bool) -> Option<T> {
        self.rows.read().iter().find(|r| pred(r)).cloned()
    }

    fn get(&self, id: Uuid) -> Option<T> {
        let key = self.key;
        self.find(|r| key(r) == id)
    }

    fn upsert(&self, row: &T) {
        let key = self.key;
        let id = key(row);
        let mut rows = self.rows.write();
        match rows.iter_mut().find(|r| key(r) == id) {
            Some(existing) => *existing = row.clone(),
            None => rows.push(row.clone()),
        }
    }

    fn remove(&self, id: Uuid) -> bool {
        let key = self.key;
        let mut rows = self.rows.write();
        let before = rows.len();
        rows.retain(|r| key(r) != id);
        rows.len() != before
    }

    fn len(&self) -> u64 {
        self.rows.read().len() as u64
    }
}

pub struct MemoryDriverStore {
    table: Table<Driver>,
}

impl Default for MemoryDriverStore {
    fn default() -> Self {
        Self {
            table: Table::new(|d| d.id),
        }
    }
}

#[async_trait]
impl DriverStore for MemoryDriverStore {
    async fn list(&self) -> anyhow::Result<Vec<Driver>> {
        Ok(self.table.all())
    }

    async fn list_active(&self) -> anyhow::Result<Vec<Driver>> {
        Ok(self.table.filter(|d| d.is_active))
    }

    async fn active_by_shift_hours(&self) -> anyhow::Result<Vec<Driver>> {
        let mut drivers = self.table.filter(|d| d.is_active);
        // sort_by is stable, so equal shift hours keep insertion order
        drivers.sort_by(|a, b| a.current_shift_hours.total_cmp(&b.current_shift_hours));
        Ok(drivers)
    }

    async fn count_active(&self) -> anyhow::Result<u64> {
        Ok(self.table.filter(|d| d.is_active).len() as u64)
    }

    async fn count(&self) -> anyhow::Result<u64> {
        Ok(self.table.len())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Driver>> {
        Ok(self.table.get(id))
    }

    async fn save(&self, driver: &Driver) -> anyhow::Result<()> {
        self.table.upsert(driver);
        Ok(())
    }
}

pub struct MemoryRouteStore {
    table: Table<Route>,
}

impl Default for MemoryRouteStore {
    fn default() -> Self {
        Self {
            table: Table::new(|r| r.id),
        }
    }
}

#[async_trait]
impl RouteStore for MemoryRouteStore {
    async fn list(&self) -> anyhow::Result<Vec<Route>> {
        Ok(self.table.all())
    }

    async fn list_active(&self) -> anyhow::Result<Vec<Route>> {
        Ok(self.table.filter(|r| r.is_active))
    }

    async fn by_traffic_level(&self, level: TrafficLevel) -> anyhow::Result<Vec<Route>> {
        Ok(self.table.filter(|r| r.traffic_level == level))
    }

    async fn count(&self) -> anyhow::Result<u64> {
        Ok(self.table.len())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Route>> {
        Ok(self.table.get(id))
    }

    async fn find_by_route_id(&self, route_id: &str) -> anyhow::Result<Option<Route>> {
        Ok(self.table.find(|r| r.route_id == route_id))
    }

    async fn save(&self, route: &Route) -> anyhow::Result<()> {
        self.table.upsert(route);
        Ok(())
    }
}

pub struct MemoryOrderStore {
    table: Table<Order>,
}

impl Default for MemoryOrderStore {
    fn default() -> Self {
        Self {
            table: Table::new(|o| o.id),
        }
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn list(&self) -> anyhow::Result<Vec<Order>> {
        Ok(self.table.all())
    }

    async fn by_status(&self, status: OrderStatus) -> anyhow::Result<Vec<Order>> {
        Ok(self.table.filter(|o| o.status == status))
    }

    async fn by_driver(&self, driver_id: Uuid) -> anyhow::Result<Vec<Order>> {
        Ok(self.table.filter(|o| o.assigned_driver_id == Some(driver_id)))
    }

    async fn by_route(&self, route_id: &str) -> anyhow::Result<Vec<Order>> {
        Ok(self.table.filter(|o| o.assigned_route_id == route_id))
    }

    async fn count(&self) -> anyhow::Result<u64> {
        Ok(self.table.len())
    }

    async fn delivery_counts(&self) -> anyhow::Result<(u64, u64)> {
        let delivered = self.table.filter(|o| o.status == OrderStatus::Delivered);
        let on_time = delivered.iter().filter(|o| o.is_delivered_on_time).count() as u64;
        Ok((on_time, delivered.len() as u64 - on_time))
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Order>> {
        Ok(self.table.get(id))
    }

    async fn find_by_order_id(&self, order_id: &str) -> anyhow::Result<Option<Order>> {
        Ok(self.table.find(|o| o.order_id == order_id))
    }

    async fn save(&self, order: &Order) -> anyhow::Result<()> {
        self.table.upsert(order);
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        Ok(self.table.remove(id))
    }
}

pub struct MemorySimulationResultStore {
    table: Table<SimulationResult>,
}

impl Default for MemorySimulationResultStore {
    fn default() -> Self {
        Self {
            table: Table::new(|r| r.id),
        }
    }
}

impl MemorySimulationResultStore {
    fn newest_first(&self, pred: impl Fn(&SimulationResult) -> bool) -> Vec<SimulationResult> {
        let mut results = self.table.filter(pred);
        // Reverse first so equal timestamps come back latest-inserted first.
        results.reverse();
        results.sort_by(|a, b| b.simulation_timestamp.cmp(&a.simulation_timestamp));
        results
    }
}

#[async_trait]
impl SimulationResultStore for MemorySimulationResultStore {
    async fn insert(&self, result: &SimulationResult) -> anyhow::Result<()> {
        self.table.upsert(result);
        Ok(())
    }

    async fn list_newest_first(&self) -> anyhow::Result<Vec<SimulationResult>> {
        Ok(self.newest_first(|_| true))
    }

    async fn by_user_newest_first(&self, user_id: Uuid) -> anyhow::Result<Vec<SimulationResult>> {
        Ok(self.newest_first(|r| r.simulated_by == user_id))
    }

    async fn latest(&self) -> anyhow::Result<Option<SimulationResult>> {
        Ok(self.newest_first(|_| true).into_iter().next())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<SimulationResult>> {
        Ok(self.table.get(id))
    }
}

#[derive(Default)]
pub struct MemoryUserStore {
    users: DashMap<Uuid, User>,
    username_index: DashMap<String, Uuid>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn count(&self) -> anyhow::Result<u64> {
        Ok(self.users.len() as u64)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let id = match self.username_index.get(username) {
            Some(id) => *id.value(),
            None => return Ok(None),
        };
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn save(&self, user: &User) -> anyhow::Result<()> {
        // The index entry stays locked until the user row is written.
        let entry = self.username_index.entry(user.username.clone());
        if let Entry::Occupied(existing) = &entry {
            if *existing.get() != user.id {
                return Err(anyhow::anyhow!("Username '{}' already exists", user.username));
            }
        }
        self.users.insert(user.id, user.clone());
        entry.or_insert(user.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    #[test]
    fn test_active_by_shift_hours_is_stable_on_ties() {
        let store = MemoryDriverStore::default();
        let first = Driver::new("First", 4.0, 20.0);
        let second = Driver::new("Second", 4.0, 20.0);
        let rested = Driver::new("Rested", 1.0, 5.0);
        let mut inactive = Driver::new("Inactive", 0.0, 0.0);
        inactive.deactivate();

        tokio_test::block_on(async {
            for d in [&first, &second, &rested, &inactive] {
                store.save(d).await.unwrap();
            }
            let names: Vec<String> = store
                .active_by_shift_hours()
                .await
                .unwrap()
                .into_iter()
                .map(|d| d.name)
                .collect();
            assert_eq!(names, vec!["Rested", "First", "Second"]);
        });
    }

    #[test]
    fn test_save_replaces_existing_order() {
        let store = MemoryOrderStore::default();
        let mut order = Order::new("ORD001", 500.0, "R001");

        tokio_test::block_on(async {
            store.save(&order).await.unwrap();
            order.status = OrderStatus::Delivered;
            order.is_delivered_on_time = true;
            store.save(&order).await.unwrap();

            assert_eq!(store.count().await.unwrap(), 1);
            assert_eq!(store.delivery_counts().await.unwrap(), (1, 0));
            assert!(store.delete(order.id).await.unwrap());
            assert!(!store.delete(order.id).await.unwrap());
        });
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let store = MemoryUserStore::default();
        let a = User::new("manager", "a@example.com", String::new(), vec![Role::Manager]);
        let b = User::new("manager", "b@example.com", String::new(), vec![Role::Manager]);

        tokio_test::block_on(async {
            store.save(&a).await.unwrap();
            assert!(store.save(&b).await.is_err());
            assert_eq!(store.count().await.unwrap(), 1);
        });
    }

    #[test]
    fn test_concurrent_saves_keep_username_unique() {
        let store = MemoryUserStore::default();

        let saved = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let store = &store;
                    scope.spawn(move || {
                        let email = format!("manager{}@example.com", i);
                        let user = User::new("manager", &email, String::new(), vec![Role::Manager]);
                        tokio_test::block_on(store.save(&user)).is_ok()
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|ok| *ok)
                .count()
        });

        assert_eq!(saved, 1, "Exactly one concurrent save may claim the username");
        assert_eq!(tokio_test::block_on(store.count()).unwrap(), 1);
    }
}
