pub mod driver;
pub mod order;
pub mod route;
pub mod simulation;
pub mod user;

pub use driver::Driver;
pub use order::{Order, OrderStatus};
pub use route::{Route, TrafficLevel};
pub use simulation::SimulationResult;
pub use user::{Role, User};
