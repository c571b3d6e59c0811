pub mod auth;
pub mod jitter;
pub mod seed;
pub mod simulation;

use crate::config::Config;
use crate::repository::Stores;

use self::auth::AuthService;
use self::jitter::{DeliveryJitter, UniformJitter};
use self::simulation::SimulationService;

pub struct AppState {
    pub config: Config,
    pub stores: Stores,
    pub auth: AuthService,
    pub simulation: SimulationService,
}

impl AppState {
    pub fn new(config: Config, stores: Stores) -> Self {
        let jitter = UniformJitter::new(config.simulation_jitter_minutes);
        Self::with_jitter(config, stores, Box::new(jitter))
    }

    /// State with an explicit jitter source, for reproducible runs.
    pub fn with_jitter(config: Config, stores: Stores, jitter: Box<dyn DeliveryJitter>) -> Self {
        let auth = AuthService::new(stores.users.clone(), &config.jwt_secret, config.jwt_expiration_hours);
        let simulation = SimulationService::new(stores.clone(), jitter);
        Self {
            config,
            stores,
            auth,
            simulation,
        }
    }
}
