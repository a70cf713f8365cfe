//! Shared server state
//!
//! Cloned into every request handler; all fields are cheap handles.

use std::path::PathBuf;
use std::sync::Arc;

use crate::auth::JwtService;
use crate::core::{BackgroundTasks, Config, Result};
use crate::engine::{DispatchEngine, EngineSettings};
use crate::orders::OrdersManager;

#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Config,
    pub engine: DispatchEngine,
    pub jwt_service: Arc<JwtService>,
}

impl ServerState {
    pub fn new(config: Config, engine: DispatchEngine) -> Self {
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        Self {
            config,
            engine,
            jwt_service,
        }
    }

    /// Engine settings carried by a configuration
    pub fn engine_settings(config: &Config) -> EngineSettings {
        EngineSettings {
            business_timezone: config.business_timezone,
            assignment: config.assignment.clone(),
            earnings: config.earnings.clone(),
            payments: config.payments.clone(),
        }
    }

    /// Validate the configuration and open the ledger under the work directory
    pub fn initialize(config: &Config) -> Result<Self> {
        config.validate()?;
        std::fs::create_dir_all(&config.work_dir)?;

        let settings = Self::engine_settings(config);
        let ledger_path = config.ledger_path();
        let manager = OrdersManager::new(&ledger_path, settings.action_defaults())?;
        tracing::info!(path = %ledger_path.display(), "Ledger opened");

        let engine = DispatchEngine::new(manager, settings);
        Ok(Self::new(config.clone(), engine))
    }

    /// Spawn the engine's workers under a fresh task registry
    pub fn start_background_tasks(&self) -> BackgroundTasks {
        let mut tasks = BackgroundTasks::new();
        self.engine.spawn_workers(&mut tasks);
        tasks.log_summary();
        tasks
    }

    pub fn engine(&self) -> &DispatchEngine {
        &self.engine
    }

    pub fn jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }

    pub fn work_dir(&self) -> PathBuf {
        PathBuf::from(&self.config.work_dir)
    }
}
