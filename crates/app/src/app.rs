use std::path::PathBuf;
use std::sync::Arc;

use crate::error::Result;
use crate::gate::{IdentityGate, TokenGate};
use crate::services::AppServices;
use pulse_db::Db;

/// Paths needed to run the backend.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub db_path: PathBuf,
}

/// Application state shared by every HTTP handler.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub services: AppServices,
}

impl AppState {
    /// State wired with the production token gate.
    pub fn new(db_path: PathBuf) -> Self {
        let gate: Arc<dyn IdentityGate> = Arc::new(TokenGate::new(db_path.clone()));
        Self::with_gate(db_path, gate)
    }

    pub fn with_gate(db_path: PathBuf, gate: Arc<dyn IdentityGate>) -> Self {
        let config = AppConfig { db_path };
        let services = AppServices::new(&config, gate);
        Self { config, services }
    }

    pub fn setup_db(&self) -> Result<()> {
        let mut db = Db::open(&self.config.db_path)?;
        db.migrate()?;
        Ok(())
    }
}
