mod leaderboard;
mod linking;
mod metrics;

use std::sync::Arc;

use crate::app::AppConfig;
use crate::error::Result;
use crate::gate::IdentityGate;
use pulse_db::Db;

pub use leaderboard::{LeaderboardService, Scope, parse_metric};
pub use linking::{ClaimedToken, IssuedCode, LinkProfile, LinkingService};
pub use metrics::{MetricsService, SubmitReceipt};

type SharedConfig = Arc<AppConfig>;
type SharedGate = Arc<dyn IdentityGate>;

/// Service registry for app-level operations.
#[derive(Clone)]
pub struct AppServices {
    pub metrics: MetricsService,
    pub leaderboard: LeaderboardService,
    pub linking: LinkingService,
}

impl AppServices {
    pub fn new(config: &AppConfig, gate: SharedGate) -> Self {
        let shared = Arc::new(config.clone());
        Self {
            metrics: MetricsService::new(shared.clone(), gate.clone()),
            leaderboard: LeaderboardService::new(shared.clone(), gate),
            linking: LinkingService::new(shared),
        }
    }
}

fn open_db(config: &SharedConfig) -> Result<Db> {
    Ok(Db::open(&config.db_path)?)
}
