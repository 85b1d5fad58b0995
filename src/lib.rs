pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod ledger;
pub mod models;
pub mod voting;

use std::sync::Arc;

use catalog::CATALOG;
use config::Config;
use db::Database;
use handlers::AppState;
use ledger::{Ledger, LedgerError, MemoryLedger};
use log::info;

/// Opens the ledger selected by `DATABASE_URL`.
pub async fn open_ledger(config: &Config) -> Result<Arc<dyn Ledger>, LedgerError> {
    if config.uses_memory_storage() {
        info!("Using in-memory ledger, votes will not survive a restart");
        return Ok(Arc::new(MemoryLedger::new()));
    }

    info!("Using SQLite ledger at {}", config.database_url);
    Ok(Arc::new(Database::new(&config.database_url).await?))
}

pub fn app(config: &Config, ledger: Arc<dyn Ledger>) -> axum::Router {
    let state = Arc::new(AppState {
        catalog: &CATALOG,
        ledger,
        admin_key: config.admin_key.clone(),
    });
    handlers::router(state, &config.frontend_url)
}
