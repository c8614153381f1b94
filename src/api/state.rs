//! Application state for the API server

use crate::Config;
use crate::Result;
use crate::convert::Converter;
use crate::db::Database;
use crate::fetch::RemoteFetcher;
use crate::stats::StatsStore;
use crate::workspace::Workspace;
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// This struct is cloned for each request (cheap Arc clone).
#[derive(Clone)]
pub struct AppState {
    /// Conversion pipeline
    pub converter: Arc<Converter>,

    /// Usage statistics backend
    pub stats: Arc<dyn StatsStore>,

    /// Configuration (read-only at runtime)
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(converter: Arc<Converter>, stats: Arc<dyn StatsStore>, config: Arc<Config>) -> Self {
        Self {
            converter,
            stats,
            config,
        }
    }

    /// Open the stats database, create the temp directories and wire up the converter
    pub async fn from_config(config: Config) -> Result<Self> {
        config.validate()?;

        let db = Arc::new(Database::new(&config.storage.database_path).await?);
        let stats: Arc<dyn StatsStore> = db;

        let workspace = Workspace::from_config(&config.storage);
        workspace.ensure_dirs().await?;

        let fetcher = RemoteFetcher::new(&config.fetch)?;
        let converter = Arc::new(Converter::new(workspace, fetcher, stats.clone()));

        Ok(Self::new(converter, stats, Arc::new(config)))
    }
}
