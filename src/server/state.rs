//! Shared application state for the API server

use crate::analytics::fact_table::FactTable;
use crate::config::EngineConfig;
use crate::repository::FactRepository;
use crate::sales_record::DataSourceError;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Readers share the memoized table; `/refresh` takes the write lock
    /// to invalidate and rebuild.
    pub repository: Arc<RwLock<FactRepository>>,
    pub config: Arc<EngineConfig>,
}

impl AppState {
    /// Creates a new application state
    pub fn new(repository: FactRepository, config: EngineConfig) -> Self {
        AppState {
            repository: Arc::new(RwLock::new(repository)),
            config: Arc::new(config),
        }
    }

    /// Current fact table, building it if the cache is cold.
    pub async fn table(&self) -> Result<Arc<FactTable>, DataSourceError> {
        self.repository.read().await.build()
    }

    /// Drops the cached table and builds a fresh one from the source.
    pub async fn rebuild(&self) -> Result<Arc<FactTable>, DataSourceError> {
        let mut repository = self.repository.write().await;
        repository.invalidate();
        repository.build()
    }
}
