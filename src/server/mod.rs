//! REST API server exposing the query facade

mod error;
mod handlers;
mod routes;
mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;

use crate::config::EngineConfig;
use crate::csv_source::CsvDataSource;
use crate::repository::FactRepository;
use crate::sales_record::SalesDataSource;
use crate::sqlite_source::SqliteDataSource;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Where the server loads its sales records from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataLocation {
    Csv(PathBuf),
    Sqlite(PathBuf),
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server host address (default: "127.0.0.1")
    pub host: String,
    /// Server port (default: 3000)
    pub port: u16,
    /// Record source (default: `sales.csv`)
    pub data: DataLocation,
    pub engine: EngineConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            data: DataLocation::Csv(PathBuf::from("sales.csv")),
            engine: EngineConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Creates a new server configuration
    pub fn new(host: impl Into<String>, port: u16, data: DataLocation, engine: EngineConfig) -> Self {
        ServerConfig {
            host: host.into(),
            port,
            data,
            engine,
        }
    }

    fn open_source(&self) -> Result<Box<dyn SalesDataSource>, Box<dyn std::error::Error>> {
        let scope = self.engine.scope();
        let source: Box<dyn SalesDataSource> = match &self.data {
            DataLocation::Csv(path) => Box::new(CsvDataSource::new(path, scope)),
            DataLocation::Sqlite(path) => Box::new(SqliteDataSource::new(path, scope)?),
        };
        Ok(source)
    }
}

/// Runs the API server
///
/// Builds the fact table before binding so the first request never pays
/// for the load.
///
/// # Example
/// ```rust,no_run
/// use sales_analytics::server::{run_server, ServerConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     run_server(ServerConfig::default()).await?;
///     Ok(())
/// }
/// ```
pub async fn run_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    config.engine.validate()?;

    let repository = FactRepository::new(config.open_source()?);
    let table = repository.build()?;
    tracing::info!(
        entities = table.len(),
        as_of = ?table.as_of(),
        source = ?config.data,
        "fact table ready"
    );

    let state = AppState::new(repository, config.engine.clone());
    let app = routes::create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
