pub mod entity_key;
pub mod sales_record;
pub mod config;
pub mod csv_source;
pub mod sqlite_source;
pub mod analytics;
pub mod queries;
pub mod repository;
pub mod server;


pub use entity_key::{EntityKey, EntityKeyError};
pub use sales_record::{
    DataSourceError, DateRange, InMemoryDataSource, Metric, SalesDataSource, SalesRecord,
};
pub use config::{ConfigError, EngineConfig, RecordScope};
pub use csv_source::CsvDataSource;
pub use sqlite_source::SqliteDataSource;
pub use analytics::{
    safe_divide,
    Comparison,
    FactKey,
    FactRow,
    FactTable,
    FlatFactRow,
    Horizon,
    Period,
    PeriodWindows,
    PriceVolumeDecomposition,
};
pub use queries::{BrandDiagnostics, FactQueries, PerformanceSummary};
pub use repository::FactRepository;
pub use server::{run_server, ServerConfig, AppState, ApiError};
