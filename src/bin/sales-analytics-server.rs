//! Sales Analytics API Server Binary
//!
//! Run with: `cargo run --bin sales-analytics-server`

use sales_analytics::server::DataLocation;
use sales_analytics::{run_server, EngineConfig, ServerConfig};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Tracing is initialized in run_server(); RUST_LOG controls the level:
    //   RUST_LOG=sales_analytics=debug cargo run --bin sales-analytics-server

    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse::<u16>()
        .unwrap_or(3000);

    // SQLite wins when both are set.
    let data = match (std::env::var("DATABASE_PATH"), std::env::var("SALES_CSV_PATH")) {
        (Ok(db), _) => DataLocation::Sqlite(PathBuf::from(db)),
        (Err(_), Ok(csv)) => DataLocation::Csv(PathBuf::from(csv)),
        _ => DataLocation::Csv(PathBuf::from("sales.csv")),
    };

    let engine = match std::env::var("SALES_CONFIG_FILE") {
        Ok(path) => EngineConfig::from_json_file(path)?,
        Err(_) => EngineConfig::from_env()?,
    };

    let config = ServerConfig::new(host, port, data, engine);

    println!("Starting Sales Analytics API Server...");
    println!("   Host: {}", config.host);
    println!("   Port: {}", config.port);
    println!("   Data: {:?}", config.data);
    println!();
    println!("Available endpoints:");
    println!("  GET  /health                              - Health check");
    println!("  GET  /category-summary                    - Sales change per supercategory");
    println!("  GET  /performance-summary                 - Focus brands and top competitors");
    println!("  GET  /diagnostics?brand=...&category=...  - Brand diagnostics");
    println!("  GET  /facts                               - Flattened fact table");
    println!("  POST /refresh                             - Rebuild from the data source");
    println!();

    run_server(config).await?;

    Ok(())
}
