use tracing::info;

use snapaja::store::BlobStorage;
use snapaja::web::WebServer;
use snapaja::{Config, Database};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load_with_env("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {e}");
        std::process::exit(1);
    }

    // Initialize logging
    if let Err(e) = snapaja::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        snapaja::logging::init_console_only(&config.logging.level);
    }

    info!("Snapaja - file group sharing");

    let db = match Database::open(&config.database.path).await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Failed to open database at {}: {e}", config.database.path);
            std::process::exit(1);
        }
    };

    let blob = match BlobStorage::new(&config.blob.storage_path, &config.blob.public_base_url) {
        Ok(blob) => blob,
        Err(e) => {
            eprintln!(
                "Failed to initialize blob storage at {}: {e}",
                config.blob.storage_path
            );
            std::process::exit(1);
        }
    };

    let server = WebServer::new(&config, &db, blob);
    info!(
        "Server configured on {}:{}",
        config.server.host, config.server.port
    );

    if let Err(e) = server.run().await {
        eprintln!("Web server error: {e}");
        std::process::exit(1);
    }
}
