use dotenvy::dotenv;
use storefront::{
    api::{self, AppState},
    config::{Settings, catalog::load_catalog, database},
    core::catalog::seed_catalog,
    errors::Result,
};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; variables may also come from the environment
    dotenv().ok();

    // 3. Settings
    let settings = Settings::from_env()
        .inspect_err(|e| error!("Failed to load settings: {}", e))?;

    // 4. Database and schema
    let db = database::create_connection(&settings.database_url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Seed the catalog, if a seed file is configured
    if let Some(path) = &settings.catalog_path {
        let catalog = load_catalog(path)?;
        seed_catalog(&db, &catalog)
            .await
            .inspect_err(|e| error!("Failed to seed catalog: {}", e))?;
    }

    // 6. Serve
    let address = settings.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .inspect_err(|e| error!("Failed to bind {}: {}", address, e))?;
    info!("Listening on {}", address);

    let app = api::router(AppState::new(db, settings));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}
