//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own.
//!
//! ## Intended use
//! Useful for development and debugging with Swagger UI at `/swagger-ui/`. The workspace's main
//! `medico-run` binary serves the same router.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{core_config_from_env, router, AppState};

/// Main entry point for the Medico REST API server.
///
/// # Environment Variables
/// - `MEDICO_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `MEDICO_DATA_DIR`: Case data directory (default: "case_data")
/// - `MEDICO_HOSPITALS_FILE`: Hospital registry file (default: `<data dir>/hospitals.yaml`)
/// - `MEDICO_DEFAULT_RATE`: Multiplier used when a quote names no hospital (default: 1.00)
/// - `API_KEY`: Shared key required in `x-api-key` when set
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is invalid or the hospital registry cannot be read,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("medico_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("MEDICO_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let cfg = core_config_from_env()?;
    tracing::info!(
        "-- Starting Medico REST API on {} (data dir {})",
        addr,
        cfg.case_data_dir().display()
    );

    let state = AppState::open(cfg, std::env::var("API_KEY").ok())?;
    if state.api_key.is_none() {
        tracing::warn!("API_KEY not set; the REST API is open");
    }

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}
