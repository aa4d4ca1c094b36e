use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, core_config_from_env, router};
use medico_core::HospitalRegistry;

/// Main entry point for the Medico application
///
/// Serves the REST API (with Swagger UI) on `MEDICO_REST_ADDR` until Ctrl-C is received.
///
/// # Environment Variables
/// - `MEDICO_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `MEDICO_DATA_DIR`: Directory for case data storage (default: "case_data")
/// - `MEDICO_HOSPITALS_FILE`: Hospital registry file (default: `<data dir>/hospitals.yaml`)
/// - `MEDICO_DEFAULT_RATE`: Default rate multiplier (default: 1.00)
/// - `API_KEY`: API key required in `x-api-key` when set
///
/// # Returns
/// * `Ok(())` - If the server starts and shuts down cleanly
/// * `Err(anyhow::Error)` - If startup or the server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("medico=info".parse()?)
                .add_directive("medico_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("MEDICO_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let cfg = core_config_from_env()?;

    let state = AppState::open(cfg.clone(), std::env::var("API_KEY").ok())?;
    let registered = state.service.hospitals().list()?.len();
    if registered == 0 {
        tracing::warn!(
            "no hospitals registered in {}; seed them with `medico hospitals seed`",
            cfg.hospitals_file().display()
        );
    }
    log_registry(state.service.hospitals());

    tracing::info!("++ Starting Medico REST on {}", rest_addr);

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("-- Shutting down Medico REST");
        })
        .await?;

    Ok(())
}

fn log_registry(hospitals: &HospitalRegistry) {
    if let Ok(list) = hospitals.list() {
        for hospital in list {
            tracing::debug!(
                "hospital {} ({}) at x{}",
                hospital.name,
                hospital.id,
                hospital.rate_multiplier
            );
        }
    }
}
