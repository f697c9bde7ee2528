use dotenv::dotenv;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use votes_api::config::LogFormat;
use votes_api::server::{create_app, run_server};
use votes_api::{ApiError, Dependencies, Settings};

/// Initialize tracing/logging.
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("votes_api=info,votes_service=info,votes_repository=info")
    });

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_thread_ids(true),
                )
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
                .init();
        }
    }

    info!(
        service_name = "votes-api",
        service_version = env!("CARGO_PKG_VERSION"),
        format = ?format,
        "Tracing initialized"
    );
}

/// Main entry point for the Votes API.
///
/// Loads `.env`, reads settings, wires the vote service on PostgreSQL and
/// serves HTTP until ctrl-c.
#[tokio::main]
async fn main() -> Result<(), ApiError> {
    dotenv().ok();
    init_tracing(LogFormat::from_env());

    let settings = Settings::from_env().map_err(|e| {
        error!("Failed to read settings: {}", e);
        e
    })?;

    let dependencies = Dependencies::new(&settings).await.map_err(|e| {
        error!("Failed to initialize dependencies: {}", e);
        e
    })?;

    let app = create_app(dependencies.service, &settings.cors_origin)?;
    if let Err(e) = run_server(app, settings.addr()).await {
        error!("Server error: {}", e);
        return Err(e);
    }

    Ok(())
}
