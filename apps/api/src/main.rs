use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use talent_api::config::Config;
use talent_api::db::{bootstrap::seed_if_empty, Database};
use talent_api::network::{FaultInjector, NoFaults, RandomFaults};
use talent_api::routes::build_router;
use talent_api::seed::SeedConfig;
use talent_api::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (malformed env vars abort start-up)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Talent API v{}", env!("CARGO_PKG_VERSION"));

    // Open the store, then seed whatever is still empty
    let db = Database::open(config.store_path.clone())
        .await
        .context("failed to open store")?;
    let report = seed_if_empty(&db, &SeedConfig::anchored(config.seed_anchor))
        .await
        .context("failed to seed store")?;
    info!(
        jobs = report.jobs_seeded,
        applications = report.applications_seeded,
        assessments = report.assessments_seeded,
        "Bootstrap complete"
    );

    // Network simulation
    let faults: Arc<dyn FaultInjector> = if config.faults_enabled {
        info!(
            "Simulating {}-{} ms latency, {:.1}% write failures",
            config.latency_min_ms,
            config.latency_max_ms,
            config.failure_rate * 100.0
        );
        Arc::new(RandomFaults::new(
            config.latency_min_ms..=config.latency_max_ms,
            config.failure_rate,
            config.fault_seed,
        ))
    } else {
        info!("Network simulation disabled");
        Arc::new(NoFaults)
    };

    let state = AppState::new(Arc::new(db), faults);

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
