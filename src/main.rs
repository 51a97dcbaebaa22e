use std::sync::Arc;

use anyhow::Context;
use mediflow::api::dispatch_routes;
use mediflow::config::ServiceConfig;
use mediflow::dispatch::sweep::spawn_sweep_loop;
use mediflow::dispatch::DispatchService;
use mediflow::store::{Database, LibSqlBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = ServiceConfig::from_env();

    eprintln!("🏥 MediFlow v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Dispatch API: http://0.0.0.0:{}/api/dispatch", config.port);
    eprintln!("   Database: {}", config.db_path);

    // ── Database ─────────────────────────────────────────────────────────
    let db_path = std::path::Path::new(&config.db_path);
    let db: Arc<dyn Database> = Arc::new(
        LibSqlBackend::new_local(db_path)
            .await
            .with_context(|| format!("Failed to open database at {}", config.db_path))?,
    );

    // ── Dispatch service ─────────────────────────────────────────────────
    let service = Arc::new(DispatchService::new(Arc::clone(&db)));

    // Optional background sweep
    if let Some(interval) = config.sweep_interval {
        eprintln!("   Sweep: every {}s", interval.as_secs());
        let _sweep_handle = spawn_sweep_loop(Arc::clone(&service), interval);
    } else {
        eprintln!("   Sweep: disabled (set MEDIFLOW_SWEEP_INTERVAL_SECS to enable)");
    }

    // ── HTTP server ──────────────────────────────────────────────────────
    let app = dispatch_routes(service, db);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;
    tracing::info!(port = config.port, "Dispatch server started");
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
