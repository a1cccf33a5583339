//! pulse engine binary.
//!
//! - Loads `PULSE_CONFIG` (default `pulse.yaml`; defaults when absent)
//! - Starts the registry's retention sweeper and system sampler
//! - Serves the exposition endpoints until ctrl-c, then stops the registry

use pulse_core::error::{Result, TelemetryError};
use tracing_subscriber::{fmt, EnvFilter};

use pulse_engine::{app_state, config, router, MetricRegistry};

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::var("PULSE_CONFIG").unwrap_or_else(|_| "pulse.yaml".to_string());
    let cfg = config::load_or_default(&path)?;
    let listen = cfg.exporter.listen_addr()?;

    let registry = MetricRegistry::new(&cfg);
    registry.start()?;
    registry.spawn_listener("trace-log", |ev| {
        tracing::trace!(metric = %ev.name, kind = %ev.kind, value = ev.value, "metric");
        Ok(())
    })?;

    let app = router::build_router(app_state::AppState::new(registry.clone()));

    tracing::info!(%listen, "pulse-engine starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| TelemetryError::Internal(format!("failed to bind {listen}: {e}")))?;

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown requested");
        })
        .await;

    registry.shutdown().await;
    served.map_err(|e| TelemetryError::Internal(format!("server failed: {e}")))
}
