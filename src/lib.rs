use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod settings;

use application::{services::ModelStore, ForecastService};
use infrastructure::FsModelStore;
use interfaces::AppState;
use settings::ServiceSettings;

/// Fully wired service graph.
pub struct AppHandles {
    pub service: Arc<ForecastService>,
    pub store: Arc<FsModelStore>,
    pub settings: ServiceSettings,
}

impl AppHandles {
    pub fn app_state(&self) -> AppState {
        AppState::new(
            Arc::clone(&self.service),
            self.settings.predict_timeout(),
            self.settings.max_concurrent_predictions,
        )
    }
}

/// Wire the artifact store and forecast service from `settings`.
///
/// A missing models directory is not fatal: requests will answer 404 until
/// artifacts appear.
pub fn build_environment(settings: ServiceSettings) -> Result<AppHandles> {
    settings.validate().context("invalid service settings")?;

    let store = Arc::new(FsModelStore::new(
        &settings.models_dir,
        settings.store_config(),
    ));

    if let Err(err) = store.ping() {
        warn!(
            models_dir = %settings.models_dir.display(),
            "models directory unavailable: {}",
            err
        );
    }

    let service = Arc::new(ForecastService::new(
        Arc::clone(&store) as Arc<dyn ModelStore>,
        settings.service_config(),
    ));

    Ok(AppHandles {
        service,
        store,
        settings,
    })
}

/// Entry point used by the `forecast-service` binary.
pub async fn run_service() -> Result<()> {
    init_tracing();

    info!(
        "Starting Forecast Service v{}",
        env!("CARGO_PKG_VERSION")
    );

    let settings = ServiceSettings::load().context("failed to load settings")?;
    info!(
        models_dir = %settings.models_dir.display(),
        max_combinations = settings.max_combinations,
        timeout_ms = settings.predict_timeout_ms,
        cache = settings.cache_artifacts,
        max_concurrent = settings.max_concurrent_predictions,
        "settings loaded"
    );

    let addr = settings.resolve_bind_addr().await?;
    let handles = build_environment(settings).context("failed to bootstrap forecast service")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    interfaces::serve(listener, handles.app_state()).await
}

/// Install the global subscriber once; later calls are no-ops.
pub fn init_tracing() {
    static INIT: std::sync::OnceLock<()> = std::sync::OnceLock::new();

    let _ = INIT.get_or_init(|| {
        let filter = std::env::var("FORECAST_LOG")
            .unwrap_or_else(|_| "info,forecast_lib=debug".into());
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .compact()
            .try_init();
    });
}
