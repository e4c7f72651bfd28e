use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::{
    application::dtos::{HealthStatusResponse, PredictRequest, PredictResponse},
    domain::{CombinationTable, DomainError, ModelName},
};

const DEFAULT_MAX_COMBINATIONS: usize = 100_000;

/// High level configuration shared by the service and its adapters.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub max_combinations: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_combinations: DEFAULT_MAX_COMBINATIONS,
        }
    }
}

impl ServiceConfig {
    pub fn new(max_combinations: usize) -> Self {
        Self {
            max_combinations: max_combinations.max(1),
        }
    }
}

/// A loaded model: batch prediction over the `[store_nbr, item_nbr,
/// month_name, year]` table, one value per row in input order.
pub trait Predictor: Send + Sync {
    fn predict(&self, table: &CombinationTable) -> Result<Vec<f64>, DomainError>;

    fn kind(&self) -> &'static str {
        "unknown"
    }
}

impl std::fmt::Debug for dyn Predictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Predictor")
            .field("kind", &self.kind())
            .finish()
    }
}

/// Contract for wherever model artifacts live.
pub trait ModelStore: Send + Sync {
    /// Whether an artifact exists for `name`. Must not decode anything.
    fn contains(&self, name: &ModelName) -> Result<bool, DomainError>;

    /// Decode the artifact for `name` into a predictor.
    fn load(&self, name: &ModelName) -> Result<Arc<dyn Predictor>, DomainError>;

    fn ping(&self) -> Result<(), DomainError>;
}

/// The orchestrator responsible for validation, combination expansion,
/// artifact loading and response shaping.
pub struct ForecastService {
    store: Arc<dyn ModelStore>,
    config: ServiceConfig,
}

impl ForecastService {
    pub fn new(store: Arc<dyn ModelStore>, config: ServiceConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn predict(&self, request: PredictRequest) -> Result<PredictResponse, DomainError> {
        let started = Instant::now();

        let model = ModelName::parse(&request.forecast_model)?;
        let table = CombinationTable::cartesian(
            &request.store_nbr,
            &request.item_nbr,
            &request.months,
            &request.years,
            self.config.max_combinations,
        )?;

        debug!(model = %model, rows = table.len(), "expanded combinations");

        if !self.store.contains(&model)? {
            warn!(model = %model, "requested model artifact does not exist");
            return Err(DomainError::not_found("model not found"));
        }

        let predictor = self.store.load(&model)?;

        let values = predictor.predict(&table).map_err(|err| match err {
            DomainError::Prediction(_) => err,
            other => DomainError::prediction(other.to_string()),
        })?;

        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(DomainError::prediction(format!(
                "model `{}` produced a non-finite value at row {}",
                model, index
            )));
        }

        let rows = table.len();
        let predictions = table.annotate(values)?;

        info!(
            model = %model,
            kind = predictor.kind(),
            rows,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "prediction served"
        );

        Ok(PredictResponse { predictions })
    }

    pub fn health(&self) -> HealthStatusResponse {
        let readable = match self.store.ping() {
            Ok(()) => true,
            Err(err) => {
                warn!("model store is not readable: {}", err);
                false
            }
        };

        HealthStatusResponse {
            status: "healthy".into(),
            service: "forecast-service".into(),
            models_dir_readable: readable,
            checked_at: Utc::now(),
        }
    }
}
