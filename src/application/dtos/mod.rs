use chrono::{DateTime, Utc};
#[cfg(feature = "json-schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::PredictionRow;

/// Payload accepted on `POST /predict`.
#[cfg_attr(feature = "json-schema", derive(JsonSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictRequest {
    pub store_nbr: Vec<i64>,
    pub item_nbr: Vec<i64>,
    pub months: Vec<i64>,
    pub years: Vec<i64>,
    /// Name of the artifact (without extension) inside the models directory.
    pub forecast_model: String,
}

/// Ordered prediction rows for the full cross product of the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub predictions: Vec<PredictionRow>,
}

/// Health/readiness report for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatusResponse {
    pub status: String,
    pub service: String,
    pub models_dir_readable: bool,
    pub checked_at: DateTime<Utc>,
}
