//! HTTP surface of the forecast service.
//!
//! # Endpoints
//!
//! - `GET /` - static greeting
//! - `GET /health` - liveness plus models directory readability
//! - `POST /predict` (also `/predict/`) - forecast every requested combination
//! - `GET /schema` - JSON Schema of the prediction request (`json-schema` feature)

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::Semaphore};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    application::{ForecastService, HealthStatusResponse, PredictRequest, PredictResponse},
    domain::DomainError,
};

pub const GREETING: &str = "Hello,World";

/// Shared handler state.
///
/// `permits` bounds the blocking prediction tasks. A task that outlives its
/// request deadline cannot be cancelled and keeps its permit until it
/// returns, so abandoned work never occupies more than
/// `max_concurrent_predictions` blocking threads.
#[derive(Clone)]
pub struct AppState {
    service: Arc<ForecastService>,
    predict_timeout: Duration,
    permits: Arc<Semaphore>,
}

impl AppState {
    pub fn new(
        service: Arc<ForecastService>,
        predict_timeout: Duration,
        max_concurrent_predictions: usize,
    ) -> Self {
        Self {
            service,
            predict_timeout,
            permits: Arc::new(Semaphore::new(max_concurrent_predictions.max(1))),
        }
    }
}

/// Structured error body returned for every failed request.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
    pub code: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    fn new(status: StatusCode, code: &str, detail: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse {
                detail: detail.into(),
                code: code.to_string(),
            },
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        let status = match &err {
            DomainError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            DomainError::Load(_) | DomainError::Prediction(_) | DomainError::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let detail = match &err {
            DomainError::NotFound(_) => "model not found".to_string(),
            other => other.to_string(),
        };

        Self::new(status, err.code(), detail)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "INVALID_PAYLOAD",
            rejection.body_text(),
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

// ============================================================================
// Handlers
// ============================================================================

async fn greeting() -> Json<&'static str> {
    Json(GREETING)
}

async fn health_check(State(state): State<AppState>) -> Json<HealthStatusResponse> {
    let service = Arc::clone(&state.service);
    match tokio::task::spawn_blocking(move || service.health()).await {
        Ok(status) => Json(status),
        Err(err) => {
            error!("health task failed: {}", err);
            Json(HealthStatusResponse {
                status: "degraded".into(),
                service: "forecast-service".into(),
                models_dir_readable: false,
                checked_at: chrono::Utc::now(),
            })
        }
    }
}

async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let request_id = Uuid::new_v4();
    let Json(request) = payload.map_err(|rejection| {
        warn!(%request_id, "rejected prediction payload: {}", rejection.body_text());
        ApiError::from(rejection)
    })?;

    let model = request.forecast_model.clone();
    let service = Arc::clone(&state.service);
    let permits = Arc::clone(&state.permits);

    // Waiting for a permit counts against the deadline.
    let work = async move {
        let permit = permits
            .acquire_owned()
            .await
            .map_err(|err| DomainError::other(format!("prediction slots closed: {err}")))?;

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            service.predict(request)
        })
        .await
        .unwrap_or_else(|join_err| {
            Err(DomainError::other(format!(
                "prediction task aborted: {join_err}"
            )))
        })
    };

    let outcome = match tokio::time::timeout(state.predict_timeout, work).await {
        Ok(outcome) => outcome,
        Err(_) => Err(DomainError::timeout(format!(
            "prediction did not finish within {} ms",
            state.predict_timeout.as_millis()
        ))),
    };

    match outcome {
        Ok(response) => Ok(Json(response)),
        Err(err) if err.is_client_error() => {
            warn!(%request_id, model = %model.escape_debug(), code = err.code(), "{}", err);
            Err(err.into())
        }
        Err(err) => {
            error!(%request_id, model = %model.escape_debug(), code = err.code(), "{}", err);
            Err(err.into())
        }
    }
}

#[cfg(feature = "json-schema")]
async fn request_schema() -> impl IntoResponse {
    Json(schemars::schema_for!(PredictRequest))
}

// ============================================================================
// Router and server
// ============================================================================

pub fn router(state: AppState) -> Router {
    let app = Router::new()
        .route("/", get(greeting))
        .route("/health", get(health_check))
        .route("/predict", post(predict))
        .route("/predict/", post(predict));

    #[cfg(feature = "json-schema")]
    let app = app.route("/schema", get(request_schema));

    app.with_state(state)
}

/// Serve `state` on an already bound listener until Ctrl+C.
pub async fn serve(listener: TcpListener, state: AppState) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    info!("🚀 Forecast service listening on http://{}", addr);
    info!("📊 Health check: http://{}/health", addr);
    info!("📈 Predictions: POST http://{}/predict", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Forecast service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (DomainError::validation("x"), StatusCode::UNPROCESSABLE_ENTITY),
            (DomainError::not_found("x"), StatusCode::NOT_FOUND),
            (DomainError::load("x"), StatusCode::INTERNAL_SERVER_ERROR),
            (DomainError::prediction("x"), StatusCode::INTERNAL_SERVER_ERROR),
            (DomainError::timeout("x"), StatusCode::GATEWAY_TIMEOUT),
            (DomainError::other("x"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn test_not_found_detail() {
        let api = ApiError::from(DomainError::not_found("whatever"));
        assert_eq!(api.body.detail, "model not found");
        assert_eq!(api.body.code, "MODEL_NOT_FOUND");
    }

    #[test]
    fn test_server_error_detail_keeps_cause() {
        let api = ApiError::from(DomainError::prediction("model returned 1 predictions for 2 rows"));
        assert!(api.body.detail.contains("1 predictions for 2 rows"));
    }
}
