/// Forecast prediction service.
///
/// Loads model artifacts from a local directory on demand and answers
/// `POST /predict` with a forecast for every (store, item, month, year)
/// combination of the request.
///
/// # Usage
///
/// ```bash
/// FORECAST_MODELS_DIR=./models forecast-service
/// curl -X POST localhost:8000/predict -H 'content-type: application/json' \
///   -d '{"store_nbr":[1,2],"item_nbr":[10],"months":[1],"years":[2020],"forecast_model":"model_a"}'
/// ```
///
/// # Environment Variables
///
/// - `FORECAST_LOG`: Set logging level (trace, debug, info, warn, error)
/// - `FORECAST_CONFIG`: Optional JSON settings file
/// - `FORECAST_SERVICE_HOST`: Bind address (default: 127.0.0.1)
/// - `FORECAST_SERVICE_PORT`: Port (default: 8000)
/// - `FORECAST_MODELS_DIR`: Artifact directory (default: ./models)
/// - `FORECAST_MAX_COMBINATIONS`: Row ceiling per request (default: 100000)
/// - `FORECAST_PREDICT_TIMEOUT_MS`: Load + predict deadline (default: 30000)
/// - `FORECAST_MAX_ARTIFACT_BYTES`: Largest artifact accepted (default: 64 MiB)
/// - `FORECAST_CACHE_ARTIFACTS`: Reuse decoded artifacts across requests (default: false)
/// - `FORECAST_MAX_CONCURRENT_PREDICTIONS`: Loads/predictions allowed to run at once (default: 16)
#[tokio::main]
async fn main() {
    if let Err(err) = forecast_lib::run_service().await {
        eprintln!("[forecast::service] Service failed: {err:?}");
        std::process::exit(1);
    }
}
