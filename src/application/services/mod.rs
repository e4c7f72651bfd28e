//! Service layer orchestrating domain operations and infrastructure adapters.

mod forecast_service;

pub use forecast_service::{ForecastService, ModelStore, Predictor, ServiceConfig};
