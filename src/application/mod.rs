//! Application layer wiring DTOs and services for the forecast service.

pub mod dtos;
pub mod services;

pub use dtos::{HealthStatusResponse, PredictRequest, PredictResponse};
pub use services::ForecastService;
