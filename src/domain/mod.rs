//! Domain layer: core value objects and the error taxonomy for forecasting.

pub mod errors;
pub mod models;

pub use errors::DomainError;
pub use models::{
    Combination, CombinationTable, Feature, ModelName, PredictionRow, FEATURE_COLUMNS,
};
