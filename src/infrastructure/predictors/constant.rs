use serde::{Deserialize, Serialize};

use crate::{
    application::services::Predictor,
    domain::{CombinationTable, DomainError},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConstantParams {
    pub value: f64,
}

/// Predicts the same value for every row. Useful as a baseline.
pub struct ConstantPredictor {
    value: f64,
}

impl ConstantPredictor {
    pub fn try_from_params(params: ConstantParams) -> Result<Self, DomainError> {
        super::ensure_finite("value", params.value)?;
        Ok(Self {
            value: params.value,
        })
    }
}

impl Predictor for ConstantPredictor {
    fn predict(&self, table: &CombinationTable) -> Result<Vec<f64>, DomainError> {
        Ok(vec![self.value; table.len()])
    }

    fn kind(&self) -> &'static str {
        "constant"
    }
}
