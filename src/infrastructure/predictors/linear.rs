use serde::{Deserialize, Serialize};

use crate::{
    application::services::Predictor,
    domain::{CombinationTable, DomainError, Feature, FEATURE_COLUMNS},
};

/// One weight per input column.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeatureWeights {
    #[serde(default)]
    pub store_nbr: f64,
    #[serde(default)]
    pub item_nbr: f64,
    #[serde(default)]
    pub month_name: f64,
    #[serde(default)]
    pub year: f64,
}

impl FeatureWeights {
    pub fn weight(&self, feature: Feature) -> f64 {
        match feature {
            Feature::StoreNbr => self.store_nbr,
            Feature::ItemNbr => self.item_nbr,
            Feature::MonthName => self.month_name,
            Feature::Year => self.year,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinearParams {
    #[serde(default)]
    pub intercept: f64,
    pub weights: FeatureWeights,
}

/// `intercept + Σ weight_i * column_i` over the four feature columns.
pub struct LinearPredictor {
    intercept: f64,
    weights: FeatureWeights,
}

impl LinearPredictor {
    pub fn try_from_params(params: LinearParams) -> Result<Self, DomainError> {
        super::ensure_finite("intercept", params.intercept)?;
        for feature in FEATURE_COLUMNS {
            super::ensure_finite(
                &format!("weights.{}", feature.name()),
                params.weights.weight(feature),
            )?;
        }
        Ok(Self {
            intercept: params.intercept,
            weights: params.weights,
        })
    }
}

impl Predictor for LinearPredictor {
    fn predict(&self, table: &CombinationTable) -> Result<Vec<f64>, DomainError> {
        Ok(table
            .rows()
            .iter()
            .map(|row| {
                FEATURE_COLUMNS.iter().fold(self.intercept, |acc, &feature| {
                    acc + self.weights.weight(feature) * row.value(feature) as f64
                })
            })
            .collect())
    }

    fn kind(&self) -> &'static str {
        "linear"
    }
}
