use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Upper bound on model identifier length.
pub const MAX_MODEL_NAME_CHARS: usize = 64;

/// Column order of the tabular input handed to every predictor.
pub const FEATURE_COLUMNS: [Feature; 4] = [
    Feature::StoreNbr,
    Feature::ItemNbr,
    Feature::MonthName,
    Feature::Year,
];

/// One column of the combination table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    StoreNbr,
    ItemNbr,
    MonthName,
    Year,
}

impl Feature {
    pub fn name(&self) -> &'static str {
        match self {
            Feature::StoreNbr => "store_nbr",
            Feature::ItemNbr => "item_nbr",
            Feature::MonthName => "month_name",
            Feature::Year => "year",
        }
    }
}

/// Validated artifact identifier.
///
/// Only ASCII alphanumerics, `_`, `-` and `.` are accepted, the name cannot
/// start with a dot and cannot contain `..`, so it always maps to a single
/// file directly inside the artifact root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelName(String);

impl ModelName {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        if raw.is_empty() {
            return Err(DomainError::validation("forecast_model cannot be empty"));
        }
        if raw.chars().count() > MAX_MODEL_NAME_CHARS {
            return Err(DomainError::validation(format!(
                "forecast_model cannot exceed {} characters",
                MAX_MODEL_NAME_CHARS
            )));
        }
        if !raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        {
            return Err(DomainError::validation(
                "forecast_model may only contain ASCII letters, digits, '_', '-' and '.'",
            ));
        }
        if raw.starts_with('.') || raw.contains("..") {
            return Err(DomainError::validation(
                "forecast_model cannot start with '.' or contain '..'",
            ));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ModelName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One (store, item, month, year) tuple of the requested cross product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Combination {
    pub store_nbr: i64,
    pub item_nbr: i64,
    pub month: i64,
    pub year: i64,
}

impl Combination {
    pub fn value(&self, feature: Feature) -> i64 {
        match feature {
            Feature::StoreNbr => self.store_nbr,
            Feature::ItemNbr => self.item_nbr,
            Feature::MonthName => self.month,
            Feature::Year => self.year,
        }
    }
}

/// Ordered table of combinations with columns [`FEATURE_COLUMNS`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CombinationTable {
    rows: Vec<Combination>,
}

impl CombinationTable {
    /// Expand the four dimension lists into their full cross product.
    ///
    /// Rows come out in nested order: stores outermost, then items, then
    /// months, with years varying fastest. The product size is checked
    /// against `max_rows` before anything is allocated; an oversized product
    /// is a validation failure.
    pub fn cartesian(
        store_nbrs: &[i64],
        item_nbrs: &[i64],
        months: &[i64],
        years: &[i64],
        max_rows: usize,
    ) -> Result<Self, DomainError> {
        let dimensions = [
            ("store_nbr", store_nbrs.len()),
            ("item_nbr", item_nbrs.len()),
            ("months", months.len()),
            ("years", years.len()),
        ];

        for (name, len) in dimensions {
            if len == 0 {
                return Err(DomainError::validation(format!("{name} cannot be empty")));
            }
        }

        let total = dimensions
            .iter()
            .try_fold(1usize, |acc, (_, len)| acc.checked_mul(*len));

        match total {
            Some(total) if total <= max_rows => {}
            _ => {
                return Err(DomainError::validation(format!(
                    "request expands to more than {} combinations",
                    max_rows
                )))
            }
        }

        let mut rows = Vec::with_capacity(total.unwrap_or_default());
        for &store_nbr in store_nbrs {
            for &item_nbr in item_nbrs {
                for &month in months {
                    for &year in years {
                        rows.push(Combination {
                            store_nbr,
                            item_nbr,
                            month,
                            year,
                        });
                    }
                }
            }
        }

        Ok(Self { rows })
    }

    pub fn from_rows(rows: Vec<Combination>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Combination] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of a single column, in row order.
    pub fn column(&self, feature: Feature) -> impl Iterator<Item = i64> + '_ {
        self.rows.iter().map(move |row| row.value(feature))
    }

    /// Pair every row with its prediction.
    ///
    /// Fails unless exactly one prediction per row was supplied; rows are
    /// never dropped or padded.
    pub fn annotate(self, predictions: Vec<f64>) -> Result<Vec<PredictionRow>, DomainError> {
        if predictions.len() != self.rows.len() {
            return Err(DomainError::prediction(format!(
                "model returned {} predictions for {} rows",
                predictions.len(),
                self.rows.len()
            )));
        }

        Ok(self
            .rows
            .into_iter()
            .zip(predictions)
            .map(|(combination, predicted_value)| PredictionRow {
                combination,
                predicted_value,
            })
            .collect())
    }
}

/// A combination annotated with its predicted value.
///
/// Serialised as `[store_nbr, item_nbr, month, year, predicted_value]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RowTuple", into = "RowTuple")]
pub struct PredictionRow {
    pub combination: Combination,
    pub predicted_value: f64,
}

type RowTuple = (i64, i64, i64, i64, f64);

impl From<PredictionRow> for RowTuple {
    fn from(row: PredictionRow) -> Self {
        let c = row.combination;
        (c.store_nbr, c.item_nbr, c.month, c.year, row.predicted_value)
    }
}

impl From<RowTuple> for PredictionRow {
    fn from((store_nbr, item_nbr, month, year, predicted_value): RowTuple) -> Self {
        Self {
            combination: Combination {
                store_nbr,
                item_nbr,
                month,
                year,
            },
            predicted_value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_count_is_product_of_lengths() {
        let table =
            CombinationTable::cartesian(&[1, 2, 3], &[10, 20], &[1, 2, 3, 4], &[2020], 1_000)
                .unwrap();
        assert_eq!(table.len(), 3 * 2 * 4);
    }

    #[test]
    fn test_nested_product_order() {
        let table = CombinationTable::cartesian(&[1, 2], &[10, 20], &[5], &[2020, 2021], 100)
            .unwrap();
        let tuples: Vec<(i64, i64, i64, i64)> = table
            .rows()
            .iter()
            .map(|c| (c.store_nbr, c.item_nbr, c.month, c.year))
            .collect();
        assert_eq!(
            tuples,
            vec![
                (1, 10, 5, 2020),
                (1, 10, 5, 2021),
                (1, 20, 5, 2020),
                (1, 20, 5, 2021),
                (2, 10, 5, 2020),
                (2, 10, 5, 2021),
                (2, 20, 5, 2020),
                (2, 20, 5, 2021),
            ]
        );
    }

    #[test]
    fn test_duplicates_are_kept() {
        let table = CombinationTable::cartesian(&[1, 1], &[10], &[1], &[2020], 10).unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_empty_dimension_rejected() {
        let err = CombinationTable::cartesian(&[1], &[], &[1], &[2020], 10).unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("item_nbr")));
    }

    #[test]
    fn test_product_overflow_is_rejected() {
        let huge = vec![0i64; 1 << 16];
        let err =
            CombinationTable::cartesian(&huge, &huge, &huge, &huge, usize::MAX).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn test_row_ceiling_is_validation_error() {
        let err = CombinationTable::cartesian(&[1, 2], &[1, 2], &[1], &[2020], 3).unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("more than 3")));

        let err = CombinationTable::cartesian(&[1, 2], &[1], &[1], &[2020], 1).unwrap_err();
        assert_eq!(err.code(), "VALIDATION_FAILED");

        let ok = CombinationTable::cartesian(&[1, 2], &[1, 2], &[1], &[2020], 4);
        assert!(ok.is_ok());
    }

    #[test]
    fn test_column_view() {
        let table = CombinationTable::cartesian(&[1, 2], &[7], &[3], &[2019], 10).unwrap();
        let stores: Vec<i64> = table.column(Feature::StoreNbr).collect();
        let months: Vec<i64> = table.column(Feature::MonthName).collect();
        assert_eq!(stores, vec![1, 2]);
        assert_eq!(months, vec![3, 3]);
        let names: Vec<&str> = FEATURE_COLUMNS.iter().map(Feature::name).collect();
        assert_eq!(names, vec!["store_nbr", "item_nbr", "month_name", "year"]);
    }

    #[test]
    fn test_annotate_requires_one_value_per_row() {
        let table = CombinationTable::cartesian(&[1, 2], &[10], &[1], &[2020], 10).unwrap();
        let err = table.clone().annotate(vec![1.0]).unwrap_err();
        assert!(matches!(err, DomainError::Prediction(_)));

        let rows = table.annotate(vec![1.5, 2.5]).unwrap();
        assert_eq!(rows[1].predicted_value, 2.5);
        assert_eq!(rows[1].combination.store_nbr, 2);
    }

    #[test]
    fn test_prediction_row_serializes_as_array() {
        let row = PredictionRow {
            combination: Combination {
                store_nbr: 1,
                item_nbr: 10,
                month: 1,
                year: 2020,
            },
            predicted_value: 0.0,
        };
        assert_eq!(serde_json::to_string(&row).unwrap(), "[1,10,1,2020,0.0]");
    }

    #[test]
    fn test_model_name_allow_list() {
        assert!(ModelName::parse("model_a").is_ok());
        assert!(ModelName::parse("xgb-2024.v2").is_ok());

        for bad in [
            "",
            "../secrets",
            "a/b",
            "a\\b",
            ".hidden",
            "a..b",
            "model a",
            "modèle",
            "name\0",
        ] {
            assert!(
                matches!(ModelName::parse(bad), Err(DomainError::Validation(_))),
                "{bad:?} should be rejected"
            );
        }

        let long = "m".repeat(MAX_MODEL_NAME_CHARS + 1);
        assert!(ModelName::parse(&long).is_err());
    }
}
