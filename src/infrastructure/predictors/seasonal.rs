use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::{
    application::services::Predictor,
    domain::{Combination, CombinationTable, DomainError},
};

/// One learned value, optionally pinned to a year.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeasonalEntry {
    pub store_nbr: i64,
    pub item_nbr: i64,
    pub month_name: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i64>,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeasonalParams {
    pub entries: Vec<SeasonalEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<f64>,
}

type MonthKey = (i64, i64, i64);
type YearKey = (i64, i64, i64, i64);

/// Table lookup keyed by (store, item, month[, year]).
///
/// Resolution order per row: exact year entry, year-less entry, fallback.
pub struct SeasonalPredictor {
    by_year: AHashMap<YearKey, f64>,
    by_month: AHashMap<MonthKey, f64>,
    fallback: Option<f64>,
}

impl SeasonalPredictor {
    pub fn try_from_params(params: SeasonalParams) -> Result<Self, DomainError> {
        if let Some(fallback) = params.fallback {
            super::ensure_finite("fallback", fallback)?;
        }

        let mut by_year = AHashMap::new();
        let mut by_month = AHashMap::new();

        for (index, entry) in params.entries.into_iter().enumerate() {
            super::ensure_finite(&format!("entries[{index}].value"), entry.value)?;

            let month_key = (entry.store_nbr, entry.item_nbr, entry.month_name);
            let duplicate = match entry.year {
                Some(year) => by_year
                    .insert((month_key.0, month_key.1, month_key.2, year), entry.value)
                    .is_some(),
                None => by_month.insert(month_key, entry.value).is_some(),
            };

            if duplicate {
                return Err(DomainError::validation(format!(
                    "entries[{index}] duplicates an earlier entry"
                )));
            }
        }

        Ok(Self {
            by_year,
            by_month,
            fallback: params.fallback,
        })
    }

    fn lookup(&self, row: &Combination) -> Option<f64> {
        self.by_year
            .get(&(row.store_nbr, row.item_nbr, row.month, row.year))
            .or_else(|| self.by_month.get(&(row.store_nbr, row.item_nbr, row.month)))
            .copied()
            .or(self.fallback)
    }
}

impl Predictor for SeasonalPredictor {
    fn predict(&self, table: &CombinationTable) -> Result<Vec<f64>, DomainError> {
        table
            .rows()
            .iter()
            .map(|row| {
                self.lookup(row).ok_or_else(|| {
                    DomainError::prediction(format!(
                        "no value for store {} item {} month {} year {}",
                        row.store_nbr, row.item_nbr, row.month, row.year
                    ))
                })
            })
            .collect()
    }

    fn kind(&self) -> &'static str {
        "seasonal"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(store: i64, item: i64, month: i64, year: Option<i64>, value: f64) -> SeasonalEntry {
        SeasonalEntry {
            store_nbr: store,
            item_nbr: item,
            month_name: month,
            year,
            value,
        }
    }

    #[test]
    fn test_resolution_order() {
        let predictor = SeasonalPredictor::try_from_params(SeasonalParams {
            entries: vec![
                entry(1, 10, 1, Some(2020), 5.0),
                entry(1, 10, 1, None, 3.0),
            ],
            fallback: Some(-1.0),
        })
        .unwrap();

        let table =
            CombinationTable::cartesian(&[1, 2], &[10], &[1], &[2020, 2021], 10).unwrap();
        assert_eq!(
            predictor.predict(&table).unwrap(),
            vec![5.0, 3.0, -1.0, -1.0]
        );
    }

    #[test]
    fn test_missing_row_without_fallback() {
        let predictor = SeasonalPredictor::try_from_params(SeasonalParams {
            entries: vec![entry(1, 10, 1, None, 3.0)],
            fallback: None,
        })
        .unwrap();
        let table = CombinationTable::cartesian(&[1], &[10], &[2], &[2020], 10).unwrap();
        let err = predictor.predict(&table).unwrap_err();
        assert!(matches!(err, DomainError::Prediction(msg) if msg.contains("month 2")));
    }

    #[test]
    fn test_duplicate_entries_rejected() {
        let result = SeasonalPredictor::try_from_params(SeasonalParams {
            entries: vec![entry(1, 10, 1, None, 3.0), entry(1, 10, 1, None, 4.0)],
            fallback: None,
        });
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }
}
