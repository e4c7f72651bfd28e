//! Concrete predictors and the artifact document they are decoded from.
//!
//! Artifacts are plain JSON with a closed set of model kinds, so loading one
//! never runs code from the file:
//!
//! ```json
//! {
//!   "format_version": 1,
//!   "description": "optional free text",
//!   "model": { "kind": "linear", "params": { "intercept": 3.0, "weights": { ... } } }
//! }
//! ```

pub mod constant;
pub mod linear;
pub mod seasonal;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{application::services::Predictor, domain::DomainError};

pub use constant::ConstantPredictor;
pub use linear::{FeatureWeights, LinearPredictor};
pub use seasonal::{SeasonalEntry, SeasonalPredictor};

/// The only artifact layout this build understands.
pub const FORMAT_VERSION: u32 = 1;

/// Top-level artifact document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArtifactDocument {
    pub format_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub model: ModelSpec,
}

/// Closed set of model kinds an artifact may describe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "params", rename_all = "kebab-case")]
pub enum ModelSpec {
    Constant(constant::ConstantParams),
    Linear(linear::LinearParams),
    Seasonal(seasonal::SeasonalParams),
}

impl ModelSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            ModelSpec::Constant(_) => "constant",
            ModelSpec::Linear(_) => "linear",
            ModelSpec::Seasonal(_) => "seasonal",
        }
    }

    /// Validate the parameters and build the matching predictor.
    pub fn into_predictor(self) -> Result<Arc<dyn Predictor>, DomainError> {
        let predictor: Arc<dyn Predictor> = match self {
            ModelSpec::Constant(params) => Arc::new(ConstantPredictor::try_from_params(params)?),
            ModelSpec::Linear(params) => Arc::new(LinearPredictor::try_from_params(params)?),
            ModelSpec::Seasonal(params) => Arc::new(SeasonalPredictor::try_from_params(params)?),
        };
        Ok(predictor)
    }
}

/// Decode raw artifact bytes into a ready predictor.
///
/// `name` is only used in error messages, which therefore never carry the
/// on-disk location of the artifact.
pub fn decode_artifact(name: &str, bytes: &[u8]) -> Result<Arc<dyn Predictor>, DomainError> {
    let document: ArtifactDocument = serde_json::from_slice(bytes).map_err(|err| {
        DomainError::load(format!(
            "artifact `{name}` is not a valid model document: {err}"
        ))
    })?;

    if document.format_version != FORMAT_VERSION {
        return Err(DomainError::load(format!(
            "artifact `{name}` uses format version {}, expected {}",
            document.format_version, FORMAT_VERSION
        )));
    }

    document
        .model
        .into_predictor()
        .map_err(|err| DomainError::load(format!("artifact `{name}`: {err}")))
}

pub(crate) fn ensure_finite(label: &str, value: f64) -> Result<(), DomainError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(DomainError::validation(format!("{label} must be a finite number")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CombinationTable;

    fn table() -> CombinationTable {
        CombinationTable::cartesian(&[1, 2], &[10], &[3], &[2020], 10).unwrap()
    }

    #[test]
    fn test_decode_constant() {
        let bytes = br#"{"format_version":1,"model":{"kind":"constant","params":{"value":4.5}}}"#;
        let predictor = decode_artifact("m", bytes).unwrap();
        assert_eq!(predictor.kind(), "constant");
        assert_eq!(predictor.predict(&table()).unwrap(), vec![4.5, 4.5]);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode_artifact("m", b"\x80\x04\x95pickle").unwrap_err();
        assert!(matches!(err, DomainError::Load(msg) if msg.contains("`m`")));
    }

    #[test]
    fn test_decode_rejects_unknown_kind() {
        let bytes = br#"{"format_version":1,"model":{"kind":"python-object","params":{}}}"#;
        assert!(matches!(decode_artifact("m", bytes), Err(DomainError::Load(_))));
    }

    #[test]
    fn test_decode_rejects_unknown_fields() {
        let bytes = br#"{"format_version":1,"exec":"rm -rf /","model":{"kind":"constant","params":{"value":1.0}}}"#;
        assert!(matches!(decode_artifact("m", bytes), Err(DomainError::Load(_))));

        let bytes = br#"{"format_version":1,"model":{"kind":"constant","params":{"value":1.0,"extra":2}}}"#;
        assert!(matches!(decode_artifact("m", bytes), Err(DomainError::Load(_))));
    }

    #[test]
    fn test_decode_rejects_future_version() {
        let bytes = br#"{"format_version":2,"model":{"kind":"constant","params":{"value":1.0}}}"#;
        let err = decode_artifact("m", bytes).unwrap_err();
        assert!(matches!(err, DomainError::Load(msg) if msg.contains("version 2")));
    }

    #[test]
    fn test_shipped_artifacts_decode() {
        let model_a = include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/models/model_a.json"));
        let predictor = decode_artifact("model_a", model_a).unwrap();
        assert_eq!(predictor.kind(), "constant");
        assert_eq!(predictor.predict(&table()).unwrap(), vec![0.0, 0.0]);

        let seasonal = include_bytes!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/models/seasonal_demo.json"
        ));
        let predictor = decode_artifact("seasonal_demo", seasonal).unwrap();
        assert_eq!(predictor.kind(), "seasonal");

        let table = CombinationTable::cartesian(&[1, 2], &[10], &[1, 12], &[2020], 10).unwrap();
        assert_eq!(
            predictor.predict(&table).unwrap(),
            vec![12.5, 31.0, 4.0, 4.0]
        );
    }

    #[test]
    fn test_document_round_trip_keeps_kind() {
        let document = ArtifactDocument {
            format_version: FORMAT_VERSION,
            description: Some("baseline".into()),
            model: ModelSpec::Constant(constant::ConstantParams { value: 2.0 }),
        };
        let json = serde_json::to_vec(&document).unwrap();
        let predictor = decode_artifact("baseline", &json).unwrap();
        assert_eq!(predictor.kind(), "constant");
    }
}
