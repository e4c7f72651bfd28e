//! Infrastructure layer wiring concrete adapters (artifact storage, predictors).

pub mod predictors;
pub mod storage;

pub use predictors::{decode_artifact, ArtifactDocument, ModelSpec};
pub use storage::{FsModelStore, FsStoreConfig};
