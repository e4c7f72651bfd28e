use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use ahash::AHashMap;
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::{
    application::services::{ModelStore, Predictor},
    domain::{DomainError, ModelName},
    infrastructure::predictors::decode_artifact,
};

/// File extension every artifact carries.
pub const ARTIFACT_EXTENSION: &str = "json";

/// Tunables for [`FsModelStore`].
#[derive(Debug, Clone)]
pub struct FsStoreConfig {
    pub max_artifact_bytes: u64,
    pub cache_artifacts: bool,
}

impl Default for FsStoreConfig {
    fn default() -> Self {
        Self {
            max_artifact_bytes: 64 * 1024 * 1024,
            cache_artifacts: false,
        }
    }
}

struct CachedModel {
    modified: Option<SystemTime>,
    len: u64,
    predictor: Arc<dyn Predictor>,
}

/// Read-only artifact store backed by a local directory.
///
/// `<root>/<model_name>.json` holds the artifact for `model_name`. With the
/// cache enabled, decoded predictors are reused until the file's length or
/// modification time changes; otherwise every call decodes from disk.
pub struct FsModelStore {
    root: PathBuf,
    config: FsStoreConfig,
    cache: Option<RwLock<AHashMap<String, CachedModel>>>,
}

impl FsModelStore {
    pub fn new(root: impl AsRef<Path>, config: FsStoreConfig) -> Self {
        let cache = config
            .cache_artifacts
            .then(|| RwLock::new(AHashMap::new()));

        Self {
            root: root.as_ref().to_path_buf(),
            config,
            cache,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Deterministic location of the artifact for `name`.
    pub fn artifact_path(&self, name: &ModelName) -> PathBuf {
        self.root.join(format!("{}.{}", name.as_str(), ARTIFACT_EXTENSION))
    }

    pub fn cached_models(&self) -> usize {
        self.cache.as_ref().map_or(0, |cache| cache.read().len())
    }

    fn cached(
        &self,
        name: &ModelName,
        modified: Option<SystemTime>,
        len: u64,
    ) -> Option<Arc<dyn Predictor>> {
        let cache = self.cache.as_ref()?.read();
        cache
            .get(name.as_str())
            .filter(|entry| entry.modified == modified && entry.len == len)
            .map(|entry| Arc::clone(&entry.predictor))
    }
}

impl ModelStore for FsModelStore {
    fn contains(&self, name: &ModelName) -> Result<bool, DomainError> {
        match fs::metadata(self.artifact_path(name)) {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(DomainError::load(format!(
                "failed to stat artifact `{name}`: {err}"
            ))),
        }
    }

    fn load(&self, name: &ModelName) -> Result<Arc<dyn Predictor>, DomainError> {
        let path = self.artifact_path(name);

        let metadata = fs::metadata(&path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => DomainError::not_found("model not found"),
            _ => DomainError::load(format!("failed to stat artifact `{name}`: {err}")),
        })?;

        if metadata.len() > self.config.max_artifact_bytes {
            return Err(DomainError::load(format!(
                "artifact `{name}` is {} bytes, limit is {}",
                metadata.len(),
                self.config.max_artifact_bytes
            )));
        }

        let modified = metadata.modified().ok();
        if let Some(predictor) = self.cached(name, modified, metadata.len()) {
            debug!(model = %name, "artifact served from cache");
            return Ok(predictor);
        }

        let bytes = fs::read(&path)
            .map_err(|err| DomainError::load(format!("failed to read artifact `{name}`: {err}")))?;
        let predictor = decode_artifact(name.as_str(), &bytes)?;

        debug!(model = %name, kind = predictor.kind(), bytes = bytes.len(), "artifact loaded");

        if let Some(cache) = &self.cache {
            cache.write().insert(
                name.as_str().to_string(),
                CachedModel {
                    modified,
                    len: metadata.len(),
                    predictor: Arc::clone(&predictor),
                },
            );
            info!(model = %name, "artifact cached");
        }

        Ok(predictor)
    }

    fn ping(&self) -> Result<(), DomainError> {
        fs::read_dir(&self.root)
            .map(|_| ())
            .map_err(|err| DomainError::other(format!("models directory is not readable: {err}")))
    }
}
