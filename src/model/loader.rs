//! Model loading rooted at a models directory.

use std::path::{Path, PathBuf};

use super::resolver::{resolve_with, LoadedModel, ResolvePolicy};
use crate::config::ModelConfig;
use crate::error::{CompanionError, ModelError};

/// Loads character models from a directory of model directories and keeps
/// track of the most recent result.
#[derive(Debug)]
pub struct ModelLoader {
    models_dir: PathBuf,
    policy: ResolvePolicy,
    current: Option<LoadedModel>,
    last_error: Option<ModelError>,
}

impl ModelLoader {
    /// Create a loader for `models_dir` using the lenient policy
    pub fn new(models_dir: impl Into<PathBuf>) -> Self {
        Self {
            models_dir: models_dir.into(),
            policy: ResolvePolicy::Lenient,
            current: None,
            last_error: None,
        }
    }

    /// Create a loader from configuration
    pub fn from_config(config: &ModelConfig) -> Self {
        Self::new(config.models_dir.clone()).with_policy(config.resolution)
    }

    /// Set the resolution policy
    pub fn with_policy(mut self, policy: ResolvePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    pub fn policy(&self) -> ResolvePolicy {
        self.policy
    }

    /// The most recently loaded model
    pub fn current(&self) -> Option<&LoadedModel> {
        self.current.as_ref()
    }

    /// Error from the most recent failed load, cleared by the next success
    pub fn last_error(&self) -> Option<&ModelError> {
        self.last_error.as_ref()
    }

    /// Load a model by directory name under the models directory
    pub fn load_named(&mut self, name: &str) -> Result<LoadedModel, ModelError> {
        let dir = self.models_dir.join(name);
        self.load_from(dir)
    }

    /// Load a model from an explicit directory
    pub fn load_from(&mut self, dir: impl AsRef<Path>) -> Result<LoadedModel, ModelError> {
        let result = resolve_with(dir, self.policy);
        self.record(result)
    }

    /// Load a model on a blocking worker thread.
    ///
    /// Resolution runs off the caller's thread; the result is recorded on this
    /// loader only after it has been handed back.
    pub async fn load_async(
        &mut self,
        dir: impl Into<PathBuf>,
    ) -> Result<LoadedModel, CompanionError> {
        let dir = dir.into();
        let policy = self.policy;

        let result = tokio::task::spawn_blocking(move || resolve_with(&dir, policy))
            .await
            .map_err(|e| CompanionError::Task(e.to_string()))?;

        Ok(self.record(result)?)
    }

    /// Forget the current model and any recorded error
    pub fn unload(&mut self) {
        if let Some(model) = self.current.take() {
            tracing::info!("Unloaded model '{}'", model.name());
        }
        self.last_error = None;
    }

    fn record(
        &mut self,
        result: Result<LoadedModel, ModelError>,
    ) -> Result<LoadedModel, ModelError> {
        match result {
            Ok(model) => {
                self.current = Some(model.clone());
                self.last_error = None;
                Ok(model)
            }
            Err(e) => {
                tracing::warn!("Model load failed: {}", e);
                self.last_error = Some(e.clone());
                Err(e)
            }
        }
    }
}
