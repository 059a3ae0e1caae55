//! Static catalog of the models the playground can talk to.
//!
//! The catalog is loaded once from a JSON file and never mutated afterwards;
//! it is shared behind an `Arc` by every session.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read model catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse model catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Model catalog is empty")]
    Empty,

    #[error("Invalid catalog entry {name:?}: {reason}")]
    Invalid { name: String, reason: String },
}

/// One catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub name: String,
    pub provider: String,
    pub base_url: String,
    pub temperature_min: f32,
    pub temperature_max: f32,
    pub temperature_default: f32,
    pub max_completion_tokens: u32,
}

/// Sampling settings chosen by the user for a model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_completion_tokens: u32,
}

impl ModelSpec {
    /// Defaults offered when the model is first selected
    pub fn default_params(&self) -> GenerationParams {
        GenerationParams {
            temperature: self.temperature_default,
            max_completion_tokens: self.max_completion_tokens,
        }
    }

    pub fn clamp_temperature(&self, temperature: f32) -> f32 {
        if temperature.is_nan() {
            return self.temperature_default;
        }
        temperature.clamp(self.temperature_min, self.temperature_max)
    }

    /// At least one token is always requested
    pub fn clamp_max_tokens(&self, max_tokens: u32) -> u32 {
        max_tokens.clamp(1, self.max_completion_tokens)
    }

    /// Brings `params` within this model's bounds
    pub fn clamp(&self, params: GenerationParams) -> GenerationParams {
        GenerationParams {
            temperature: self.clamp_temperature(params.temperature),
            max_completion_tokens: self.clamp_max_tokens(params.max_completion_tokens),
        }
    }

    fn validate(&self) -> Result<(), CatalogError> {
        let invalid = |reason: &str| CatalogError::Invalid {
            name: self.name.clone(),
            reason: reason.to_string(),
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name is empty"));
        }
        if self.base_url.trim().is_empty() {
            return Err(invalid("base_url is empty"));
        }
        if self.max_completion_tokens == 0 {
            return Err(invalid("max_completion_tokens must be at least 1"));
        }
        let bounds = [
            self.temperature_min,
            self.temperature_default,
            self.temperature_max,
        ];
        if bounds.iter().any(|t| !t.is_finite()) {
            return Err(invalid("temperatures must be finite numbers"));
        }
        if !(self.temperature_min <= self.temperature_default
            && self.temperature_default <= self.temperature_max)
        {
            return Err(invalid(
                "expected temperature_min <= temperature_default <= temperature_max",
            ));
        }
        Ok(())
    }
}

/// Read-only, ordered list of models
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    models: Vec<ModelSpec>,
}

impl ModelCatalog {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json(&raw)?;
        tracing::info!(path = %path.display(), models = catalog.len(), "loaded model catalog");
        Ok(catalog)
    }

    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let models: Vec<ModelSpec> = serde_json::from_str(raw)?;
        Self::from_models(models)
    }

    pub fn from_models(models: Vec<ModelSpec>) -> Result<Self, CatalogError> {
        if models.is_empty() {
            return Err(CatalogError::Empty);
        }
        for model in &models {
            model.validate()?;
        }
        Ok(Self { models })
    }

    /// Names in catalog order
    pub fn model_names(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.name.as_str()).collect()
    }

    /// Entry at `index`
    pub fn get(&self, index: usize) -> Option<&ModelSpec> {
        self.models.get(index)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.models.iter().position(|m| m.name == name)
    }

    pub fn find(&self, name: &str) -> Option<&ModelSpec> {
        self.index_of(name).and_then(|index| self.get(index))
    }

    /// The entry new sessions start with
    pub fn first(&self) -> &ModelSpec {
        // from_models rejects empty catalogs
        &self.models[0]
    }

    pub fn models(&self) -> &[ModelSpec] {
        &self.models
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
