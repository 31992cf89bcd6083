use super::{
    extraction::ExtractionConfig, models::ModelsConfig, serving::ServingConfig,
    training::TrainingConfig, traits::ConfigSection,
};
use crate::error::PhishstackError;
use crate::ml::training::TrainingPlan;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, RwLock};

/// Prefix of environment overrides, e.g. `PHISHSTACK__TRAINING__TEST_SIZE=0.25`.
pub const ENV_PREFIX: &str = "PHISHSTACK";
const ENV_SEPARATOR: &str = "__";
/// Picked up from the working directory when no explicit path is given.
pub const DEFAULT_CONFIG_FILE: &str = "phishstack.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub extraction: ExtractionConfig,
    pub training: TrainingConfig,
    pub models: ModelsConfig,
    pub serving: ServingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), PhishstackError> {
        self.extraction.validate()?;
        self.training.validate()?;
        self.models.validate()?;
        self.serving.validate()?;
        Ok(())
    }

    pub fn training_plan(&self) -> TrainingPlan {
        TrainingPlan {
            base: self.models.base.clone(),
            meta: self.models.meta.clone(),
            test_size: self.training.test_size,
            random_state: self.training.random_state,
            stacking: self.training.stacking,
            parallel_fit: self.training.parallel_fit,
        }
    }
}

fn config_error(e: config::ConfigError) -> PhishstackError {
    PhishstackError::Configuration(e.to_string())
}

fn lock_error<T>(_: T) -> PhishstackError {
    PhishstackError::Configuration("configuration lock poisoned".to_string())
}

pub struct ConfigManager {
    config: Arc<RwLock<AppConfig>>,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(AppConfig::default())),
        }
    }

    fn environment() -> config::Environment {
        config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator(ENV_SEPARATOR)
            .separator(ENV_SEPARATOR)
            .try_parsing(true)
    }

    /// Defaults overlaid with `PHISHSTACK__…` environment variables.
    pub fn load_from_env(&self) -> Result<(), PhishstackError> {
        let settings = config::Config::builder()
            .add_source(Self::environment())
            .build()
            .map_err(config_error)?;
        self.install(settings)
    }

    /// TOML file, then environment overrides on top. Keys absent from both
    /// keep their defaults.
    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> Result<(), PhishstackError> {
        let path = path.as_ref();
        let settings = config::Config::builder()
            .add_source(config::File::from(path).format(config::FileFormat::Toml))
            .add_source(Self::environment())
            .build()
            .map_err(|e| {
                PhishstackError::Configuration(format!(
                    "Failed to read config {}: {}",
                    path.display(),
                    e
                ))
            })?;
        self.install(settings)?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(())
    }

    fn install(&self, settings: config::Config) -> Result<(), PhishstackError> {
        let config: AppConfig = settings.try_deserialize().map_err(config_error)?;
        config.validate()?;
        *self.config.write().map_err(lock_error)? = config;
        Ok(())
    }

    /// `path` if given, else `phishstack.toml` when present, else the
    /// environment alone.
    pub fn load_startup(&self, path: Option<&Path>) -> Result<(), PhishstackError> {
        match path {
            Some(path) => self.load_from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                self.load_from_file(DEFAULT_CONFIG_FILE)
            }
            None => self.load_from_env(),
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), PhishstackError> {
        let config = self.config.read().map_err(lock_error)?;
        let toml_str = toml::to_string_pretty(&*config)
            .map_err(|e| PhishstackError::Configuration(format!("Failed to serialize: {}", e)))?;

        std::fs::write(path, toml_str)
            .map_err(|e| PhishstackError::Configuration(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    pub fn get(&self) -> Result<AppConfig, PhishstackError> {
        Ok(self.config.read().map_err(lock_error)?.clone())
    }

    /// Applies `f` and keeps the result only if it validates.
    pub fn update<F>(&self, f: F) -> Result<(), PhishstackError>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut config = self.config.write().map_err(lock_error)?;
        let mut candidate = config.clone();
        f(&mut candidate);
        candidate.validate()?;
        *config = candidate;
        Ok(())
    }
}
