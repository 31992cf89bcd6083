pub mod extraction;
pub mod manager;
pub mod models;
pub mod serving;
pub mod training;
pub mod traits;

pub use extraction::ExtractionConfig;
pub use manager::{AppConfig, ConfigManager, DEFAULT_CONFIG_FILE, ENV_PREFIX};
pub use models::ModelsConfig;
pub use serving::ServingConfig;
pub use training::TrainingConfig;
pub use traits::ConfigSection;
