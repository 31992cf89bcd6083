pub mod model_selector;

pub use model_selector::ModelSelector;
