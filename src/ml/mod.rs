pub mod matrix;
pub mod models;
pub mod stacking;
pub mod training;

pub use matrix::FeatureMatrix;
