pub mod binning;
pub mod boosting;
pub mod classifier;
pub mod logistic;
pub mod random_forest;
pub mod tree;

pub use boosting::{
    BoostingFlavor, BoostingParams, CatBoostParams, GradientBoostedTrees, GrowthPolicy,
    LightGbmParams, RowSampling, XgbParams,
};
pub use classifier::{Classifier, DECISION_THRESHOLD};
pub use logistic::{LogisticParams, LogisticRegression};
pub use random_forest::{ForestParams, MaxFeatures, RandomForest};
