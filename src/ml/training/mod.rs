pub mod metrics;
pub mod orchestrator;
pub mod splitter;

pub use metrics::{accuracy, roc_auc, ClassMetrics, ClassificationReport, ConfusionMatrix};
pub use orchestrator::{
    EvaluationReport, LogProgress, StackingMethod, TrainingOrchestrator, TrainingOutcome,
    TrainingPlan, TrainingProgress, TrainingStage,
};
pub use splitter::{stratified_kfold, stratified_split, SplitIndices};
