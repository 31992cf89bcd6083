use super::metrics::{accuracy, ClassificationReport};
use super::splitter::{stratified_kfold, stratified_split};
use crate::error::{PhishstackError, Result};
use crate::ml::matrix::{check_xy, select_labels, FeatureMatrix};
use crate::ml::models::{Classifier, XgbParams};
use crate::ml::stacking::{
    validate_stack, BaseModelKind, BaseModelLayer, BaseModelSpec, MetaFeatureAssembler,
    MetaModel, StackingClassifier,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the meta model's training rows are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum StackingMethod {
    /// Out-of-fold base predictions from a stratified k-fold over the
    /// training split; base models are then refit on the whole split.
    CrossValidated { folds: usize },
    /// Base models fitted on the whole training split score those same rows.
    Naive,
}

impl Default for StackingMethod {
    fn default() -> Self {
        Self::CrossValidated { folds: 5 }
    }
}

impl fmt::Display for StackingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CrossValidated { folds } => write!(f, "cross_validated ({} folds)", folds),
            Self::Naive => f.write_str("naive"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrainingStage {
    Idle,
    Split,
    FitBase,
    AssembleMeta,
    FitMeta,
    Evaluate,
    Done,
}

impl TrainingStage {
    /// The only stage reachable from `self`.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::Split),
            Self::Split => Some(Self::FitBase),
            Self::FitBase => Some(Self::AssembleMeta),
            Self::AssembleMeta => Some(Self::FitMeta),
            Self::FitMeta => Some(Self::Evaluate),
            Self::Evaluate => Some(Self::Done),
            Self::Done => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Split => "split",
            Self::FitBase => "fit_base",
            Self::AssembleMeta => "assemble_meta",
            Self::FitMeta => "fit_meta",
            Self::Evaluate => "evaluate",
            Self::Done => "done",
        }
    }
}

/// Callback for long-running training.
pub trait TrainingProgress {
    fn on_stage(&mut self, stage: TrainingStage);

    /// `fold` is `None` for the final fit on the whole training split.
    fn on_base_model_fitted(&mut self, kind: BaseModelKind, fold: Option<usize>);
}

/// Writes progress to the log.
pub struct LogProgress;

impl TrainingProgress for LogProgress {
    fn on_stage(&mut self, stage: TrainingStage) {
        log::info!("Training stage: {}", stage.as_str());
    }

    fn on_base_model_fitted(&mut self, kind: BaseModelKind, fold: Option<usize>) {
        match fold {
            Some(fold) => log::debug!("  {} fitted on fold {}", kind, fold + 1),
            None => log::info!("  {} fitted on full training split", kind),
        }
    }
}

/// Everything the orchestrator needs to know to produce a stacked model.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingPlan {
    pub base: Vec<BaseModelSpec>,
    pub meta: XgbParams,
    pub test_size: f64,
    pub random_state: u64,
    pub stacking: StackingMethod,
    pub parallel_fit: bool,
}

impl Default for TrainingPlan {
    fn default() -> Self {
        Self {
            base: BaseModelSpec::default_stack(),
            meta: XgbParams::default(),
            test_size: 0.3,
            random_state: 42,
            stacking: StackingMethod::default(),
            parallel_fit: false,
        }
    }
}

/// Held-out evaluation of a freshly trained stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub stacking: StackingMethod,
    pub n_train: usize,
    pub n_test: usize,
    pub base_accuracy: Vec<(BaseModelKind, f64)>,
    pub stacked: ClassificationReport,
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Stacking: {} | train rows: {} | test rows: {}",
            self.stacking, self.n_train, self.n_test
        )?;
        for (kind, acc) in &self.base_accuracy {
            writeln!(f, "  {:<13} accuracy {:.4}", kind.as_str(), acc)?;
        }
        writeln!(f, "Stacked model:")?;
        write!(f, "{}", self.stacked)
    }
}

pub struct TrainingOutcome {
    pub classifier: StackingClassifier,
    pub report: EvaluationReport,
}

/// Runs `Idle → Split → FitBase → AssembleMeta → FitMeta → Evaluate → Done`.
pub struct TrainingOrchestrator {
    plan: TrainingPlan,
    stage: TrainingStage,
}

impl TrainingOrchestrator {
    pub fn new(plan: TrainingPlan) -> Self {
        Self {
            plan,
            stage: TrainingStage::Idle,
        }
    }

    pub fn stage(&self) -> TrainingStage {
        self.stage
    }

    pub fn plan(&self) -> &TrainingPlan {
        &self.plan
    }

    fn advance(&mut self, to: TrainingStage, progress: &mut dyn TrainingProgress) -> Result<()> {
        if self.stage.next() != Some(to) {
            return Err(PhishstackError::Training(format!(
                "illegal stage transition {} -> {}",
                self.stage.as_str(),
                to.as_str()
            )));
        }
        self.stage = to;
        progress.on_stage(to);
        Ok(())
    }

    fn fit_layer(
        &self,
        x: &FeatureMatrix,
        y: &[u8],
        fold: Option<usize>,
        progress: &mut dyn TrainingProgress,
    ) -> Result<BaseModelLayer> {
        let layer = BaseModelLayer::fit(&self.plan.base, x, y, self.plan.parallel_fit)?;
        for kind in layer.kinds() {
            progress.on_base_model_fitted(kind, fold);
        }
        Ok(layer)
    }

    pub fn run(
        &mut self,
        x: &FeatureMatrix,
        y: &[u8],
        progress: &mut dyn TrainingProgress,
    ) -> Result<TrainingOutcome> {
        if self.stage != TrainingStage::Idle {
            return Err(PhishstackError::Training(format!(
                "orchestrator already used (stage {})",
                self.stage.as_str()
            )));
        }
        check_xy(x, y)?;
        validate_stack(&self.plan.base)?;

        self.advance(TrainingStage::Split, progress)?;
        let split = stratified_split(y, self.plan.test_size, self.plan.random_state)?;
        let x_train = x.select_rows(&split.train);
        let y_train = select_labels(y, &split.train);
        let x_test = x.select_rows(&split.test);
        let y_test = select_labels(y, &split.test);
        log::info!(
            "Split {} rows into {} train / {} test",
            y.len(),
            y_train.len(),
            y_test.len()
        );

        self.advance(TrainingStage::FitBase, progress)?;
        let fold_layers = match self.plan.stacking {
            StackingMethod::CrossValidated { folds } => {
                let splits = stratified_kfold(&y_train, folds)?;
                let mut layers = Vec::with_capacity(splits.len());
                for (i, fold) in splits.into_iter().enumerate() {
                    let fx = x_train.select_rows(&fold.train);
                    let fy = select_labels(&y_train, &fold.train);
                    let layer = self.fit_layer(&fx, &fy, Some(i), progress)?;
                    layers.push((fold.test, layer));
                }
                layers
            }
            StackingMethod::Naive => Vec::new(),
        };
        let full_layer = self.fit_layer(&x_train, &y_train, None, progress)?;

        self.advance(TrainingStage::AssembleMeta, progress)?;
        let meta_train = if fold_layers.is_empty() {
            MetaFeatureAssembler::assemble(&full_layer, &x_train)?
        } else {
            out_of_fold_meta(&fold_layers, &x_train, full_layer.len())?
        };

        self.advance(TrainingStage::FitMeta, progress)?;
        let mut meta = MetaModel::new(&self.plan.meta);
        meta.fit(&meta_train, &y_train)?;

        self.advance(TrainingStage::Evaluate, progress)?;
        let classifier = StackingClassifier::new(full_layer, meta)?;
        let report = evaluate(&classifier, &x_test, &y_test, self.plan.stacking, y_train.len())?;
        log::info!(
            "Held-out accuracy {:.4} on {} rows",
            report.stacked.accuracy,
            report.n_test
        );

        self.advance(TrainingStage::Done, progress)?;
        Ok(TrainingOutcome { classifier, report })
    }
}

/// Meta-features for every training row, each produced by the fold layer
/// that did not see it.
fn out_of_fold_meta(
    fold_layers: &[(Vec<usize>, BaseModelLayer)],
    x_train: &FeatureMatrix,
    width: usize,
) -> Result<FeatureMatrix> {
    let mut rows: Vec<Option<Vec<f64>>> = vec![None; x_train.n_rows()];
    for (held_out, layer) in fold_layers {
        for &i in held_out {
            let mfv = MetaFeatureAssembler::assemble_row(layer, x_train.row(i))?;
            rows[i] = Some(mfv.values().to_vec());
        }
    }
    let mut meta = FeatureMatrix::new(width);
    for (i, row) in rows.into_iter().enumerate() {
        let row = row.ok_or_else(|| {
            PhishstackError::Training(format!("training row {} not covered by any fold", i))
        })?;
        meta.push_row(&row)?;
    }
    Ok(meta)
}

fn evaluate(
    classifier: &StackingClassifier,
    x_test: &FeatureMatrix,
    y_test: &[u8],
    stacking: StackingMethod,
    n_train: usize,
) -> Result<EvaluationReport> {
    let mut base_accuracy = Vec::with_capacity(classifier.base_layer().len());
    for named in classifier.base_layer().models() {
        let pred = named.model.predict(x_test)?;
        base_accuracy.push((named.kind, accuracy(y_test, &pred)));
    }

    let mut y_pred = Vec::with_capacity(y_test.len());
    let mut p_pos = Vec::with_capacity(y_test.len());
    for row in x_test.rows() {
        let pred = classifier.predict_row(row)?;
        y_pred.push(pred.label.as_class());
        p_pos.push(pred.p_phishing);
    }

    Ok(EvaluationReport {
        stacking,
        n_train,
        n_test: y_test.len(),
        base_accuracy,
        stacked: ClassificationReport::calculate(y_test, &y_pred, &p_pos),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::models::{ForestParams, LogisticParams};

    struct Recorder {
        stages: Vec<TrainingStage>,
        fitted: usize,
    }

    impl TrainingProgress for Recorder {
        fn on_stage(&mut self, stage: TrainingStage) {
            self.stages.push(stage);
        }

        fn on_base_model_fitted(&mut self, _kind: BaseModelKind, _fold: Option<usize>) {
            self.fitted += 1;
        }
    }

    fn data() -> (FeatureMatrix, Vec<u8>) {
        let mut x = FeatureMatrix::new(2);
        let mut y = Vec::new();
        for i in 0..120 {
            let label = u8::from(i % 3 == 0);
            let base = if label == 1 { 10.0 } else { 50.0 };
            x.push_row(&[base + (i % 7) as f64, (i % 5) as f64]).unwrap();
            y.push(label);
        }
        (x, y)
    }

    fn small_plan(stacking: StackingMethod) -> TrainingPlan {
        TrainingPlan {
            base: vec![
                BaseModelSpec::RandomForest(ForestParams {
                    n_estimators: 10,
                    ..Default::default()
                }),
                BaseModelSpec::Logistic(LogisticParams::default()),
            ],
            meta: XgbParams {
                n_estimators: 50,
                ..Default::default()
            },
            stacking,
            ..Default::default()
        }
    }

    #[test]
    fn test_stage_order() {
        let mut stage = TrainingStage::Idle;
        let mut seen = vec![stage];
        while let Some(next) = stage.next() {
            seen.push(next);
            stage = next;
        }
        assert_eq!(seen.len(), 7);
        assert_eq!(seen.last(), Some(&TrainingStage::Done));
    }

    #[test]
    fn test_cross_validated_run_visits_every_stage() {
        let (x, y) = data();
        let mut orch = TrainingOrchestrator::new(small_plan(StackingMethod::CrossValidated { folds: 5 }));
        let mut rec = Recorder {
            stages: Vec::new(),
            fitted: 0,
        };
        let outcome = orch.run(&x, &y, &mut rec).unwrap();

        assert_eq!(
            rec.stages,
            vec![
                TrainingStage::Split,
                TrainingStage::FitBase,
                TrainingStage::AssembleMeta,
                TrainingStage::FitMeta,
                TrainingStage::Evaluate,
                TrainingStage::Done,
            ]
        );
        // 5 folds plus the final refit, two models each
        assert_eq!(rec.fitted, 12);
        assert_eq!(orch.stage(), TrainingStage::Done);
        assert_eq!(outcome.report.n_test, 36);
        assert!(outcome.report.stacked.accuracy > 0.9);
        assert_eq!(outcome.classifier.base_layer().len(), 2);
    }

    #[test]
    fn test_naive_run() {
        let (x, y) = data();
        let mut orch = TrainingOrchestrator::new(small_plan(StackingMethod::Naive));
        let outcome = orch.run(&x, &y, &mut LogProgress).unwrap();
        assert_eq!(outcome.report.stacking, StackingMethod::Naive);
        assert_eq!(outcome.report.base_accuracy.len(), 2);
    }

    #[test]
    fn test_orchestrator_is_single_use() {
        let (x, y) = data();
        let mut orch = TrainingOrchestrator::new(small_plan(StackingMethod::Naive));
        orch.run(&x, &y, &mut LogProgress).unwrap();
        assert!(orch.run(&x, &y, &mut LogProgress).is_err());
    }

    #[test]
    fn test_too_few_rows_per_fold() {
        let x = FeatureMatrix::from_rows(1, &[[0.0], [1.0], [2.0], [3.0], [4.0], [5.0], [6.0], [7.0]]).unwrap();
        let y = [0, 0, 0, 0, 1, 1, 1, 1];
        let mut orch = TrainingOrchestrator::new(small_plan(StackingMethod::CrossValidated { folds: 5 }));
        let err = orch.run(&x, &y, &mut LogProgress);
        assert!(matches!(err, Err(PhishstackError::Training(_))));
    }

    #[test]
    fn test_stacking_method_serde() {
        let json = serde_json::to_string(&StackingMethod::default()).unwrap();
        assert_eq!(json, r#"{"method":"cross_validated","folds":5}"#);
        let naive: StackingMethod = serde_json::from_str(r#"{"method":"naive"}"#).unwrap();
        assert_eq!(naive, StackingMethod::Naive);
    }
}
