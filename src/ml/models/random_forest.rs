use crate::error::{PhishstackError, Result};
use crate::ml::matrix::{check_xy, FeatureMatrix};
use crate::ml::models::binning::{BinnedMatrix, FeatureBinner};
use crate::ml::models::classifier::{check_row, Classifier};
use crate::ml::models::tree::DecisionTree;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

const MIN_DECREASE: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    Sqrt,
    Log2,
    All,
    Count(usize),
}

impl MaxFeatures {
    pub fn resolve(&self, n_features: usize) -> usize {
        let n = match self {
            Self::Sqrt => (n_features as f64).sqrt() as usize,
            Self::Log2 => (n_features as f64).log2() as usize,
            Self::All => n_features,
            Self::Count(c) => *c,
        };
        n.clamp(1, n_features.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_features: MaxFeatures,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub bootstrap: bool,
    pub max_bins: usize,
    pub random_state: Option<u64>,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_features: MaxFeatures::Sqrt,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            bootstrap: true,
            max_bins: 1024,
            random_state: Some(42),
        }
    }
}

impl ForestParams {
    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(PhishstackError::Configuration(
                "random forest needs at least one tree".to_string(),
            ));
        }
        if self.min_samples_split < 2 || self.min_samples_leaf < 1 {
            return Err(PhishstackError::Configuration(
                "min_samples_split must be >= 2 and min_samples_leaf >= 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn build(&self) -> RandomForest {
        RandomForest::new(self.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct FittedForest {
    n_features: usize,
    trees: Vec<DecisionTree>,
}

/// Bagged CART classification trees with Gini splits.
///
/// Each leaf stores the weighted fraction of positive samples; the forest
/// probability is the mean over trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    params: ForestParams,
    fitted: Option<FittedForest>,
}

#[derive(Debug, Clone, Copy, Default)]
struct ClassStats {
    w0: f64,
    w1: f64,
    n: usize,
}

impl ClassStats {
    fn weight(&self) -> f64 {
        self.w0 + self.w1
    }

    fn gini(&self) -> f64 {
        let w = self.weight();
        if w <= 0.0 {
            return 0.0;
        }
        let (p0, p1) = (self.w0 / w, self.w1 / w);
        1.0 - p0 * p0 - p1 * p1
    }
}

struct TreeBuilder<'a> {
    binned: &'a BinnedMatrix,
    binner: &'a FeatureBinner,
    y: &'a [u8],
    weights: Vec<f64>,
    params: &'a ForestParams,
    max_features: usize,
    rng: StdRng,
}

impl TreeBuilder<'_> {
    fn stats(&self, rows: &[u32]) -> ClassStats {
        let mut s = ClassStats::default();
        for &r in rows {
            let r = r as usize;
            if self.y[r] == 1 {
                s.w1 += self.weights[r];
            } else {
                s.w0 += self.weights[r];
            }
            s.n += 1;
        }
        s
    }

    fn build(&mut self, tree: &mut DecisionTree, node: usize, rows: Vec<u32>, depth: usize) {
        let stats = self.stats(&rows);
        let depth_ok = self.params.max_depth.map_or(true, |d| depth < d);
        let splittable = depth_ok
            && stats.n >= self.params.min_samples_split
            && stats.w0 > 0.0
            && stats.w1 > 0.0;

        if splittable {
            if let Some((feature, bin)) = self.best_split(&rows, stats) {
                let threshold = self.binner.threshold(feature, bin);
                let (left, right) = tree.split_node(node, feature, threshold);
                let (left_rows, right_rows): (Vec<u32>, Vec<u32>) = rows
                    .iter()
                    .copied()
                    .partition(|&r| self.binned.bin(r as usize, feature) <= bin);
                drop(rows);
                self.build(tree, left, left_rows, depth + 1);
                self.build(tree, right, right_rows, depth + 1);
                return;
            }
        }

        let value = if stats.weight() > 0.0 {
            stats.w1 / stats.weight()
        } else {
            0.0
        };
        tree.set_leaf(node, value);
    }

    fn best_split(&mut self, rows: &[u32], total: ClassStats) -> Option<(usize, usize)> {
        let mut features: Vec<usize> = (0..self.binner.n_cols()).collect();
        features.shuffle(&mut self.rng);

        let parent = total.weight() * total.gini();
        let mut best: Option<(usize, usize, f64)> = None;
        let mut visited = 0;

        for feature in features {
            if visited >= self.max_features {
                break;
            }
            let n_bins = self.binner.n_bins(feature);
            let mut hist = vec![ClassStats::default(); n_bins];
            for &r in rows {
                let r = r as usize;
                let slot = &mut hist[self.binned.bin(r, feature)];
                if self.y[r] == 1 {
                    slot.w1 += self.weights[r];
                } else {
                    slot.w0 += self.weights[r];
                }
                slot.n += 1;
            }
            if hist.iter().filter(|s| s.n > 0).count() < 2 {
                continue;
            }
            visited += 1;

            let mut left = ClassStats::default();
            for (bin, slot) in hist.iter().enumerate().take(n_bins - 1) {
                left.w0 += slot.w0;
                left.w1 += slot.w1;
                left.n += slot.n;
                let right = ClassStats {
                    w0: total.w0 - left.w0,
                    w1: total.w1 - left.w1,
                    n: total.n - left.n,
                };
                if left.n < self.params.min_samples_leaf || right.n < self.params.min_samples_leaf {
                    continue;
                }
                let decrease =
                    parent - left.weight() * left.gini() - right.weight() * right.gini();
                if decrease > best.map_or(MIN_DECREASE, |b| b.2) {
                    best = Some((feature, bin, decrease));
                }
            }
        }
        best.map(|(f, b, _)| (f, b))
    }
}

impl RandomForest {
    pub fn new(params: ForestParams) -> Self {
        Self {
            params,
            fitted: None,
        }
    }

    pub fn n_trees(&self) -> usize {
        self.fitted.as_ref().map_or(0, |f| f.trees.len())
    }
}

impl Classifier for RandomForest {
    fn name(&self) -> &'static str {
        "randomforest"
    }

    fn fit(&mut self, x: &FeatureMatrix, y: &[u8]) -> Result<()> {
        check_xy(x, y)?;
        self.params.validate()?;

        let n = x.n_rows();
        let binner = FeatureBinner::fit(x, self.params.max_bins);
        let binned = binner.transform(x);
        let max_features = self.params.max_features.resolve(x.n_cols());
        let mut master = match self.params.random_state {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut trees = Vec::with_capacity(self.params.n_estimators);
        for _ in 0..self.params.n_estimators {
            let mut rng = StdRng::seed_from_u64(master.gen());
            let mut weights = vec![0.0; n];
            if self.params.bootstrap {
                for _ in 0..n {
                    weights[rng.gen_range(0..n)] += 1.0;
                }
            } else {
                weights.iter_mut().for_each(|w| *w = 1.0);
            }
            let rows: Vec<u32> = (0..n as u32).filter(|&r| weights[r as usize] > 0.0).collect();

            let mut builder = TreeBuilder {
                binned: &binned,
                binner: &binner,
                y,
                weights,
                params: &self.params,
                max_features,
                rng,
            };
            let mut tree = DecisionTree::new();
            let root = tree.push_leaf(0.0);
            builder.build(&mut tree, root, rows, 0);
            trees.push(tree);
        }

        log::debug!("randomforest: fitted {} trees on {} rows", trees.len(), n);
        self.fitted = Some(FittedForest {
            n_features: x.n_cols(),
            trees,
        });
        Ok(())
    }

    fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    fn n_features(&self) -> Option<usize> {
        self.fitted.as_ref().map(|f| f.n_features)
    }

    fn positive_proba(&self, row: &[f64]) -> Result<f64> {
        check_row(self.n_features(), row, "randomforest")?;
        let fitted = self
            .fitted
            .as_ref()
            .ok_or(PhishstackError::NotFitted("randomforest"))?;
        let total: f64 = fitted.trees.iter().map(|t| t.predict(row)).sum();
        Ok(total / fitted.trees.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn threshold_data() -> (FeatureMatrix, Vec<u8>) {
        let mut x = FeatureMatrix::new(2);
        let mut y = Vec::new();
        for i in 0..200 {
            let signal = (i % 10) as f64;
            x.push_row(&[signal, ((i * 7) % 13) as f64]).unwrap();
            y.push(u8::from(signal >= 5.0));
        }
        (x, y)
    }

    #[test]
    fn test_max_features_resolution() {
        assert_eq!(MaxFeatures::Sqrt.resolve(6), 2);
        assert_eq!(MaxFeatures::Log2.resolve(6), 2);
        assert_eq!(MaxFeatures::All.resolve(6), 6);
        assert_eq!(MaxFeatures::Count(10).resolve(4), 4);
        assert_eq!(MaxFeatures::Sqrt.resolve(1), 1);
    }

    #[test]
    fn test_forest_learns_threshold() {
        let (x, y) = threshold_data();
        let mut forest = ForestParams {
            n_estimators: 25,
            ..Default::default()
        }
        .build();
        forest.fit(&x, &y).unwrap();
        let pred = forest.predict(&x).unwrap();
        let correct = pred.iter().zip(&y).filter(|(p, t)| p == t).count();
        assert!(correct as f64 / y.len() as f64 > 0.95);
        assert_eq!(forest.n_trees(), 25);
    }

    #[test]
    fn test_forest_is_deterministic_with_seed() {
        let (x, y) = threshold_data();
        let params = ForestParams {
            n_estimators: 10,
            ..Default::default()
        };
        let mut a = params.build();
        let mut b = params.build();
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_single_class_gives_constant_leaf() {
        let x = FeatureMatrix::from_rows(1, &[[1.0], [2.0], [3.0]]).unwrap();
        let mut forest = ForestParams {
            n_estimators: 3,
            ..Default::default()
        }
        .build();
        forest.fit(&x, &[1, 1, 1]).unwrap();
        assert_eq!(forest.positive_proba(&[5.0]).unwrap(), 1.0);
    }
}
