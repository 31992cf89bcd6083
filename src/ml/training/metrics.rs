// src/ml/training/metrics.rs
use serde::{Deserialize, Serialize};
use std::fmt;

/// 2x2 confusion matrix indexed `[actual][predicted]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix(pub [[usize; 2]; 2]);

impl ConfusionMatrix {
    pub fn from_labels(y_true: &[u8], y_pred: &[u8]) -> Self {
        let mut m = [[0usize; 2]; 2];
        for (&t, &p) in y_true.iter().zip(y_pred) {
            m[usize::from(t.min(1))][usize::from(p.min(1))] += 1;
        }
        Self(m)
    }

    pub fn total(&self) -> usize {
        self.0.iter().flatten().sum()
    }

    pub fn correct(&self) -> usize {
        self.0[0][0] + self.0[1][1]
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

impl ClassMetrics {
    fn for_class(cm: &ConfusionMatrix, class: usize) -> Self {
        let m = cm.0;
        let tp = m[class][class];
        let predicted = m[0][class] + m[1][class];
        let support = m[class][0] + m[class][1];
        let precision = ratio(tp, predicted);
        let recall = ratio(tp, support);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        Self {
            precision,
            recall,
            f1,
            support,
        }
    }
}

/// Per-class precision/recall/F1 with macro and weighted averages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub accuracy: f64,
    /// Indexed by class: `[legitimate, phishing]`.
    pub per_class: [ClassMetrics; 2],
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
    pub confusion: ConfusionMatrix,
    /// `None` when only one class is present in `y_true`.
    pub roc_auc: Option<f64>,
}

impl ClassificationReport {
    pub fn calculate(y_true: &[u8], y_pred: &[u8], p_positive: &[f64]) -> Self {
        let confusion = ConfusionMatrix::from_labels(y_true, y_pred);
        let per_class = [
            ClassMetrics::for_class(&confusion, 0),
            ClassMetrics::for_class(&confusion, 1),
        ];
        let total = confusion.total();

        let macro_avg = ClassMetrics {
            precision: (per_class[0].precision + per_class[1].precision) / 2.0,
            recall: (per_class[0].recall + per_class[1].recall) / 2.0,
            f1: (per_class[0].f1 + per_class[1].f1) / 2.0,
            support: total,
        };
        let weight = |f: fn(&ClassMetrics) -> f64| {
            if total == 0 {
                0.0
            } else {
                per_class
                    .iter()
                    .map(|c| f(c) * c.support as f64)
                    .sum::<f64>()
                    / total as f64
            }
        };
        let weighted_avg = ClassMetrics {
            precision: weight(|c| c.precision),
            recall: weight(|c| c.recall),
            f1: weight(|c| c.f1),
            support: total,
        };

        Self {
            accuracy: ratio(confusion.correct(), total),
            per_class,
            macro_avg,
            weighted_avg,
            confusion,
            roc_auc: roc_auc(y_true, p_positive),
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>14} {:>9} {:>9} {:>9} {:>9}", "", "precision", "recall", "f1-score", "support")?;
        let names = ["legitimate", "phishing"];
        for (name, m) in names.iter().zip(&self.per_class) {
            writeln!(f, "{:>14} {:>9.4} {:>9.4} {:>9.4} {:>9}", name, m.precision, m.recall, m.f1, m.support)?;
        }
        writeln!(f)?;
        writeln!(f, "{:>14} {:>9} {:>9} {:>9.4} {:>9}", "accuracy", "", "", self.accuracy, self.confusion.total())?;
        for (name, m) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(f, "{:>14} {:>9.4} {:>9.4} {:>9.4} {:>9}", name, m.precision, m.recall, m.f1, m.support)?;
        }
        let c = self.confusion.0;
        writeln!(f, "confusion: [[{}, {}], [{}, {}]]", c[0][0], c[0][1], c[1][0], c[1][1])?;
        match self.roc_auc {
            Some(auc) => write!(f, "roc auc: {:.4}", auc),
            None => write!(f, "roc auc: n/a"),
        }
    }
}

pub fn accuracy(y_true: &[u8], y_pred: &[u8]) -> f64 {
    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    ratio(correct, y_true.len())
}

/// Area under the ROC curve via the rank-sum statistic, ties given average rank.
pub fn roc_auc(y_true: &[u8], scores: &[f64]) -> Option<f64> {
    let n_pos = y_true.iter().filter(|&&l| l == 1).count();
    let n_neg = y_true.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut rank_sum_pos = 0.0;
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        // ranks are 1-based; tied block shares the mean rank
        let avg_rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            if y_true[idx] == 1 {
                rank_sum_pos += avg_rank;
            }
        }
        i = j + 1;
    }

    let u = rank_sum_pos - (n_pos * (n_pos + 1)) as f64 / 2.0;
    Some(u / (n_pos * n_neg) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_on_known_predictions() {
        let y_true = [0, 0, 0, 1, 1, 1];
        let y_pred = [0, 0, 1, 1, 1, 0];
        let scores = [0.1, 0.2, 0.6, 0.9, 0.8, 0.4];
        let r = ClassificationReport::calculate(&y_true, &y_pred, &scores);

        assert_eq!(r.confusion.0, [[2, 1], [1, 2]]);
        assert!((r.accuracy - 4.0 / 6.0).abs() < 1e-12);
        assert!((r.per_class[1].precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((r.per_class[1].recall - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(r.per_class[0].support, 3);
        assert!((r.roc_auc.unwrap() - 8.0 / 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_auc_perfect_and_tied() {
        assert_eq!(roc_auc(&[0, 0, 1, 1], &[0.1, 0.2, 0.8, 0.9]), Some(1.0));
        assert_eq!(roc_auc(&[0, 1, 0, 1], &[0.5, 0.5, 0.5, 0.5]), Some(0.5));
        assert_eq!(roc_auc(&[1, 1], &[0.2, 0.3]), None);
    }

    #[test]
    fn test_empty_class_yields_zero_precision() {
        let r = ClassificationReport::calculate(&[0, 0], &[0, 0], &[0.1, 0.2]);
        assert_eq!(r.per_class[1].precision, 0.0);
        assert_eq!(r.accuracy, 1.0);
        assert!(r.roc_auc.is_none());
    }

    #[test]
    fn test_accuracy() {
        assert_eq!(accuracy(&[0, 1, 1, 0], &[0, 1, 0, 0]), 0.75);
        assert_eq!(accuracy(&[], &[]), 0.0);
    }
}
