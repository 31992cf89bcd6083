use super::BoostingParams;
use crate::ml::models::binning::{BinnedMatrix, FeatureBinner};
use crate::ml::models::tree::{DecisionTree, ObliviousTree};
use std::ops::{Add, Sub};

const MIN_GAIN: f64 = 1e-10;

#[derive(Debug, Clone, Copy, Default)]
struct NodeStats {
    g: f64,
    h: f64,
    n: usize,
}

impl Add for NodeStats {
    type Output = Self;
    fn add(self, o: Self) -> Self {
        Self {
            g: self.g + o.g,
            h: self.h + o.h,
            n: self.n + o.n,
        }
    }
}

impl Sub for NodeStats {
    type Output = Self;
    fn sub(self, o: Self) -> Self {
        Self {
            g: self.g - o.g,
            h: self.h - o.h,
            n: self.n - o.n,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    bin: usize,
    gain: f64,
}

struct OpenLeaf {
    node: usize,
    rows: Vec<u32>,
    depth: usize,
    stats: NodeStats,
    split: Option<SplitCandidate>,
}

/// Everything needed to grow one tree on the current gradients.
pub(super) struct GrowContext<'a> {
    pub binned: &'a BinnedMatrix,
    pub binner: &'a FeatureBinner,
    pub grad: &'a [f64],
    pub hess: &'a [f64],
    pub cols: &'a [usize],
    pub params: &'a BoostingParams,
}

impl GrowContext<'_> {
    pub fn grow_depth_wise(&self, rows: Vec<u32>) -> DecisionTree {
        let mut tree = DecisionTree::new();
        let root = tree.push_leaf(0.0);
        self.grow_node(&mut tree, root, rows, 0);
        tree
    }

    fn grow_node(&self, tree: &mut DecisionTree, node: usize, rows: Vec<u32>, depth: usize) {
        let stats = self.stats(&rows);
        if self.depth_allows(depth) {
            if let Some(split) = self.best_split(&rows, stats) {
                let threshold = self.binner.threshold(split.feature, split.bin);
                let (left, right) = tree.split_node(node, split.feature, threshold);
                let (left_rows, right_rows) = self.partition(&rows, &split);
                drop(rows);
                self.grow_node(tree, left, left_rows, depth + 1);
                self.grow_node(tree, right, right_rows, depth + 1);
                return;
            }
        }
        tree.set_leaf(node, self.leaf_value(stats));
    }

    pub fn grow_leaf_wise(&self, rows: Vec<u32>) -> DecisionTree {
        let max_leaves = self.params.max_leaves.unwrap_or(usize::MAX).max(1);
        let mut tree = DecisionTree::new();
        let root = tree.push_leaf(0.0);
        let mut open = vec![self.open_leaf(root, rows, 0)];
        let mut n_leaves = 1;

        while n_leaves < max_leaves {
            let best = open
                .iter()
                .enumerate()
                .filter_map(|(i, leaf)| leaf.split.map(|s| (i, s.gain)))
                .max_by(|a, b| a.1.total_cmp(&b.1));
            let Some((idx, _)) = best else { break };

            let leaf = open.swap_remove(idx);
            let Some(split) = leaf.split else { break };
            let threshold = self.binner.threshold(split.feature, split.bin);
            let (left, right) = tree.split_node(leaf.node, split.feature, threshold);
            let (left_rows, right_rows) = self.partition(&leaf.rows, &split);
            open.push(self.open_leaf(left, left_rows, leaf.depth + 1));
            open.push(self.open_leaf(right, right_rows, leaf.depth + 1));
            n_leaves += 1;
        }

        for leaf in open {
            tree.set_leaf(leaf.node, self.leaf_value(leaf.stats));
        }
        tree
    }

    fn open_leaf(&self, node: usize, rows: Vec<u32>, depth: usize) -> OpenLeaf {
        let stats = self.stats(&rows);
        let split = if self.depth_allows(depth) {
            self.best_split(&rows, stats)
        } else {
            None
        };
        OpenLeaf {
            node,
            rows,
            depth,
            stats,
            split,
        }
    }

    pub fn grow_symmetric(&self, rows: Vec<u32>) -> ObliviousTree {
        let depth = self.params.max_depth.unwrap_or(6);
        let mut leaves: Vec<Vec<u32>> = vec![rows];
        let mut splits = Vec::with_capacity(depth);

        for _level in 0..depth {
            let leaf_stats: Vec<NodeStats> = leaves.iter().map(|r| self.stats(r)).collect();
            let mut best: Option<SplitCandidate> = None;

            for &col in self.cols {
                let n_bins = self.binner.n_bins(col);
                if n_bins < 2 {
                    continue;
                }
                let hists: Vec<Vec<NodeStats>> =
                    leaves.iter().map(|r| self.histogram(r, col)).collect();
                let mut left = vec![NodeStats::default(); leaves.len()];

                for bin in 0..n_bins - 1 {
                    let mut gain = 0.0;
                    for (leaf, hist) in hists.iter().enumerate() {
                        left[leaf] = left[leaf] + hist[bin];
                        let right = leaf_stats[leaf] - left[leaf];
                        gain += self.score(left[leaf]) + self.score(right)
                            - self.score(leaf_stats[leaf]);
                    }
                    let gain = 0.5 * gain;
                    if gain > best.map_or(MIN_GAIN, |b| b.gain) {
                        best = Some(SplitCandidate {
                            feature: col,
                            bin,
                            gain,
                        });
                    }
                }
            }

            let Some(split) = best else { break };
            let width = leaves.len();
            let mut next: Vec<Vec<u32>> = vec![Vec::new(); width * 2];
            for (i, rows) in leaves.into_iter().enumerate() {
                for r in rows {
                    if self.binned.bin(r as usize, split.feature) > split.bin {
                        next[i + width].push(r);
                    } else {
                        next[i].push(r);
                    }
                }
            }
            splits.push((split.feature, self.binner.threshold(split.feature, split.bin)));
            leaves = next;
        }

        let leaf_values = leaves
            .iter()
            .map(|rows| self.leaf_value(self.stats(rows)))
            .collect();
        ObliviousTree {
            splits,
            leaf_values,
        }
    }

    fn depth_allows(&self, depth: usize) -> bool {
        self.params.max_depth.map_or(true, |d| depth < d)
    }

    fn stats(&self, rows: &[u32]) -> NodeStats {
        rows.iter().fold(NodeStats::default(), |acc, &r| NodeStats {
            g: acc.g + self.grad[r as usize],
            h: acc.h + self.hess[r as usize],
            n: acc.n + 1,
        })
    }

    fn histogram(&self, rows: &[u32], col: usize) -> Vec<NodeStats> {
        let mut hist = vec![NodeStats::default(); self.binner.n_bins(col)];
        for &r in rows {
            let r = r as usize;
            let slot = &mut hist[self.binned.bin(r, col)];
            slot.g += self.grad[r];
            slot.h += self.hess[r];
            slot.n += 1;
        }
        hist
    }

    fn best_split(&self, rows: &[u32], total: NodeStats) -> Option<SplitCandidate> {
        let p = self.params;
        let parent_score = self.score(total);
        let mut best: Option<SplitCandidate> = None;

        for &col in self.cols {
            let n_bins = self.binner.n_bins(col);
            if n_bins < 2 {
                continue;
            }
            let hist = self.histogram(rows, col);
            let mut left = NodeStats::default();
            for (bin, slot) in hist.iter().enumerate().take(n_bins - 1) {
                left = left + *slot;
                let right = total - left;
                if left.n == 0 || right.n == 0 {
                    continue;
                }
                if left.n < p.min_child_samples || right.n < p.min_child_samples {
                    continue;
                }
                if left.h < p.min_child_weight || right.h < p.min_child_weight {
                    continue;
                }
                let gain =
                    0.5 * (self.score(left) + self.score(right) - parent_score) - p.gamma;
                if gain > best.map_or(MIN_GAIN, |b| b.gain) {
                    best = Some(SplitCandidate {
                        feature: col,
                        bin,
                        gain,
                    });
                }
            }
        }
        best
    }

    fn partition(&self, rows: &[u32], split: &SplitCandidate) -> (Vec<u32>, Vec<u32>) {
        rows.iter()
            .copied()
            .partition(|&r| self.binned.bin(r as usize, split.feature) <= split.bin)
    }

    fn score(&self, s: NodeStats) -> f64 {
        let denom = s.h + self.params.reg_lambda;
        if denom <= 0.0 {
            return 0.0;
        }
        let g = soft_threshold(s.g, self.params.reg_alpha);
        g * g / denom
    }

    fn leaf_value(&self, s: NodeStats) -> f64 {
        let denom = s.h + self.params.reg_lambda;
        if s.n == 0 || denom <= 0.0 {
            return 0.0;
        }
        -soft_threshold(s.g, self.params.reg_alpha) / denom * self.params.learning_rate
    }
}

fn soft_threshold(g: f64, alpha: f64) -> f64 {
    if g > alpha {
        g - alpha
    } else if g < -alpha {
        g + alpha
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soft_threshold() {
        assert_eq!(soft_threshold(5.0, 2.0), 3.0);
        assert_eq!(soft_threshold(-5.0, 2.0), -3.0);
        assert_eq!(soft_threshold(1.0, 2.0), 0.0);
    }
}
