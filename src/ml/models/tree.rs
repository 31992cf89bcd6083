//! Fitted tree structures shared by the forest and boosting learners.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    /// Rows with `row[feature] <= threshold` go left.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// Binary tree stored as a flat node list; the root is node 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
}

impl DecisionTree {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn single_leaf(value: f64) -> Self {
        Self {
            nodes: vec![TreeNode::Leaf { value }],
        }
    }

    /// Reserves a node slot and returns its index.
    pub fn push_leaf(&mut self, value: f64) -> usize {
        self.nodes.push(TreeNode::Leaf { value });
        self.nodes.len() - 1
    }

    pub fn set_leaf(&mut self, node: usize, value: f64) {
        self.nodes[node] = TreeNode::Leaf { value };
    }

    /// Turns `node` into a split and returns the indices of its new children.
    pub fn split_node(&mut self, node: usize, feature: usize, threshold: f64) -> (usize, usize) {
        let left = self.push_leaf(0.0);
        let right = self.push_leaf(0.0);
        self.nodes[node] = TreeNode::Split {
            feature,
            threshold,
            left,
            right,
        };
        (left, right)
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, TreeNode::Leaf { .. }))
            .count()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[TreeNode], idx: usize) -> usize {
            match &nodes[idx] {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => {
                    1 + walk(nodes, *left).max(walk(nodes, *right))
                }
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Symmetric tree: every level applies the same split to all nodes.
///
/// Leaf index bit `l` is set when the level-`l` condition `row[f] > t` holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObliviousTree {
    pub splits: Vec<(usize, f64)>,
    pub leaf_values: Vec<f64>,
}

impl ObliviousTree {
    pub fn leaf_index(&self, row: &[f64]) -> usize {
        self.splits
            .iter()
            .enumerate()
            .fold(0, |acc, (level, &(feature, threshold))| {
                acc | (usize::from(row[feature] > threshold) << level)
            })
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        self.leaf_values[self.leaf_index(row)]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Tree {
    Binary(DecisionTree),
    Oblivious(ObliviousTree),
}

impl Tree {
    pub fn predict(&self, row: &[f64]) -> f64 {
        match self {
            Tree::Binary(t) => t.predict(row),
            Tree::Oblivious(t) => t.predict(row),
        }
    }
}
