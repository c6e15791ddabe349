//! Isolation forest.
//!
//! An ensemble of random binary trees, each grown on a small sample of the
//! training rows by picking a random feature and a random split value
//! between that feature's minimum and maximum. Outliers are isolated close
//! to the root, so their average path length is short.
//!
//! Scores follow the usual conventions:
//!
//! - `score_samples(x) = -2^(-E[h(x)] / c(psi))`, in `[-1, 0]`, lower is
//!   more abnormal
//! - `decision_function(x) = score_samples(x) - offset`, negative for outliers
//!
//! With a contamination fraction the offset is that quantile of the
//! training scores, so roughly that fraction of the batch is flagged.

use crate::config::{Contamination, DetectorConfig};
use crate::error::{ModelFileError, Result, UrbanSenseError};
use crate::scaler::{FeatureRow, N_FEATURES};
use rand::prelude::*;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Offset used when contamination is `Auto`.
const AUTO_OFFSET: f64 = -0.5;

/// Expected path length of an unsuccessful search in a binary search tree
/// of `n` nodes. Normalizes tree depths.
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// One randomly partitioned tree, stored as a node arena rooted at 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolationTree {
    nodes: Vec<Node>,
}

impl IsolationTree {
    /// Grow a tree over `rows[indices]`.
    pub fn grow<R: Rng + ?Sized>(
        rows: &[FeatureRow],
        mut indices: Vec<usize>,
        max_depth: usize,
        rng: &mut R,
    ) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow_node(rows, &mut indices, 0, max_depth, rng);
        tree
    }

    fn grow_node<R: Rng + ?Sized>(
        &mut self,
        rows: &[FeatureRow],
        indices: &mut [usize],
        depth: usize,
        max_depth: usize,
        rng: &mut R,
    ) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf {
            size: indices.len(),
        });

        if depth >= max_depth || indices.len() <= 1 {
            return id;
        }
        let Some((feature, threshold)) = choose_split(rows, indices, rng) else {
            // Every remaining row is identical
            return id;
        };

        let mid = partition(indices, |i| rows[i][feature] <= threshold);
        let (left_rows, right_rows) = indices.split_at_mut(mid);
        let left = self.grow_node(rows, left_rows, depth + 1, max_depth, rng);
        let right = self.grow_node(rows, right_rows, depth + 1, max_depth, rng);

        self.nodes[id] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
        id
    }

    /// Depth at which `row` lands, plus the expected remaining depth of
    /// the leaf it lands in.
    pub fn path_length(&self, row: &FeatureRow) -> f64 {
        let mut id = 0;
        let mut depth = 0usize;
        loop {
            match self.nodes.get(id) {
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    id = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                    depth += 1;
                }
                Some(Node::Leaf { size }) => {
                    return depth as f64 + average_path_length(*size);
                }
                None => return depth as f64,
            }
        }
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Check the arena invariants: a root exists, split features are in
    /// range, thresholds are finite and children come after their parent.
    pub fn validate(&self) -> std::result::Result<(), ModelFileError> {
        if self.nodes.is_empty() {
            return Err(ModelFileError::InvalidModel("tree has no nodes".to_string()));
        }
        for (id, node) in self.nodes.iter().enumerate() {
            if let Node::Split {
                feature,
                threshold,
                left,
                right,
            } = *node
            {
                if feature >= N_FEATURES {
                    return Err(ModelFileError::InvalidModel(format!(
                        "node {} splits on feature {}",
                        id, feature
                    )));
                }
                if !threshold.is_finite() {
                    return Err(ModelFileError::InvalidModel(format!(
                        "node {} has threshold {}",
                        id, threshold
                    )));
                }
                for child in [left, right] {
                    if child <= id || child >= self.nodes.len() {
                        return Err(ModelFileError::InvalidModel(format!(
                            "node {} links to node {}",
                            id, child
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Random feature among the non-constant ones, and a split value in
/// `[min, max)` of that feature.
fn choose_split<R: Rng + ?Sized>(
    rows: &[FeatureRow],
    indices: &[usize],
    rng: &mut R,
) -> Option<(usize, f64)> {
    let mut candidates: Vec<(usize, f64, f64)> = Vec::with_capacity(N_FEATURES);
    for feature in 0..N_FEATURES {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &i in indices {
            let v = rows[i][feature];
            min = min.min(v);
            max = max.max(v);
        }
        if max > min {
            candidates.push((feature, min, max));
        }
    }

    let &(feature, min, max) = candidates.choose(rng)?;
    Some((feature, rng.gen_range(min..max)))
}

/// Move every index satisfying `pred` to the front; returns their count.
fn partition<F: Fn(usize) -> bool>(indices: &mut [usize], pred: F) -> usize {
    let mut mid = 0;
    for k in 0..indices.len() {
        if pred(indices[k]) {
            indices.swap(mid, k);
            mid += 1;
        }
    }
    mid
}

/// Linear-interpolated percentile, `q` in `[0, 100]`.
fn percentile(values: &[f64], q: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let pos = q / 100.0 * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Fitted isolation forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolationForest {
    trees: Vec<IsolationTree>,
    sample_size: usize,
    offset: f64,
}

impl IsolationForest {
    /// Fit on standardized `rows`.
    pub fn fit(rows: &[FeatureRow], config: &DetectorConfig) -> Result<Self> {
        config.validate()?;
        if rows.is_empty() {
            return Err(UrbanSenseError::EmptyDataset {
                operation: "fit isolation forest",
            });
        }

        let n = rows.len();
        let sample_size = config.max_samples.resolve(n);
        let max_depth = (sample_size.max(2) as f64).log2().ceil() as usize;

        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut trees = Vec::with_capacity(config.n_estimators);
        for _ in 0..config.n_estimators {
            let mut tree_rng = StdRng::seed_from_u64(rng.gen());
            let indices: Vec<usize> = if config.bootstrap {
                (0..sample_size).map(|_| tree_rng.gen_range(0..n)).collect()
            } else {
                rand::seq::index::sample(&mut tree_rng, n, sample_size).into_vec()
            };
            trees.push(IsolationTree::grow(rows, indices, max_depth, &mut tree_rng));
        }

        let mut forest = Self {
            trees,
            sample_size,
            offset: AUTO_OFFSET,
        };
        if let Contamination::Fraction(fraction) = config.contamination {
            let scores = forest.score_samples(rows);
            forest.offset = percentile(&scores, 100.0 * fraction);
        }

        debug!(
            "Fitted isolation forest: {} trees, {} rows per tree, depth limit {}, offset {:.4}",
            forest.trees.len(),
            sample_size,
            max_depth,
            forest.offset
        );
        Ok(forest)
    }

    /// Mean path length of `row` across the ensemble.
    pub fn mean_path_length(&self, row: &FeatureRow) -> f64 {
        let total: f64 = self.trees.iter().map(|t| t.path_length(row)).sum();
        total / self.trees.len().max(1) as f64
    }

    /// Opposite of the Liu et al. anomaly score; lower is more
    /// abnormal.
    pub fn score_samples(&self, rows: &[FeatureRow]) -> Vec<f64> {
        let norm = average_path_length(self.sample_size).max(1.0);
        rows.iter()
            .map(|row| -(2f64.powf(-self.mean_path_length(row) / norm)))
            .collect()
    }

    /// Shifted score; negative values are outliers.
    pub fn decision_function(&self, rows: &[FeatureRow]) -> Vec<f64> {
        self.score_samples(rows)
            .into_iter()
            .map(|s| s - self.offset)
            .collect()
    }

    /// `true` for rows classified as outliers.
    pub fn predict(&self, rows: &[FeatureRow]) -> Vec<bool> {
        self.decision_function(rows)
            .into_iter()
            .map(|d| d < 0.0)
            .collect()
    }

    /// Decision threshold on `score_samples`.
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Rows drawn per tree.
    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    /// Number of trees.
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Check a forest read from an untrusted source before scoring with it.
    pub fn validate(&self) -> std::result::Result<(), ModelFileError> {
        if self.trees.is_empty() {
            return Err(ModelFileError::InvalidModel("forest has no trees".to_string()));
        }
        if self.sample_size == 0 || !self.offset.is_finite() {
            return Err(ModelFileError::InvalidModel(format!(
                "sample size {} with offset {}",
                self.sample_size, self.offset
            )));
        }
        self.trees.iter().try_for_each(IsolationTree::validate)
    }
}
