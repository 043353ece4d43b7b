//! CART regression tree
//!
//! Splits greedily on the feature/threshold pair with the largest reduction
//! in squared error. Used directly by gradient boosting and, with feature
//! subsampling, as the base learner of a random forest.

use crate::{MathError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Growth limits for a regression tree
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeParams {
    /// Maximum depth (a depth of 0 is a single leaf)
    pub max_depth: usize,
    /// Minimum number of samples on each side of a split
    pub min_samples_leaf: usize,
    /// Number of features considered per split; all features when `None`
    pub max_features: Option<usize>,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: 6,
            min_samples_leaf: 2,
            max_features: None,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf(f64),
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// A fitted regression tree
#[derive(Debug, Clone)]
pub struct RegressionTree {
    root: Node,
    n_features: usize,
}

struct Candidate {
    feature: usize,
    threshold: f64,
    score: f64,
}

impl RegressionTree {
    /// Fit a tree on feature rows `x` and targets `y`.
    ///
    /// `rng` is only consulted when `params.max_features` restricts the
    /// candidate features.
    pub fn fit<R: Rng + ?Sized>(
        x: &[Vec<f64>],
        y: &[f64],
        params: &TreeParams,
        rng: &mut R,
    ) -> Result<Self> {
        if x.is_empty() {
            return Err(MathError::InsufficientData(
                "Cannot fit a tree without samples".to_string(),
            ));
        }
        if x.len() != y.len() {
            return Err(MathError::InvalidInput(format!(
                "Got {} feature rows but {} targets",
                x.len(),
                y.len()
            )));
        }
        if params.min_samples_leaf == 0 {
            return Err(MathError::InvalidInput(
                "min_samples_leaf must be at least 1".to_string(),
            ));
        }

        let n_features = x[0].len();
        if x.iter().any(|row| row.len() != n_features) {
            return Err(MathError::InvalidInput(
                "Feature rows have inconsistent widths".to_string(),
            ));
        }
        if y.iter().chain(x.iter().flatten()).any(|v| !v.is_finite()) {
            return Err(MathError::InvalidInput(
                "Training data contains non-finite values".to_string(),
            ));
        }

        let indices: Vec<usize> = (0..x.len()).collect();
        let root = grow(x, y, indices, 0, params, rng);

        Ok(Self { root, n_features })
    }

    /// Predict the target for one feature row
    pub fn predict(&self, row: &[f64]) -> Result<f64> {
        if row.len() != self.n_features {
            return Err(MathError::InvalidInput(format!(
                "Expected {} features, got {}",
                self.n_features,
                row.len()
            )));
        }

        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf(value) => return Ok(*value),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold { left } else { right };
                }
            }
        }
    }
}

fn grow<R: Rng + ?Sized>(
    x: &[Vec<f64>],
    y: &[f64],
    indices: Vec<usize>,
    depth: usize,
    params: &TreeParams,
    rng: &mut R,
) -> Node {
    let n = indices.len();
    let sum: f64 = indices.iter().map(|&i| y[i]).sum();
    let mean = sum / n as f64;

    if depth >= params.max_depth || n < 2 * params.min_samples_leaf {
        return Node::Leaf(mean);
    }

    let n_features = x[0].len();
    let features: Vec<usize> = match params.max_features {
        Some(k) if k < n_features => rand::seq::index::sample(rng, n_features, k.max(1)).into_vec(),
        _ => (0..n_features).collect(),
    };

    // Minimizing SSE is equivalent to maximizing sum_l²/n_l + sum_r²/n_r
    let parent_score = sum * sum / n as f64;
    let mut best: Option<Candidate> = None;

    for feature in features {
        let mut sorted = indices.clone();
        sorted.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));

        let mut left_sum = 0.0;
        for pos in 1..n {
            left_sum += y[sorted[pos - 1]];
            if pos < params.min_samples_leaf || n - pos < params.min_samples_leaf {
                continue;
            }

            let lo = x[sorted[pos - 1]][feature];
            let hi = x[sorted[pos]][feature];
            if lo == hi {
                continue;
            }

            let right_sum = sum - left_sum;
            let score = left_sum * left_sum / pos as f64 + right_sum * right_sum / (n - pos) as f64;
            if best.as_ref().map_or(true, |b| score > b.score) {
                best = Some(Candidate {
                    feature,
                    threshold: lo + (hi - lo) / 2.0,
                    score,
                });
            }
        }
    }

    match best {
        Some(split) if split.score > parent_score + 1e-12 => {
            let (left, right): (Vec<usize>, Vec<usize>) = indices
                .into_iter()
                .partition(|&i| x[i][split.feature] <= split.threshold);

            Node::Split {
                feature: split.feature,
                threshold: split.threshold,
                left: Box::new(grow(x, y, left, depth + 1, params, rng)),
                right: Box::new(grow(x, y, right, depth + 1, params, rng)),
            }
        }
        _ => Node::Leaf(mean),
    }
}
