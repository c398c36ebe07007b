//! Gradient-boosted regression trees for squared-error regression.
//!
//! Each round fits a regression tree to the first and second order
//! gradients of the squared loss at the current prediction and adds it,
//! shrunk by the learning rate. Leaf weights use the regularised form
//! `-G / (H + λ)` and splits must clear `γ`.

mod tree;

use ndarray::Array2;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::index::sample;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ModelError, Result};
use tree::{RegressionTree, TreeParams};

/// Boosting configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostingConfig {
    /// Number of boosting rounds (default: 100)
    pub n_estimators: usize,
    /// Maximum tree depth (default: 6)
    pub max_depth: usize,
    /// Shrinkage applied to each tree (default: 0.3)
    pub learning_rate: f64,
    /// L2 penalty on leaf weights (default: 1.0)
    pub lambda: f64,
    /// Minimum loss reduction required to split (default: 0.0)
    pub gamma: f64,
    /// Minimum hessian sum in a child (default: 1.0)
    pub min_child_weight: f64,
    /// Fraction of rows drawn per round (default: 1.0)
    pub subsample: f64,
    /// Random seed for row subsampling (default: 42)
    pub seed: u64,
}

impl Default for BoostingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: 6,
            learning_rate: 0.3,
            lambda: 1.0,
            gamma: 0.0,
            min_child_weight: 1.0,
            subsample: 1.0,
            seed: 42,
        }
    }
}

impl BoostingConfig {
    fn validate(&self) -> Result<()> {
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(ModelError::InvalidParameter(format!(
                "learning_rate must be in (0, 1], got {}",
                self.learning_rate
            )));
        }
        if !(self.subsample > 0.0 && self.subsample <= 1.0) {
            return Err(ModelError::InvalidParameter(format!(
                "subsample must be in (0, 1], got {}",
                self.subsample
            )));
        }
        if self.lambda < 0.0 || self.gamma < 0.0 || self.min_child_weight < 0.0 {
            return Err(ModelError::InvalidParameter(
                "lambda, gamma and min_child_weight must be non-negative".to_string(),
            ));
        }
        Ok(())
    }

    const fn tree_params(&self) -> TreeParams {
        TreeParams {
            max_depth: self.max_depth,
            lambda: self.lambda,
            gamma: self.gamma,
            min_child_weight: self.min_child_weight,
        }
    }
}

/// Fitted tree ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingRegressor {
    base_score: f64,
    learning_rate: f64,
    n_features: usize,
    trees: Vec<RegressionTree>,
}

impl GradientBoostingRegressor {
    /// Fit on rows of `x` against `y`.
    pub fn fit(config: &BoostingConfig, x: &Array2<f64>, y: &[f64]) -> Result<Self> {
        config.validate()?;
        let n = x.nrows();
        if y.len() != n {
            return Err(ModelError::DimensionMismatch {
                expected: n,
                actual: y.len(),
            });
        }
        if n == 0 {
            return Err(ModelError::InsufficientData {
                required: 1,
                actual: 0,
            });
        }
        if x.iter().chain(y).any(|v| !v.is_finite()) {
            return Err(ModelError::InvalidParameter(
                "training data must be finite".to_string(),
            ));
        }

        let base_score = y.iter().sum::<f64>() / n as f64;
        let mut prediction = vec![base_score; n];
        let hess = vec![1.0; n];
        let mut rng = StdRng::seed_from_u64(config.seed);
        let draw = ((n as f64 * config.subsample).ceil() as usize).clamp(1, n);
        let params = config.tree_params();

        let mut trees = Vec::with_capacity(config.n_estimators);
        for round in 0..config.n_estimators {
            let grad: Vec<f64> = prediction.iter().zip(y).map(|(p, t)| p - t).collect();
            let rows: Vec<usize> = if draw < n {
                let mut rows = sample(&mut rng, n, draw).into_vec();
                rows.sort_unstable();
                rows
            } else {
                (0..n).collect()
            };

            let tree = RegressionTree::fit(x, &grad, &hess, &rows, params);
            for (i, p) in prediction.iter_mut().enumerate() {
                *p += config.learning_rate * tree.predict_row(x.row(i));
            }
            if round % 25 == 0 {
                let mse = prediction
                    .iter()
                    .zip(y)
                    .map(|(p, t)| (p - t).powi(2))
                    .sum::<f64>()
                    / n as f64;
                debug!(round, mse, leaves = tree.n_leaves(), "boosting round");
            }
            trees.push(tree);
        }

        Ok(Self {
            base_score,
            learning_rate: config.learning_rate,
            n_features: x.ncols(),
            trees,
        })
    }

    /// Predict one value per row of `x`.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Vec<f64>> {
        if x.ncols() != self.n_features {
            return Err(ModelError::DimensionMismatch {
                expected: self.n_features,
                actual: x.ncols(),
            });
        }
        Ok(x.rows()
            .into_iter()
            .map(|row| {
                self.base_score
                    + self.learning_rate
                        * self
                            .trees
                            .iter()
                            .map(|tree| tree.predict_row(row))
                            .sum::<f64>()
            })
            .collect())
    }

    /// Number of trees.
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Number of input features.
    pub const fn n_features(&self) -> usize {
        self.n_features
    }

    /// Mean of the training target.
    pub const fn base_score(&self) -> f64 {
        self.base_score
    }

    /// Deepest tree in the ensemble.
    pub fn max_depth(&self) -> usize {
        self.trees.iter().map(RegressionTree::depth).max().unwrap_or(0)
    }
}
