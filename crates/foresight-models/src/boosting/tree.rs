//! Second-order regression trees grown by exact greedy split search.

use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// Growth constraints for one tree.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TreeParams {
    pub(crate) max_depth: usize,
    pub(crate) lambda: f64,
    pub(crate) gamma: f64,
    pub(crate) min_child_weight: f64,
}

/// A node in the tree arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) enum Node {
    Leaf {
        weight: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Regression tree stored as a flat arena rooted at index 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct RegressionTree {
    nodes: Vec<Node>,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

struct Grower<'a> {
    x: &'a Array2<f64>,
    grad: &'a [f64],
    hess: &'a [f64],
    params: TreeParams,
    nodes: Vec<Node>,
}

impl Grower<'_> {
    fn score(&self, g: f64, h: f64) -> f64 {
        g * g / (h + self.params.lambda)
    }

    fn best_split(&self, rows: &[usize], g_total: f64, h_total: f64) -> Option<Candidate> {
        let parent = self.score(g_total, h_total);
        let mut best: Option<Candidate> = None;

        for feature in 0..self.x.ncols() {
            let mut sorted = rows.to_vec();
            sorted.sort_by(|&a, &b| self.x[[a, feature]].total_cmp(&self.x[[b, feature]]));

            let (mut g_left, mut h_left) = (0.0, 0.0);
            for pair in sorted.windows(2) {
                let (row, next) = (pair[0], pair[1]);
                g_left += self.grad[row];
                h_left += self.hess[row];

                let (value, next_value) = (self.x[[row, feature]], self.x[[next, feature]]);
                if value == next_value {
                    continue;
                }
                let (g_right, h_right) = (g_total - g_left, h_total - h_left);
                if h_left < self.params.min_child_weight || h_right < self.params.min_child_weight
                {
                    continue;
                }

                let gain = 0.5
                    * (self.score(g_left, h_left) + self.score(g_right, h_right) - parent)
                    - self.params.gamma;
                if gain > best.map_or(0.0, |b| b.gain) {
                    best = Some(Candidate {
                        feature,
                        threshold: 0.5 * (value + next_value),
                        gain,
                    });
                }
            }
        }
        best
    }

    fn grow(&mut self, rows: &[usize], depth: usize) -> usize {
        let g: f64 = rows.iter().map(|&r| self.grad[r]).sum();
        let h: f64 = rows.iter().map(|&r| self.hess[r]).sum();
        let index = self.nodes.len();
        self.nodes.push(Node::Leaf {
            weight: -g / (h + self.params.lambda),
        });

        if depth >= self.params.max_depth || rows.len() < 2 {
            return index;
        }
        let Some(split) = self.best_split(rows, g, h) else {
            return index;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .iter()
            .copied()
            .partition(|&r| self.x[[r, split.feature]] < split.threshold);
        let left = self.grow(&left_rows, depth + 1);
        let right = self.grow(&right_rows, depth + 1);
        self.nodes[index] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        index
    }
}

impl RegressionTree {
    /// Grow a tree on `rows` of `x` against first and second order gradients.
    pub(crate) fn fit(
        x: &Array2<f64>,
        grad: &[f64],
        hess: &[f64],
        rows: &[usize],
        params: TreeParams,
    ) -> Self {
        let mut grower = Grower {
            x,
            grad,
            hess,
            params,
            nodes: Vec::new(),
        };
        grower.grow(rows, 0);
        Self {
            nodes: grower.nodes,
        }
    }

    /// Leaf weight for one feature row.
    pub(crate) fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut index = 0;
        loop {
            match self.nodes.get(index) {
                Some(Node::Leaf { weight }) => return *weight,
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    index = if row[*feature] < *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                None => return 0.0,
            }
        }
    }

    /// Number of leaves.
    pub(crate) fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    /// Depth of the deepest leaf; a single leaf has depth 0.
    pub(crate) fn depth(&self) -> usize {
        fn walk(nodes: &[Node], index: usize) -> usize {
            match nodes.get(index) {
                Some(Node::Split { left, right, .. }) => {
                    1 + walk(nodes, *left).max(walk(nodes, *right))
                }
                _ => 0,
            }
        }
        walk(&self.nodes, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    const PARAMS: TreeParams = TreeParams {
        max_depth: 6,
        lambda: 0.0,
        gamma: 0.0,
        min_child_weight: 0.0,
    };

    #[test]
    fn test_step_function_single_split() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = [0.0, 0.0, 10.0, 10.0];
        // Squared error at prediction 0: grad = -y, hess = 1.
        let grad: Vec<f64> = y.iter().map(|v| -v).collect();
        let hess = vec![1.0; 4];
        let tree = RegressionTree::fit(&x, &grad, &hess, &[0, 1, 2, 3], PARAMS);

        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.n_leaves(), 2);
        assert_abs_diff_eq!(tree.predict_row(x.row(0)), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(tree.predict_row(x.row(3)), 10.0, epsilon = 1e-12);
        assert_abs_diff_eq!(tree.predict_row(array![2.6].view()), 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_depth_limit() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let grad = [-1.0, -2.0, -3.0, -4.0];
        let params = TreeParams {
            max_depth: 0,
            ..PARAMS
        };
        let tree = RegressionTree::fit(&x, &grad, &[1.0; 4], &[0, 1, 2, 3], params);

        assert_eq!(tree.n_leaves(), 1);
        assert_abs_diff_eq!(tree.predict_row(x.row(0)), 2.5, epsilon = 1e-12);
    }

    #[test]
    fn test_constant_feature_never_splits() {
        let x = array![[5.0], [5.0], [5.0]];
        let tree = RegressionTree::fit(&x, &[-1.0, 0.0, 1.0], &[1.0; 3], &[0, 1, 2], PARAMS);
        assert_eq!(tree.n_leaves(), 1);
    }
}
