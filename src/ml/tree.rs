//! CART decision tree
//!
//! Binary splits of the form `x[feature] <= threshold`. Used with the Gini
//! criterion as the base learner of the random forest and with squared error
//! as the stage learner of gradient boosting. Nodes live in a flat arena so
//! deep trees serialize without recursion.

use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Split quality measure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Criterion {
    /// Binary Gini impurity; targets must be 0/1 and leaves hold P(class 1)
    Gini,
    /// Variance reduction; leaves hold the mean target
    SquaredError,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    pub criterion: Criterion,
    /// `None` grows until leaves are pure or too small to split
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features examined per split (`None` = all)
    pub max_features: Option<usize>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            criterion: Criterion::Gini,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    n_features: usize,
    /// Unnormalized weighted impurity decrease per feature
    importances: Vec<f64>,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    decrease: f64,
}

/// Running sums for one side of a split
#[derive(Clone, Copy, Default)]
struct Stats {
    n: f64,
    sum: f64,
    sum_sq: f64,
}

impl Stats {
    fn add(&mut self, y: f64) {
        self.n += 1.0;
        self.sum += y;
        self.sum_sq += y * y;
    }

    fn sub(&mut self, y: f64) {
        self.n -= 1.0;
        self.sum -= y;
        self.sum_sq -= y * y;
    }

    fn impurity(&self, criterion: Criterion) -> f64 {
        if self.n <= 0.0 {
            return 0.0;
        }
        match criterion {
            Criterion::Gini => {
                let p = self.sum / self.n;
                2.0 * p * (1.0 - p)
            }
            Criterion::SquaredError => {
                let mean = self.sum / self.n;
                (self.sum_sq / self.n - mean * mean).max(0.0)
            }
        }
    }

    fn mean(&self) -> f64 {
        if self.n <= 0.0 {
            0.0
        } else {
            self.sum / self.n
        }
    }
}

impl DecisionTree {
    /// Fit on the rows of `x` listed in `indices` (duplicates allowed, which
    /// is how bootstrap samples are expressed).
    pub fn fit(
        x: &[Vec<f64>],
        y: &[f64],
        indices: &[usize],
        config: &TreeConfig,
        rng: &mut ChaCha8Rng,
    ) -> Self {
        let n_features = x.first().map(|r| r.len()).unwrap_or(0);
        let mut tree = Self {
            nodes: Vec::new(),
            n_features,
            importances: vec![0.0; n_features],
        };
        let mut idx = indices.to_vec();
        tree.build(x, y, &mut idx, 0, config, rng);
        tree
    }

    fn build(
        &mut self,
        x: &[Vec<f64>],
        y: &[f64],
        idx: &mut [usize],
        depth: usize,
        config: &TreeConfig,
        rng: &mut ChaCha8Rng,
    ) -> usize {
        let mut stats = Stats::default();
        for &i in idx.iter() {
            stats.add(y[i]);
        }
        let impurity = stats.impurity(config.criterion);

        let depth_reached = config.max_depth.is_some_and(|d| depth >= d);
        if depth_reached
            || idx.len() < config.min_samples_split
            || idx.len() < 2 * config.min_samples_leaf
            || impurity <= 1e-12
        {
            return self.push(Node::Leaf { value: stats.mean() });
        }

        let Some(split) = self.best_split(x, y, idx, &stats, impurity, config, rng) else {
            return self.push(Node::Leaf { value: stats.mean() });
        };

        self.importances[split.feature] += split.decrease;

        // Partition in place: left half holds x <= threshold
        let mut mid = 0;
        for k in 0..idx.len() {
            if x[idx[k]][split.feature] <= split.threshold {
                idx.swap(k, mid);
                mid += 1;
            }
        }
        if mid == 0 || mid == idx.len() {
            return self.push(Node::Leaf { value: stats.mean() });
        }

        let node_id = self.push(Node::Leaf { value: stats.mean() });
        let (left_idx, right_idx) = idx.split_at_mut(mid);
        let left = self.build(x, y, left_idx, depth + 1, config, rng);
        let right = self.build(x, y, right_idx, depth + 1, config, rng);
        self.nodes[node_id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        node_id
    }

    #[allow(clippy::too_many_arguments)]
    fn best_split(
        &self,
        x: &[Vec<f64>],
        y: &[f64],
        idx: &[usize],
        parent: &Stats,
        parent_impurity: f64,
        config: &TreeConfig,
        rng: &mut ChaCha8Rng,
    ) -> Option<SplitCandidate> {
        let mut features: Vec<usize> = (0..self.n_features).collect();
        features.shuffle(rng);
        let max_features = config.max_features.unwrap_or(self.n_features).max(1);

        let n = idx.len() as f64;
        let min_leaf = config.min_samples_leaf.max(1);
        let mut best: Option<SplitCandidate> = None;
        let mut visited = 0;
        let mut order: Vec<usize> = idx.to_vec();

        for &f in &features {
            // Keep drawing past constant features until enough real candidates were seen
            if visited >= max_features {
                break;
            }
            order.sort_by(|&a, &b| x[a][f].total_cmp(&x[b][f]));
            let first = x[order[0]][f];
            let last = x[order[order.len() - 1]][f];
            if first == last {
                continue;
            }
            visited += 1;

            let mut left = Stats::default();
            let mut right = *parent;
            for pos in 0..order.len() - 1 {
                let i = order[pos];
                left.add(y[i]);
                right.sub(y[i]);

                let here = x[i][f];
                let next = x[order[pos + 1]][f];
                if here == next {
                    continue;
                }
                let n_left = pos + 1;
                if n_left < min_leaf || order.len() - n_left < min_leaf {
                    continue;
                }

                let child = left.n * left.impurity(config.criterion)
                    + right.n * right.impurity(config.criterion);
                let decrease = n * parent_impurity - child;

                if best.as_ref().is_none_or(|b| decrease > b.decrease) {
                    let mut threshold = (here + next) / 2.0;
                    if threshold >= next {
                        threshold = here;
                    }
                    best = Some(SplitCandidate {
                        feature: f,
                        threshold,
                        decrease: decrease.max(0.0),
                    });
                }
            }
        }

        best
    }

    fn push(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Arena index of the leaf a sample falls into
    pub fn apply(&self, features: &[f64]) -> usize {
        let mut id = 0;
        loop {
            match &self.nodes[id] {
                Node::Leaf { .. } => return id,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    id = if features[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Leaf value for a sample
    pub fn predict(&self, features: &[f64]) -> f64 {
        if self.nodes.is_empty() {
            return 0.0;
        }
        match &self.nodes[self.apply(features)] {
            Node::Leaf { value } => *value,
            Node::Split { .. } => 0.0,
        }
    }

    /// Overwrite a leaf value (gradient boosting uses Newton-step leaves)
    pub fn set_leaf_value(&mut self, leaf: usize, new_value: f64) {
        if let Some(Node::Leaf { value }) = self.nodes.get_mut(leaf) {
            *value = new_value;
        }
    }

    pub fn raw_importances(&self) -> &[f64] {
        &self.importances
    }

    /// Importances normalized to sum to 1 (all zero for a single-leaf tree)
    pub fn feature_importances(&self) -> Vec<f64> {
        normalize(&self.importances)
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], id: usize) -> usize {
            match &nodes[id] {
                Node::Leaf { .. } => 1,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }
}

pub(crate) fn normalize(values: &[f64]) -> Vec<f64> {
    let sum: f64 = values.iter().sum();
    if sum > 0.0 {
        values.iter().map(|v| v / sum).collect()
    } else {
        vec![0.0; values.len()]
    }
}
