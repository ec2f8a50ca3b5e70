//! CART decision tree on Gini impurity, grown on (possibly repeated)
//! sample indices so a forest can pass bootstrap draws directly.

use crate::rng::SignalRng;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeParams {
    pub max_depth:         Option<usize>,
    pub min_samples_split: usize,
    /// Features examined per split; more are examined if none of them splits.
    pub max_features:      usize,
}

#[derive(Debug, Clone)]
enum Node {
    Leaf { distribution: Vec<f64> },
    Split { feature: usize, threshold: f64, left: usize, right: usize },
}

#[derive(Debug, Clone)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

struct Candidate {
    feature:   usize,
    threshold: f64,
    score:     f64,
}

struct Grower<'a> {
    x:         &'a [Vec<f64>],
    y:         &'a [usize],
    n_classes: usize,
    params:    TreeParams,
    nodes:     Vec<Node>,
}

impl DecisionTree {
    /// Grow a tree on rows `samples` of `x` with class indices `y`.
    pub fn fit(
        x: &[Vec<f64>],
        y: &[usize],
        samples: Vec<usize>,
        n_classes: usize,
        params: TreeParams,
        rng: &mut SignalRng,
    ) -> Self {
        let mut grower = Grower { x, y, n_classes, params, nodes: Vec::new() };
        grower.grow(samples, 0, rng);
        Self { nodes: grower.nodes }
    }

    /// Class distribution of the leaf `row` falls into.
    pub fn predict_distribution(&self, row: &[f64]) -> &[f64] {
        let mut at = 0;
        loop {
            match &self.nodes[at] {
                Node::Leaf { distribution } => return distribution,
                Node::Split { feature, threshold, left, right } => {
                    at = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], at: usize) -> usize {
            match &nodes[at] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        walk(&self.nodes, 0)
    }
}

impl Grower<'_> {
    fn grow(&mut self, samples: Vec<usize>, depth: usize, rng: &mut SignalRng) -> usize {
        let counts = self.class_counts(&samples);
        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        let depth_reached = self.params.max_depth.is_some_and(|d| depth >= d);

        if pure || depth_reached || samples.len() < self.params.min_samples_split {
            return self.leaf(&counts, samples.len());
        }
        let Some(best) = self.best_split(&samples, rng) else {
            return self.leaf(&counts, samples.len());
        };

        let (left, right): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|&i| self.x[i][best.feature] <= best.threshold);

        let at = self.nodes.len();
        self.nodes.push(Node::Leaf { distribution: Vec::new() });
        let left = self.grow(left, depth + 1, rng);
        let right = self.grow(right, depth + 1, rng);
        self.nodes[at] = Node::Split { feature: best.feature, threshold: best.threshold, left, right };
        at
    }

    fn leaf(&mut self, counts: &[usize], n: usize) -> usize {
        let distribution = counts.iter().map(|&c| c as f64 / n as f64).collect();
        self.nodes.push(Node::Leaf { distribution });
        self.nodes.len() - 1
    }

    fn class_counts(&self, samples: &[usize]) -> Vec<usize> {
        let mut counts = vec![0; self.n_classes];
        for &i in samples {
            counts[self.y[i]] += 1;
        }
        counts
    }

    fn best_split(&self, samples: &[usize], rng: &mut SignalRng) -> Option<Candidate> {
        let width = self.x[samples[0]].len();
        let mut features: Vec<usize> = (0..width).collect();
        rng.shuffle(&mut features);

        let mut best: Option<Candidate> = None;
        for (examined, &feature) in features.iter().enumerate() {
            if examined >= self.params.max_features && best.is_some() {
                break;
            }
            if let Some(c) = self.best_threshold(samples, feature) {
                if best.as_ref().map_or(true, |b| c.score > b.score) {
                    best = Some(c);
                }
            }
        }
        best
    }

    /// Sweep sorted values of one feature. Score is Σ_side Σ_c n_c² / n_side,
    /// which is maximal where the weighted Gini impurity is minimal.
    fn best_threshold(&self, samples: &[usize], feature: usize) -> Option<Candidate> {
        let mut order: Vec<usize> = samples.to_vec();
        order.sort_by(|&a, &b| {
            self.x[a][feature]
                .partial_cmp(&self.x[b][feature])
                .unwrap_or(Ordering::Equal)
        });

        let n = order.len();
        let mut right = self.class_counts(&order);
        let mut left = vec![0usize; self.n_classes];
        let mut best: Option<Candidate> = None;

        for p in 1..n {
            let moved = self.y[order[p - 1]];
            left[moved] += 1;
            right[moved] -= 1;

            let lo = self.x[order[p - 1]][feature];
            let hi = self.x[order[p]][feature];
            if lo >= hi {
                continue;
            }
            let score = side_score(&left, p) + side_score(&right, n - p);
            if best.as_ref().map_or(true, |b| score > b.score) {
                let mut threshold = lo + (hi - lo) / 2.0;
                if threshold >= hi {
                    threshold = lo;
                }
                best = Some(Candidate { feature, threshold, score });
            }
        }
        best
    }
}

fn side_score(counts: &[usize], n: usize) -> f64 {
    let sum_sq: usize = counts.iter().map(|c| c * c).sum();
    sum_sq as f64 / n as f64
}
