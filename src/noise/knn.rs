//! Distance-weighted k-nearest-neighbour regression over the mesh.
//!
//! The fitted model acts as a continuous noise field: a query point gets
//! the inverse-distance weighted mean of the noise sampled at its `k`
//! nearest lattice points. Two backends are available, a kd-tree and an
//! exhaustive scan; both order candidates by `(distance, mesh index)` and
//! therefore return the same neighbours.

use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;
use serde::Deserialize;
use tracing::{debug, warn};

use super::mesh::Coord;
use crate::config::ForecastConfig;
use crate::error::{GenerationError, Result};

/// Continuous field that can be evaluated at arbitrary mesh coordinates.
///
/// Implementations are shared read-only between per-load query tasks.
pub trait Interpolator: Sync {
    /// Evaluates the field at every point of `points`, in order.
    ///
    /// Must return exactly `points.len()` values.
    fn predict(&self, points: &[Coord]) -> Vec<f64>;
}

/// Nearest-neighbour search backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnnAlgorithm {
    /// Brute force when `k` covers half the mesh or more, kd-tree otherwise.
    #[default]
    Auto,
    /// Kd-tree with bounded leaves.
    #[serde(alias = "ball_tree")]
    KdTree,
    /// Exhaustive scan.
    #[serde(alias = "brute_force")]
    Brute,
}

/// Validated regressor settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnnParams {
    pub n_neighbors: usize,
    pub leaf_size: usize,
    pub algorithm: KnnAlgorithm,
}

impl KnnParams {
    /// Extracts the regressor settings from the forecast section.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the neighbour count is not
    /// positive, a horizon standard deviation is not positive, or any
    /// other forecast constraint is violated.
    pub fn from_config(cfg: &ForecastConfig) -> Result<Self> {
        let mut errors = Vec::new();
        cfg.check(&mut errors);
        if let Some(first) = errors.into_iter().next() {
            return Err(first.into());
        }
        Ok(Self {
            n_neighbors: cfg.n_neighbors as usize,
            leaf_size: cfg.leaf_size,
            algorithm: cfg.algorithm,
        })
    }
}

/// Squared distance paired with the mesh index it belongs to.
type Candidate = (OrderedFloat<f64>, usize);

fn squared_distance(a: &Coord, b: &Coord) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Fitted inverse-distance weighted kNN regressor.
#[derive(Debug, Clone)]
pub struct KnnRegressor {
    points: Vec<Coord>,
    values: Vec<f64>,
    k: usize,
    index: Index,
}

#[derive(Debug, Clone)]
enum Index {
    Brute,
    KdTree(KdTree),
}

impl KnnRegressor {
    /// Fits the regressor on `points -> values`.
    ///
    /// A neighbour count above the number of points is clamped.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::InvalidInput`] if there are no points or
    /// `points` and `values` differ in length, and a configuration error if
    /// `params.n_neighbors` or `params.leaf_size` is zero.
    pub fn fit(points: Vec<Coord>, values: Vec<f64>, params: KnnParams) -> Result<Self> {
        if params.n_neighbors == 0 {
            return Err(GenerationError::config("forecast.n_neighbors", "must be > 0"));
        }
        if params.leaf_size == 0 {
            return Err(GenerationError::config("forecast.leaf_size", "must be > 0"));
        }
        if points.is_empty() {
            return Err(GenerationError::InvalidInput(
                "cannot fit a correlation model on an empty mesh".into(),
            ));
        }
        if points.len() != values.len() {
            return Err(GenerationError::InvalidInput(format!(
                "{} mesh points but {} noise values",
                points.len(),
                values.len()
            )));
        }

        let n = points.len();
        let k = if params.n_neighbors > n {
            warn!(
                requested = params.n_neighbors,
                available = n,
                "neighbour count exceeds mesh size, clamping"
            );
            n
        } else {
            params.n_neighbors
        };

        let use_brute = match params.algorithm {
            KnnAlgorithm::Brute => true,
            KnnAlgorithm::KdTree => false,
            KnnAlgorithm::Auto => 2 * k >= n,
        };
        let index = if use_brute {
            Index::Brute
        } else {
            Index::KdTree(KdTree::build(&points, params.leaf_size))
        };
        debug!(points = n, k, brute = use_brute, "fitted correlation model");

        Ok(Self {
            points,
            values,
            k,
            index,
        })
    }

    /// Effective neighbour count after clamping.
    pub fn k(&self) -> usize {
        self.k
    }

    /// The `k` nearest mesh points to `query` as `(distance, mesh index)`,
    /// closest first.
    pub fn neighbors(&self, query: &Coord) -> Vec<(f64, usize)> {
        let candidates = match &self.index {
            Index::Brute => self.brute_neighbors(query),
            Index::KdTree(tree) => tree.neighbors(&self.points, query, self.k),
        };
        candidates
            .into_iter()
            .map(|(d2, i)| (d2.into_inner().sqrt(), i))
            .collect()
    }

    fn brute_neighbors(&self, query: &Coord) -> Vec<Candidate> {
        let mut all: Vec<Candidate> = self
            .points
            .iter()
            .enumerate()
            .map(|(i, p)| (OrderedFloat(squared_distance(p, query)), i))
            .collect();
        if self.k < all.len() {
            all.select_nth_unstable(self.k - 1);
            all.truncate(self.k);
        }
        all.sort_unstable();
        all
    }

    /// Weighted mean of the neighbour values, weights `1 / distance`.
    ///
    /// Neighbours at zero distance take all the weight.
    fn predict_one(&self, query: &Coord) -> f64 {
        let neighbors = self.neighbors(query);

        let exact: Vec<f64> = neighbors
            .iter()
            .filter(|(d, _)| *d == 0.0)
            .map(|(_, i)| self.values[*i])
            .collect();
        if !exact.is_empty() {
            return exact.iter().sum::<f64>() / exact.len() as f64;
        }

        let (num, den) = neighbors
            .iter()
            .fold((0.0, 0.0), |(num, den), (d, i)| {
                (num + self.values[*i] / d, den + 1.0 / d)
            });
        num / den
    }
}

impl Interpolator for KnnRegressor {
    fn predict(&self, points: &[Coord]) -> Vec<f64> {
        points.iter().map(|q| self.predict_one(q)).collect()
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        start: usize,
        end: usize,
    },
    Split {
        dim: usize,
        value: f64,
        left: usize,
        right: usize,
    },
}

/// Median-split kd-tree over point indices.
///
/// Points with coordinate `<= value` on the split axis live on the left,
/// `>= value` on the right.
#[derive(Debug, Clone)]
struct KdTree {
    order: Vec<usize>,
    nodes: Vec<Node>,
    root: usize,
}

impl KdTree {
    fn build(points: &[Coord], leaf_size: usize) -> Self {
        let mut tree = Self {
            order: (0..points.len()).collect(),
            nodes: Vec::new(),
            root: 0,
        };
        tree.root = tree.build_node(points, 0, points.len(), leaf_size);
        tree
    }

    fn build_node(&mut self, points: &[Coord], start: usize, end: usize, leaf_size: usize) -> usize {
        if end - start <= leaf_size {
            self.nodes.push(Node::Leaf { start, end });
            return self.nodes.len() - 1;
        }

        let dim = widest_axis(points, &self.order[start..end]);
        let mid = start + (end - start) / 2;
        self.order[start..end].select_nth_unstable_by(mid - start, |a, b| {
            points[*a][dim].total_cmp(&points[*b][dim]).then(a.cmp(b))
        });
        let value = points[self.order[mid]][dim];

        let left = self.build_node(points, start, mid, leaf_size);
        let right = self.build_node(points, mid, end, leaf_size);
        self.nodes.push(Node::Split {
            dim,
            value,
            left,
            right,
        });
        self.nodes.len() - 1
    }

    fn neighbors(&self, points: &[Coord], query: &Coord, k: usize) -> Vec<Candidate> {
        let mut heap = BinaryHeap::with_capacity(k + 1);
        self.search(self.root, points, query, k, &mut heap);
        heap.into_sorted_vec()
    }

    fn search(
        &self,
        node: usize,
        points: &[Coord],
        query: &Coord,
        k: usize,
        heap: &mut BinaryHeap<Candidate>,
    ) {
        match self.nodes[node] {
            Node::Leaf { start, end } => {
                for &i in &self.order[start..end] {
                    let candidate = (OrderedFloat(squared_distance(&points[i], query)), i);
                    if heap.len() < k {
                        heap.push(candidate);
                    } else if heap.peek().is_some_and(|worst| candidate < *worst) {
                        heap.pop();
                        heap.push(candidate);
                    }
                }
            }
            Node::Split {
                dim,
                value,
                left,
                right,
            } => {
                let diff = query[dim] - value;
                let (near, far) = if diff < 0.0 { (left, right) } else { (right, left) };
                self.search(near, points, query, k, heap);
                let plane = OrderedFloat(diff * diff);
                if heap.len() < k || heap.peek().is_some_and(|worst| plane <= worst.0) {
                    self.search(far, points, query, k, heap);
                }
            }
        }
    }
}

fn widest_axis(points: &[Coord], indices: &[usize]) -> usize {
    let mut lo = [f64::INFINITY; 4];
    let mut hi = [f64::NEG_INFINITY; 4];
    for &i in indices {
        for a in 0..4 {
            lo[a] = lo[a].min(points[i][a]);
            hi[a] = hi[a].max(points[i][a]);
        }
    }
    (0..4)
        .max_by(|a, b| (hi[*a] - lo[*a]).total_cmp(&(hi[*b] - lo[*b])))
        .unwrap_or(0)
}
