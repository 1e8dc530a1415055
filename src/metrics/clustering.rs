//! Stromal clustering coefficient.
//!
//! Average local clustering over the subgraph induced by `Other` cells. A
//! node with fewer than two stromal neighbors scores 0 and still counts
//! toward the average.

use rayon::prelude::*;
use tracing::debug;

use crate::model::{Phenotype, SpatialGraph};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StromalClustering {
    pub stromal_cells: usize,
    /// `None` when there are no stromal cells to average over.
    pub average: Option<f64>,
}

impl StromalClustering {
    pub fn compute(graph: &SpatialGraph) -> Self {
        let members = graph.indices_of(Phenotype::Other);
        let coefficients: Vec<f64> = members
            .par_iter()
            .map(|&v| local_clustering(graph, v, |u| graph.phenotype(u).is_stromal()))
            .collect();

        // Summed in node order so the result does not depend on scheduling.
        let average = if coefficients.is_empty() {
            None
        } else {
            Some(coefficients.iter().sum::<f64>() / coefficients.len() as f64)
        };

        debug!(stromal_cells = members.len(), ?average, "stromal clustering");
        Self { stromal_cells: members.len(), average }
    }
}

/// Clustering coefficient of `v` within the subgraph induced by `member`.
pub fn local_clustering<F>(graph: &SpatialGraph, v: usize, member: F) -> f64
where
    F: Fn(usize) -> bool,
{
    let nbrs: Vec<usize> = graph
        .neighbors(v)
        .iter()
        .map(|&u| u as usize)
        .filter(|&u| member(u))
        .collect();
    let k = nbrs.len();
    if k < 2 {
        return 0.0;
    }

    let mut links = 0usize;
    for (a, &u) in nbrs.iter().enumerate() {
        links += nbrs[a + 1..].iter().filter(|&&w| graph.has_edge(u, w)).count();
    }
    2.0 * links as f64 / (k * (k - 1)) as f64
}
