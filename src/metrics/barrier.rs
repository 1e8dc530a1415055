//! Stromal barrier.
//!
//! For each cell of an immune phenotype, find the nearest tumor cell at
//! least two hops away and count the stromal (`Other`) cells on one shortest
//! path to it. A tumor cell in direct contact does not count as barriered,
//! and neither does anything reachable only through contact at one hop.
//! The phenotype-level barrier is the mean count over cells that found such
//! a tumor cell.

use rayon::prelude::*;
use tracing::debug;

use super::traversal::nearest_matching;
use crate::model::{CellId, CellPath, Phenotype, SpatialGraph};

/// Paths shorter than this are direct contact, not a barrier.
pub const MIN_BARRIER_HOPS: usize = 2;

/// Result for one immune cell.
#[derive(Debug, Clone, PartialEq)]
pub struct BarrierMeasurement {
    pub cell: CellId,
    pub tumor: CellId,
    pub path: CellPath,
    /// `Other` cells on `path`. Endpoints are immune and tumor, so counting
    /// them or not gives the same number.
    pub stromal_cells: usize,
}

impl BarrierMeasurement {
    pub fn hops(&self) -> usize {
        self.path.len()
    }
}

/// Barrier for a whole phenotype.
#[derive(Debug, Clone, PartialEq)]
pub struct StromalBarrier {
    pub phenotype: Phenotype,
    /// Cells of `phenotype` in the graph.
    pub cells: usize,
    /// Cells that produced a measurement.
    pub measured: usize,
    /// `None` when no cell produced a measurement.
    pub mean: Option<f64>,
}

impl StromalBarrier {
    pub fn compute(graph: &SpatialGraph, phenotype: Phenotype) -> Self {
        let cells = graph.indices_of(phenotype);
        if !graph.nodes().iter().any(|n| n.phenotype.is_tumor()) {
            debug!(%phenotype, cells = cells.len(), "no tumor cells, stromal barrier undefined");
            return Self { phenotype, cells: cells.len(), measured: 0, mean: None };
        }
        let measurements = measure_all(graph, &cells);

        // Summed in node order so the result does not depend on scheduling.
        let total: usize = measurements.iter().map(|m| m.stromal_cells).sum();
        let mean = if measurements.is_empty() {
            None
        } else {
            Some(total as f64 / measurements.len() as f64)
        };

        debug!(%phenotype, cells = cells.len(), measured = measurements.len(), ?mean, "stromal barrier");
        Self { phenotype, cells: cells.len(), measured: measurements.len(), mean }
    }
}

/// Measure every cell in `cells` (node indices), in parallel. Cells with no
/// eligible tumor are left out; order follows `cells`.
pub fn measure_all(graph: &SpatialGraph, cells: &[usize]) -> Vec<BarrierMeasurement> {
    cells
        .par_iter()
        .map(|&v| measure_from(graph, v))
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect()
}

/// Nearest eligible tumor from one cell. All search state is local to this
/// call, so results for different cells never influence each other.
pub fn measure_from(graph: &SpatialGraph, cell: usize) -> Option<BarrierMeasurement> {
    let path = nearest_matching(graph, cell, MIN_BARRIER_HOPS, |v| graph.phenotype(v).is_tumor())?;
    Some(BarrierMeasurement {
        cell: graph.node(cell).id,
        tumor: graph.node(path.end()).id,
        stromal_cells: path.count_phenotype(graph, Phenotype::Other),
        path,
    })
}
