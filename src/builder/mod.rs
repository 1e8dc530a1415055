//! # Spatial Graph Builder
//!
//! Turns a list of classified cells into a [`SpatialGraph`] with an edge
//! between every pair strictly closer than the interaction radius.
//!
//! ```text
//! cells ──► validate ──► neighbor scan (brute force | uniform grid) ──► SpatialGraph
//!                              rayon tasks, one edge buffer each
//! ```
//!
//! Both scan strategies test the same predicate, `sqrt(dx² + dy²) < radius`,
//! so they produce the identical edge set. The predicate is symmetric in its
//! arguments, which makes the edge set independent of input order.

mod grid;

use std::io::Read;

use hashbrown::HashSet;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AnalysisConfig;
use crate::model::{CellNode, Phenotype, SpatialGraph};
use crate::{Error, Result};

use grid::UniformGrid;

/// Cell-interaction radius in micrometers.
pub const DEFAULT_INTERACTION_RADIUS_UM: f64 = 35.0;

/// Largest input for which `Auto` enumerates every pair.
pub const DEFAULT_BRUTE_FORCE_LIMIT: usize = 2048;

// ============================================================================
// Input records
// ============================================================================

/// One cleaned input row: `id,x,y,phenotype`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellRecord {
    pub id: u64,
    pub x: f64,
    pub y: f64,
    pub phenotype: Phenotype,
}

impl From<CellRecord> for CellNode {
    fn from(r: CellRecord) -> Self {
        CellNode::new(r.id, r.x, r.y, r.phenotype)
    }
}

/// Read cells from a headed CSV table with columns `id,x,y,phenotype`.
pub fn read_cells_csv<R: Read>(reader: R) -> Result<Vec<CellNode>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut cells = Vec::new();
    for record in rdr.deserialize::<CellRecord>() {
        cells.push(record?.into());
    }
    Ok(cells)
}

// ============================================================================
// Builder
// ============================================================================

/// How candidate pairs are enumerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeighborStrategy {
    /// Brute force up to the configured limit, grid above it.
    #[default]
    Auto,
    /// Test all N·(N−1)/2 pairs.
    BruteForce,
    /// Bucket cells into a uniform grid and test adjacent buckets only.
    Grid,
}

#[derive(Debug, Clone)]
pub struct SpatialGraphBuilder {
    radius: f64,
    brute_force_limit: usize,
    strategy: NeighborStrategy,
}

impl Default for SpatialGraphBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_INTERACTION_RADIUS_UM)
    }
}

impl SpatialGraphBuilder {
    pub fn new(radius: f64) -> Self {
        Self {
            radius,
            brute_force_limit: DEFAULT_BRUTE_FORCE_LIMIT,
            strategy: NeighborStrategy::Auto,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(config.interaction_radius_um).with_brute_force_limit(config.brute_force_limit)
    }

    pub fn with_brute_force_limit(mut self, limit: usize) -> Self {
        self.brute_force_limit = limit;
        self
    }

    pub fn with_strategy(mut self, strategy: NeighborStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Build the proximity graph. Nodes keep their input order.
    pub fn build(&self, cells: Vec<CellNode>) -> Result<SpatialGraph> {
        self.validate(&cells)?;

        let strategy = match self.strategy {
            NeighborStrategy::Auto if cells.len() <= self.brute_force_limit => NeighborStrategy::BruteForce,
            NeighborStrategy::Auto => NeighborStrategy::Grid,
            fixed => fixed,
        };

        let pairs = match strategy {
            NeighborStrategy::Grid => {
                let grid = UniformGrid::new(&cells, self.radius);
                debug!(buckets = grid.bucket_count(), "bucketed cells");
                grid.pairs_within(&cells, self.radius)
            }
            _ => brute_force_pairs(&cells, self.radius),
        };

        debug!(cells = cells.len(), edges = pairs.len(), ?strategy, radius = self.radius, "built spatial graph");
        SpatialGraph::from_index_pairs(cells, pairs)
    }

    fn validate(&self, cells: &[CellNode]) -> Result<()> {
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "interaction radius must be positive and finite, got {}",
                self.radius
            )));
        }
        let mut seen = HashSet::with_capacity(cells.len());
        for cell in cells {
            if !cell.x.is_finite() || !cell.y.is_finite() {
                return Err(Error::InvalidInput(format!(
                    "cell {} has non-finite position ({}, {})",
                    cell.id, cell.x, cell.y
                )));
            }
            if !seen.insert(cell.id) {
                return Err(Error::InvalidInput(format!("duplicate cell id {}", cell.id)));
            }
        }
        Ok(())
    }
}

/// The edge predicate. Strict: a pair exactly `radius` apart is not connected.
#[inline]
fn within(a: &CellNode, b: &CellNode, radius: f64) -> bool {
    a.distance(b) < radius
}

fn brute_force_pairs(cells: &[CellNode], radius: f64) -> Vec<(u32, u32)> {
    (0..cells.len())
        .into_par_iter()
        .flat_map_iter(|i| {
            let a = &cells[i];
            ((i + 1)..cells.len())
                .filter(move |&j| within(a, &cells[j], radius))
                .map(move |j| (i as u32, j as u32))
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
