//! # Immune Architecture Metrics
//!
//! Read-only analyses over a [`SpatialGraph`]. Nothing here mutates the
//! graph, and repeated runs over the same graph give identical numbers.
//!
//! | Metric | Module | Undefined when |
//! |--------|--------|----------------|
//! | Mixing score | `mixing` | no immune↔immune edges |
//! | Stromal clustering | `clustering` | no stromal cells |
//! | Stromal barrier | `barrier` | no immune cell reaches a tumor cell in ≥ 2 hops |

pub mod barrier;
pub mod clustering;
pub mod mixing;
pub mod traversal;

use tracing::debug;

use crate::config::AnalysisConfig;
use crate::model::{Phenotype, SpatialGraph};

pub use barrier::{BarrierMeasurement, StromalBarrier, MIN_BARRIER_HOPS};
pub use clustering::StromalClustering;
pub use mixing::{MixingOutcome, MixingPhenotype, MixingScore};

/// All descriptors for one sample.
#[derive(Debug, Clone, PartialEq)]
pub struct ImmuneArchitecture {
    pub mixing: MixingScore,
    pub stromal_clustering: StromalClustering,
    /// One entry per [`Phenotype::TRACKED`], in that order.
    pub barriers: Vec<StromalBarrier>,
}

impl ImmuneArchitecture {
    pub fn compute(graph: &SpatialGraph, config: &AnalysisConfig) -> Self {
        let mixing = MixingScore::compute(graph, config.immune_floor, config.compartmentalized_below);
        let stromal_clustering = StromalClustering::compute(graph);
        let barriers = Phenotype::TRACKED
            .iter()
            .map(|&p| StromalBarrier::compute(graph, p))
            .collect();

        debug!(cells = graph.len(), edges = graph.edge_count(), "immune architecture computed");
        Self { mixing, stromal_clustering, barriers }
    }

    pub fn barrier(&self, phenotype: Phenotype) -> Option<&StromalBarrier> {
        self.barriers.iter().find(|b| b.phenotype == phenotype)
    }
}
