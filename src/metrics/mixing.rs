//! Tumor/immune mixing score.
//!
//! Ratio of tumor↔immune edges to immune↔immune edges. Low values mean the
//! immune cells keep to themselves (compartmentalized), high values mean they
//! are interspersed with the tumor (mixed).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::SpatialGraph;
use crate::Error;

/// Fewer immune cells than this and the ratio is too noisy to report.
pub const IMMUNE_FLOOR: usize = 250;

/// Scores strictly below this are compartmentalized.
pub const COMPARTMENTALIZED_BELOW: f64 = 0.22;

/// Reported in place of a score when the immune population is below the floor.
pub const COLD_SENTINEL: f64 = -1.0;

/// Spatial phenotype of the tumor-immune interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MixingPhenotype {
    /// Also covers "not enough immune cells to tell".
    Cold,
    Compartmentalized,
    Mixed,
}

impl MixingPhenotype {
    pub fn as_str(self) -> &'static str {
        match self {
            MixingPhenotype::Cold => "Cold",
            MixingPhenotype::Compartmentalized => "Compartmentalized",
            MixingPhenotype::Mixed => "Mixed",
        }
    }
}

impl fmt::Display for MixingPhenotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MixingPhenotype {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Cold" => Ok(MixingPhenotype::Cold),
            "Compartmentalized" => Ok(MixingPhenotype::Compartmentalized),
            "Mixed" => Ok(MixingPhenotype::Mixed),
            other => Err(Error::InvalidInput(format!("unknown mixing phenotype {other:?}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MixingOutcome {
    /// Immune population below the floor.
    InsufficientData,
    /// No immune↔immune edges, so the ratio has no denominator.
    Undefined,
    Score(f64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixingScore {
    pub immune_cells: usize,
    pub tumor_immune_edges: usize,
    pub immune_immune_edges: usize,
    pub outcome: MixingOutcome,
    pub phenotype: Option<MixingPhenotype>,
}

impl MixingScore {
    /// Count interface edges and classify.
    pub fn compute(graph: &SpatialGraph, immune_floor: usize, compartmentalized_below: f64) -> Self {
        let immune_cells = graph.nodes().iter().filter(|n| n.phenotype.is_immune()).count();

        let mut tumor_immune_edges = 0;
        let mut immune_immune_edges = 0;
        for (i, j) in graph.edges() {
            let (a, b) = (graph.phenotype(i), graph.phenotype(j));
            if a.is_immune() && b.is_immune() {
                immune_immune_edges += 1;
            } else if (a.is_tumor() && b.is_immune()) || (a.is_immune() && b.is_tumor()) {
                tumor_immune_edges += 1;
            }
        }

        let (outcome, phenotype) = if immune_cells < immune_floor {
            (MixingOutcome::InsufficientData, Some(MixingPhenotype::Cold))
        } else if immune_immune_edges == 0 {
            (MixingOutcome::Undefined, None)
        } else {
            let score = tumor_immune_edges as f64 / immune_immune_edges as f64;
            let phenotype = if score < compartmentalized_below {
                MixingPhenotype::Compartmentalized
            } else {
                MixingPhenotype::Mixed
            };
            (MixingOutcome::Score(score), Some(phenotype))
        };

        debug!(immune_cells, tumor_immune_edges, immune_immune_edges, ?outcome, "mixing score");
        Self { immune_cells, tumor_immune_edges, immune_immune_edges, outcome, phenotype }
    }

    /// The reportable number: the score, `-1` below the floor, `None` when undefined.
    pub fn value(&self) -> Option<f64> {
        match self.outcome {
            MixingOutcome::InsufficientData => Some(COLD_SENTINEL),
            MixingOutcome::Undefined => None,
            MixingOutcome::Score(s) => Some(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CellId, CellNode, Phenotype};

    /// `immune` B cells and 20 tumor cells wired with exactly the requested
    /// tumor↔immune and immune↔immune edge counts.
    fn synthetic(immune: u64, tumor_immune: u64, immune_immune: u64) -> SpatialGraph {
        let mut nodes: Vec<CellNode> = (0..immune).map(|i| CellNode::new(i, 0.0, 0.0, Phenotype::BCell)).collect();
        nodes.extend((0..20).map(|t| CellNode::new(10_000 + t, 0.0, 0.0, Phenotype::Tumor)));
        let mut edges = Vec::new();
        for k in 0..tumor_immune {
            edges.push((CellId(10_000 + k % 20), CellId(k)));
        }
        for k in 0..immune_immune {
            edges.push((CellId(2 * k), CellId(2 * k + 1)));
        }
        SpatialGraph::from_parts(nodes, edges).unwrap()
    }

    #[test]
    fn test_compartmentalized() {
        let m = MixingScore::compute(&synthetic(300, 10, 50), IMMUNE_FLOOR, COMPARTMENTALIZED_BELOW);
        assert_eq!(m.immune_cells, 300);
        assert_eq!(m.tumor_immune_edges, 10);
        assert_eq!(m.immune_immune_edges, 50);
        assert_eq!(m.outcome, MixingOutcome::Score(0.2));
        assert_eq!(m.phenotype, Some(MixingPhenotype::Compartmentalized));
        assert_eq!(m.value(), Some(0.2));
    }

    #[test]
    fn test_cold_below_floor() {
        let m = MixingScore::compute(&synthetic(200, 10, 50), IMMUNE_FLOOR, COMPARTMENTALIZED_BELOW);
        assert_eq!(m.outcome, MixingOutcome::InsufficientData);
        assert_eq!(m.phenotype, Some(MixingPhenotype::Cold));
        assert_eq!(m.value(), Some(-1.0));
    }

    #[test]
    fn test_mixed_at_cutoff() {
        // 11 / 50 = 0.22 is not below the cutoff.
        let m = MixingScore::compute(&synthetic(300, 11, 50), IMMUNE_FLOOR, COMPARTMENTALIZED_BELOW);
        assert_eq!(m.phenotype, Some(MixingPhenotype::Mixed));
    }

    #[test]
    fn test_undefined_without_immune_pairs() {
        let m = MixingScore::compute(&synthetic(300, 10, 0), IMMUNE_FLOOR, COMPARTMENTALIZED_BELOW);
        assert_eq!(m.outcome, MixingOutcome::Undefined);
        assert_eq!(m.phenotype, None);
        assert_eq!(m.value(), None);
    }

    #[test]
    fn test_regulatory_t_cells_are_not_immune_here() {
        let nodes = vec![
            CellNode::new(0, 0.0, 0.0, Phenotype::RegulatoryT),
            CellNode::new(1, 0.0, 0.0, Phenotype::Tumor),
            CellNode::new(2, 0.0, 0.0, Phenotype::TCell),
            CellNode::new(3, 0.0, 0.0, Phenotype::Macrophage),
        ];
        let edges = [(0, 1), (0, 2), (1, 2), (2, 3)].map(|(a, b)| (CellId(a), CellId(b)));
        let g = SpatialGraph::from_parts(nodes, edges).unwrap();
        let m = MixingScore::compute(&g, 1, COMPARTMENTALIZED_BELOW);
        assert_eq!(m.immune_cells, 2);
        assert_eq!(m.tumor_immune_edges, 1);
        assert_eq!(m.immune_immune_edges, 1);
        assert_eq!(m.value(), Some(1.0));
    }
}
