//! Cell node in the spatial graph.

use serde::{Deserialize, Serialize};
use super::Phenotype;

/// Stable cell identifier, unique within one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellId(pub u64);

impl std::fmt::Display for CellId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A classified cell: centroid in micrometers plus one canonical phenotype.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellNode {
    pub id: CellId,
    pub x: f64,
    pub y: f64,
    pub phenotype: Phenotype,
}

impl CellNode {
    pub fn new(id: u64, x: f64, y: f64, phenotype: Phenotype) -> Self {
        Self { id: CellId(id), x, y, phenotype }
    }

    /// Planar Euclidean distance in micrometers.
    pub fn distance(&self, other: &CellNode) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}
