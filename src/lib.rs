//! # tme-graph: Tumor-Immune Spatial Architecture
//!
//! Builds a proximity graph over classified cells from a tissue sample and
//! derives immune-architecture descriptors from it.
//!
//! ## Design Principles
//!
//! 1. **Graph is an arena**: `SpatialGraph` owns flat node and adjacency arrays;
//!    everything downstream borrows it read-only
//! 2. **Closed phenotypes**: `Phenotype` is an enum, never a string key
//! 3. **Undefined is not zero**: metrics with no denominator are `None`, not `0.0`
//! 4. **Store is a trait**: `GraphStore` is the persistence boundary between
//!    construction and analysis
//!
//! ## Quick Start
//!
//! ```rust
//! use tme_graph::{AnalysisConfig, CellNode, ImmuneArchitecture, Phenotype, SpatialGraphBuilder};
//!
//! # fn example() -> tme_graph::Result<()> {
//! let cells = vec![
//!     CellNode::new(1, 0.0, 0.0, Phenotype::Tumor),
//!     CellNode::new(2, 20.0, 0.0, Phenotype::Other),
//!     CellNode::new(3, 40.0, 0.0, Phenotype::TCell),
//! ];
//! let graph = SpatialGraphBuilder::new(35.0).build(cells)?;
//! let metrics = ImmuneArchitecture::compute(&graph, &AnalysisConfig::default());
//! assert_eq!(metrics.barrier(Phenotype::TCell).and_then(|b| b.mean), Some(1.0));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Graph Stores
//!
//! | Store | Format | Description |
//! |-------|--------|-------------|
//! | `GmlStore` | GML text | networkx-compatible, one file per sample |
//! | `JsonStore` | JSON | serde document with a creation timestamp |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod builder;
pub mod storage;
pub mod metrics;
pub mod report;
pub mod config;
pub mod pipeline;

// ============================================================================
// Re-exports: Model
// ============================================================================

pub use model::{CellId, CellNode, CellPath, Phenotype, SpatialGraph};

// ============================================================================
// Re-exports: Construction and storage
// ============================================================================

pub use builder::{CellRecord, NeighborStrategy, SpatialGraphBuilder, DEFAULT_INTERACTION_RADIUS_UM};
pub use storage::{GmlStore, GraphStore, JsonStore, StoreFormat};

// ============================================================================
// Re-exports: Metrics and reporting
// ============================================================================

pub use metrics::{
    ImmuneArchitecture, MixingOutcome, MixingPhenotype, MixingScore, StromalBarrier,
    StromalClustering,
};
pub use report::MetricsReport;
pub use config::AnalysisConfig;
pub use pipeline::{SampleInput, SampleOutcome};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown phenotype label: {0:?}")]
    UnknownPhenotype(String),

    #[error("Malformed graph: {reason}")]
    MalformedGraph { reason: String },

    #[error("GML parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
