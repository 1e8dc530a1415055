//! # Cell Graph Model
//!
//! Plain data types shared by every stage: builder ↔ store ↔ metrics ↔ report.
//!
//! Design rule: this module is pure data with no I/O or logging.

pub mod phenotype;
pub mod node;
pub mod graph;
pub mod path;

pub use phenotype::Phenotype;
pub use node::{CellId, CellNode};
pub use graph::{NeighborList, SpatialGraph};
pub use path::CellPath;
