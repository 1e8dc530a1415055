//! # Graph Store Trait
//!
//! The persistence boundary between graph construction and metric
//! computation. A graph saved by one run must reload, possibly on another
//! machine, with the same cells and the same adjacency.
//!
//! ## Implementations
//!
//! | Store | Module | Description |
//! |-------|--------|-------------|
//! | `GmlStore` | `gml` | GML text, readable by networkx |
//! | `JsonStore` | `json` | serde document with metadata |
//!
//! Every loader funnels through [`SpatialGraph::from_parts`], so a file with
//! a dangling endpoint, a self-loop or a repeated edge is rejected with
//! [`crate::Error::MalformedGraph`] instead of being half-loaded.

pub mod gml;
pub mod json;

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::model::SpatialGraph;
use crate::Result;

pub use gml::GmlStore;
pub use json::JsonStore;

// ============================================================================
// Store selection
// ============================================================================

/// On-disk graph format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreFormat {
    #[default]
    Gml,
    Json,
}

impl StoreFormat {
    pub fn extension(self) -> &'static str {
        match self {
            StoreFormat::Gml => "gml",
            StoreFormat::Json => "json",
        }
    }

    /// Guess the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "gml" => Some(StoreFormat::Gml),
            "json" => Some(StoreFormat::Json),
            _ => None,
        }
    }

    pub fn store(self) -> Box<dyn GraphStore> {
        match self {
            StoreFormat::Gml => Box::new(GmlStore),
            StoreFormat::Json => Box::new(JsonStore),
        }
    }
}

// ============================================================================
// GraphStore Trait
// ============================================================================

/// Serialize and deserialize a [`SpatialGraph`] losslessly.
pub trait GraphStore: Send + Sync {
    /// Write the whole graph.
    fn save(&self, graph: &SpatialGraph, writer: &mut dyn Write) -> Result<()>;

    /// Read and validate a graph.
    fn load(&self, reader: &mut dyn Read) -> Result<SpatialGraph>;

    fn save_path(&self, graph: &SpatialGraph, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.save(graph, &mut writer)?;
        writer.flush()?;
        Ok(())
    }

    fn load_path(&self, path: &Path) -> Result<SpatialGraph> {
        let mut reader = BufReader::new(File::open(path)?);
        self.load(&mut reader)
    }
}
