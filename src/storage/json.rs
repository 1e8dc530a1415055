//! JSON graph store.
//!
//! One serde document per graph: metadata, the node array in node order, and
//! the edge list as `[source id, target id]` pairs.

use std::io::{Read, Write};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::GraphStore;
use crate::model::{CellId, CellNode, SpatialGraph};
use crate::{Error, Result};

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonStore;

#[derive(Debug, Serialize, Deserialize)]
struct GraphDocument {
    format_version: u32,
    created_at: DateTime<Utc>,
    nodes: Vec<CellNode>,
    edges: Vec<(CellId, CellId)>,
}

impl GraphStore for JsonStore {
    fn save(&self, graph: &SpatialGraph, writer: &mut dyn Write) -> Result<()> {
        let doc = GraphDocument {
            format_version: FORMAT_VERSION,
            created_at: Utc::now(),
            nodes: graph.nodes().to_vec(),
            edges: graph
                .edges()
                .map(|(i, j)| (graph.node(i).id, graph.node(j).id))
                .collect(),
        };
        serde_json::to_writer(&mut *writer, &doc)?;
        writeln!(writer)?;
        debug!(nodes = doc.nodes.len(), edges = doc.edges.len(), "wrote JSON graph");
        Ok(())
    }

    fn load(&self, reader: &mut dyn Read) -> Result<SpatialGraph> {
        let doc: GraphDocument = serde_json::from_reader(reader)?;
        if doc.format_version != FORMAT_VERSION {
            return Err(Error::MalformedGraph {
                reason: format!("unsupported format_version {}", doc.format_version),
            });
        }
        debug!(nodes = doc.nodes.len(), edges = doc.edges.len(), created_at = %doc.created_at, "read JSON graph");
        SpatialGraph::from_parts(doc.nodes, doc.edges)
    }
}
