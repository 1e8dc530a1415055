//! CellPath: a walk through the graph as a sequence of node indices.

use super::{Phenotype, SpatialGraph};

/// A path in the graph: node -- node -- node ...
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellPath {
    /// Node indices along the path, start first. Never empty.
    nodes: Vec<usize>,
}

impl CellPath {
    pub fn single(node: usize) -> Self {
        Self { nodes: vec![node] }
    }

    /// Build from indices ordered start to end. `None` if `nodes` is empty.
    pub fn from_nodes(nodes: Vec<usize>) -> Option<Self> {
        if nodes.is_empty() { None } else { Some(Self { nodes }) }
    }

    /// Number of hops.
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    pub fn start(&self) -> usize {
        self.nodes[0]
    }

    pub fn end(&self) -> usize {
        self.nodes[self.nodes.len() - 1]
    }

    pub fn nodes(&self) -> &[usize] {
        &self.nodes
    }

    /// Extend the path by one hop.
    pub fn append(&mut self, node: usize) {
        self.nodes.push(node);
    }

    /// Nodes on the path (endpoints included) whose phenotype is `phenotype`.
    pub fn count_phenotype(&self, graph: &SpatialGraph, phenotype: Phenotype) -> usize {
        self.nodes.iter().filter(|&&i| graph.phenotype(i) == phenotype).count()
    }
}
