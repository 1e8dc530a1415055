//! SpatialGraph: the arena-backed, read-only cell proximity graph.
//!
//! Nodes live in a flat `Vec` in input order. Edges are stored only as
//! sorted adjacency lists of `u32` node indices; every undirected edge
//! appears in both endpoint lists. A `CellId -> index` map gives stable
//! lookups by id.
//!
//! The graph is built once, by [`SpatialGraph::from_parts`], and never
//! mutated afterwards, so `&SpatialGraph` can be shared across rayon tasks.

use std::collections::{BTreeMap, BTreeSet};

use hashbrown::HashMap;
use smallvec::SmallVec;

use super::{CellId, CellNode, Phenotype};
use crate::{Error, Result};

/// Neighbor indices of one node. Cells rarely touch more than eight others.
pub type NeighborList = SmallVec<[u32; 8]>;

/// Undirected simple graph over classified cells.
#[derive(Debug, Clone, Default)]
pub struct SpatialGraph {
    nodes: Vec<CellNode>,
    index: HashMap<CellId, usize>,
    adjacency: Vec<NeighborList>,
    edge_count: usize,
}

impl SpatialGraph {
    /// Assemble a graph from nodes and id-keyed edges.
    ///
    /// Fails with [`Error::MalformedGraph`] on a duplicate node id, an edge
    /// endpoint that names no node, a self-loop, or a repeated edge (in
    /// either orientation).
    pub fn from_parts<I>(nodes: Vec<CellNode>, edges: I) -> Result<Self>
    where
        I: IntoIterator<Item = (CellId, CellId)>,
    {
        let index = index_nodes(&nodes)?;
        let mut pairs = Vec::new();
        for (a, b) in edges {
            let ia = *index.get(&a).ok_or_else(|| dangling(a, b, a))?;
            let ib = *index.get(&b).ok_or_else(|| dangling(a, b, b))?;
            pairs.push((ia as u32, ib as u32));
        }
        Self::assemble(nodes, index, pairs)
    }

    /// Assemble from index-keyed edges. Used by the builder, whose pairs are
    /// already in range.
    pub(crate) fn from_index_pairs(nodes: Vec<CellNode>, pairs: Vec<(u32, u32)>) -> Result<Self> {
        let index = index_nodes(&nodes)?;
        Self::assemble(nodes, index, pairs)
    }

    fn assemble(
        nodes: Vec<CellNode>,
        index: HashMap<CellId, usize>,
        pairs: Vec<(u32, u32)>,
    ) -> Result<Self> {
        let mut adjacency: Vec<NeighborList> = vec![NeighborList::new(); nodes.len()];
        for &(a, b) in &pairs {
            if a == b {
                return Err(Error::MalformedGraph {
                    reason: format!("self-loop on cell {}", nodes[a as usize].id),
                });
            }
            adjacency[a as usize].push(b);
            adjacency[b as usize].push(a);
        }

        for (i, list) in adjacency.iter_mut().enumerate() {
            list.sort_unstable();
            if let Some(w) = list.windows(2).find(|w| w[0] == w[1]) {
                return Err(Error::MalformedGraph {
                    reason: format!(
                        "duplicate edge between cells {} and {}",
                        nodes[i].id, nodes[w[0] as usize].id
                    ),
                });
            }
        }

        Ok(Self { nodes, index, adjacency, edge_count: pairs.len() })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn nodes(&self) -> &[CellNode] {
        &self.nodes
    }

    pub fn node(&self, idx: usize) -> &CellNode {
        &self.nodes[idx]
    }

    pub fn phenotype(&self, idx: usize) -> Phenotype {
        self.nodes[idx].phenotype
    }

    pub fn index_of(&self, id: CellId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// Sorted neighbor indices of node `idx`.
    pub fn neighbors(&self, idx: usize) -> &[u32] {
        &self.adjacency[idx]
    }

    pub fn degree(&self, idx: usize) -> usize {
        self.adjacency[idx].len()
    }

    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        self.adjacency[a].binary_search(&(b as u32)).is_ok()
    }

    /// Every undirected edge once, as `(lower index, higher index)`.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.adjacency.iter().enumerate().flat_map(|(i, list)| {
            list.iter()
                .map(|&j| j as usize)
                .filter(move |&j| j > i)
                .map(move |j| (i, j))
        })
    }

    /// The edge set keyed by cell id, each pair ordered `(min, max)`.
    ///
    /// Independent of node order, so two graphs over the same cells compare
    /// equal here regardless of how their nodes were laid out.
    pub fn edge_ids(&self) -> BTreeSet<(CellId, CellId)> {
        self.edges()
            .map(|(i, j)| {
                let (a, b) = (self.nodes[i].id, self.nodes[j].id);
                if a <= b { (a, b) } else { (b, a) }
            })
            .collect()
    }

    /// Indices of all nodes carrying `phenotype`, in node order.
    pub fn indices_of(&self, phenotype: Phenotype) -> Vec<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.phenotype == phenotype)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn count_by_phenotype(&self) -> BTreeMap<Phenotype, usize> {
        let mut counts = BTreeMap::new();
        for node in &self.nodes {
            *counts.entry(node.phenotype).or_insert(0) += 1;
        }
        counts
    }

    /// Same cells (id, position, phenotype) and same adjacency, ignoring
    /// node order.
    pub fn same_structure(&self, other: &SpatialGraph) -> bool {
        if self.len() != other.len() || self.edge_count != other.edge_count {
            return false;
        }
        let attrs_match = self.nodes.iter().all(|n| {
            other
                .index_of(n.id)
                .map(|j| other.node(j) == n)
                .unwrap_or(false)
        });
        attrs_match && self.edge_ids() == other.edge_ids()
    }
}

fn index_nodes(nodes: &[CellNode]) -> Result<HashMap<CellId, usize>> {
    if nodes.len() > u32::MAX as usize {
        return Err(Error::InvalidInput(format!(
            "{} cells exceed the supported graph size",
            nodes.len()
        )));
    }
    let mut index = HashMap::with_capacity(nodes.len());
    for (i, node) in nodes.iter().enumerate() {
        if index.insert(node.id, i).is_some() {
            return Err(Error::MalformedGraph {
                reason: format!("duplicate cell id {}", node.id),
            });
        }
    }
    Ok(index)
}

fn dangling(a: CellId, b: CellId, missing: CellId) -> Error {
    Error::MalformedGraph {
        reason: format!("edge ({a}, {b}) references unknown cell {missing}"),
    }
}
