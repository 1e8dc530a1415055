//! Unweighted shortest-path search.
//!
//! Breadth-first, level by level, visiting neighbors in ascending index
//! order. The first parent recorded for a node is kept, so the path returned
//! between two nodes is always the same one.

use std::collections::VecDeque;

use hashbrown::HashMap;

use crate::model::{CellPath, SpatialGraph};

/// Hop count from `source` to every node; `None` where unreachable.
pub fn shortest_path_lengths(graph: &SpatialGraph, source: usize) -> Vec<Option<usize>> {
    let mut dist = vec![None; graph.len()];
    let mut queue = VecDeque::new();
    dist[source] = Some(0);
    queue.push_back(source);

    while let Some(u) = queue.pop_front() {
        let next = dist[u].map_or(0, |d| d + 1);
        for &v in graph.neighbors(u) {
            let v = v as usize;
            if dist[v].is_none() {
                dist[v] = Some(next);
                queue.push_back(v);
            }
        }
    }
    dist
}

/// One shortest path from `source` to `target`, or `None` if unreachable.
pub fn shortest_path(graph: &SpatialGraph, source: usize, target: usize) -> Option<CellPath> {
    nearest_matching(graph, source, 0, |v| v == target)
}

/// Shortest path from `source` to the closest node satisfying `accept`,
/// ignoring any node fewer than `min_hops` away.
///
/// Nodes closer than `min_hops` are still traversed; they just can't end the
/// search. Among accepted nodes at the winning depth the lowest index wins.
/// Search state lives in this call frame only.
pub fn nearest_matching<F>(graph: &SpatialGraph, source: usize, min_hops: usize, accept: F) -> Option<CellPath>
where
    F: Fn(usize) -> bool,
{
    if min_hops == 0 && accept(source) {
        return Some(CellPath::single(source));
    }

    let mut parent: HashMap<u32, u32> = HashMap::new();
    parent.insert(source as u32, source as u32);
    let mut frontier = vec![source as u32];
    let mut depth = 0;

    // Each level discovers at least one new node, so this runs at most
    // graph.len() times.
    while !frontier.is_empty() {
        depth += 1;
        let mut next = Vec::new();
        for &u in &frontier {
            for &v in graph.neighbors(u as usize) {
                if !parent.contains_key(&v) {
                    parent.insert(v, u);
                    next.push(v);
                }
            }
        }

        if depth >= min_hops {
            if let Some(&hit) = next.iter().filter(|&&v| accept(v as usize)).min() {
                return Some(unwind(&parent, source as u32, hit));
            }
        }
        frontier = next;
    }
    None
}

fn unwind(parent: &HashMap<u32, u32>, source: u32, target: u32) -> CellPath {
    let mut nodes = vec![target as usize];
    let mut cur = target;
    while cur != source {
        cur = parent[&cur];
        nodes.push(cur as usize);
    }
    nodes.reverse();
    CellPath::from_nodes(nodes).unwrap_or_else(|| CellPath::single(source as usize))
}
