//! Graph construction from cell positions.
//!
//! The edge set must be a pure function of the cell positions: input order
//! and neighbor-search strategy may not change it.

use proptest::prelude::*;

use tme_graph::{CellNode, NeighborStrategy, Phenotype, SpatialGraph, SpatialGraphBuilder};

fn arb_phenotype() -> impl Strategy<Value = Phenotype> {
    prop::sample::select(Phenotype::ALL.to_vec())
}

/// Up to 80 cells in a 200µm square. Ids are the input positions.
fn arb_cells() -> impl Strategy<Value = Vec<CellNode>> {
    prop::collection::vec((0.0..200.0f64, 0.0..200.0f64, arb_phenotype()), 0..80).prop_map(|raw| {
        raw.into_iter()
            .enumerate()
            .map(|(i, (x, y, p))| CellNode::new(i as u64, x, y, p))
            .collect()
    })
}

fn build(cells: Vec<CellNode>, strategy: NeighborStrategy) -> SpatialGraph {
    SpatialGraphBuilder::new(35.0)
        .with_strategy(strategy)
        .build(cells)
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn edges_do_not_depend_on_input_order(
        (cells, shuffled) in arb_cells().prop_flat_map(|c| (Just(c.clone()), Just(c).prop_shuffle()))
    ) {
        let a = build(cells, NeighborStrategy::BruteForce);
        let b = build(shuffled, NeighborStrategy::BruteForce);
        prop_assert_eq!(a.edge_ids(), b.edge_ids());
        prop_assert!(a.same_structure(&b));
    }

    #[test]
    fn grid_matches_brute_force(cells in arb_cells()) {
        let brute = build(cells.clone(), NeighborStrategy::BruteForce);
        let grid = build(cells, NeighborStrategy::Grid);
        prop_assert_eq!(brute.edge_ids(), grid.edge_ids());
    }

    #[test]
    fn every_edge_is_strictly_within_radius(cells in arb_cells()) {
        let g = build(cells, NeighborStrategy::Auto);
        for i in 0..g.len() {
            for j in (i + 1)..g.len() {
                let close = g.node(i).distance(g.node(j)) < 35.0;
                prop_assert_eq!(g.has_edge(i, j), close);
            }
        }
    }
}

#[test]
fn boundary_pairs_on_a_lattice() {
    // 5 x 5 lattice at exactly the radius: no cell touches another.
    let lattice: Vec<CellNode> = (0..25)
        .map(|k| CellNode::new(k, (k % 5) as f64 * 35.0, (k / 5) as f64 * 35.0, Phenotype::Other))
        .collect();
    for strategy in [NeighborStrategy::BruteForce, NeighborStrategy::Grid] {
        assert_eq!(build(lattice.clone(), strategy).edge_count(), 0);
    }

    // Just inside the radius: the 4-neighborhood lattice, 2 * 5 * 4 edges.
    let tight: Vec<CellNode> = lattice
        .iter()
        .map(|c| CellNode::new(c.id.0, c.x * (34.999 / 35.0), c.y * (34.999 / 35.0), c.phenotype))
        .collect();
    for strategy in [NeighborStrategy::BruteForce, NeighborStrategy::Grid] {
        assert_eq!(build(tight.clone(), strategy).edge_count(), 40);
    }
}

#[test]
fn auto_switches_to_grid_above_the_limit() {
    let cells: Vec<CellNode> = (0..300)
        .map(|k| CellNode::new(k, (k % 20) as f64 * 10.0, (k / 20) as f64 * 10.0, Phenotype::Tumor))
        .collect();
    let auto = SpatialGraphBuilder::new(35.0)
        .with_brute_force_limit(10)
        .build(cells.clone())
        .unwrap();
    let brute = build(cells, NeighborStrategy::BruteForce);
    assert_eq!(auto.edge_ids(), brute.edge_ids());
    assert!(auto.edge_count() > 0);
}

#[test]
fn grid_handles_coordinates_beyond_the_bucket_range() {
    let cells = vec![
        CellNode::new(1, 1e21, 0.0, Phenotype::Tumor),
        CellNode::new(2, 1e21, 0.0, Phenotype::Other),
        CellNode::new(3, -1e21, 5.0, Phenotype::TCell),
    ];
    let grid = build(cells.clone(), NeighborStrategy::Grid);
    let brute = build(cells, NeighborStrategy::BruteForce);
    assert_eq!(grid.edge_count(), 1);
    assert_eq!(grid.edge_ids(), brute.edge_ids());
}
