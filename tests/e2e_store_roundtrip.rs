//! Persist a graph, reload it, compare.
//!
//! A reloaded graph must carry the same cells (id, position, phenotype) and
//! the same adjacency as the one written, in either store format.

use std::fs;

use proptest::prelude::*;
use tempfile::TempDir;

use tme_graph::{
    AnalysisConfig, CellNode, Error, GmlStore, GraphStore, ImmuneArchitecture, JsonStore, Phenotype,
    SpatialGraph, SpatialGraphBuilder, StoreFormat,
};

fn arb_graph() -> impl Strategy<Value = SpatialGraph> {
    let cell = (-500.0..500.0f64, -500.0..500.0f64, prop::sample::select(Phenotype::ALL.to_vec()));
    prop::collection::vec(cell, 0..60).prop_map(|raw| {
        let cells = raw
            .into_iter()
            .enumerate()
            .map(|(i, (x, y, p))| CellNode::new(1000 + 7 * i as u64, x, y, p))
            .collect();
        SpatialGraphBuilder::new(120.0).build(cells).unwrap()
    })
}

fn reload(store: &dyn GraphStore, graph: &SpatialGraph) -> SpatialGraph {
    let mut buf = Vec::new();
    store.save(graph, &mut buf).unwrap();
    store.load(&mut buf.as_slice()).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn gml_preserves_structure(graph in arb_graph()) {
        let back = reload(&GmlStore, &graph);
        prop_assert!(graph.same_structure(&back));
        for (a, b) in graph.nodes().iter().zip(back.nodes()) {
            prop_assert_eq!(a.x.to_bits(), b.x.to_bits());
            prop_assert_eq!(a.y.to_bits(), b.y.to_bits());
        }
    }

    #[test]
    fn json_preserves_structure(graph in arb_graph()) {
        let back = reload(&JsonStore, &graph);
        prop_assert!(graph.same_structure(&back));
    }
}

#[test]
fn metrics_survive_a_round_trip_through_disk() {
    let dir = TempDir::new().unwrap();
    let cells = vec![
        CellNode::new(1, 0.0, 0.0, Phenotype::Tumor),
        CellNode::new(2, 20.0, 0.0, Phenotype::Other),
        CellNode::new(3, 40.0, 0.0, Phenotype::Other),
        CellNode::new(4, 60.0, 0.0, Phenotype::KillerT),
        CellNode::new(5, 60.0, 30.0, Phenotype::Tumor),
    ];
    let graph = SpatialGraphBuilder::new(35.0).build(cells).unwrap();
    let config = AnalysisConfig::default();
    let expected = ImmuneArchitecture::compute(&graph, &config);

    for format in [StoreFormat::Gml, StoreFormat::Json] {
        let path = dir.path().join(format!("P01.{}", format.extension()));
        format.store().save_path(&graph, &path).unwrap();
        let back = format.store().load_path(&path).unwrap();
        assert!(graph.same_structure(&back));
        assert_eq!(ImmuneArchitecture::compute(&back, &config), expected);
    }
}

#[test]
fn gml_written_by_other_tools_loads() {
    let text = r#"
        # exported from a plotting session
        graph [
          name "P07"
          node [ id 0 label "0" pos 10 pos 12.5 type "B cell" ]
          node [ id 1 label "1" pos 11.0 pos 40.0 type "CD4+CD8" ]
          edge [ source 1 target 0 weight 0.5 ]
        ]
    "#;
    let g = GmlStore.load(&mut text.as_bytes()).unwrap();
    assert_eq!(g.len(), 2);
    assert_eq!(g.edge_count(), 1);
    assert_eq!(g.node(0).x, 10.0);
    assert_eq!(g.phenotype(1), Phenotype::DoublePositive);
}

#[test]
fn malformed_files_are_rejected() {
    let dir = TempDir::new().unwrap();
    let cases = [
        ("dangling.gml", "graph [ node [ id 0 pos 0 pos 0 type \"Tumor\" ] edge [ source 0 target 9 ] ]"),
        ("loop.gml", "graph [ node [ id 0 pos 0 pos 0 type \"Tumor\" ] edge [ source 0 target 0 ] ]"),
        (
            "twice.gml",
            "graph [ node [ id 0 pos 0 pos 0 type \"Tumor\" ] node [ id 1 pos 1 pos 1 type \"Other\" ] \
             edge [ source 0 target 1 ] edge [ source 1 target 0 ] ]",
        ),
        ("label.gml", "graph [ node [ id 0 pos 0 pos 0 type \"CD20\" ] ]"),
    ];
    for (name, text) in cases {
        let path = dir.path().join(name);
        fs::write(&path, text).unwrap();
        let err = GmlStore.load_path(&path).unwrap_err();
        assert!(matches!(err, Error::MalformedGraph { .. }), "{name}: {err}");
    }
}
