//! Batch processing: build, persist, reload, measure, tabulate.

use std::fs;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use tme_graph::builder::read_cells_csv;
use tme_graph::pipeline::{self, SampleInput};
use tme_graph::report::{read_csv, write_csv};
use tme_graph::{AnalysisConfig, CellNode, Error, GmlStore, GraphStore, MixingPhenotype, Phenotype, StoreFormat};

const P01_CSV: &str = "\
id,x,y,phenotype
1,0.0,0.0,Tumor
2,20.0,0.0,Other
3,40.0,0.0,Other
4,60.0,0.0,T cell
5,60.0,30.0,Tumor
6,200.0,200.0,B cell
";

/// Twelve cells on a 60µm ring, alternating stroma and macrophages, with one
/// tumor cell touching the stromal cell at angle 0.
fn ring(name: &str, offset: u64) -> SampleInput {
    let cells = (0..12u64)
        .map(|k| {
            let angle = k as f64 * std::f64::consts::TAU / 12.0;
            let p = if k % 2 == 0 { Phenotype::Other } else { Phenotype::Macrophage };
            CellNode::new(offset + k, 60.0 * angle.cos(), 60.0 * angle.sin(), p)
        })
        .chain([CellNode::new(offset + 100, 90.0, 0.0, Phenotype::Tumor)])
        .collect();
    SampleInput::new(name, cells)
}

#[test]
fn batch_writes_graphs_and_a_table() {
    let dir = TempDir::new().unwrap();
    let config = AnalysisConfig::default();
    let p01 = SampleInput::new("P01", read_cells_csv(P01_CSV.as_bytes()).unwrap());

    let results = pipeline::run_batch(vec![p01, ring("P02", 0)], &config, dir.path());
    assert_eq!(results.len(), 2);
    let reports: Vec<_> = results.into_iter().map(Result::unwrap).collect();

    assert!(dir.path().join("P01.gml").exists());
    assert!(dir.path().join("P02.gml").exists());

    let p01 = &reports[0];
    assert_eq!(p01.sample, "P01");
    assert_eq!(p01.mixing_score, Some(-1.0));
    assert_eq!(p01.mixing_phenotype, Some(MixingPhenotype::Cold));
    assert_eq!(p01.barrier(Phenotype::TCell), Some(2.0));
    assert_eq!(p01.barrier(Phenotype::BCell), None);

    // Measuring the stored graph again gives the same row.
    let again = pipeline::measure_stored(&dir.path().join("P01.gml"), &config).unwrap();
    assert_eq!(&again, p01);

    let mut table = Vec::new();
    write_csv(&reports, &mut table).unwrap();
    assert_eq!(read_csv(table.as_slice()).unwrap(), reports);
}

#[test]
fn one_bad_sample_does_not_stop_the_batch() {
    let dir = TempDir::new().unwrap();
    let config = AnalysisConfig { store_format: StoreFormat::Json, ..AnalysisConfig::default() };
    let duplicate = SampleInput::new(
        "P09",
        vec![
            CellNode::new(1, 0.0, 0.0, Phenotype::Tumor),
            CellNode::new(1, 5.0, 0.0, Phenotype::Other),
        ],
    );

    let results = pipeline::run_batch(
        vec![ring("P01", 0), duplicate, ring("P03", 50), ring("../escape", 0)],
        &config,
        dir.path(),
    );

    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(Error::InvalidInput(_))));
    assert!(results[2].is_ok());
    assert!(matches!(results[3], Err(Error::InvalidInput(_))));
    assert!(dir.path().join("P03.json").exists());
    assert!(!dir.path().join("P09.json").exists());
}

#[test]
fn corrupted_graph_file_fails_only_that_sample() {
    let dir = TempDir::new().unwrap();
    let config = AnalysisConfig::default();
    let results = pipeline::run_batch(vec![ring("P01", 0), ring("P02", 0)], &config, dir.path());
    assert!(results.iter().all(Result::is_ok));

    let bad = dir.path().join("P02.gml");
    let text = fs::read_to_string(&bad).unwrap();
    let truncated = text.replacen("source 0", "source 4242", 1);
    assert_ne!(truncated, text);
    fs::write(&bad, truncated).unwrap();

    let good = pipeline::measure_stored(&dir.path().join("P01.gml"), &config);
    let broken = pipeline::measure_stored(&bad, &config);
    assert!(good.is_ok());
    assert!(matches!(broken, Err(Error::MalformedGraph { .. })));
}

#[test]
fn in_memory_analysis_matches_the_stored_path() {
    let dir = TempDir::new().unwrap();
    let config = AnalysisConfig::default();
    let input = ring("P05", 0);

    let outcome = pipeline::analyze_sample(&input.name, input.cells.clone(), &config).unwrap();
    let stored = pipeline::process_sample(input, &config, dir.path()).unwrap();

    assert_eq!(outcome.report, stored);
    // Macrophages sit 1, 3, 5, 5, 3, 1 ring steps from the stromal cell that
    // touches the tumor, crossing 1, 2, 3, 3, 2, 1 stromal cells.
    assert_eq!(stored.barrier(Phenotype::Macrophage), Some(2.0));
}

#[test]
fn repeated_sample_names_keep_the_first_graph() {
    let dir = TempDir::new().unwrap();
    let config = AnalysisConfig::default();
    let first = ring("P01", 0);
    let expected = first.cells.len();
    let second = SampleInput::new("P01", read_cells_csv(P01_CSV.as_bytes()).unwrap());

    let results = pipeline::run_batch(vec![first, second, ring("P02", 0)], &config, dir.path());

    assert!(results[0].is_ok());
    assert!(matches!(&results[1], Err(Error::InvalidInput(m)) if m.contains("P01")));
    assert!(results[2].is_ok());

    let stored = GmlStore.load_path(&dir.path().join("P01.gml")).unwrap();
    assert_eq!(stored.len(), expected);
}
