//! Sample processing.
//!
//! Each sample is built, persisted, reloaded and measured on its own. Samples
//! share nothing mutable, so a batch runs them in parallel and a failure in
//! one sample never touches another's result.

use std::path::{Path, PathBuf};

use hashbrown::HashSet;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::builder::SpatialGraphBuilder;
use crate::config::AnalysisConfig;
use crate::metrics::ImmuneArchitecture;
use crate::model::{CellNode, SpatialGraph};
use crate::report::MetricsReport;
use crate::storage::StoreFormat;
use crate::{Error, Result};

/// Cleaned cells for one sample.
#[derive(Debug, Clone)]
pub struct SampleInput {
    pub name: String,
    pub cells: Vec<CellNode>,
}

impl SampleInput {
    pub fn new(name: impl Into<String>, cells: Vec<CellNode>) -> Self {
        Self { name: name.into(), cells }
    }
}

#[derive(Debug, Clone)]
pub struct SampleOutcome {
    pub graph: SpatialGraph,
    pub metrics: ImmuneArchitecture,
    pub report: MetricsReport,
}

/// Build and measure one sample in memory.
#[tracing::instrument(skip_all, fields(sample = %name, cells = cells.len()))]
pub fn analyze_sample(name: &str, cells: Vec<CellNode>, config: &AnalysisConfig) -> Result<SampleOutcome> {
    let graph = SpatialGraphBuilder::from_config(config).build(cells)?;
    let metrics = ImmuneArchitecture::compute(&graph, config);
    let report = MetricsReport::from_metrics(name, &metrics);
    Ok(SampleOutcome { graph, metrics, report })
}

/// Where a sample's graph is stored under `out_dir`.
pub fn graph_path(out_dir: &Path, sample: &str, format: StoreFormat) -> Result<PathBuf> {
    if sample.is_empty() || sample.contains(['/', '\\']) || sample == "." || sample == ".." {
        return Err(Error::InvalidInput(format!("sample name {sample:?} is not a file name")));
    }
    Ok(out_dir.join(format!("{sample}.{}", format.extension())))
}

/// Load a stored graph and measure it. The sample name is the file stem.
#[tracing::instrument(skip(config))]
pub fn measure_stored(path: &Path, config: &AnalysisConfig) -> Result<MetricsReport> {
    let format = StoreFormat::from_path(path).unwrap_or(config.store_format);
    let sample = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| Error::InvalidInput(format!("no sample name in {}", path.display())))?;

    let graph = format.store().load_path(path)?;
    let metrics = ImmuneArchitecture::compute(&graph, config);
    Ok(MetricsReport::from_metrics(sample, &metrics))
}

/// Build, persist, reload and measure one sample.
#[tracing::instrument(skip_all, fields(sample = %input.name))]
pub fn process_sample(input: SampleInput, config: &AnalysisConfig, out_dir: &Path) -> Result<MetricsReport> {
    let path = graph_path(out_dir, &input.name, config.store_format)?;
    let store = config.store_format.store();

    let built = SpatialGraphBuilder::from_config(config).build(input.cells)?;
    store.save_path(&built, &path)?;

    // Metrics are always taken from the reloaded graph.
    let graph = store.load_path(&path)?;
    if !built.same_structure(&graph) {
        return Err(Error::MalformedGraph {
            reason: format!("{} does not reload to the graph that was written", path.display()),
        });
    }

    let metrics = ImmuneArchitecture::compute(&graph, config);
    info!(
        path = %path.display(),
        cells = graph.len(),
        edges = graph.edge_count(),
        mixing = ?metrics.mixing.value(),
        "sample processed"
    );
    Ok(MetricsReport::from_metrics(input.name, &metrics))
}

/// Process every sample, in parallel. Results come back in input order.
///
/// Sample names map to graph files, so a name may appear only once per
/// batch: the first sample keeps it and later repeats fail with
/// [`Error::InvalidInput`] without touching the output directory.
pub fn run_batch(samples: Vec<SampleInput>, config: &AnalysisConfig, out_dir: &Path) -> Vec<Result<MetricsReport>> {
    info!(samples = samples.len(), out_dir = %out_dir.display(), "starting batch");
    let mut seen = HashSet::with_capacity(samples.len());
    let repeated: Vec<bool> = samples.iter().map(|s| !seen.insert(s.name.clone())).collect();

    let results: Vec<Result<MetricsReport>> = samples
        .into_par_iter()
        .zip(repeated)
        .map(|(input, repeated)| {
            let name = input.name.clone();
            let result = if repeated {
                Err(Error::InvalidInput(format!("sample name {name:?} appears more than once in the batch")))
            } else {
                process_sample(input, config, out_dir)
            };
            result.inspect_err(|e| warn!(sample = %name, error = %e, "sample failed"))
        })
        .collect();

    let failed = results.iter().filter(|r| r.is_err()).count();
    info!(succeeded = results.len() - failed, failed, "batch finished");
    results
}
