//! tme-graph - build cell proximity graphs and report immune architecture.

use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tme_graph::builder::read_cells_csv;
use tme_graph::pipeline::{self, SampleInput};
use tme_graph::report::{self, MetricsReport};
use tme_graph::{AnalysisConfig, SpatialGraphBuilder, StoreFormat};

/// Tumor-immune spatial architecture from classified cells.
#[derive(Parser)]
#[command(name = "tme-graph")]
#[command(author, version)]
#[command(propagate_version = true)]
#[command(after_help = "Examples:
  tme-graph build P01.csv -o graphs/P01.gml
  tme-graph metrics graphs/*.gml -o metrics.csv
  tme-graph run cells/*.csv --graphs-dir graphs -o metrics.csv")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Analysis settings (TOML)
    #[arg(short, long, global = true, env = "TME_GRAPH_CONFIG")]
    config: Option<PathBuf>,

    /// Override the interaction radius in micrometers
    #[arg(long, global = true)]
    radius: Option<f64>,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build one graph from a cell table and store it
    Build {
        /// CSV with columns id,x,y,phenotype
        cells: PathBuf,

        /// Graph file; the extension picks the format
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Compute metrics for stored graphs
    Metrics {
        /// Graph files; each file stem becomes the sample name
        #[arg(required = true)]
        graphs: Vec<PathBuf>,

        /// Metrics table (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Build, store and measure many samples
    Run {
        /// Cell tables; each file stem becomes the sample name
        #[arg(required = true)]
        cells: Vec<PathBuf>,

        /// Directory for the stored graphs
        #[arg(long, default_value = "graphs")]
        graphs_dir: PathBuf,

        /// Metrics table (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        "error"
    } else if verbose {
        "tme_graph=debug,info"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();
}

fn load_config(path: Option<&Path>, radius: Option<f64>) -> anyhow::Result<AnalysisConfig> {
    let mut config = match path {
        Some(p) => AnalysisConfig::load(p).with_context(|| format!("loading config {}", p.display()))?,
        None => AnalysisConfig::default(),
    };
    if let Some(r) = radius {
        config.interaction_radius_um = r;
        config.validate()?;
    }
    Ok(config)
}

fn read_cells(path: &Path) -> anyhow::Result<Vec<tme_graph::CellNode>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    read_cells_csv(BufReader::new(file)).with_context(|| format!("reading cells from {}", path.display()))
}

fn sample_name(path: &Path) -> anyhow::Result<String> {
    match path.file_stem().and_then(|s| s.to_str()) {
        Some(stem) => Ok(stem.to_string()),
        None => bail!("cannot take a sample name from {}", path.display()),
    }
}

fn write_table(reports: &[MetricsReport], output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
            report::write_csv(reports, file)?;
            info!(path = %path.display(), rows = reports.len(), "metrics written");
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            report::write_csv(reports, &mut lock)?;
            lock.flush()?;
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);
    let config = load_config(cli.config.as_deref(), cli.radius)?;

    match cli.command {
        Commands::Build { cells, output } => {
            let graph = SpatialGraphBuilder::from_config(&config).build(read_cells(&cells)?)?;
            let format = StoreFormat::from_path(&output).unwrap_or(config.store_format);
            format
                .store()
                .save_path(&graph, &output)
                .with_context(|| format!("writing {}", output.display()))?;
            info!(path = %output.display(), cells = graph.len(), edges = graph.edge_count(), "graph stored");
        }
        Commands::Metrics { graphs, output } => {
            let reports = graphs
                .iter()
                .map(|p| pipeline::measure_stored(p, &config).with_context(|| format!("measuring {}", p.display())))
                .collect::<anyhow::Result<Vec<_>>>()?;
            write_table(&reports, output.as_deref())?;
        }
        Commands::Run { cells, graphs_dir, output } => {
            std::fs::create_dir_all(&graphs_dir)
                .with_context(|| format!("creating {}", graphs_dir.display()))?;
            let samples = cells
                .iter()
                .map(|p| Ok(SampleInput::new(sample_name(p)?, read_cells(p)?)))
                .collect::<anyhow::Result<Vec<_>>>()?;

            let total = samples.len();
            let reports: Vec<MetricsReport> = pipeline::run_batch(samples, &config, &graphs_dir)
                .into_iter()
                .filter_map(|r| r.ok())
                .collect();
            write_table(&reports, output.as_deref())?;

            if reports.len() < total {
                bail!("{} of {total} samples failed; see log for details", total - reports.len());
            }
        }
    }
    Ok(())
}
