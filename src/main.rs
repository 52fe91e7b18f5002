use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use micp_perm::data::loader::{ColumnMap, ColumnRef, LoadOptions, RowWindow, load_file};
use micp_perm::data::model::SampleProperties;
use micp_perm::estimator::analyze;
use micp_perm::export::{write_features_csv, write_results_csv};

/// Estimate permeability from an MICP curve.
///
/// Columns can be given by header name or by spreadsheet letter (A, B, ...).
#[derive(Parser, Debug)]
#[command(name = "micp-perm", version, about)]
struct Cli {
    /// Curve file (.csv, .json, .parquet)
    input: PathBuf,

    /// Sample porosity in percent (0, 100]
    #[arg(long, short = 'p', env = "MICP_POROSITY")]
    porosity: Option<f64>,

    /// Sample name (defaults to the input file stem)
    #[arg(long, short = 's')]
    sample: Option<String>,

    /// Pressure column (psia)
    #[arg(long, default_value = "pressure")]
    pressure: ColumnRef,

    /// Pore radius column (µm)
    #[arg(long, default_value = "pore_radius")]
    pore_radius: ColumnRef,

    /// Incremental pore volume column (mL/g)
    #[arg(long, default_value = "incremental_volume")]
    incremental: ColumnRef,

    /// Cumulative pore volume column (mL/g)
    #[arg(long, default_value = "cumulative_volume")]
    cumulative: ColumnRef,

    /// First data row to use (1-based, header excluded)
    #[arg(long)]
    first_row: Option<usize>,

    /// Last data row to use (inclusive); its cumulative volume is the total intrusion
    #[arg(long)]
    last_row: Option<usize>,

    /// Write the estimates to this CSV file
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Append to --output instead of overwriting it
    #[arg(long, requires = "output")]
    append: bool,

    /// Write the derived per-point feature table to this CSV file
    #[arg(long)]
    features: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let options = LoadOptions {
        columns: ColumnMap {
            pressure: cli.pressure,
            pore_radius: cli.pore_radius,
            incremental_volume: cli.incremental,
            cumulative_volume: cli.cumulative,
        },
        rows: RowWindow {
            first: cli.first_row,
            last: cli.last_row,
        },
    };
    let loaded = load_file(&cli.input, &options)?;

    let porosity = cli
        .porosity
        .or(loaded.porosity_percent)
        .context("no porosity given: pass --porosity or include \"porosity\" in the JSON input")?;
    let name = cli
        .sample
        .or(loaded.sample)
        .or_else(|| {
            cli.input
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
        })
        .unwrap_or_default();
    let sample = SampleProperties::new(name, porosity);

    info!("computing permeability for {} ({}% porosity)", sample.name, porosity);
    let analysis = analyze(&loaded.curve, &sample)
        .with_context(|| format!("estimating permeability for '{}'", sample.name))?;

    println!("{}", analysis.result);

    if let Some(path) = &cli.features {
        write_features_csv(path, &analysis)?;
        info!("wrote feature table to {}", path.display());
    }
    if let Some(path) = &cli.output {
        write_results_csv(path, std::slice::from_ref(&analysis.result), cli.append)?;
        info!("wrote estimates to {}", path.display());
    }

    Ok(())
}
