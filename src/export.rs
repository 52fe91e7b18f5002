use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::data::model::{CurveAnalysis, PermeabilityResult};

// ---------------------------------------------------------------------------
// Result table
// ---------------------------------------------------------------------------

/// One exported row; header names follow the lab's existing spreadsheets.
#[derive(Serialize)]
struct ResultRow<'a> {
    sample: &'a str,
    #[serde(rename = "winland_permeability_mD")]
    winland: f64,
    #[serde(rename = "swanson_permeability_mD")]
    swanson: f64,
    #[serde(rename = "Wells_permeability_mD")]
    wells_amaefule: f64,
    #[serde(rename = "kamath_permeability_mD")]
    kamath: f64,
    #[serde(rename = "dastidar_permeability_mD")]
    dastidar: f64,
}

impl<'a> From<&'a PermeabilityResult> for ResultRow<'a> {
    fn from(r: &'a PermeabilityResult) -> Self {
        Self {
            sample: &r.sample,
            winland: r.winland_md,
            swanson: r.swanson_md,
            wells_amaefule: r.wells_amaefule_md,
            kamath: r.kamath_md,
            dastidar: r.dastidar_md,
        }
    }
}

/// Serialize results as CSV, with or without the header row.
pub fn write_results<W: Write>(
    writer: W,
    results: &[PermeabilityResult],
    header: bool,
) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(header)
        .from_writer(writer);
    for r in results {
        wtr.serialize(ResultRow::from(r))
            .with_context(|| format!("writing result for '{}'", r.sample))?;
    }
    wtr.flush().context("flushing CSV")?;
    Ok(())
}

/// Write results to `path`. With `append`, rows go to the end of an existing
/// file and the header is only written if the file is new or empty.
pub fn write_results_csv(path: &Path, results: &[PermeabilityResult], append: bool) -> Result<()> {
    let needs_header = !append
        || std::fs::metadata(path)
            .map(|m| m.len() == 0)
            .unwrap_or(true);
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(path)
        .with_context(|| format!("opening {}", path.display()))?;
    write_results(file, results, needs_header)
        .with_context(|| format!("writing {}", path.display()))
}

// ---------------------------------------------------------------------------
// Feature table
// ---------------------------------------------------------------------------

/// Dump the per-point feature table of one analysis.
pub fn write_features<W: Write>(writer: W, analysis: &CurveAnalysis) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for f in &analysis.features {
        wtr.serialize(f).context("writing feature row")?;
    }
    wtr.flush().context("flushing CSV")?;
    Ok(())
}

pub fn write_features_csv(path: &Path, analysis: &CurveAnalysis) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    write_features(file, analysis).with_context(|| format!("writing {}", path.display()))
}
