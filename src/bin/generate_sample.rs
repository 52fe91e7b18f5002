use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use micp_perm::data::model::CurvePoint;

/// Washburn constant for mercury/air: r (µm) ≈ 106.7 / P (psia).
const WASHBURN: f64 = 106.7;

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// Deterministic noise source (splitmix64), enough for reproducible demo data.
struct Noise(u64);

impl Noise {
    fn uniform(&mut self) -> f64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        ((z ^ (z >> 31)) >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Normal deviate via Box-Muller.
    fn normal(&mut self, std_dev: f64) -> f64 {
        let u1 = self.uniform().max(1e-15);
        let u2 = self.uniform();
        std_dev * (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
    }
}

/// A unimodal pore-throat distribution sampled over a log pressure sweep.
///
/// Increments follow a Gaussian in log10(radius); noise can push some
/// increments to zero, which the estimator's cleaning step drops.
fn generate_curve(
    noise: &mut Noise,
    total_volume: f64,
    log_r_mode: f64,
    log_r_sigma: f64,
    steps: usize,
) -> Vec<CurvePoint> {
    // 1 psia → 60 000 psia
    let pressures: Vec<f64> = (0..steps)
        .map(|i| 10f64.powf(i as f64 * 4.778 / (steps - 1) as f64))
        .collect();
    let weights: Vec<f64> = pressures
        .iter()
        .map(|p| gaussian((WASHBURN / p).log10(), log_r_mode, log_r_sigma, 1.0))
        .collect();
    let norm: f64 = weights.iter().sum();

    let mut cum = 0.0;
    pressures
        .iter()
        .zip(&weights)
        .map(|(&p, &w)| {
            let incr = (total_volume * w / norm + noise.normal(0.0005)).max(0.0);
            cum += incr;
            CurvePoint::new(p, WASHBURN / p, incr, cum)
        })
        .collect()
}

fn write_csv(path: &str, points: &[CurvePoint]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path).context("creating CSV")?;
    for p in points {
        wtr.serialize(p)?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_parquet(path: &str, points: &[CurvePoint]) -> Result<()> {
    let column = |f: fn(&CurvePoint) -> f64| -> ArrayRef {
        Arc::new(Float64Array::from(points.iter().map(f).collect::<Vec<_>>()))
    };
    let schema = Arc::new(Schema::new(vec![
        Field::new("pressure", DataType::Float64, false),
        Field::new("pore_radius", DataType::Float64, false),
        Field::new("incremental_volume", DataType::Float64, false),
        Field::new("cumulative_volume", DataType::Float64, false),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            column(|p| p.pressure),
            column(|p| p.pore_radius),
            column(|p| p.incremental_volume),
            column(|p| p.cumulative_volume),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).context("creating output file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating writer")?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    let mut noise = Noise(42);

    // Sandstone-like: mode near 5 µm, total intrusion 0.08 mL/g.
    let points = generate_curve(&mut noise, 0.08, 5f64.log10(), 0.35, 120);

    write_csv("sample_micp.csv", &points)?;
    write_parquet("sample_micp.parquet", &points)?;

    println!(
        "Wrote {} MICP points to sample_micp.csv and sample_micp.parquet",
        points.len()
    );
    Ok(())
}
