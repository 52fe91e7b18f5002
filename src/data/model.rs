use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CurvePoint – one measured row of the MICP table
// ---------------------------------------------------------------------------

/// A single MICP measurement.
///
/// Missing cells are carried as `f64::NAN` until cleaning drops the row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    /// Injection pressure (psia).
    pub pressure: f64,
    /// Pore-throat radius (µm).
    pub pore_radius: f64,
    /// Incremental intruded volume (mL/g).
    pub incremental_volume: f64,
    /// Cumulative intruded volume (mL/g).
    pub cumulative_volume: f64,
}

impl CurvePoint {
    pub fn new(
        pressure: f64,
        pore_radius: f64,
        incremental_volume: f64,
        cumulative_volume: f64,
    ) -> Self {
        Self {
            pressure,
            pore_radius,
            incremental_volume,
            cumulative_volume,
        }
    }
}

impl From<(f64, f64, f64, f64)> for CurvePoint {
    fn from((p, r, incr, cum): (f64, f64, f64, f64)) -> Self {
        Self::new(p, r, incr, cum)
    }
}

// ---------------------------------------------------------------------------
// CapillaryCurve – the raw, uncleaned curve as measured
// ---------------------------------------------------------------------------

/// The full measured curve, in acquisition order (rising pressure).
///
/// Holds the raw rows, including ones cleaning will later drop: the total
/// intruded volume is read from the last raw row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapillaryCurve {
    pub points: Vec<CurvePoint>,
}

impl CapillaryCurve {
    pub fn new(points: Vec<CurvePoint>) -> Self {
        Self { points }
    }

    /// Cumulative volume of the last raw row, before any cleaning.
    pub fn intruded_volume(&self) -> Option<f64> {
        self.points.last().map(|p| p.cumulative_volume)
    }

    /// Number of raw rows.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the curve has no rows at all.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl FromIterator<CurvePoint> for CapillaryCurve {
    fn from_iter<I: IntoIterator<Item = CurvePoint>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

// ---------------------------------------------------------------------------
// SampleProperties – per-sample scalars supplied alongside the curve
// ---------------------------------------------------------------------------

/// Sample name and porosity (in percent, as reported by the lab).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleProperties {
    pub name: String,
    pub porosity_percent: f64,
}

impl SampleProperties {
    pub fn new(name: impl Into<String>, porosity_percent: f64) -> Self {
        Self {
            name: name.into(),
            porosity_percent,
        }
    }

    /// Porosity as a 0–1 fraction.
    pub fn porosity_fraction(&self) -> f64 {
        self.porosity_percent / 100.0
    }
}

// ---------------------------------------------------------------------------
// Derived values
// ---------------------------------------------------------------------------

/// Per-point features computed from a cleaned curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivedPoint {
    pub pore_radius: f64,
    /// `cum_vol / intruded_volume`, rounded to two decimals.
    pub norm_cum_vol: f64,
    /// `|norm_cum_vol - 0.35|`
    pub r35_distance: f64,
    pub bulk_saturation: f64,
    pub cum_bulk_saturation: f64,
    pub swanson_parameter: f64,
    pub dastidar_weight: f64,
    pub log_pore_radius: f64,
    pub weighted_log_pore_radius: f64,
}

/// Characteristic curve parameters feeding the correlations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CurveParameters {
    pub intruded_volume: f64,
    pub sample_bulk_volume: f64,
    pub porosity_fraction: f64,
    /// Pore-throat radius at 35 % mercury saturation (µm).
    pub r35: f64,
    pub max_swanson: f64,
    pub dastidar_parameter: f64,
}

/// Five permeability estimates for one sample, in millidarcy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermeabilityResult {
    pub sample: String,
    pub winland_md: f64,
    pub swanson_md: f64,
    pub wells_amaefule_md: f64,
    pub kamath_md: f64,
    pub dastidar_md: f64,
}

impl fmt::Display for PermeabilityResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Permeability estimates for {}", self.sample)?;
        writeln!(f, "        Winland permeability: {:.2} mD", self.winland_md)?;
        writeln!(f, "        Swanson-brine permeability: {:.2} mD", self.swanson_md)?;
        writeln!(
            f,
            "        Wells-Amaefule permeability: {:.2} mD",
            self.wells_amaefule_md
        )?;
        writeln!(f, "        Kamath permeability: {:.2} mD", self.kamath_md)?;
        write!(f, "        Dastidar permeability: {:.2} mD", self.dastidar_md)
    }
}

/// Everything computed for one sample: feature table, parameters, result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurveAnalysis {
    pub features: Vec<DerivedPoint>,
    pub parameters: CurveParameters,
    pub result: PermeabilityResult,
    /// Raw rows removed by cleaning.
    pub dropped_rows: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intruded_volume_reads_last_raw_row() {
        let curve = CapillaryCurve::new(vec![
            CurvePoint::new(10.0, 20.0, 0.5, 0.5),
            CurvePoint::new(50.0, 5.0, 0.0, 1.7),
        ]);
        assert_eq!(curve.intruded_volume(), Some(1.7));
        assert_eq!(CapillaryCurve::default().intruded_volume(), None);
    }

    #[test]
    fn porosity_fraction_divides_by_hundred() {
        let sample = SampleProperties::new("A-1", 20.0);
        assert!((sample.porosity_fraction() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn display_matches_report_layout() {
        let result = PermeabilityResult {
            sample: "Core 7".into(),
            winland_md: 755.08,
            swanson_md: 109.25,
            wells_amaefule_md: 12.19,
            kamath_md: 135.49,
            dastidar_md: 501.88,
        };
        let text = result.to_string();
        assert!(text.starts_with("Permeability estimates for Core 7\n"));
        assert!(text.contains("Swanson-brine permeability: 109.25 mD"));
        assert!(text.ends_with("Dastidar permeability: 501.88 mD"));
    }
}
