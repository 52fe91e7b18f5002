//! Permeability from MICP curves via five published correlations.
//!
//! The pipeline runs in a fixed order:
//!
//! 1. capture the total intruded volume from the last *raw* row,
//! 2. derive the sample bulk volume from porosity,
//! 3. clean the curve (see [`crate::data::filter`]),
//! 4. derive per-point features,
//! 5. extract R35, the maximum Swanson parameter and the Dastidar parameter,
//! 6. apply the power laws.
//!
//! # References
//!
//! - Kolodzie (1980), "Analysis of pore throat size and use of the Waxman-Smits
//!   equation to determine OOIP in Spindle Field, Colorado", SPE 9382 (Winland).
//! - Swanson (1981), "A simple correlation between permeabilities and mercury
//!   capillary pressures", *JPT* 33(12).
//! - Wells & Amaefule (1985), SPE 14239.
//! - Kamath (1992), "Evaluation of accuracy of estimating air permeability
//!   from mercury-injection data", *SPE Formation Evaluation* 7(4).
//! - Dastidar, Sondergeld & Rai (2007), "An improved empirical permeability
//!   estimator from mercury injection for tight clastic rocks", *Petrophysics* 48(3).

use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::data::filter::{clean_points, dropped_rows};
use crate::data::model::{
    CapillaryCurve, CurveAnalysis, CurveParameters, CurvePoint, DerivedPoint,
    PermeabilityResult, SampleProperties,
};
use crate::error::{EstimateError, Result};

/// Normalized saturation the Winland correlation is anchored to.
const R35_SATURATION: f64 = 0.35;

// ---------------------------------------------------------------------------
// Correlations
// ---------------------------------------------------------------------------

/// The five empirical permeability models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Correlation {
    Winland,
    Swanson,
    WellsAmaefule,
    Kamath,
    Dastidar,
}

impl Correlation {
    pub const ALL: [Correlation; 5] = [
        Correlation::Winland,
        Correlation::Swanson,
        Correlation::WellsAmaefule,
        Correlation::Kamath,
        Correlation::Dastidar,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Correlation::Winland => "Winland",
            Correlation::Swanson => "Swanson",
            Correlation::WellsAmaefule => "Wells-Amaefule",
            Correlation::Kamath => "Kamath",
            Correlation::Dastidar => "Dastidar",
        }
    }

    pub fn coefficient(self) -> f64 {
        match self {
            Correlation::Winland => 49.4,
            Correlation::Swanson => 355.0,
            Correlation::WellsAmaefule => 30.5,
            Correlation::Kamath => 347.0,
            Correlation::Dastidar => 4073.0,
        }
    }

    /// Exponent applied to the curve parameter (R35, max Swanson or Dastidar).
    pub fn exponent(self) -> f64 {
        match self {
            Correlation::Winland => 1.7,
            Correlation::Swanson => 2.005,
            Correlation::WellsAmaefule => 1.56,
            Correlation::Kamath => 1.60,
            Correlation::Dastidar => 1.64,
        }
    }

    /// Exponent applied to porosity fraction, for models that use porosity.
    pub fn porosity_exponent(self) -> Option<f64> {
        match self {
            Correlation::Winland => Some(1.47),
            Correlation::Dastidar => Some(3.06),
            _ => None,
        }
    }

    /// The curve parameter this model consumes.
    pub fn base(self, params: &CurveParameters) -> f64 {
        match self {
            Correlation::Winland => params.r35,
            Correlation::Swanson | Correlation::WellsAmaefule | Correlation::Kamath => {
                params.max_swanson
            }
            Correlation::Dastidar => params.dastidar_parameter,
        }
    }

    /// Permeability in mD, rounded to two decimals.
    ///
    /// # Errors
    ///
    /// [`EstimateError::Domain`] when `base` (or the porosity fraction, for
    /// Winland and Dastidar) is non-positive or not finite, or when the
    /// result overflows.
    pub fn evaluate(self, base: f64, porosity_fraction: f64) -> Result<f64> {
        if !(base.is_finite() && base > 0.0) {
            return Err(EstimateError::Domain {
                formula: self,
                base,
            });
        }
        let mut k = self.coefficient() * base.powf(self.exponent());
        if let Some(exp) = self.porosity_exponent() {
            if !(porosity_fraction.is_finite() && porosity_fraction > 0.0) {
                return Err(EstimateError::Domain {
                    formula: self,
                    base: porosity_fraction,
                });
            }
            k *= porosity_fraction.powf(exp);
        }
        // Checked after rounding: `k * 100` can overflow for a finite `k`.
        let k = round_to(k, 2);
        if !k.is_finite() {
            return Err(EstimateError::Domain {
                formula: self,
                base,
            });
        }
        Ok(k)
    }
}

impl fmt::Display for Correlation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Feature derivation
// ---------------------------------------------------------------------------

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Round half to even to `decimals` places (`rint(x * 10^d) / 10^d`).
///
/// Used where the rounded value feeds a selection, so exact halves such as
/// `0.345` go to `0.34` as lab spreadsheets report them.
pub fn round_half_even(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round_ties_even() / scale
}

/// Per-point features over an already cleaned curve.
///
/// `points` must stay in measurement order: the cumulative bulk saturation is
/// a running sum.
pub fn derive_features(
    points: &[CurvePoint],
    intruded_volume: f64,
    sample_bulk_volume: f64,
) -> Vec<DerivedPoint> {
    let mut cum_bulk_saturation = 0.0;
    points
        .iter()
        .map(|p| {
            // Two-decimal rounding here is part of the lab-report convention.
            let norm_cum_vol = round_half_even(p.cumulative_volume / intruded_volume, 2);
            let bulk_saturation = p.incremental_volume / sample_bulk_volume;
            cum_bulk_saturation += bulk_saturation;
            let dastidar_weight = p.incremental_volume / intruded_volume;
            let log_pore_radius = p.pore_radius.log10();
            DerivedPoint {
                pore_radius: p.pore_radius,
                norm_cum_vol,
                r35_distance: (norm_cum_vol - R35_SATURATION).abs(),
                bulk_saturation,
                cum_bulk_saturation,
                swanson_parameter: cum_bulk_saturation * 100.0 / p.pressure,
                dastidar_weight,
                log_pore_radius,
                weighted_log_pore_radius: log_pore_radius * dastidar_weight,
            }
        })
        .collect()
}

/// Pore radius closest to 35 % normalized saturation.
///
/// Exact ties on the distance are averaged. `None` for an empty slice.
pub fn r35_radius(features: &[DerivedPoint]) -> Option<f64> {
    let min = features
        .iter()
        .map(|f| f.r35_distance)
        .min_by(|a, b| a.total_cmp(b))?;
    let (sum, count) = features
        .iter()
        .filter(|f| f.r35_distance == min)
        .fold((0.0, 0usize), |(s, n), f| (s + f.pore_radius, n + 1));
    Some(sum / count as f64)
}

/// Largest Swanson parameter on the curve.
pub fn max_swanson(features: &[DerivedPoint]) -> Option<f64> {
    features
        .iter()
        .map(|f| f.swanson_parameter)
        .max_by(|a, b| a.total_cmp(b))
}

/// `10 ^ Σ weighted log10(radius)`: a volume-weighted geometric mean radius.
pub fn dastidar_parameter(features: &[DerivedPoint]) -> f64 {
    let exponent: f64 = features.iter().map(|f| f.weighted_log_pore_radius).sum();
    10f64.powf(exponent)
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

fn validate_porosity(porosity_percent: f64) -> Result<()> {
    if porosity_percent.is_finite() && porosity_percent > 0.0 && porosity_percent <= 100.0 {
        Ok(())
    } else {
        Err(EstimateError::InvalidInput(format!(
            "porosity must be within (0, 100] percent, got {porosity_percent}"
        )))
    }
}

/// Run the full pipeline and keep every intermediate value.
pub fn analyze(curve: &CapillaryCurve, sample: &SampleProperties) -> Result<CurveAnalysis> {
    validate_porosity(sample.porosity_percent)?;

    // Must come from the raw curve: cleaning may drop the terminal row.
    let intruded_volume = curve
        .intruded_volume()
        .ok_or(EstimateError::InsufficientData { valid: 0 })?;
    if !(intruded_volume.is_finite() && intruded_volume > 0.0) {
        return Err(EstimateError::InvalidInput(format!(
            "total intruded volume (last cumulative volume) must be positive, got {intruded_volume}"
        )));
    }
    let porosity_fraction = sample.porosity_fraction();
    let sample_bulk_volume = intruded_volume / porosity_fraction;

    let points = clean_points(&curve.points);
    let dropped = dropped_rows(&curve.points);
    if !dropped.is_empty() {
        debug!(
            "{}: dropped {} invalid row(s) at {:?}",
            sample.name,
            dropped.len(),
            dropped
        );
    }
    if points.len() < 2 {
        return Err(EstimateError::InsufficientData {
            valid: points.len(),
        });
    }

    let features = derive_features(&points, intruded_volume, sample_bulk_volume);
    let r35 = r35_radius(&features).ok_or(EstimateError::InsufficientData { valid: 0 })?;
    let swanson = max_swanson(&features).ok_or(EstimateError::InsufficientData { valid: 0 })?;
    let parameters = CurveParameters {
        intruded_volume,
        sample_bulk_volume,
        porosity_fraction,
        r35,
        max_swanson: swanson,
        dastidar_parameter: dastidar_parameter(&features),
    };
    debug!("{}: {:?}", sample.name, parameters);

    let k = |c: Correlation| c.evaluate(c.base(&parameters), porosity_fraction);
    let result = PermeabilityResult {
        sample: sample.name.clone(),
        winland_md: k(Correlation::Winland)?,
        swanson_md: k(Correlation::Swanson)?,
        wells_amaefule_md: k(Correlation::WellsAmaefule)?,
        kamath_md: k(Correlation::Kamath)?,
        dastidar_md: k(Correlation::Dastidar)?,
    };

    Ok(CurveAnalysis {
        features,
        parameters,
        result,
        dropped_rows: dropped.len(),
    })
}

/// Five permeability estimates for one sample.
pub fn estimate(curve: &CapillaryCurve, sample: &SampleProperties) -> Result<PermeabilityResult> {
    analyze(curve, sample).map(|a| a.result)
}

/// [`estimate`] for an unnamed sample.
pub fn estimate_with_porosity(
    curve: &CapillaryCurve,
    porosity_percent: f64,
) -> Result<PermeabilityResult> {
    estimate(curve, &SampleProperties::new("", porosity_percent))
}
