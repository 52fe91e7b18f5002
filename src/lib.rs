//! # micp-perm
//!
//! Permeability estimates from Mercury Injection Capillary Pressure (MICP)
//! curves using the Winland, Swanson, Wells-Amaefule, Kamath and Dastidar
//! correlations.
//!
//! - [`data`]: curve types, file loading and row cleaning
//! - [`estimator`]: feature derivation and the five correlations
//! - [`export`]: CSV output of results and feature tables
//!
//! ```
//! use micp_perm::data::model::{CapillaryCurve, CurvePoint, SampleProperties};
//! use micp_perm::estimator::estimate;
//!
//! let curve: CapillaryCurve = [
//!     (10.0, 20.0, 0.5, 0.5),
//!     (50.0, 5.0, 1.0, 1.5),
//!     (200.0, 1.0, 0.3, 1.8),
//! ]
//! .into_iter()
//! .map(CurvePoint::from)
//! .collect();
//!
//! let k = estimate(&curve, &SampleProperties::new("S1", 20.0)).unwrap();
//! assert_eq!(k.winland_md, 755.08);
//! ```

pub mod data;
pub mod error;
pub mod estimator;
pub mod export;

pub use error::EstimateError;
