/// Data layer: curve types, loading, and cleaning.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file, map columns, window rows → CapillaryCurve
///   └──────────┘
///        │
///        ▼
///   ┌────────────────┐
///   │ CapillaryCurve  │  raw rows, intruded volume from the last one
///   └────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  drop rows with non-positive / missing values
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod filter;
