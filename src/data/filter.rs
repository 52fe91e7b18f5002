use super::model::CurvePoint;

// ---------------------------------------------------------------------------
// Row cleaning: keep only fully valid measurements
// ---------------------------------------------------------------------------

/// A point survives cleaning only when every field is finite and strictly
/// positive. Logs and power laws downstream are undefined otherwise.
pub fn is_valid_point(point: &CurvePoint) -> bool {
    [
        point.pressure,
        point.pore_radius,
        point.incremental_volume,
        point.cumulative_volume,
    ]
    .iter()
    .all(|v| v.is_finite() && *v > 0.0)
}

/// Drop every row with a non-positive or missing field, preserving order.
///
/// A row failing on any single field is removed entirely.
pub fn clean_points(points: &[CurvePoint]) -> Vec<CurvePoint> {
    points.iter().copied().filter(is_valid_point).collect()
}

/// Raw indices of the rows [`clean_points`] removes.
pub fn dropped_rows(points: &[CurvePoint]) -> Vec<usize> {
    points
        .iter()
        .enumerate()
        .filter(|(_, p)| !is_valid_point(p))
        .map(|(i, _)| i)
        .collect()
}
