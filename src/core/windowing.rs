use crate::core::DataPoint;

/// Returns points whose logical time falls inside an inclusive time window.
#[must_use]
pub fn points_in_time_window(points: &[DataPoint], start: f64, end: f64) -> Vec<DataPoint> {
    let (min_t, max_t) = if start <= end {
        (start, end)
    } else {
        (end, start)
    };

    points
        .iter()
        .copied()
        .filter(|point| point.x >= min_t && point.x <= max_t)
        .collect()
}

/// Keeps every `ceil(len / max_points)`-th point so the result never exceeds
/// `max_points`. Series already under the limit are returned unchanged.
///
/// `max_points == 0` disables decimation.
#[must_use]
pub fn decimate_by_stride(points: Vec<DataPoint>, max_points: usize) -> Vec<DataPoint> {
    if max_points == 0 || points.len() <= max_points {
        return points;
    }
    let stride = points.len().div_ceil(max_points);
    points.into_iter().step_by(stride).collect()
}
