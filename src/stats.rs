//! Small aggregation primitives shared by the calibration engines.

/// Arithmetic mean. `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Two-pass sample standard deviation, `sqrt(sum((x - mean)^2) / (n - 1))`.
///
/// Undefined for fewer than two values. Kept as a standalone primitive: the
/// engines aggregate with a plain mean, and the planned deviation-based
/// outlier rejection was never enabled upstream.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = values.iter().sum::<f64>() / values.len() as f64;
    let sum_sq: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}
