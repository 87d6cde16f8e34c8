/// Computes the arithmetic mean of a slice of values. Returns `None` for empty input.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// `part` as a percentage of `total`, 0.0 when `total` is zero.
pub fn pct(part: f64, total: f64) -> f64 {
    if total == 0.0 {
        0.0
    } else {
        (part / total) * 100.0
    }
}

/// `count` divided by `units`, or `None` when there are no units.
pub fn rate(count: usize, units: usize) -> Option<f64> {
    if units == 0 {
        None
    } else {
        Some(count as f64 / units as f64)
    }
}

/// Minutes saved if the replaced vendor's events had taken the replacement
/// vendor's mean duration: `total - count * replacement_mean`.
pub fn counterfactual_reduction(total: f64, count: usize, replacement_mean: f64) -> f64 {
    total - count as f64 * replacement_mean
}
