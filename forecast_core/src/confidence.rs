//! Centrality score of a point estimate inside its own band

/// Confidence lost per unit a value sits outside its band
const OUTSIDE_PENALTY: f64 = 2.0;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// How centered `value` is in `[lower, upper]`, in percent.
///
/// 100 at the exact center, decaying linearly by `decay` towards either
/// bound. Values on or outside a bound lose [`OUTSIDE_PENALTY`] per unit of
/// distance, floored at zero. A zero-width band scores 100.
pub fn confidence_pct(value: i64, lower: i64, upper: i64, decay: f64) -> f64 {
    if upper <= lower {
        return 100.0;
    }
    if value <= lower {
        return (100.0 - (lower - value) as f64 * OUTSIDE_PENALTY).max(0.0);
    }
    if value >= upper {
        return (100.0 - (value - upper) as f64 * OUTSIDE_PENALTY).max(0.0);
    }

    let width = (upper - lower) as f64;
    let center = (upper as f64 + lower as f64) / 2.0;
    let distance = (value as f64 - center).abs();
    round2(100.0 - distance / (width / 2.0) * decay)
}
