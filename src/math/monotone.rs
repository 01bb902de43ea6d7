//! Post-processing that turns raw per-diameter ratios into a usable lookup.

/// Outcome of [`monotone_envelope`].
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// Non-decreasing, finite values.
    Curve(Vec<f64>),
    /// No input value was finite.
    Degenerate,
}

/// Replace non-finite values with the largest finite value, then sweep a
/// running maximum from left to right.
pub fn monotone_envelope(raw: &[f64]) -> Envelope {
    let Some(max_finite) = raw
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .reduce(f64::max)
    else {
        return Envelope::Degenerate;
    };

    let mut running = f64::NEG_INFINITY;
    let out = raw
        .iter()
        .map(|&v| {
            let v = if v.is_finite() { v } else { max_finite };
            running = running.max(v);
            running
        })
        .collect();
    Envelope::Curve(out)
}
