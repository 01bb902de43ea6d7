//! Trapezoidal quadrature over a selected subset of samples.

/// Integrate `ys(xs)` with the trapezoidal rule using only samples where
/// `keep(x)` holds.
///
/// The kept samples are treated as one consecutive run (adjacent kept samples
/// are joined even if rejected samples lie between them), matching a masked
/// trapezoid over sorted abscissae. Fewer than two kept samples integrate to 0.
pub fn trapezoid_where<F>(xs: &[f64], ys: &[f64], keep: F) -> f64
where
    F: Fn(f64) -> bool,
{
    let mut total = 0.0;
    let mut prev: Option<(f64, f64)> = None;
    for (&x, &y) in xs.iter().zip(ys) {
        if !keep(x) {
            continue;
        }
        if let Some((px, py)) = prev {
            total += 0.5 * (x - px) * (y + py);
        }
        prev = Some((x, y));
    }
    total
}
