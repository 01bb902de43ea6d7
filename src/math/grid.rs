//! Uniform grids and piecewise-linear interpolation on them.

/// `steps` evenly spaced points between `min` and `max` (inclusive).
///
/// Callers validate the range; `steps < 2` yields `[min]` (or nothing for 0).
pub fn linspace(min: f64, max: f64, steps: usize) -> Vec<f64> {
    match steps {
        0 => Vec::new(),
        1 => vec![min],
        _ => {
            let step = (max - min) / (steps as f64 - 1.0);
            let mut out: Vec<f64> = (0..steps).map(|i| min + step * i as f64).collect();
            // Pin the last point so it is exactly `max`.
            out[steps - 1] = max;
            out
        }
    }
}

/// Linear interpolation of `ys` over increasing `xs`, clamped at both ends.
///
/// Returns NaN if the arrays are empty or have different lengths.
pub fn interp_linear(x: f64, xs: &[f64], ys: &[f64]) -> f64 {
    if xs.is_empty() || xs.len() != ys.len() || !x.is_finite() {
        return f64::NAN;
    }
    let last = xs.len() - 1;
    if x <= xs[0] {
        return ys[0];
    }
    if x >= xs[last] {
        return ys[last];
    }
    // First index with xs[i] > x; guaranteed in 1..=last here.
    let hi = xs.partition_point(|&v| v <= x);
    let lo = hi - 1;
    let span = xs[hi] - xs[lo];
    if span <= 0.0 {
        return ys[lo];
    }
    let u = (x - xs[lo]) / span;
    ys[lo] + u * (ys[hi] - ys[lo])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linspace_includes_endpoints() {
        let v = linspace(0.0, 180.0, 1000);
        assert_eq!(v.len(), 1000);
        assert_eq!(v[0], 0.0);
        assert_eq!(v[999], 180.0);
        assert!(v.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn interp_linear_clamps_and_interpolates() {
        let xs = [10.0, 20.0, 30.0];
        let ys = [1.0, 2.0, 4.0];
        assert_eq!(interp_linear(5.0, &xs, &ys), 1.0);
        assert_eq!(interp_linear(35.0, &xs, &ys), 4.0);
        assert!((interp_linear(25.0, &xs, &ys) - 3.0).abs() < 1e-12);
        assert!((interp_linear(20.0, &xs, &ys) - 2.0).abs() < 1e-12);
        assert!(interp_linear(f64::NAN, &xs, &ys).is_nan());
    }
}
