//! Closed-form surrogate used when the Mie solver is unavailable.
//!
//! `ratio(D) = A * D^p / (B + D^q)`
//!
//! With `p > q` and positive constants this increases monotonically with `D`,
//! which is the only property the estimator relies on.

use crate::domain::SurrogateParams;
use crate::error::SizingError;
use crate::scatter::ScatterError;

pub fn ratio(params: &SurrogateParams, diameter_nm: f64) -> Result<f64, ScatterError> {
    let d = diameter_nm;
    let value = (params.a * d.powf(params.p)) / (params.b + d.powf(params.q));
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ScatterError::NonFiniteRatio(value))
    }
}

pub fn validate(params: &SurrogateParams) -> Result<(), SizingError> {
    let finite = [params.a, params.p, params.b, params.q]
        .iter()
        .all(|v| v.is_finite());
    if !finite || params.a <= 0.0 || params.b < 0.0 {
        return Err(SizingError::invalid(
            "surrogate parameters",
            format!(
                "A={}, p={}, B={}, q={} (need finite values, A > 0, B >= 0)",
                params.a, params.p, params.b, params.q
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_constants_strictly_increase_over_ev_range() {
        let params = SurrogateParams::default();
        let raw: Vec<f64> = (40..=180)
            .map(|d| ratio(&params, d as f64).unwrap())
            .collect();
        for w in raw.windows(2) {
            assert!(w[1] > w[0], "surrogate not strictly increasing: {} -> {}", w[0], w[1]);
        }
    }

    #[test]
    fn matches_closed_form() {
        let params = SurrogateParams::default();
        let d: f64 = 100.0;
        let expected = 1e-6 * d.powf(5.5) / (1e-2 + d.powi(3));
        assert!((ratio(&params, d).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn rejects_unusable_constants() {
        let bad = SurrogateParams {
            a: 0.0,
            ..SurrogateParams::default()
        };
        assert!(validate(&bad).is_err());
        assert!(validate(&SurrogateParams::default()).is_ok());
    }
}
