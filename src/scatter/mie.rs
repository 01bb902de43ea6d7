//! Mie scattering by a homogeneous sphere.
//!
//! The expansion coefficients `a_n`, `b_n` follow the Bohren & Huffman
//! formulation:
//!
//! - logarithmic derivative `D_n(mx)` by downward recurrence (stable for any `m`)
//! - Riccati-Bessel `psi_n(x)`, `chi_n(x)` by upward recurrence up to
//!   `n_stop = x + 4 x^(1/3) + 2`
//!
//! Angular amplitudes `S1`, `S2` are summed with the usual `pi_n` / `tau_n`
//! recurrences in `mu = cos(theta)`. Intensities are for unpolarised light,
//! `(|S1|^2 + |S2|^2) / 2`, in arbitrary but consistent units.

use std::f64::consts::PI;

use nalgebra::Complex;

use crate::domain::OpticalParameters;
use crate::math::trapezoid_where;
use crate::scatter::ScatterError;

/// Upper bound on series length. EV sizes stay far below this (x < 10).
const MAX_TERMS: usize = 20_000;

/// Extra terms for the downward `D_n` recurrence.
const DOWNWARD_PAD: usize = 15;

/// Expansion coefficients for one sphere.
#[derive(Debug, Clone)]
pub struct MieCoefficients {
    x: f64,
    a: Vec<Complex<f64>>,
    b: Vec<Complex<f64>>,
}

impl MieCoefficients {
    /// `m` is the particle index relative to the medium; `x = 2 pi r / lambda_medium`.
    pub fn compute(m: Complex<f64>, x: f64) -> Result<Self, ScatterError> {
        if !(x.is_finite() && x > 0.0) {
            return Err(ScatterError::InvalidSizeParameter { x });
        }
        let n_stop = ((x + 4.0 * x.cbrt() + 2.0).floor() as usize).max(1);
        if n_stop > MAX_TERMS {
            return Err(ScatterError::TooManyTerms {
                terms: n_stop,
                limit: MAX_TERMS,
            });
        }

        let mx = m * x;
        let n_mx = (n_stop as f64).max(mx.norm()).ceil() as usize + DOWNWARD_PAD;

        let mut d = vec![Complex::new(0.0, 0.0); n_mx + 1];
        for n in (1..=n_mx).rev() {
            let en = n as f64 / mx;
            d[n - 1] = en - 1.0 / (d[n] + en);
        }

        let mut psi_prev = x.cos();
        let mut psi_cur = x.sin();
        let mut chi_prev = -x.sin();
        let mut chi_cur = x.cos();
        let mut xi_cur = Complex::new(psi_cur, -chi_cur);

        let mut a = Vec::with_capacity(n_stop);
        let mut b = Vec::with_capacity(n_stop);
        for n in 1..=n_stop {
            let nf = n as f64;
            let psi = (2.0 * nf - 1.0) * psi_cur / x - psi_prev;
            let chi = (2.0 * nf - 1.0) * chi_cur / x - chi_prev;
            let xi = Complex::new(psi, -chi);

            let da = d[n] / m + nf / x;
            let db = d[n] * m + nf / x;
            a.push((da * psi - psi_cur) / (da * xi - xi_cur));
            b.push((db * psi - psi_cur) / (db * xi - xi_cur));

            psi_prev = psi_cur;
            psi_cur = psi;
            chi_prev = chi_cur;
            chi_cur = chi;
            xi_cur = Complex::new(psi_cur, -chi_cur);
        }

        Ok(Self { x, a, b })
    }

    /// Number of series terms.
    pub fn terms(&self) -> usize {
        self.a.len()
    }

    /// Scattering amplitudes `(S1, S2)` at `mu = cos(theta)`.
    pub fn amplitudes(&self, mu: f64) -> (Complex<f64>, Complex<f64>) {
        let mut s1 = Complex::new(0.0, 0.0);
        let mut s2 = Complex::new(0.0, 0.0);
        let mut pi_prev = 0.0;
        let mut pi_cur = 1.0;

        for (i, (&an, &bn)) in self.a.iter().zip(&self.b).enumerate() {
            let n = (i + 1) as f64;
            let tau = n * mu * pi_cur - (n + 1.0) * pi_prev;
            let weight = (2.0 * n + 1.0) / (n * (n + 1.0));
            s1 += (an * pi_cur + bn * tau) * weight;
            s2 += (an * tau + bn * pi_cur) * weight;

            let pi_next = ((2.0 * n + 1.0) * mu * pi_cur - (n + 1.0) * pi_prev) / n;
            pi_prev = pi_cur;
            pi_cur = pi_next;
        }
        (s1, s2)
    }

    /// Unpolarised intensity at `theta` (degrees).
    pub fn intensity(&self, angle_deg: f64) -> f64 {
        let (s1, s2) = self.amplitudes(angle_deg.to_radians().cos());
        0.5 * (s1.norm_sqr() + s2.norm_sqr())
    }

    /// Scattering efficiency `Q_sca`.
    pub fn scattering_efficiency(&self) -> f64 {
        let sum: f64 = self
            .a
            .iter()
            .zip(&self.b)
            .enumerate()
            .map(|(i, (an, bn))| {
                let n = (i + 1) as f64;
                (2.0 * n + 1.0) * (an.norm_sqr() + bn.norm_sqr())
            })
            .sum();
        2.0 * sum / (self.x * self.x)
    }
}

/// Intensity profile of a sphere of `diameter_nm` at each of `angles_deg`.
pub fn angular_intensity(
    optical: &OpticalParameters,
    diameter_nm: f64,
    angles_deg: &[f64],
) -> Result<Vec<f64>, ScatterError> {
    let x = PI * diameter_nm / optical.medium_wavelength_nm();
    let m = Complex::new(optical.relative_index(), 0.0);
    let coeffs = MieCoefficients::compute(m, x)?;

    angles_deg
        .iter()
        .map(|&angle_deg| {
            let i = coeffs.intensity(angle_deg);
            if i.is_finite() {
                Ok(i)
            } else {
                Err(ScatterError::NonFiniteIntensity { angle_deg })
            }
        })
        .collect()
}

/// FSC/SSC ratio: intensity integrated over each acceptance range.
pub fn acceptance_ratio(
    optical: &OpticalParameters,
    diameter_nm: f64,
    angles_deg: &[f64],
) -> Result<f64, ScatterError> {
    let intensity = angular_intensity(optical, diameter_nm, angles_deg)?;
    let fsc = trapezoid_where(angles_deg, &intensity, |a| optical.fsc_range.contains(a));
    let ssc = trapezoid_where(angles_deg, &intensity, |a| optical.ssc_range.contains(a));
    if ssc == 0.0 {
        return Err(ScatterError::ZeroSideScatter);
    }
    let ratio = fsc / ssc;
    if ratio.is_finite() {
        Ok(ratio)
    } else {
        Err(ScatterError::NonFiniteRatio(ratio))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AngleRange;
    use crate::math::linspace;

    #[test]
    fn rayleigh_limit_angular_shape() {
        // Tiny sphere: I(theta) ~ (1 + cos^2 theta) / 2.
        let c = MieCoefficients::compute(Complex::new(1.5, 0.0), 0.01).unwrap();
        let i0 = c.intensity(0.0);
        let i90 = c.intensity(90.0);
        let i180 = c.intensity(180.0);
        assert!((i90 / i0 - 0.5).abs() < 1e-3, "I90/I0 = {}", i90 / i0);
        assert!((i180 / i0 - 1.0).abs() < 1e-3, "I180/I0 = {}", i180 / i0);
    }

    #[test]
    fn rayleigh_limit_efficiency() {
        let m: f64 = 1.5;
        let x = 0.05;
        let c = MieCoefficients::compute(Complex::new(m, 0.0), x).unwrap();
        let lorentz = (m * m - 1.0) / (m * m + 2.0);
        let expected = 8.0 / 3.0 * x.powi(4) * lorentz * lorentz;
        let got = c.scattering_efficiency();
        assert!(
            ((got - expected) / expected).abs() < 0.02,
            "Q_sca {got} vs Rayleigh {expected}"
        );
    }

    #[test]
    fn larger_spheres_scatter_forward() {
        let c = MieCoefficients::compute(Complex::new(1.33, 0.0), 5.0).unwrap();
        assert!(c.terms() >= 5);
        assert!(c.intensity(0.0) > 10.0 * c.intensity(90.0));
    }

    #[test]
    fn acceptance_ratio_is_finite_for_ev_sizes() {
        let optical = OpticalParameters::default();
        let angles = linspace(0.0, 180.0, 1000);
        for d in [40.0, 100.0, 180.0] {
            let r = acceptance_ratio(&optical, d, &angles).unwrap();
            assert!(r.is_finite() && r > 0.0, "ratio at {d} nm = {r}");
        }
    }

    #[test]
    fn empty_side_acceptance_is_an_error() {
        let optical = OpticalParameters {
            ssc_range: AngleRange::new(90.0, 90.05),
            ..OpticalParameters::default()
        };
        let angles = linspace(0.0, 180.0, 1000);
        assert_eq!(
            acceptance_ratio(&optical, 100.0, &angles),
            Err(ScatterError::ZeroSideScatter)
        );
    }

    #[test]
    fn rejects_bad_size_parameter() {
        assert!(matches!(
            MieCoefficients::compute(Complex::new(1.5, 0.0), 0.0),
            Err(ScatterError::InvalidSizeParameter { .. })
        ));
    }
}
