//! Scattering models behind the theoretical lookup.
//!
//! Two strategies share one contract (raw FSC/SSC ratio for a single diameter):
//!
//! - `Mie`: exact homogeneous-sphere solution, integrated over the detector
//!   acceptance angles (cargo feature `mie`, on by default)
//! - `Surrogate`: closed-form monotone power law, always available
//!
//! The strategy is chosen once at startup via [`ScatteringStrategy::select`].

#[cfg(feature = "mie")]
pub mod mie;
pub mod surrogate;

use thiserror::Error;

use crate::domain::{OpticalParameters, ScatteringKind, ScatteringModel, SurrogateParams};
use crate::error::SizingError;

/// Setting this environment variable (any value) hides the Mie solver from
/// capability detection.
pub const DISABLE_MIE_ENV: &str = "EVSIZE_DISABLE_MIE";

/// Failure to produce a ratio for one diameter.
///
/// The builder absorbs these; they never abort a whole curve.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScatterError {
    #[error("size parameter {x} is not a positive finite number")]
    InvalidSizeParameter { x: f64 },
    #[error("series needs {terms} terms (limit {limit})")]
    TooManyTerms { terms: usize, limit: usize },
    #[error("non-finite intensity at {angle_deg} deg")]
    NonFiniteIntensity { angle_deg: f64 },
    #[error("side-scatter integral is zero")]
    ZeroSideScatter,
    #[error("non-finite ratio {0}")]
    NonFiniteRatio(f64),
}

/// Scattering model used by the lookup builder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScatteringStrategy {
    #[cfg(feature = "mie")]
    Mie,
    Surrogate(SurrogateParams),
}

impl ScatteringStrategy {
    /// Mie when the capability is present, otherwise the default surrogate.
    pub fn detect() -> Self {
        Self::mie_strategy().unwrap_or(ScatteringStrategy::Surrogate(SurrogateParams::default()))
    }

    /// Resolve a user request against what this build/environment provides.
    pub fn select(model: ScatteringModel) -> Result<Self, SizingError> {
        match model {
            ScatteringModel::Auto => Ok(Self::detect()),
            ScatteringModel::Surrogate => Ok(ScatteringStrategy::Surrogate(SurrogateParams::default())),
            ScatteringModel::Mie => Self::mie_strategy().ok_or_else(|| {
                SizingError::invalid(
                    "scattering model",
                    format!(
                        "Mie is unavailable (built without feature `mie` or disabled by {DISABLE_MIE_ENV})"
                    ),
                )
            }),
        }
    }

    pub fn mie_available() -> bool {
        Self::mie_strategy().is_some()
    }

    fn mie_strategy() -> Option<Self> {
        #[cfg(feature = "mie")]
        {
            if std::env::var_os(DISABLE_MIE_ENV).is_none() {
                return Some(ScatteringStrategy::Mie);
            }
        }
        None
    }

    pub fn kind(&self) -> ScatteringKind {
        match self {
            #[cfg(feature = "mie")]
            ScatteringStrategy::Mie => ScatteringKind::Mie,
            ScatteringStrategy::Surrogate(_) => ScatteringKind::Surrogate,
        }
    }

    /// Whether [`raw_ratio`](Self::raw_ratio) reads the angular grid.
    pub fn uses_angles(&self) -> bool {
        matches!(self.kind(), ScatteringKind::Mie)
    }

    pub fn validate(&self) -> Result<(), SizingError> {
        match self {
            #[cfg(feature = "mie")]
            ScatteringStrategy::Mie => Ok(()),
            ScatteringStrategy::Surrogate(params) => surrogate::validate(params),
        }
    }

    /// Raw (pre-envelope) FSC/SSC ratio for one diameter.
    ///
    /// `angles_deg` is the angular sampling grid over [0, 180]; only the
    /// samples inside each acceptance range are integrated.
    #[cfg_attr(not(feature = "mie"), allow(unused_variables))]
    pub fn raw_ratio(
        &self,
        optical: &OpticalParameters,
        diameter_nm: f64,
        angles_deg: &[f64],
    ) -> Result<f64, ScatterError> {
        match self {
            #[cfg(feature = "mie")]
            ScatteringStrategy::Mie => mie::acceptance_ratio(optical, diameter_nm, angles_deg),
            ScatteringStrategy::Surrogate(params) => surrogate::ratio(params, diameter_nm),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surrogate_is_always_selectable() {
        let s = ScatteringStrategy::select(ScatteringModel::Surrogate).unwrap();
        assert_eq!(s.kind(), ScatteringKind::Surrogate);
        assert!(!s.uses_angles());
        assert!(s.validate().is_ok());
    }

    #[test]
    fn explicit_mie_request_matches_capability() {
        let requested = ScatteringStrategy::select(ScatteringModel::Mie);
        if ScatteringStrategy::mie_available() {
            assert_eq!(requested.unwrap().kind(), ScatteringKind::Mie);
        } else {
            assert!(matches!(requested, Err(SizingError::InvalidParameter { .. })));
        }
    }

    #[test]
    fn auto_falls_back_consistently() {
        let auto = ScatteringStrategy::select(ScatteringModel::Auto).unwrap();
        let expected = if ScatteringStrategy::mie_available() {
            ScatteringKind::Mie
        } else {
            ScatteringKind::Surrogate
        };
        assert_eq!(auto.kind(), expected);
    }
}
