//! Caller-owned memo of built curves.
//!
//! Building a Mie curve costs `points x angles x terms`; repeated analyses with
//! unchanged optics can reuse it. Keys cover every input that influences the
//! curve (strategy, optics, full diameter grid) compared bit-for-bit, and
//! entries are never invalidated implicitly.

use std::collections::HashMap;

use tracing::debug;

use crate::domain::{DiameterGrid, OpticalParameters, ScatteringKind, TheoreticalCurve};
use crate::error::SizingError;
use crate::lookup::CurveBuilder;
use crate::scatter::ScatteringStrategy;

/// Exact identity of a curve build.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CurveKey {
    kind: ScatteringKind,
    strategy_params: [u64; 4],
    optical: [u64; 7],
    diameters: Vec<u64>,
}

impl CurveKey {
    pub fn new(
        strategy: &ScatteringStrategy,
        optical: &OpticalParameters,
        diameters: &DiameterGrid,
    ) -> Self {
        let strategy_params = match strategy {
            #[cfg(feature = "mie")]
            ScatteringStrategy::Mie => [0; 4],
            ScatteringStrategy::Surrogate(p) => {
                [p.a.to_bits(), p.p.to_bits(), p.b.to_bits(), p.q.to_bits()]
            }
        };
        Self {
            kind: strategy.kind(),
            strategy_params,
            optical: [
                optical.wavelength_nm.to_bits(),
                optical.n_particle.to_bits(),
                optical.n_medium.to_bits(),
                optical.fsc_range.lo.to_bits(),
                optical.fsc_range.hi.to_bits(),
                optical.ssc_range.lo.to_bits(),
                optical.ssc_range.hi.to_bits(),
            ],
            diameters: diameters.as_slice().iter().map(|d| d.to_bits()).collect(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CurveCache {
    entries: HashMap<CurveKey, TheoreticalCurve>,
    hits: usize,
    misses: usize,
}

impl CurveCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached curve for these inputs, building it on first use.
    ///
    /// Build errors are returned and not cached.
    pub fn get_or_build(
        &mut self,
        builder: &CurveBuilder,
        optical: &OpticalParameters,
        diameters: &DiameterGrid,
    ) -> Result<&TheoreticalCurve, SizingError> {
        let key = CurveKey::new(builder.strategy(), optical, diameters);
        if self.entries.contains_key(&key) {
            self.hits += 1;
            debug!(hits = self.hits, "theoretical curve cache hit");
        } else {
            let curve = builder.build(optical, diameters)?;
            self.misses += 1;
            debug!(misses = self.misses, points = curve.len(), "theoretical curve built");
            self.entries.insert(key.clone(), curve);
        }
        Ok(&self.entries[&key])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
