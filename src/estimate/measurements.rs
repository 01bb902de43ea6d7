//! Event cleaning and measured-ratio derivation.
//!
//! A measured ratio is `FSC / SSC` and is defined only when both channels are
//! finite and `SSC != 0`; otherwise it is NaN and the estimator leaves the row
//! unknown.

use crate::domain::{CleaningOptions, Measurement, MeasurementSet};

impl Measurement {
    pub fn ratio(&self) -> f64 {
        if self.fsc.is_finite() && self.ssc.is_finite() && self.ssc != 0.0 {
            self.fsc / self.ssc
        } else {
            f64::NAN
        }
    }

    fn has_missing_channel(&self) -> bool {
        !(self.fsc.is_finite() && self.ssc.is_finite())
    }
}

impl MeasurementSet {
    pub fn new(events: Vec<Measurement>) -> Self {
        Self { events }
    }

    pub fn from_pairs(fsc: &[f64], ssc: &[f64]) -> Self {
        Self::new(
            fsc.iter()
                .zip(ssc)
                .map(|(&fsc, &ssc)| Measurement { fsc, ssc })
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Apply `options`: negatives become NaN first, then events with a missing
    /// channel are dropped.
    pub fn clean(&self, options: CleaningOptions) -> MeasurementSet {
        self.clean_with_rows(options).0
    }

    /// [`MeasurementSet::clean`] plus the original row of every kept event.
    pub fn clean_with_rows(&self, options: CleaningOptions) -> (MeasurementSet, Vec<usize>) {
        let mut events = Vec::with_capacity(self.events.len());
        let mut rows = Vec::with_capacity(self.events.len());
        for (row, m) in self.events.iter().enumerate() {
            let m = if options.ignore_negative {
                Measurement {
                    fsc: if m.fsc < 0.0 { f64::NAN } else { m.fsc },
                    ssc: if m.ssc < 0.0 { f64::NAN } else { m.ssc },
                }
            } else {
                *m
            };
            if options.drop_missing && m.has_missing_channel() {
                continue;
            }
            events.push(m);
            rows.push(row);
        }
        (MeasurementSet { events }, rows)
    }

    /// Per-event FSC/SSC ratios, NaN where undefined.
    pub fn ratios(&self) -> Vec<f64> {
        self.events.iter().map(Measurement::ratio).collect()
    }
}
