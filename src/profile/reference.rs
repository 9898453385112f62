//! Reference curves: nameplate capacity times the weekly usage shape.

use super::weekly::WeeklyPattern;
use crate::site::LoadSite;
use crate::window::SimulationWindow;

/// Deterministic baseline trajectory of every load.
///
/// No randomness is involved; the same inputs always give the same curves.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceCurves {
    nb_t: usize,
    values: Vec<f64>,
}

impl ReferenceCurves {
    /// Scales the weekly pattern, sampled with `day_lag`, by each load's Pmax.
    pub fn build(
        loads: &[LoadSite],
        weekly: &WeeklyPattern,
        window: &SimulationWindow,
        day_lag: u32,
    ) -> Self {
        let shape = weekly.series(window, day_lag);
        let values = loads
            .iter()
            .flat_map(|load| shape.iter().map(move |w| load.pmax * w))
            .collect();
        Self {
            nb_t: shape.len(),
            values,
        }
    }

    pub fn nb_steps(&self) -> usize {
        self.nb_t
    }

    /// Reference curve of one load.
    pub fn load(&self, index: usize) -> &[f64] {
        &self.values[index * self.nb_t..(index + 1) * self.nb_t]
    }
}
