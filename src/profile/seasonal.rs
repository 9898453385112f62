//! Yearly demand level as a cosine of the day of year.

use std::f64::consts::PI;

use crate::config::SeasonalConfig;
use crate::window::{MINUTES_PER_DAY, SimulationWindow};

/// Multiplicative seasonal level, highest at `phase_days` after 1 January.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeasonalPattern {
    mean: f64,
    amplitude: f64,
    phase_minutes: f64,
    period_minutes: f64,
}

impl SeasonalPattern {
    pub fn new(cfg: &SeasonalConfig) -> Self {
        let day = MINUTES_PER_DAY as f64;
        Self {
            mean: cfg.mean,
            amplitude: cfg.amplitude,
            phase_minutes: cfg.phase_days * day,
            period_minutes: cfg.period_days * day,
        }
    }

    /// Level at `minute` minutes after 1 January of the start year.
    pub fn value(&self, minute: f64) -> f64 {
        self.mean + self.amplitude * (2.0 * PI * (minute - self.phase_minutes) / self.period_minutes).cos()
    }

    /// Level at every timestep of `window`.
    pub fn series(&self, window: &SimulationWindow) -> Vec<f64> {
        (0..window.nb_steps())
            .map(|t| self.value(window.minutes_since_year_start(t) as f64))
            .collect()
    }
}
