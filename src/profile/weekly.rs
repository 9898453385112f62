//! Weekly usage pattern table and its cyclic sampling.

use crate::error::{GenerationError, Result};
use crate::window::{MINUTES_PER_DAY, SimulationWindow};

/// Typical consumption shape over one week, reused cyclically.
///
/// Row `i` of the table holds the value at minute `i * step_minutes` of the
/// pattern; values in between are linearly interpolated and the last row
/// wraps around to the first.
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyPattern {
    values: Vec<f64>,
    step_minutes: u32,
}

impl WeeklyPattern {
    /// Wraps a pattern table.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::InvalidInput`] if the table is empty or
    /// holds a non-finite value, and a configuration error if
    /// `step_minutes` is zero.
    pub fn new(values: Vec<f64>, step_minutes: u32) -> Result<Self> {
        if step_minutes == 0 {
            return Err(GenerationError::config("weekly.step_minutes", "must be > 0"));
        }
        if values.is_empty() {
            return Err(GenerationError::InvalidInput("weekly pattern is empty".into()));
        }
        if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
            return Err(GenerationError::InvalidInput(format!(
                "weekly pattern row {pos} is not a finite number"
            )));
        }
        Ok(Self {
            values,
            step_minutes,
        })
    }

    /// A pattern that is identically one.
    pub fn flat() -> Self {
        Self {
            values: vec![1.0],
            step_minutes: 5,
        }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Length of one pattern cycle in minutes.
    pub fn period_minutes(&self) -> f64 {
        self.values.len() as f64 * f64::from(self.step_minutes)
    }

    /// Pattern value at `minute`, wrapping around the cycle.
    pub fn sample(&self, minute: f64) -> f64 {
        let pos = minute.rem_euclid(self.period_minutes()) / f64::from(self.step_minutes);
        let i = (pos.floor() as usize).min(self.values.len() - 1);
        let frac = pos - i as f64;
        let next = self.values[(i + 1) % self.values.len()];
        self.values[i] + (next - self.values[i]) * frac
    }

    /// Samples the pattern at every timestep of `window`.
    ///
    /// Timestep `t` reads the pattern at its minute of the week (Monday
    /// 00:00 = 0) shifted by `day_lag` days.
    pub fn series(&self, window: &SimulationWindow, day_lag: u32) -> Vec<f64> {
        let lag = i64::from(day_lag) * MINUTES_PER_DAY;
        (0..window.nb_steps())
            .map(|t| self.sample((window.minute_of_week(t) + lag) as f64))
            .collect()
    }
}
