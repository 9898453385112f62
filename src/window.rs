//! Simulation window: start, end, and timestep of a generation run.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};

use crate::error::{GenerationError, Result};

/// Minutes in one day.
pub const MINUTES_PER_DAY: i64 = 24 * 60;

/// Fixed time grid of a generation run.
///
/// Timestamps run from `start` to `end` inclusive in steps of
/// `dt_minutes`; an `end` that does not fall on the grid is dropped.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use load_synth::window::SimulationWindow;
///
/// let start = NaiveDate::from_ymd_opt(2012, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
/// let end = NaiveDate::from_ymd_opt(2012, 1, 1).unwrap().and_hms_opt(1, 0, 0).unwrap();
/// let window = SimulationWindow::new(start, end, 5).unwrap();
/// assert_eq!(window.nb_steps(), 13);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationWindow {
    start: NaiveDateTime,
    end: NaiveDateTime,
    dt_minutes: u32,
    nb_steps: usize,
}

impl SimulationWindow {
    /// Creates a window, deriving the number of timesteps.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `dt_minutes` is zero or `end`
    /// precedes `start`.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime, dt_minutes: u32) -> Result<Self> {
        if dt_minutes == 0 {
            return Err(GenerationError::config("simulation.dt_minutes", "must be > 0"));
        }
        let span = (end - start).num_minutes();
        if span < 0 {
            return Err(GenerationError::config(
                "simulation.end",
                "must not precede simulation.start",
            ));
        }
        let nb_steps = (span / i64::from(dt_minutes)) as usize + 1;
        Ok(Self {
            start,
            end,
            dt_minutes,
            nb_steps,
        })
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn dt_minutes(&self) -> u32 {
        self.dt_minutes
    }

    /// Number of timesteps `Nt`.
    pub fn nb_steps(&self) -> usize {
        self.nb_steps
    }

    /// Length of the window in minutes.
    pub fn total_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Timestamp of step `t`.
    pub fn timestamp(&self, t: usize) -> NaiveDateTime {
        self.start + Duration::minutes(t as i64 * i64::from(self.dt_minutes))
    }

    /// All `Nt` timestamps in ascending order.
    pub fn timestamps(&self) -> Vec<NaiveDateTime> {
        (0..self.nb_steps).map(|t| self.timestamp(t)).collect()
    }

    /// Minutes elapsed between 1 January of the start year and step `t`.
    pub fn minutes_since_year_start(&self, t: usize) -> i64 {
        let year_start = NaiveDate::from_ymd_opt(self.start.year(), 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or(self.start);
        (self.timestamp(t) - year_start).num_minutes()
    }

    /// Minutes elapsed since the Monday 00:00 preceding step `t`.
    pub fn minute_of_week(&self, t: usize) -> i64 {
        let ts = self.timestamp(t);
        i64::from(ts.weekday().num_days_from_monday()) * MINUTES_PER_DAY
            + i64::from(ts.hour()) * 60
            + i64::from(ts.minute())
    }
}
