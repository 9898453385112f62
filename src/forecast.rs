//! Forecast horizons and multi-horizon forecast assembly.

use std::fmt;

use tracing::warn;

use crate::config::ForecastConfig;
use crate::error::{GenerationError, Result};
use crate::noise::NoiseTensor;

/// One forecast lead time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Horizon {
    /// Lead time as configured, in minutes.
    pub minutes: u32,
    /// Lead time in simulation steps (`minutes / dt`, rounded down).
    pub steps: usize,
    /// Noise standard deviation, relative to Pmax.
    pub std: f64,
}

/// A horizon that is not a whole number of timesteps.
///
/// Generation proceeds with the rounded-down step count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsistencyWarning {
    pub horizon_minutes: u32,
    pub dt_minutes: u32,
    pub rounded_steps: usize,
}

impl fmt::Display for ConsistencyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "forecast horizon of {} min is not a multiple of the {} min timestep, rounded to {} step(s)",
            self.horizon_minutes, self.dt_minutes, self.rounded_steps
        )
    }
}

/// Ordered list of forecast horizons.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSpec {
    horizons: Vec<Horizon>,
}

impl ForecastSpec {
    /// Converts the configured horizons to step counts.
    ///
    /// Horizons that are not a multiple of `dt_minutes` are rounded down;
    /// each one yields a [`ConsistencyWarning`], also logged.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an empty horizon list, mismatched
    /// horizon/std lengths, a non-positive std or neighbour count, or a
    /// zero `dt_minutes`.
    pub fn from_config(
        cfg: &ForecastConfig,
        dt_minutes: u32,
    ) -> Result<(Self, Vec<ConsistencyWarning>)> {
        if dt_minutes == 0 {
            return Err(GenerationError::config("simulation.dt_minutes", "must be > 0"));
        }
        let mut errors = Vec::new();
        cfg.check(&mut errors);
        if let Some(first) = errors.into_iter().next() {
            return Err(first.into());
        }

        let mut warnings = Vec::new();
        let horizons = cfg
            .horizons_minutes
            .iter()
            .zip(&cfg.horizon_std)
            .map(|(&minutes, &std)| {
                let steps = (minutes / dt_minutes) as usize;
                if minutes % dt_minutes != 0 {
                    let warning = ConsistencyWarning {
                        horizon_minutes: minutes,
                        dt_minutes,
                        rounded_steps: steps,
                    };
                    warn!("{warning}");
                    warnings.push(warning);
                }
                Horizon {
                    minutes,
                    steps,
                    std,
                }
            })
            .collect();

        Ok((Self { horizons }, warnings))
    }

    pub fn horizons(&self) -> &[Horizon] {
        &self.horizons
    }

    /// Number of horizons.
    pub fn len(&self) -> usize {
        self.horizons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.horizons.is_empty()
    }

    /// Checks that every horizon leaves at least one valid forecast row.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a horizon spans `nb_t` steps or more.
    pub fn check_window(&self, nb_t: usize) -> Result<()> {
        match self.horizons.iter().find(|h| h.steps >= nb_t) {
            Some(h) => Err(GenerationError::config(
                "forecast.horizons_minutes",
                format!(
                    "horizon of {} min ({} steps) does not fit in a window of {nb_t} steps",
                    h.minutes, h.steps
                ),
            )),
            None => Ok(()),
        }
    }

    /// Builds every horizon's forecast for one load.
    ///
    /// For horizon `h` with `s` steps the forecast at `t` is the ground
    /// truth at `t + s` plus `noise[t, 1 + h] * std_h * pmax`. The last `s`
    /// rows would wrap around to the start of the window, so they repeat
    /// row `nb_t - s - 1` instead.
    ///
    /// # Arguments
    ///
    /// * `truth` - Ground-truth series of the load (length `nb_t`)
    /// * `noise` - Renormalised noise tensor of the run
    /// * `load` - Index of the load in `noise`
    /// * `pmax` - Nameplate capacity of the load
    ///
    /// # Returns
    ///
    /// `nb_t * len()` values, timestep-major with the horizon varying fastest.
    pub fn forecast_load(&self, truth: &[f64], noise: &NoiseTensor, load: usize, pmax: f64) -> Vec<f64> {
        let nb_t = truth.len();
        let nb_h = self.horizons.len();
        let mut out = vec![0.0; nb_t * nb_h];

        for (h, horizon) in self.horizons.iter().enumerate() {
            let s = horizon.steps;
            let scale = horizon.std * pmax;
            for t in 0..nb_t {
                let rolled = truth[(t + s) % nb_t];
                out[t * nb_h + h] = rolled + noise.get(load, t, 1 + h) * scale;
            }

            if s > 0 && s < nb_t {
                let edge = out[(nb_t - s - 1) * nb_h + h];
                for t in (nb_t - s)..nb_t {
                    out[t * nb_h + h] = edge;
                }
            }
        }
        out
    }
}
