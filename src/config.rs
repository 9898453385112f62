//! TOML-based generator configuration and preset definitions.

use std::fmt;
use std::fs;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

use crate::noise::knn::KnnAlgorithm;

/// Default neighbour count of the correlation model.
///
/// Empirical tuning value carried over as a plain constant.
pub const DEFAULT_N_NEIGHBORS: i64 = 16 * 15 - 32;

/// Default kd-tree leaf size of the correlation model.
pub const DEFAULT_LEAF_SIZE: usize = 100;

/// Top-level generator configuration parsed from TOML.
///
/// Every section except `[forecast]` has defaults; `[forecast]` must at
/// least name the horizons and their noise levels. Load from TOML with
/// [`GeneratorConfig::from_toml_file`] or start from
/// [`GeneratorConfig::baseline`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Simulation window and ground-truth parameters.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Correlation mesh density.
    #[serde(default)]
    pub mesh: MeshConfig,
    /// Seasonal pattern parameters.
    #[serde(default)]
    pub seasonal: SeasonalConfig,
    /// Weekly pattern table layout.
    #[serde(default)]
    pub weekly: WeeklyConfig,
    /// Forecast horizons and correlation model settings.
    pub forecast: ForecastConfig,
}

/// Simulation window and ground-truth parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// First timestamp of the window (inclusive).
    pub start: NaiveDateTime,
    /// Last timestamp of the window (inclusive).
    pub end: NaiveDateTime,
    /// Timestep duration in minutes (must be > 0).
    pub dt_minutes: u32,
    /// Master random seed; `None` lets the caller draw a fresh one.
    pub seed: Option<u64>,
    /// Standard deviation of the temperature-noise channel.
    pub std_temperature_noise: f64,
    /// Reactive / active power ratio.
    pub q_from_p_ratio: f64,
    /// Day offset applied when sampling the weekly pattern.
    pub day_lag: u32,
}

fn midnight(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            start: midnight(2012, 1, 1),
            end: midnight(2012, 1, 8),
            dt_minutes: 5,
            seed: None,
            std_temperature_noise: 0.06,
            q_from_p_ratio: 0.7,
            day_lag: 6,
        }
    }
}

/// Correlation mesh density.
///
/// The spatial and temporal axis extents are `floor(extent / corr) + 1`
/// plus an extra dimension derived from the load coordinates.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MeshConfig {
    /// Grid extent along x.
    pub lx: f64,
    /// Grid extent along y.
    pub ly: f64,
    /// Spatial correlation length along x.
    pub dx_corr: f64,
    /// Spatial correlation length along y.
    pub dy_corr: f64,
    /// Temporal correlation length in minutes.
    pub dt_corr_minutes: f64,
    /// Global multiplier on every axis rescaling factor.
    pub ratio_adjust: f64,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            lx: 1000.0,
            ly: 1000.0,
            dx_corr: 250.0,
            dy_corr: 250.0,
            dt_corr_minutes: 1440.0,
            ratio_adjust: 1.0,
        }
    }
}

/// Seasonal (yearly) cosine pattern.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeasonalConfig {
    /// Mean level of the pattern.
    pub mean: f64,
    /// Cosine amplitude.
    pub amplitude: f64,
    /// Day of year at which the pattern peaks.
    pub phase_days: f64,
    /// Period in days.
    pub period_days: f64,
}

impl Default for SeasonalConfig {
    fn default() -> Self {
        Self {
            mean: 5.5 / 7.0,
            amplitude: 1.5 / 7.0,
            phase_days: 30.0,
            period_days: 365.0,
        }
    }
}

impl SeasonalConfig {
    /// A pattern that is identically one.
    pub fn flat() -> Self {
        Self {
            mean: 1.0,
            amplitude: 0.0,
            ..Self::default()
        }
    }
}

/// Layout of the weekly usage pattern table.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WeeklyConfig {
    /// Minutes between two rows of the table.
    pub step_minutes: u32,
}

impl Default for WeeklyConfig {
    fn default() -> Self {
        Self { step_minutes: 5 }
    }
}

/// Forecast horizons and correlation model settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForecastConfig {
    /// Forecast lead times in minutes.
    pub horizons_minutes: Vec<u32>,
    /// Noise standard deviation per horizon, relative to Pmax.
    pub horizon_std: Vec<f64>,
    /// Neighbour count of the correlation model.
    #[serde(default = "default_n_neighbors")]
    pub n_neighbors: i64,
    /// Leaf size of the kd-tree backend.
    #[serde(default = "default_leaf_size")]
    pub leaf_size: usize,
    /// Nearest-neighbour backend.
    #[serde(default)]
    pub algorithm: KnnAlgorithm,
    /// Number of independent noise channels; defaults to horizons + 1.
    #[serde(default)]
    pub nb_h_iid: Option<usize>,
}

fn default_n_neighbors() -> i64 {
    DEFAULT_N_NEIGHBORS
}

fn default_leaf_size() -> usize {
    DEFAULT_LEAF_SIZE
}

impl ForecastConfig {
    /// Builds a forecast section with default model settings.
    pub fn new(horizons_minutes: Vec<u32>, horizon_std: Vec<f64>) -> Self {
        Self {
            horizons_minutes,
            horizon_std,
            n_neighbors: DEFAULT_N_NEIGHBORS,
            leaf_size: DEFAULT_LEAF_SIZE,
            algorithm: KnnAlgorithm::default(),
            nb_h_iid: None,
        }
    }

    /// Number of noise channels on the mesh.
    pub fn channel_count(&self) -> usize {
        self.nb_h_iid.unwrap_or(self.horizons_minutes.len() + 1)
    }

    /// Appends every violated constraint of this section to `errors`.
    pub fn check(&self, errors: &mut Vec<ConfigError>) {
        if self.horizons_minutes.is_empty() {
            errors.push(ConfigError::new("forecast.horizons_minutes", "must not be empty"));
        }
        if self.horizons_minutes.contains(&0) {
            errors.push(ConfigError::new("forecast.horizons_minutes", "must all be > 0"));
        }
        if self.horizon_std.len() != self.horizons_minutes.len() {
            errors.push(ConfigError::new(
                "forecast.horizon_std",
                format!(
                    "expected one value per horizon ({}), got {}",
                    self.horizons_minutes.len(),
                    self.horizon_std.len()
                ),
            ));
        }
        if let Some(std) = self.horizon_std.iter().find(|s| !(**s > 0.0)) {
            errors.push(ConfigError::new(
                "forecast.horizon_std",
                format!("all values must be > 0, found {std}"),
            ));
        }
        if self.n_neighbors <= 0 {
            errors.push(ConfigError::new(
                "forecast.n_neighbors",
                format!("must be > 0, got {}", self.n_neighbors),
            ));
        }
        if self.leaf_size == 0 {
            errors.push(ConfigError::new("forecast.leaf_size", "must be > 0"));
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"forecast.n_neighbors"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {} — {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl GeneratorConfig {
    /// One week at 5-minute resolution with twelve 5-minute-spaced horizons.
    pub fn baseline() -> Self {
        let horizons: Vec<u32> = (1..=12).map(|i| 5 * i).collect();
        let stds = (1..=12).map(|i| 0.002 * f64::from(i)).collect();
        Self {
            simulation: SimulationConfig::default(),
            mesh: MeshConfig::default(),
            seasonal: SeasonalConfig::default(),
            weekly: WeeklyConfig::default(),
            forecast: ForecastConfig::new(horizons, stds),
        }
    }

    /// Four weeks at hourly resolution with day-ahead horizons.
    pub fn hourly() -> Self {
        let horizons: Vec<u32> = vec![60, 180, 360, 720, 1440];
        let stds = vec![0.01, 0.02, 0.035, 0.05, 0.08];
        Self {
            simulation: SimulationConfig {
                end: midnight(2012, 1, 29),
                dt_minutes: 60,
                ..SimulationConfig::default()
            },
            mesh: MeshConfig {
                dt_corr_minutes: 2880.0,
                ..MeshConfig::default()
            },
            seasonal: SeasonalConfig::default(),
            weekly: WeeklyConfig::default(),
            forecast: ForecastConfig::new(horizons, stds),
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "hourly"];

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "hourly" => Ok(Self::hourly()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("config", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid, misses a required
    /// key, or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let s = &self.simulation;
        if s.dt_minutes == 0 {
            errors.push(ConfigError::new("simulation.dt_minutes", "must be > 0"));
        }
        if s.end <= s.start {
            errors.push(ConfigError::new("simulation.end", "must be after simulation.start"));
        }
        if !(s.std_temperature_noise >= 0.0) {
            errors.push(ConfigError::new(
                "simulation.std_temperature_noise",
                "must be >= 0",
            ));
        }
        if !s.q_from_p_ratio.is_finite() {
            errors.push(ConfigError::new("simulation.q_from_p_ratio", "must be finite"));
        }

        let m = &self.mesh;
        for (field, value) in [
            ("mesh.lx", m.lx),
            ("mesh.ly", m.ly),
            ("mesh.dx_corr", m.dx_corr),
            ("mesh.dy_corr", m.dy_corr),
            ("mesh.dt_corr_minutes", m.dt_corr_minutes),
            ("mesh.ratio_adjust", m.ratio_adjust),
        ] {
            if !(value > 0.0) || !value.is_finite() {
                errors.push(ConfigError::new(field, "must be a finite value > 0"));
            }
        }

        if !(self.seasonal.period_days > 0.0) {
            errors.push(ConfigError::new("seasonal.period_days", "must be > 0"));
        }
        if self.weekly.step_minutes == 0 {
            errors.push(ConfigError::new("weekly.step_minutes", "must be > 0"));
        }

        self.forecast.check(&mut errors);
        errors
    }
}
