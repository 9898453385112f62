//! Shared test fixtures for integration tests.
#![allow(dead_code)]

use chrono::Duration;
use load_synth::config::{ForecastConfig, GeneratorConfig, SeasonalConfig};
use load_synth::noise::{Coord, Interpolator};
use load_synth::profile::WeeklyPattern;
use load_synth::site::{GenerationSite, LoadSite};

/// Interpolator returning zero everywhere.
pub struct Zero;

impl Interpolator for Zero {
    fn predict(&self, points: &[Coord]) -> Vec<f64> {
        vec![0.0; points.len()]
    }
}

/// Two hours at 5-minute resolution on a 100 x 100 grid, horizons 5/15/30 min.
///
/// Small enough that a full run with the real correlation model is fast.
pub fn small_config() -> GeneratorConfig {
    let mut cfg = GeneratorConfig::baseline();
    cfg.simulation.end = cfg.simulation.start + Duration::hours(2);
    cfg.mesh.lx = 100.0;
    cfg.mesh.ly = 100.0;
    cfg.mesh.dx_corr = 50.0;
    cfg.mesh.dy_corr = 50.0;
    cfg.mesh.dt_corr_minutes = 60.0;
    cfg.forecast = ForecastConfig::new(vec![5, 15, 30], vec![0.01, 0.02, 0.03]);
    cfg.forecast.n_neighbors = 16;
    cfg.forecast.leaf_size = 10;
    cfg
}

/// [`small_config`] with a flat seasonal level and no temperature noise.
pub fn flat_config() -> GeneratorConfig {
    let mut cfg = small_config();
    cfg.seasonal = SeasonalConfig::flat();
    cfg.simulation.std_temperature_noise = 0.0;
    cfg
}

/// Three loads with Pmax 10, 20 and 30.
pub fn three_loads() -> Vec<LoadSite> {
    vec![
        LoadSite::new("load_0", 10.0, 20.0, 10.0),
        LoadSite::new("load_1", 40.0, 70.0, 20.0),
        LoadSite::new("load_2", 90.0, 50.0, 30.0),
    ]
}

/// Two generation sites inside the load area.
pub fn two_gens() -> Vec<GenerationSite> {
    vec![
        GenerationSite { x: 0.0, y: 0.0 },
        GenerationSite { x: 95.0, y: 95.0 },
    ]
}

/// A one-week pattern at 5-minute resolution rising linearly from 1 to 2.
pub fn ramp_pattern() -> WeeklyPattern {
    let n = 7 * 288;
    let values = (0..n).map(|i| 1.0 + i as f64 / n as f64).collect();
    WeeklyPattern::new(values, 5).unwrap_or_else(|_| WeeklyPattern::flat())
}
