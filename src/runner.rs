//! Independent multi-scenario generation.

use rand::{Rng, SeedableRng, rngs::StdRng};
use rayon::prelude::*;
use tracing::{error, info};

use crate::error::Result;
use crate::generator::{LoadGenerator, LoadSeries};
use crate::profile::WeeklyPattern;
use crate::site::{GenerationSite, LoadSite};

/// Draws a fresh seed from the operating system's entropy.
pub fn draw_seed() -> u64 {
    rand::rng().random()
}

/// Derives `count` scenario seeds from a master seed.
///
/// The same master seed always gives the same scenario seeds.
pub fn scenario_seeds(master: u64, count: usize) -> Vec<u64> {
    let mut rng = StdRng::seed_from_u64(master);
    (0..count).map(|_| rng.random()).collect()
}

/// Outcome of one scenario.
#[derive(Debug)]
pub struct ScenarioOutcome {
    pub index: usize,
    pub seed: u64,
    pub result: Result<LoadSeries>,
}

/// Runs one scenario per seed, in parallel.
///
/// Scenarios share only the immutable generator and input tables; each
/// draws its own noise and fits its own model. A failing scenario does not
/// affect the others. Outcomes come back in the order of `seeds`.
pub fn run_scenarios(
    generator: &LoadGenerator,
    seeds: &[u64],
    loads: &[LoadSite],
    gens: &[GenerationSite],
    weekly: &WeeklyPattern,
) -> Vec<ScenarioOutcome> {
    let outcomes: Vec<ScenarioOutcome> = seeds
        .par_iter()
        .enumerate()
        .map(|(index, &seed)| ScenarioOutcome {
            index,
            seed,
            result: generator.generate(seed, loads, gens, weekly),
        })
        .collect();

    let mut failed = 0usize;
    for o in &outcomes {
        if let Err(e) = &o.result {
            failed += 1;
            error!(scenario = o.index, seed = o.seed, "scenario failed: {e}");
        }
    }
    info!(scenarios = outcomes.len(), failed, "scenario batch finished");
    outcomes
}
