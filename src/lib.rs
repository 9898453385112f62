//! Synthetic spatiotemporally correlated load chronics and forecasts.
//!
//! A seeded Gaussian field is drawn on a coarse space-time-channel mesh,
//! interpolated at every load by distance-weighted nearest neighbours, and
//! combined with weekly and seasonal reference curves into ground-truth
//! active/reactive consumption plus multi-horizon forecasts.
//!
//! The entry point is [`generator::LoadGenerator`].

pub mod config;
pub mod error;
pub mod forecast;
pub mod generator;
pub mod io;
/// Correlated noise: mesh, sampler, interpolation model, and per-load queries.
pub mod noise;
pub mod profile;
pub mod runner;
pub mod site;
pub mod window;

pub use config::GeneratorConfig;
pub use error::{GenerationError, Result};
pub use generator::{LoadGenerator, LoadSeries};
