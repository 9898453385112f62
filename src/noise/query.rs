//! Per-load noise queries and tensor renormalisation.

use rayon::prelude::*;
use tracing::debug;

use super::knn::Interpolator;
use super::mapper::CoordinateMapper;
use crate::error::{GenerationError, Result};
use crate::site::LoadSite;

/// Relative spread below which the tensor counts as constant.
const FLAT_TOLERANCE: f64 = 1e-12;

/// Interpolated noise per `(load, timestep, channel)`.
///
/// Stored load-major, then timestep, with the channel varying fastest.
/// Channel 0 drives the ground truth, channel `1 + h` forecast horizon `h`.
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseTensor {
    nb_loads: usize,
    nb_t: usize,
    nb_channels: usize,
    values: Vec<f64>,
}

impl NoiseTensor {
    /// Queries `model` for every load and renormalises the result.
    ///
    /// Loads are queried independently and in parallel, one batched call
    /// per load. The whole tensor is then shifted and scaled to zero mean
    /// and unit variance using global statistics.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::InvalidInput`] if `model` does not return
    /// one value per queried point.
    pub fn query<M: Interpolator>(model: &M, mapper: &CoordinateMapper, loads: &[LoadSite]) -> Result<Self> {
        let nb_t = mapper.nb_steps();
        let nb_channels = mapper.nb_channels();
        let block = nb_t * nb_channels;

        let blocks: Vec<Vec<f64>> = loads
            .par_iter()
            .map(|load| model.predict(&mapper.load_batch(load)))
            .collect();

        let mut values = vec![0.0; loads.len() * block];
        for ((chunk, noise), load) in values.chunks_exact_mut(block).zip(&blocks).zip(loads) {
            if noise.len() != block {
                return Err(GenerationError::InvalidInput(format!(
                    "interpolator returned {} values for {block} points of load \"{}\"",
                    noise.len(),
                    load.name
                )));
            }
            chunk.copy_from_slice(noise);
        }

        let mut tensor = Self {
            nb_loads: loads.len(),
            nb_t,
            nb_channels,
            values,
        };
        tensor.renormalize();
        debug!(
            loads = tensor.nb_loads,
            steps = nb_t,
            channels = nb_channels,
            "queried noise tensor"
        );
        Ok(tensor)
    }

    /// Wraps raw values of shape `(nb_loads, nb_t, nb_channels)` without renormalising.
    ///
    /// # Panics
    ///
    /// Panics if `values.len()` does not match the shape.
    pub fn from_values(nb_loads: usize, nb_t: usize, nb_channels: usize, values: Vec<f64>) -> Self {
        assert_eq!(values.len(), nb_loads * nb_t * nb_channels, "shape mismatch");
        Self {
            nb_loads,
            nb_t,
            nb_channels,
            values,
        }
    }

    /// Shifts and scales every value to zero mean and unit (population) variance.
    ///
    /// A constant tensor (up to rounding) is only centred.
    pub fn renormalize(&mut self) {
        if self.values.is_empty() {
            return;
        }
        let n = self.values.len() as f64;
        let mean = self.values.iter().sum::<f64>() / n;
        let var = self.values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std = var.sqrt();
        let scale = if std > FLAT_TOLERANCE * mean.abs().max(1.0) && std.is_finite() {
            1.0 / std
        } else {
            1.0
        };
        for v in &mut self.values {
            *v = (*v - mean) * scale;
        }
    }

    pub fn nb_loads(&self) -> usize {
        self.nb_loads
    }

    pub fn nb_steps(&self) -> usize {
        self.nb_t
    }

    pub fn nb_channels(&self) -> usize {
        self.nb_channels
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, load: usize, t: usize, channel: usize) -> f64 {
        self.values[(load * self.nb_t + t) * self.nb_channels + channel]
    }

    /// Time series of one channel for one load.
    pub fn channel(&self, load: usize, channel: usize) -> Vec<f64> {
        (0..self.nb_t).map(|t| self.get(load, t, channel)).collect()
    }
}
