//! Maps loads, timesteps, and forecast horizons onto mesh coordinates.

use super::mesh::Coord;
use crate::forecast::ForecastSpec;
use crate::site::{LoadSite, SpatialExtent};

/// Extra minutes added to the largest horizon when normalising channels.
const CHANNEL_MARGIN_MINUTES: f64 = 5.0;

/// Where one noise channel sits on the time and channel axes.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Channel {
    /// Time shift in steps.
    steps: usize,
    /// Normalised channel position before rescaling.
    position: f64,
}

/// Per-run mapping from physical positions to the rescaled mesh space.
///
/// Channel 0 is the ground truth (no shift, position 0); channel `1 + h`
/// is horizon `h`, shifted forward by its step count and placed at
/// `minutes / (max minutes + 5)` on the channel axis.
#[derive(Debug, Clone)]
pub struct CoordinateMapper {
    extent: SpatialExtent,
    rho: [f64; 4],
    nb_t: usize,
    channels: Vec<Channel>,
}

impl CoordinateMapper {
    pub fn new(extent: SpatialExtent, rho: [f64; 4], nb_t: usize, forecast: &ForecastSpec) -> Self {
        let max_minutes = forecast
            .horizons()
            .iter()
            .map(|h| f64::from(h.minutes))
            .fold(0.0, f64::max);
        let channels = std::iter::once(Channel {
            steps: 0,
            position: 0.0,
        })
        .chain(forecast.horizons().iter().map(|h| Channel {
            steps: h.steps,
            position: f64::from(h.minutes) / (max_minutes + CHANNEL_MARGIN_MINUTES),
        }))
        .collect();

        Self {
            extent,
            rho,
            nb_t,
            channels,
        }
    }

    /// Number of channels, ground truth included.
    pub fn nb_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn nb_steps(&self) -> usize {
        self.nb_t
    }

    /// Coordinates of every `(timestep, channel)` pair for one load.
    ///
    /// Rows are ordered timestep-major with the channel varying fastest,
    /// so the batch reshapes directly to `(Nt, channels)`.
    pub fn load_batch(&self, load: &LoadSite) -> Vec<Coord> {
        let (u, v) = self.extent.normalize(load.x, load.y);
        let x = u / self.rho[0];
        let y = v / self.rho[1];
        let denom = (self.nb_t + 1) as f64;

        let mut batch = Vec::with_capacity(self.nb_t * self.channels.len());
        for t in 0..self.nb_t {
            for ch in &self.channels {
                let time = (t + 1 + ch.steps) as f64 / denom / self.rho[2];
                let channel = ch.position / self.rho[3];
                batch.push([x, y, time, channel]);
            }
        }
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ForecastConfig;
    use crate::site::AxisRange;

    fn extent() -> SpatialExtent {
        SpatialExtent {
            x: AxisRange { min: 0.0, max: 100.0 },
            y: AxisRange { min: -50.0, max: 50.0 },
        }
    }

    fn forecast() -> ForecastSpec {
        let cfg = ForecastConfig::new(vec![10, 30], vec![0.1, 0.2]);
        ForecastSpec::from_config(&cfg, 5).unwrap().0
    }

    #[test]
    fn batch_has_one_row_per_step_and_channel() {
        let mapper = CoordinateMapper::new(extent(), [1.0; 4], 9, &forecast());
        let batch = mapper.load_batch(&LoadSite::new("a", 10.0, 0.0, 1.0));
        assert_eq!(mapper.nb_channels(), 3);
        assert_eq!(batch.len(), 27);
    }

    #[test]
    fn spatial_coordinates_are_normalised_and_rescaled() {
        let mapper = CoordinateMapper::new(extent(), [2.0, 4.0, 1.0, 1.0], 4, &forecast());
        let batch = mapper.load_batch(&LoadSite::new("a", 50.0, 0.0, 1.0));
        for row in &batch {
            assert!((row[0] - 0.25).abs() < 1e-12);
            assert!((row[1] - 0.125).abs() < 1e-12);
        }
    }

    #[test]
    fn horizons_shift_time_and_channel() {
        let mapper = CoordinateMapper::new(extent(), [1.0, 1.0, 2.0, 0.5], 9, &forecast());
        let batch = mapper.load_batch(&LoadSite::new("a", 0.0, 0.0, 1.0));
        // t = 0: ground truth, 10-minute (2 steps), 30-minute (6 steps)
        let gt = batch[0];
        let h10 = batch[1];
        let h30 = batch[2];
        assert!((gt[2] - 1.0 / 10.0 / 2.0).abs() < 1e-12);
        assert!((h10[2] - 3.0 / 10.0 / 2.0).abs() < 1e-12);
        assert!((h30[2] - 7.0 / 10.0 / 2.0).abs() < 1e-12);
        assert_eq!(gt[3], 0.0);
        assert!((h10[3] - 10.0 / 35.0 / 0.5).abs() < 1e-12);
        assert!((h30[3] - 30.0 / 35.0 / 0.5).abs() < 1e-12);
        // next timestep advances time only
        let next = batch[3];
        assert!((next[2] - 2.0 / 10.0 / 2.0).abs() < 1e-12);
        assert_eq!(next[3], 0.0);
    }
}
