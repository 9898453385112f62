//! Seeded i.i.d. standard-normal noise on the mesh lattice.

use rand::{Rng, SeedableRng, rngs::StdRng};

use super::mesh::MeshShape;

/// One standard-normal value per lattice point.
///
/// Values are stored in the same nested order as
/// [`CorrelationMesh::coords`](super::mesh::CorrelationMesh::coords), so
/// `values()[i]` is the noise at `coords()[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseField {
    shape: MeshShape,
    values: Vec<f64>,
}

impl NoiseField {
    /// Draws the field from a generator seeded with `seed`.
    ///
    /// Identical seeds and shapes give bit-identical fields.
    pub fn sample(seed: u64, shape: MeshShape) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::sample_with(&mut rng, shape)
    }

    /// Draws the field from a caller-owned generator.
    pub fn sample_with(rng: &mut StdRng, shape: MeshShape) -> Self {
        let values = (0..shape.len()).map(|_| standard_normal(rng)).collect();
        Self { shape, values }
    }

    pub fn shape(&self) -> MeshShape {
        self.shape
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }
}

/// Standard-normal draw via the Box-Muller transform.
pub fn standard_normal(rng: &mut StdRng) -> f64 {
    // 1 - U lies in (0, 1], keeping ln() finite
    let u1: f64 = 1.0 - rng.random::<f64>();
    let u2: f64 = rng.random::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}
