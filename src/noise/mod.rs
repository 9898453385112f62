//! Spatiotemporally correlated noise: mesh, samples, interpolation, queries.

/// Nearest-neighbour correlation model.
pub mod knn;
/// Load and horizon coordinates in mesh space.
pub mod mapper;
/// Four-axis lattice and its rescaling.
pub mod mesh;
/// Per-load queries into a renormalised tensor.
pub mod query;
/// Seeded i.i.d. noise on the lattice.
pub mod sampler;

pub use knn::{Interpolator, KnnAlgorithm, KnnParams, KnnRegressor};
pub use mapper::CoordinateMapper;
pub use mesh::{Coord, CorrelationMesh, MeshShape};
pub use query::NoiseTensor;
pub use sampler::NoiseField;
