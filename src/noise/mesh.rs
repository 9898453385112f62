//! Four-axis correlation mesh (space-x, space-y, time, channel).

use tracing::debug;

use crate::config::MeshConfig;
use crate::error::{GenerationError, Result};
use crate::site::LoadSite;

/// A point of the mesh in rescaled coordinates: `[x, y, t, h]`.
pub type Coord = [f64; 4];

/// Axis cardinalities `(Nx, Ny, Nt, Nh)` of the mesh.
///
/// Only [`MeshShape::new`] and [`MeshShape::from_density`] build a shape,
/// so every axis holds at least two points (indices can be divided by
/// `N - 1`) and the lattice size fits in a `usize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshShape {
    nx: usize,
    ny: usize,
    nt: usize,
    nh: usize,
}

impl MeshShape {
    /// Checks the cardinalities and builds the shape.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::DegenerateMesh`] for the first axis with
    /// fewer than two points, and [`GenerationError::InvalidInput`] if the
    /// number of lattice points overflows.
    pub fn new(nx: usize, ny: usize, nt: usize, nh: usize) -> Result<Self> {
        for (axis, extent) in [("x", nx), ("y", ny), ("t", nt), ("h", nh)] {
            if extent < 2 {
                return Err(GenerationError::DegenerateMesh { axis, extent });
            }
        }
        nx.checked_mul(ny)
            .and_then(|n| n.checked_mul(nt))
            .and_then(|n| n.checked_mul(nh))
            .ok_or_else(|| {
                GenerationError::InvalidInput(format!(
                    "mesh of {nx} x {ny} x {nt} x {nh} points is too large"
                ))
            })?;
        Ok(Self { nx, ny, nt, nh })
    }

    /// Derives the shape from the mesh density settings.
    ///
    /// Each spatial/temporal axis gets `floor(extent / corr) + 1` points
    /// plus an extra dimension large enough to cover the load coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::InvalidInput`] if a load lies so far out
    /// that the extra dimension overflows, a `mesh.*` configuration error
    /// if an axis overflows, and the errors of [`MeshShape::new`].
    pub fn from_density(
        cfg: &MeshConfig,
        window_minutes: i64,
        loads: &[LoadSite],
        nb_channels: usize,
    ) -> Result<Self> {
        let add_dim = extra_dimension(cfg, loads)?;
        let axis = |field: &str, extent: f64, corr: f64| {
            cell_count(extent / corr)
                .and_then(|n| n.checked_add(add_dim))
                .ok_or_else(|| {
                    GenerationError::config(
                        field,
                        format!("{extent} / {corr} gives more mesh points than supported"),
                    )
                })
        };
        Self::new(
            axis("mesh.lx", cfg.lx, cfg.dx_corr)?,
            axis("mesh.ly", cfg.ly, cfg.dy_corr)?,
            axis("mesh.dt_corr_minutes", window_minutes as f64, cfg.dt_corr_minutes)?,
            nb_channels,
        )
    }

    pub fn nx(&self) -> usize {
        self.nx
    }

    pub fn ny(&self) -> usize {
        self.ny
    }

    pub fn nt(&self) -> usize {
        self.nt
    }

    pub fn nh(&self) -> usize {
        self.nh
    }

    /// Number of lattice points.
    pub fn len(&self) -> usize {
        self.nx * self.ny * self.nt * self.nh
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flat index of a lattice point; the channel axis varies fastest.
    pub fn flat_index(&self, ix: usize, iy: usize, it: usize, ih: usize) -> usize {
        ((ix * self.ny + iy) * self.nt + it) * self.nh + ih
    }

    fn extents(&self) -> [usize; 4] {
        [self.nx, self.ny, self.nt, self.nh]
    }
}

/// `floor(ratio) + 1` clamped at zero, or `None` when it does not fit in a `usize`.
fn cell_count(ratio: f64) -> Option<usize> {
    let cells = ratio.floor() + 1.0;
    if cells <= 0.0 {
        return Some(0);
    }
    // usize::MAX as f64 rounds up to 2^64, which is itself out of range
    if !(cells < usize::MAX as f64) {
        return None;
    }
    Some(cells as usize)
}

/// Largest cell index reached by a load, plus one, over both spatial axes.
fn extra_dimension(cfg: &MeshConfig, loads: &[LoadSite]) -> Result<usize> {
    let mut add_dim = 0;
    for load in loads {
        for cells in [
            cell_count(load.x / cfg.dx_corr),
            cell_count(load.y / cfg.dy_corr),
        ] {
            let cells = cells.ok_or_else(|| {
                GenerationError::InvalidInput(format!(
                    "load \"{}\" at ({}, {}) lies too far outside the mesh",
                    load.name, load.x, load.y
                ))
            })?;
            add_dim = add_dim.max(cells);
        }
    }
    Ok(add_dim)
}

/// Mesh coordinates with per-axis rescaling.
///
/// An axis with `N` points is stretched by `rho = max(N) / N * ratio_adjust`
/// so that neighbouring points are roughly equidistant along every axis,
/// whatever its cardinality.
#[derive(Debug, Clone)]
pub struct CorrelationMesh {
    shape: MeshShape,
    rho: [f64; 4],
    coords: Vec<Coord>,
}

impl CorrelationMesh {
    /// Enumerates every lattice point in x, y, t, h nested order.
    pub fn build(shape: MeshShape, ratio_adjust: f64) -> Self {
        let extents = shape.extents();
        let max_extent = extents.iter().copied().max().unwrap_or(1) as f64;
        let rho = extents.map(|n| max_extent / n as f64 * ratio_adjust);
        let scale: [f64; 4] = std::array::from_fn(|a| 1.0 / ((extents[a] - 1) as f64 * rho[a]));

        let mut coords = Vec::with_capacity(shape.len());
        for ix in 0..shape.nx() {
            for iy in 0..shape.ny() {
                for it in 0..shape.nt() {
                    for ih in 0..shape.nh() {
                        coords.push([
                            ix as f64 * scale[0],
                            iy as f64 * scale[1],
                            it as f64 * scale[2],
                            ih as f64 * scale[3],
                        ]);
                    }
                }
            }
        }
        debug!(?shape, ?rho, points = coords.len(), "built correlation mesh");

        Self { shape, rho, coords }
    }

    pub fn shape(&self) -> MeshShape {
        self.shape
    }

    /// Rescaling factors `[rho_x, rho_y, rho_t, rho_h]`.
    pub fn rho(&self) -> [f64; 4] {
        self.rho
    }

    pub fn coords(&self) -> &[Coord] {
        &self.coords
    }

    /// Consumes the mesh, returning its coordinates.
    pub fn into_coords(self) -> Vec<Coord> {
        self.coords
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_rejects_single_point_axis() {
        for (dims, axis) in [
            ([1, 3, 3, 3], "x"),
            ([3, 1, 3, 3], "y"),
            ([3, 3, 1, 3], "t"),
            ([3, 3, 3, 1], "h"),
        ] {
            let err = MeshShape::new(dims[0], dims[1], dims[2], dims[3]).unwrap_err();
            match err {
                GenerationError::DegenerateMesh { axis: a, extent } => {
                    assert_eq!(a, axis);
                    assert_eq!(extent, 1);
                }
                other => panic!("expected DegenerateMesh, got {other:?}"),
            }
        }
    }

    #[test]
    fn rescaling_factors_follow_largest_axis() {
        let mesh = CorrelationMesh::build(MeshShape::new(2, 4, 8, 2).unwrap(), 1.0);
        assert_eq!(mesh.rho(), [4.0, 2.0, 1.0, 4.0]);

        let adjusted = CorrelationMesh::build(MeshShape::new(2, 4, 8, 2).unwrap(), 0.5);
        assert_eq!(adjusted.rho(), [2.0, 1.0, 0.5, 2.0]);
    }

    #[test]
    fn coordinates_are_enumerated_channel_fastest() {
        let shape = MeshShape::new(2, 3, 4, 2).unwrap();
        let mesh = CorrelationMesh::build(shape, 1.0);
        let coords = mesh.coords();
        assert_eq!(coords.len(), 48);
        assert_eq!(coords[0], [0.0, 0.0, 0.0, 0.0]);
        // second point only moves along h
        assert_eq!(coords[1][..3], [0.0, 0.0, 0.0]);
        assert!(coords[1][3] > 0.0);
        // last point sits at the far corner: 1 / rho on every axis
        let last = coords[shape.flat_index(1, 2, 3, 1)];
        let rho = mesh.rho();
        for a in 0..4 {
            assert!((last[a] - 1.0 / rho[a]).abs() < 1e-12);
        }
    }

    #[test]
    fn neighbour_spacing_is_equalised() {
        let shape = MeshShape::new(3, 5, 9, 3).unwrap();
        let mesh = CorrelationMesh::build(shape, 1.0);
        let c = mesh.coords();
        let origin = c[0];
        let steps = [
            c[shape.flat_index(1, 0, 0, 0)][0] - origin[0],
            c[shape.flat_index(0, 1, 0, 0)][1] - origin[1],
            c[shape.flat_index(0, 0, 1, 0)][2] - origin[2],
            c[shape.flat_index(0, 0, 0, 1)][3] - origin[3],
        ];
        // step along an axis of N points is N / ((N - 1) * max N)
        let expected = [3.0 / 18.0, 5.0 / 36.0, 9.0 / 72.0, 3.0 / 18.0];
        for a in 0..4 {
            assert!((steps[a] - expected[a]).abs() < 1e-12, "axis {a}");
        }
    }

    #[test]
    fn density_adds_extra_dimension_from_loads() {
        let cfg = MeshConfig {
            lx: 1000.0,
            ly: 500.0,
            dx_corr: 250.0,
            dy_corr: 250.0,
            dt_corr_minutes: 1440.0,
            ratio_adjust: 1.0,
        };
        let loads = vec![
            LoadSite::new("a", 100.0, 100.0, 1.0),
            LoadSite::new("b", 600.0, 300.0, 1.0),
        ];
        // add_dim = floor(600 / 250) + 1 = 3
        let shape = MeshShape::from_density(&cfg, 7 * 1440, &loads, 13).unwrap();
        assert_eq!(shape.extents(), [8, 6, 11, 13]);
    }

    #[test]
    fn density_rejects_single_channel() {
        let cfg = MeshConfig::default();
        let err = MeshShape::from_density(&cfg, 1440, &[], 1).unwrap_err();
        assert!(matches!(err, GenerationError::DegenerateMesh { axis: "h", .. }));
    }

    #[test]
    fn far_away_load_is_an_error_not_an_overflow() {
        let cfg = MeshConfig::default();
        for x in [1e20, 1e30, f64::MAX] {
            let loads = vec![LoadSite::new("far", x, 0.0, 1.0)];
            let err = MeshShape::from_density(&cfg, 1440, &loads, 3).unwrap_err();
            assert!(matches!(err, GenerationError::InvalidInput(_)), "x = {x}: {err:?}");
        }
    }

    #[test]
    fn oversized_grid_is_a_configuration_error() {
        let cfg = MeshConfig {
            lx: 1e300,
            dx_corr: 1.0,
            ..MeshConfig::default()
        };
        let err = MeshShape::from_density(&cfg, 1440, &[], 3).unwrap_err();
        assert!(matches!(err, GenerationError::Configuration(ref e) if e.field == "mesh.lx"));
    }

    #[test]
    fn lattice_size_overflow_is_rejected() {
        let big = usize::MAX / 2;
        let err = MeshShape::new(big, 4, 2, 2).unwrap_err();
        assert!(matches!(err, GenerationError::InvalidInput(_)));
    }

    #[test]
    fn negative_coordinates_add_no_extra_dimension() {
        let cfg = MeshConfig::default();
        let loads = vec![LoadSite::new("west", -600.0, -10.0, 1.0)];
        let shape = MeshShape::from_density(&cfg, 1440, &loads, 2).unwrap();
        assert_eq!([shape.nx(), shape.ny(), shape.nt(), shape.nh()], [5, 5, 2, 2]);
    }
}
