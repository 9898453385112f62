//! Load and generation sites, and the spatial extent they span.

use serde::Deserialize;

/// Padding applied on each side of the bounding box, as a fraction of its width.
const BORDER_RATIO: f64 = 20.0;

/// A consumption point of the grid.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoadSite {
    /// Row of the load in its characteristics table.
    #[serde(skip)]
    pub id: usize,
    /// Load name, used as the output column header.
    pub name: String,
    /// Physical x coordinate.
    pub x: f64,
    /// Physical y coordinate.
    pub y: f64,
    /// Nameplate active power capacity.
    #[serde(rename = "Pmax")]
    pub pmax: f64,
}

impl LoadSite {
    /// Builds a load with id 0; see [`LoadSite::with_id`].
    pub fn new(name: impl Into<String>, x: f64, y: f64, pmax: f64) -> Self {
        Self {
            id: 0,
            name: name.into(),
            x,
            y,
            pmax,
        }
    }

    pub fn with_id(mut self, id: usize) -> Self {
        self.id = id;
        self
    }
}

/// A generation site; only its position matters here.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct GenerationSite {
    pub x: f64,
    pub y: f64,
}

/// Closed interval `[min, max]` along one spatial axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    /// Width of the interval.
    pub fn delta(&self) -> f64 {
        self.max - self.min
    }

    /// Widens the interval by `1/BORDER_RATIO` of its width on both sides.
    ///
    /// A zero-width interval is first given a unit width centred on its value.
    fn padded(self) -> Self {
        let (min, max) = if self.delta() > 0.0 {
            (self.min, self.max)
        } else {
            (self.min - 0.5, self.max + 0.5)
        };
        let margin = (max - min) / BORDER_RATIO;
        Self {
            min: min - margin,
            max: max + margin,
        }
    }
}

/// Padded bounding box of every load and generation site.
///
/// Physical coordinates are mapped to `[0, 1]` through this box before
/// being placed on the correlation mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialExtent {
    pub x: AxisRange,
    pub y: AxisRange,
}

impl SpatialExtent {
    /// Computes the padded union of the load and generation bounding boxes.
    ///
    /// Returns `None` when there are no sites at all.
    pub fn from_sites(loads: &[LoadSite], gens: &[GenerationSite]) -> Option<Self> {
        let points = loads
            .iter()
            .map(|l| (l.x, l.y))
            .chain(gens.iter().map(|g| (g.x, g.y)));

        let mut bounds: Option<(AxisRange, AxisRange)> = None;
        for (x, y) in points {
            bounds = Some(match bounds {
                None => (AxisRange { min: x, max: x }, AxisRange { min: y, max: y }),
                Some((bx, by)) => (
                    AxisRange {
                        min: bx.min.min(x),
                        max: bx.max.max(x),
                    },
                    AxisRange {
                        min: by.min.min(y),
                        max: by.max.max(y),
                    },
                ),
            });
        }

        bounds.map(|(x, y)| Self {
            x: x.padded(),
            y: y.padded(),
        })
    }

    /// Position of `(x, y)` inside the box, each component in `[0, 1]`.
    pub fn normalize(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.x.min) / self.x.delta(),
            (y - self.y.min) / self.y.delta(),
        )
    }
}
