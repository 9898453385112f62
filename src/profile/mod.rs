//! Deterministic demand shapes: weekly usage, seasonal level, reference curves.

pub mod reference;
pub mod seasonal;
pub mod weekly;

pub use reference::ReferenceCurves;
pub use seasonal::SeasonalPattern;
pub use weekly::WeeklyPattern;
