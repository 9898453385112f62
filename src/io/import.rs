//! Readers for the grid characteristic tables and the weekly pattern.
//!
//! All inputs are comma-separated with a header row. Columns other than the
//! ones read here are ignored, so full grid descriptions can be passed
//! as-is.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{GenerationError, Result};
use crate::profile::WeeklyPattern;
use crate::site::{GenerationSite, LoadSite};

/// Column of the weekly pattern table holding the values.
pub const PATTERN_COLUMN: &str = "test";

#[derive(Deserialize)]
struct PatternRow {
    test: f64,
}

fn read_records<T: DeserializeOwned>(reader: impl Read) -> Result<Vec<T>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut rows = Vec::new();
    for record in rdr.deserialize() {
        rows.push(record?);
    }
    Ok(rows)
}

fn open(path: &Path) -> Result<io::BufReader<File>> {
    let file = File::open(path).map_err(|e| {
        GenerationError::Io(io::Error::new(e.kind(), format!("{}: {e}", path.display())))
    })?;
    Ok(io::BufReader::new(file))
}

/// Reads load characteristics (`name`, `x`, `y`, `Pmax`).
///
/// Each load's id is its row position, starting at 0.
pub fn read_loads(reader: impl Read) -> Result<Vec<LoadSite>> {
    let loads: Vec<LoadSite> = read_records::<LoadSite>(reader)?
        .into_iter()
        .enumerate()
        .map(|(id, load)| load.with_id(id))
        .collect();
    if loads.is_empty() {
        return Err(GenerationError::InvalidInput("load table has no rows".into()));
    }
    debug!(rows = loads.len(), "read load characteristics");
    Ok(loads)
}

pub fn read_loads_file(path: &Path) -> Result<Vec<LoadSite>> {
    read_loads(open(path)?)
}

/// Reads generation-site positions (`x`, `y`). An empty table is allowed.
pub fn read_generators(reader: impl Read) -> Result<Vec<GenerationSite>> {
    let gens: Vec<GenerationSite> = read_records(reader)?;
    debug!(rows = gens.len(), "read generation characteristics");
    Ok(gens)
}

pub fn read_generators_file(path: &Path) -> Result<Vec<GenerationSite>> {
    read_generators(open(path)?)
}

/// Reads the weekly pattern from its [`PATTERN_COLUMN`] column.
///
/// `step_minutes` is the spacing between consecutive rows.
pub fn read_weekly_pattern(reader: impl Read, step_minutes: u32) -> Result<WeeklyPattern> {
    let rows: Vec<PatternRow> = read_records(reader)?;
    debug!(rows = rows.len(), step_minutes, "read weekly pattern");
    WeeklyPattern::new(rows.into_iter().map(|r| r.test).collect(), step_minutes)
}

pub fn read_weekly_pattern_file(path: &Path, step_minutes: u32) -> Result<WeeklyPattern> {
    read_weekly_pattern(open(path)?, step_minutes)
}
