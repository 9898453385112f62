//! CSV export for generated load chronics.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::info;

use crate::error::Result;
use crate::generator::LoadSeries;

/// Field separator of every exported table.
pub const DELIMITER: u8 = b';';

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// File names written by [`write_all`], in order.
pub const FILE_NAMES: [&str; 4] = [
    "load_p.csv",
    "load_q.csv",
    "load_p_forecasted.csv",
    "load_q_forecasted.csv",
];

fn writer_for<W: Write>(writer: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .delimiter(DELIMITER)
        .from_writer(writer)
}

fn datetime(ts: &NaiveDateTime) -> String {
    ts.format(DATETIME_FORMAT).to_string()
}

/// Writes a ground-truth table: one `datetime` column, then one column per load.
///
/// # Errors
///
/// Returns a CSV error if writing fails.
pub fn write_truth(
    names: &[String],
    timestamps: &[NaiveDateTime],
    table: &[Vec<f64>],
    writer: impl Write,
) -> Result<()> {
    let mut wtr = writer_for(writer);
    wtr.write_record(std::iter::once("datetime").chain(names.iter().map(String::as_str)))?;
    for (ts, row) in timestamps.iter().zip(table) {
        wtr.write_record(
            std::iter::once(datetime(ts)).chain(row.iter().map(|v| format!("{v:.4}"))),
        )?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes a forecast table in long layout.
///
/// Each row carries the issue `datetime` and the `horizon` in minutes,
/// followed by one column per load; rows are grouped by timestamp.
///
/// # Errors
///
/// Returns a CSV error if writing fails.
pub fn write_forecast(series: &LoadSeries, table: &[Vec<f64>], writer: impl Write) -> Result<()> {
    let mut wtr = writer_for(writer);
    wtr.write_record(
        ["datetime", "horizon"]
            .into_iter()
            .chain(series.names.iter().map(String::as_str)),
    )?;
    let nb_h = series.nb_horizons();
    for (i, row) in table.iter().enumerate() {
        let ts = &series.timestamps[i / nb_h];
        let horizon = series.horizons[i % nb_h].minutes;
        wtr.write_record(
            [datetime(ts), horizon.to_string()]
                .into_iter()
                .chain(row.iter().map(|v| format!("{v:.4}"))),
        )?;
    }
    wtr.flush()?;
    Ok(())
}

fn create(path: &Path) -> Result<io::BufWriter<File>> {
    Ok(io::BufWriter::new(File::create(path)?))
}

/// Writes the four chronics of `series` into `dir`, creating it if needed.
///
/// Returns the written paths in [`FILE_NAMES`] order.
///
/// # Errors
///
/// Returns an I/O error if the directory or a file cannot be created.
pub fn write_all(dir: &Path, series: &LoadSeries) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let paths: Vec<PathBuf> = FILE_NAMES.iter().map(|f| dir.join(f)).collect();

    write_truth(&series.names, &series.timestamps, &series.load_p, create(&paths[0])?)?;
    write_truth(&series.names, &series.timestamps, &series.load_q, create(&paths[1])?)?;
    write_forecast(series, &series.load_p_forecasted, create(&paths[2])?)?;
    write_forecast(series, &series.load_q_forecasted, create(&paths[3])?)?;

    info!(dir = %dir.display(), seed = series.seed, "chronics written");
    Ok(paths)
}
