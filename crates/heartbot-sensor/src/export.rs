//! CSV export of a BPM history: a `Beat,BPM` header followed by one
//! `index,bpm` row per sample, numbered from 1.

use std::io;

use crate::source::SensorError;

/// Write `readings` as CSV to `writer`.
pub fn write_csv<W: io::Write>(readings: &[f64], writer: W) -> Result<(), SensorError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(["Beat", "BPM"])?;
    for (i, bpm) in readings.iter().enumerate() {
        wtr.serialize((i + 1, bpm))?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Render `readings` as a CSV string.
pub fn to_csv_string(readings: &[f64]) -> Result<String, SensorError> {
    let mut buf = Vec::new();
    write_csv(readings, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
