//! # Concentration CSV reader
//!
//! Reads a daily concentration record from a comma-separated file with a header row.
//!
//! ## Layout
//! -----------------
//! * A `date` column with `YYYY-MM-DD` values (a time part is accepted and ignored).
//! * One column per measured species; the studied species is selected by header name.
//!
//! ```text
//! date,PM10,NO2
//! 2017-03-01,21.3,18.0
//! 2017-03-02,,22.5
//! 2017-03-03,40.1,30.2
//! ```
//!
//! Empty and `NaN` cells are skipped: the day has no observation for that species.
//! Header and field whitespace is trimmed.
use camino::Utf8Path;
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Deserialize;
use tracing::debug;

use super::{ConcentrationObservation, ConcentrationRecord};
use crate::pscf_errors::PscfError;

const DATE_COLUMN: &str = "date";

/// One row of the file, projected on the `date` and species columns.
#[derive(Debug, Deserialize)]
struct ConcentrationRow {
    date: String,
    value: Option<f64>,
}

impl ConcentrationRecord {
    /// Load the record of `species` from a CSV file.
    ///
    /// Arguments
    /// -----------------
    /// * `path` – path of the CSV file.
    /// * `species` – header of the concentration column.
    ///
    /// Return
    /// ----------
    /// * The sorted record, or:
    ///   - [`PscfError::CsvError`] on I/O or field decoding failure,
    ///   - [`PscfError::MissingColumn`] if `date` or `species` is not a header,
    ///   - [`PscfError::InvalidDate`] for a malformed date,
    ///   - [`PscfError::DuplicateDate`] if a day appears twice.
    pub fn from_csv(path: &Utf8Path, species: &str) -> Result<Self, PscfError> {
        let reader = ReaderBuilder::new().trim(Trim::All).from_path(path)?;
        read_concentration(reader, species)
    }

    /// Load the record of `species` from in-memory CSV text.
    pub fn from_csv_str(content: &str, species: &str) -> Result<Self, PscfError> {
        let reader = ReaderBuilder::new()
            .trim(Trim::All)
            .from_reader(content.as_bytes());
        read_concentration(reader, species)
    }
}

fn column_index(headers: &StringRecord, name: &str) -> Result<usize, PscfError> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| PscfError::MissingColumn(name.to_string()))
}

fn read_concentration<R: std::io::Read>(
    mut reader: csv::Reader<R>,
    species: &str,
) -> Result<ConcentrationRecord, PscfError> {
    let headers = reader.headers()?.clone();
    let date_idx = column_index(&headers, DATE_COLUMN)?;
    let value_idx = column_index(&headers, species)?;

    let row_headers = StringRecord::from(vec!["date", "value"]);
    let mut observations = Vec::new();
    let mut skipped = 0usize;

    for record in reader.records() {
        let record = record?;
        let projected = StringRecord::from(vec![
            record.get(date_idx).unwrap_or_default(),
            record.get(value_idx).unwrap_or_default(),
        ]);
        let row: ConcentrationRow = projected.deserialize(Some(&row_headers))?;

        match row.value {
            Some(value) if !value.is_nan() => {
                observations.push(ConcentrationObservation::new(row.date.parse()?, value));
            }
            _ => skipped += 1,
        }
    }

    debug!(
        "read {} {species} observations ({skipped} empty rows skipped)",
        observations.len()
    );
    ConcentrationRecord::new(species, observations)
}
