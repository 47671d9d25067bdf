//! # Trajectory trace reader
//!
//! Utilities to parse **HYSPLIT "tdump"** back-trajectory files into a [`TrajectoryTrace`].
//!
//! ## Layout
//! -----------------
//! ```text
//! line 1          N ...                  number of meteorological grids
//! lines 2..=N+1                          one line per meteorological grid
//! line N+2        1 BACKWARD OMEGA       number of starting locations, direction, motion
//! line N+3                               starting location
//! line N+4        k NAME_1 ... NAME_k    diagnostic variables appended to each row
//! line N+5..                             one row per hourly step
//! ```
//!
//! Every data row starts with 12 fixed columns:
//!
//! | idx | column          |
//! |-----|-----------------|
//! | 0   | trajectory id   |
//! | 1   | grid id         |
//! | 2-6 | yy mm dd hh min |
//! | 7   | forecast hour   |
//! | 8   | age (hours)     |
//! | 9   | latitude        |
//! | 10  | longitude       |
//! | 11  | altitude        |
//!
//! followed by one value per diagnostic variable. One of the variables must be
//! [`RAIN_VARIABLE`].
//!
//! ## Row count
//! -----------------
//! Only the first `hours_in_the_past` rows are read. A shorter file is **not** an error: the
//! trace simply holds fewer rows. Blank lines are ignored.
//!
//! ## Error Handling
//! -----------------
//! Header and row failures are reported as [`ParseTrajError`] and wrapped into
//! [`PscfError::Parse`] together with the file path by [`read_tdump`].
use std::str::FromStr;

use camino::Utf8Path;
use nom::{
    bytes::complete::take_till1,
    character::complete::{digit1, space0, space1},
    combinator::map_res,
    multi::many0,
    sequence::preceded,
    IResult, Parser,
};
use thiserror::Error;

use super::{TrajectoryRow, TrajectoryTrace};
use crate::constants::{FIXED_COLUMNS, RAIN_VARIABLE};
use crate::pscf_errors::PscfError;

/// Parsing errors of a trajectory trace.
///
/// Variants
/// -----------------
/// * `InvalidHeaderCount` – The first line does not start with the number of meteo grids.
/// * `MissingVariableLine` – The file ends before the variable-name line.
/// * `InvalidVariableLine` – The variable-name line is not `count NAME...` with `count` names.
/// * `MissingPrecipitation` – No [`RAIN_VARIABLE`] among the declared variables.
/// * `InvalidRow` – A data row has a wrong column count or a non-numeric field.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseTrajError {
    #[error("Invalid number of header lines: '{0}'")]
    InvalidHeaderCount(String),
    #[error("The file ends before the variable names (line {0})")]
    MissingVariableLine(usize),
    #[error("Invalid variable names line: '{0}'")]
    InvalidVariableLine(String),
    #[error("No '{0}' variable in the trajectory file")]
    MissingPrecipitation(String),
    #[error("Invalid data row at line {line}: {reason}")]
    InvalidRow { line: usize, reason: String },
}

fn leading_count(input: &str) -> IResult<&str, usize> {
    preceded(space0, map_res(digit1, |s: &str| s.parse::<usize>())).parse(input)
}

fn variable_names(input: &str) -> IResult<&str, (usize, Vec<&str>)> {
    (
        leading_count,
        many0(preceded(space1, take_till1(char::is_whitespace))),
    )
        .parse(input)
}

/// Parse one whitespace-separated field of a data row.
fn field<T: FromStr>(fields: &[&str], idx: usize, line: usize) -> Result<T, ParseTrajError> {
    fields[idx]
        .parse::<T>()
        .map_err(|_| ParseTrajError::InvalidRow {
            line,
            reason: format!("column {idx} is not a valid number: '{}'", fields[idx]),
        })
}

fn parse_row(
    text: &str,
    line: usize,
    n_vars: usize,
    rain_idx: usize,
) -> Result<TrajectoryRow, ParseTrajError> {
    let fields: Vec<&str> = text.split_whitespace().collect();
    if fields.len() != FIXED_COLUMNS + n_vars {
        return Err(ParseTrajError::InvalidRow {
            line,
            reason: format!(
                "expected {} columns, found {}",
                FIXED_COLUMNS + n_vars,
                fields.len()
            ),
        });
    }

    let meteo = (FIXED_COLUMNS..FIXED_COLUMNS + n_vars)
        .map(|idx| field::<f64>(&fields, idx, line))
        .collect::<Result<Vec<f64>, _>>()?;

    Ok(TrajectoryRow {
        traj_id: field(&fields, 0, line)?,
        grid_id: field(&fields, 1, line)?,
        year: field(&fields, 2, line)?,
        month: field(&fields, 3, line)?,
        day: field(&fields, 4, line)?,
        hour: field(&fields, 5, line)?,
        minute: field(&fields, 6, line)?,
        forecast_hour: field(&fields, 7, line)?,
        age: field(&fields, 8, line)?,
        lat: field(&fields, 9, line)?,
        lon: field(&fields, 10, line)?,
        alt: field(&fields, 11, line)?,
        precipitation: meteo[rain_idx],
        meteo,
    })
}

/// Parse the content of a trace file, keeping at most `hours_in_the_past` rows.
///
/// Arguments
/// -----------------
/// * `content` – full text of the file.
/// * `hours_in_the_past` – maximum number of hourly rows to read.
///
/// Return
/// ----------
/// * The parsed [`TrajectoryTrace`] or the first [`ParseTrajError`] met.
pub fn parse_tdump(
    content: &str,
    hours_in_the_past: usize,
) -> Result<TrajectoryTrace, ParseTrajError> {
    let lines: Vec<&str> = content.lines().collect();

    let first_line = lines.first().copied().unwrap_or_default();
    let (_, n_grids) = leading_count(first_line)
        .map_err(|_| ParseTrajError::InvalidHeaderCount(first_line.trim().to_string()))?;

    // 1-based line number of the variable names
    let names_line = n_grids
        .checked_add(4)
        .ok_or_else(|| ParseTrajError::InvalidHeaderCount(first_line.trim().to_string()))?;
    let names_text = lines
        .get(names_line - 1)
        .ok_or(ParseTrajError::MissingVariableLine(names_line))?;

    let (remain, (declared, names)) = variable_names(names_text)
        .map_err(|_| ParseTrajError::InvalidVariableLine(names_text.trim().to_string()))?;
    if !remain.trim().is_empty() || declared != names.len() {
        return Err(ParseTrajError::InvalidVariableLine(
            names_text.trim().to_string(),
        ));
    }

    let rain_idx = names
        .iter()
        .position(|n| *n == RAIN_VARIABLE)
        .ok_or_else(|| ParseTrajError::MissingPrecipitation(RAIN_VARIABLE.to_string()))?;

    let rows = lines
        .iter()
        .enumerate()
        .skip(names_line)
        .filter(|(_, text)| !text.trim().is_empty())
        .take(hours_in_the_past)
        .map(|(idx, text)| parse_row(text, idx + 1, names.len(), rain_idx))
        .collect::<Result<Vec<TrajectoryRow>, ParseTrajError>>()?;

    Ok(TrajectoryTrace {
        meteo_names: names.into_iter().map(String::from).collect(),
        rows,
    })
}

/// Read and parse a trace file.
///
/// Return
/// ----------
/// * The parsed trace, [`PscfError::IoError`] if the file cannot be read, or
///   [`PscfError::Parse`] with the file path on malformed content.
pub fn read_tdump(
    path: &Utf8Path,
    hours_in_the_past: usize,
) -> Result<TrajectoryTrace, PscfError> {
    let content = std::fs::read_to_string(path)?;
    parse_tdump(&content, hours_in_the_past).map_err(|source| PscfError::Parse {
        path: path.to_string(),
        source,
    })
}

#[cfg(test)]
mod tdump_reader_test {
    use super::*;

    const HEADER: &str = "     1     1
    17     3    15     0     0
     1 BACKWARD OMEGA
    17     3    15     0  48.500    2.000   500.0
     3 PRESSURE RAINFALL RELHUMID
";

    fn row(age: f64, lat: f64, lon: f64, rain: f64) -> String {
        format!(
            "     1     1    17     3    15     0     0    99  {age:6.1} {lat:8.3} {lon:8.3}   500.0    950.0 {rain:6.1}     80.0\n"
        )
    }

    fn sample_file(n_rows: usize) -> String {
        let mut content = HEADER.to_string();
        for i in 0..n_rows {
            let i = i as f64;
            content.push_str(&row(-i, 48.5 + i * 0.1, 2.0 - i * 0.2, 0.0));
        }
        content
    }

    #[test]
    fn parse_valid_trace() {
        let trace = parse_tdump(&sample_file(5), 72).unwrap();

        assert_eq!(trace.meteo_names, vec!["PRESSURE", "RAINFALL", "RELHUMID"]);
        assert_eq!(trace.rows.len(), 5);

        let second = &trace.rows[1];
        assert_eq!(second.age, -1.0);
        assert_eq!(second.lat, 48.6);
        assert_eq!(second.lon, 1.8);
        assert_eq!(second.alt, 500.0);
        assert_eq!(second.precipitation, 0.0);
        assert_eq!(trace.meteo(second, "RELHUMID"), Some(80.0));
        assert_eq!(trace.meteo(second, "THETA"), None);
        assert_eq!(
            trace.arrival_date().unwrap().unwrap().to_string(),
            "2017-03-15"
        );
    }

    #[test]
    fn rows_are_capped_by_hours_in_the_past() {
        let trace = parse_tdump(&sample_file(10), 4).unwrap();
        assert_eq!(trace.rows.len(), 4);
        assert_eq!(trace.rows[3].age, -3.0);
    }

    #[test]
    fn short_trajectories_are_accepted() {
        let trace = parse_tdump(&sample_file(2), 72).unwrap();
        assert_eq!(trace.rows.len(), 2);

        let trace = parse_tdump(HEADER, 72).unwrap();
        assert!(trace.rows.is_empty());
        assert!(trace.arrival_date().is_none());
    }

    #[test]
    fn blank_lines_are_skipped() {
        let content = format!("{}\n\n{}", sample_file(1), row(-1.0, 49.0, 1.0, 0.0));
        let trace = parse_tdump(&content, 72).unwrap();
        assert_eq!(trace.rows.len(), 2);
    }

    #[test]
    fn invalid_header_count() {
        let content = sample_file(1).replacen("     1     1", "     x     1", 1);
        assert!(matches!(
            parse_tdump(&content, 72),
            Err(ParseTrajError::InvalidHeaderCount(_))
        ));
        assert!(matches!(
            parse_tdump("", 72),
            Err(ParseTrajError::InvalidHeaderCount(_))
        ));
    }

    #[test]
    fn header_count_at_usize_limit() {
        let content = format!("{} 1\nx\n", usize::MAX);
        assert_eq!(
            parse_tdump(&content, 72),
            Err(ParseTrajError::InvalidHeaderCount(format!("{} 1", usize::MAX)))
        );
    }

    #[test]
    fn header_count_past_end_of_file() {
        let content = sample_file(1).replacen("     1     1", "    40     1", 1);
        assert_eq!(
            parse_tdump(&content, 72),
            Err(ParseTrajError::MissingVariableLine(44))
        );
    }

    #[test]
    fn invalid_variable_line() {
        let content = sample_file(1).replace("     3 PRESSURE", "     4 PRESSURE");
        assert!(matches!(
            parse_tdump(&content, 72),
            Err(ParseTrajError::InvalidVariableLine(_))
        ));
    }

    #[test]
    fn missing_precipitation_variable() {
        let content = sample_file(1).replace("RAINFALL", "THETA");
        assert_eq!(
            parse_tdump(&content, 72),
            Err(ParseTrajError::MissingPrecipitation("RAINFALL".into()))
        );
    }

    #[test]
    fn invalid_rows() {
        let content = format!("{}{}", sample_file(1), "     1     1    17     3\n");
        assert!(matches!(
            parse_tdump(&content, 72),
            Err(ParseTrajError::InvalidRow { line: 7, .. })
        ));

        let content = sample_file(1).replace(
            "48.500    2.000   500.0    950.0",
            "48.500    abc   500.0    950.0",
        );
        assert!(matches!(
            parse_tdump(&content, 72),
            Err(ParseTrajError::InvalidRow { line: 6, .. })
        ));
    }
}
