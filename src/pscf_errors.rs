use thiserror::Error;

use crate::trajectories::tdump_reader::ParseTrajError;

#[derive(Error, Debug)]
pub enum PscfError {
    #[error("Invalid PSCF configuration: {0}")]
    Config(String),

    #[error("Error while parsing the trajectory file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: ParseTrajError,
    },

    #[error("Trajectories and concentration record are not aligned: {0}")]
    DataAlignment(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Two concentration values for the same date: {0}")]
    DuplicateDate(String),

    #[error("Column not found in the concentration file: {0}")]
    MissingColumn(String),

    #[error("Invalid concentration value {value} at {date}")]
    InvalidConcentration { date: String, value: f64 },

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

impl PartialEq for PscfError {
    fn eq(&self, other: &Self) -> bool {
        use PscfError::*;
        match (self, other) {
            (Config(a), Config(b)) => a == b,
            (
                Parse {
                    path: pa,
                    source: sa,
                },
                Parse {
                    path: pb,
                    source: sb,
                },
            ) => pa == pb && sa == sb,
            (DataAlignment(a), DataAlignment(b)) => a == b,
            (InvalidDate(a), InvalidDate(b)) => a == b,
            (DuplicateDate(a), DuplicateDate(b)) => a == b,
            (MissingColumn(a), MissingColumn(b)) => a == b,
            (
                InvalidConcentration { date: da, value: va },
                InvalidConcentration { date: db, value: vb },
            ) => da == db && va == vb,

            // Not comparable: equal when same variant
            (IoError(_), IoError(_)) => true,
            (CsvError(_), CsvError(_)) => true,

            _ => false,
        }
    }
}
