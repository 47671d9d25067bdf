//! # Back-trajectories: ingestion, truncation, and association
//!
//! High-level facilities to **read** back-trajectory trace files, **cut** them at the first
//! rain event, **associate** them with the concentration record, and **flatten** them into
//! the table of endpoint samples consumed by the grid accumulator.
//!
//! Modules
//! -----------------
//! * [`tdump_reader`](crate::trajectories::tdump_reader) – Reader of HYSPLIT-like trace files
//!   with a self-described header.
//! * [`truncation`](crate::trajectories::truncation) – Rain truncation of a parsed trace.
//! * [`matcher`](crate::trajectories::matcher) – Association of trace files (and starting-hour
//!   offsets) with daily concentration observations.
//! * [`collector`](crate::trajectories::collector) – Folder-level orchestration producing the
//!   flat [`EndpointSample`] table.
//! * *(crate-private)* `progress_bar` – Optional progress UI when the `progress` feature is enabled.
//!
//! Data Model
//! -----------------
//! * [`TrajectoryRow`] – one hourly step of a trace, as written in the file.
//! * [`TrajectoryTrace`] – the rows of one file plus the names of its meteo variables.
//! * [`TrajectorySample`] – one step of a trace tagged with the day and the offset hour it is
//!   attributed to.
//! * [`EndpointSample`] – a [`TrajectorySample`] enriched with its starting timestamp and the
//!   concentration of its day.
//!
//! Units
//! -----------------
//! * Positions are in **degrees**, altitudes in the unit of the trace file (metres AGL for
//!   HYSPLIT), ages and offsets in **hours**.
//! * Timestamps are [`hifitime::Epoch`] in **UTC**.
pub mod collector;
pub mod matcher;
pub(crate) mod progress_bar;
pub mod tdump_reader;
pub mod truncation;

use hifitime::Epoch;

use crate::constants::{Concentration, Degree, Hour};
use crate::pscf_errors::PscfError;
use crate::time::ObsDate;

/// One hourly step of a back-trajectory, as written in the trace file.
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryRow {
    pub traj_id: u32,
    pub grid_id: u32,
    /// Two-digit year of the step
    pub year: u32,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub forecast_hour: f64,
    /// Age of the step, in hours (negative for back-trajectories)
    pub age: Hour,
    pub lat: Degree,
    pub lon: Degree,
    pub alt: f64,
    /// Value of the precipitation variable
    pub precipitation: f64,
    /// One value per meteo variable of the trace, in declaration order
    pub meteo: Vec<f64>,
}

impl TrajectoryRow {
    /// Calendar day of the step.
    pub fn date(&self) -> Result<ObsDate, PscfError> {
        ObsDate::from_short_year(self.year, self.month, self.day)
    }
}

/// The parsed content of one trace file.
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryTrace {
    pub meteo_names: Vec<String>,
    pub rows: Vec<TrajectoryRow>,
}

impl TrajectoryTrace {
    /// Value of the meteo variable `name` at `row`, if the variable exists.
    pub fn meteo(&self, row: &TrajectoryRow, name: &str) -> Option<f64> {
        self.meteo_names
            .iter()
            .position(|n| n == name)
            .and_then(|idx| row.meteo.get(idx).copied())
    }

    /// Arrival day of the trajectory at the receptor (first row).
    ///
    /// Return
    /// ----------
    /// * `None` for a trace without rows.
    pub fn arrival_date(&self) -> Option<Result<ObsDate, PscfError>> {
        self.rows.first().map(TrajectoryRow::date)
    }
}

/// One step of a back-trajectory attributed to a concentration day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectorySample {
    /// Day of the associated concentration observation
    pub origin: ObsDate,
    /// Starting hour of the trajectory relative to midnight of `origin`
    pub offset_hour: Hour,
    pub age: Hour,
    pub lat: Degree,
    pub lon: Degree,
    pub precipitation: f64,
}

/// A trajectory endpoint ready to be gridded.
///
/// Invariant: `concentration` is the value of the record on `sample.origin`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EndpointSample {
    /// Position of the source trace file in the collection order
    pub trace: usize,
    pub sample: TrajectorySample,
    /// `origin` at midnight plus `offset_hour`
    pub timestamp: Epoch,
    pub concentration: Concentration,
}

impl EndpointSample {
    #[inline]
    pub fn lat(&self) -> Degree {
        self.sample.lat
    }

    #[inline]
    pub fn lon(&self) -> Degree {
        self.sample.lon
    }

    #[inline]
    pub fn origin(&self) -> ObsDate {
        self.sample.origin
    }
}
