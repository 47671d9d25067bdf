//! # Concentration record
//!
//! The pollutant time series measured at the receptor. It is the statistical reference of a
//! PSCF run: its percentile gives the concentration threshold, and each of its observations
//! is associated with the back-trajectories arriving on the same day.
//!
//! Modules
//! -----------------
//! * [`csv_reader`](crate::concentration::csv_reader) – Loads a record from a CSV file with a
//!   `date` column and one column per species.
//! * [`threshold`](crate::concentration::threshold) – Percentile (linear interpolation) and
//!   fixed-cutoff resolution of the concentration threshold.
//!
//! Invariants
//! -----------------
//! * Observations are **sorted by date** and there is **at most one observation per day**.
//! * Concentration values are finite.
//!
//! The record is immutable once built; date filtering returns a new record.
pub mod csv_reader;
pub mod threshold;

use crate::constants::Concentration;
use crate::pscf_errors::PscfError;
use crate::time::ObsDate;

/// One daily concentration value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConcentrationObservation {
    pub date: ObsDate,
    pub value: Concentration,
}

impl ConcentrationObservation {
    pub fn new(date: ObsDate, value: Concentration) -> Self {
        ConcentrationObservation { date, value }
    }
}

/// Date-ordered daily concentrations of one species.
#[derive(Debug, Clone, PartialEq)]
pub struct ConcentrationRecord {
    species: String,
    observations: Vec<ConcentrationObservation>,
}

impl ConcentrationRecord {
    /// Build a record from unordered observations.
    ///
    /// Arguments
    /// -----------------
    /// * `species` – name of the measured pollutant.
    /// * `observations` – daily values, in any order.
    ///
    /// Return
    /// ----------
    /// * The sorted record, [`PscfError::DuplicateDate`] if a day appears twice, or
    ///   [`PscfError::InvalidConcentration`] for a non-finite value.
    pub fn new(
        species: impl Into<String>,
        mut observations: Vec<ConcentrationObservation>,
    ) -> Result<Self, PscfError> {
        if let Some(bad) = observations.iter().find(|o| !o.value.is_finite()) {
            return Err(PscfError::InvalidConcentration {
                date: bad.date.to_string(),
                value: bad.value,
            });
        }

        observations.sort_by_key(|o| o.date);
        if let Some(pair) = observations.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(PscfError::DuplicateDate(pair[0].date.to_string()));
        }

        Ok(ConcentrationRecord {
            species: species.into(),
            observations,
        })
    }

    /// Build a record from `(date, value)` pairs.
    pub fn from_pairs(
        species: impl Into<String>,
        pairs: impl IntoIterator<Item = (ObsDate, Concentration)>,
    ) -> Result<Self, PscfError> {
        ConcentrationRecord::new(
            species,
            pairs
                .into_iter()
                .map(|(date, value)| ConcentrationObservation::new(date, value))
                .collect(),
        )
    }

    pub fn species(&self) -> &str {
        &self.species
    }

    pub fn observations(&self) -> &[ConcentrationObservation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Concentration values, in date order.
    pub fn values(&self) -> impl Iterator<Item = Concentration> + '_ {
        self.observations.iter().map(|o| o.value)
    }

    /// Observation of a given day, if any.
    pub fn get(&self, date: &ObsDate) -> Option<&ConcentrationObservation> {
        self.observations
            .binary_search_by_key(date, |o| o.date)
            .ok()
            .map(|idx| &self.observations[idx])
    }

    /// First and last dates of the record.
    pub fn date_span(&self) -> Option<(ObsDate, ObsDate)> {
        match (self.observations.first(), self.observations.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date)),
            _ => None,
        }
    }

    /// Keep the observations strictly between the optional bounds.
    ///
    /// Both bounds are **exclusive**; a missing bound does not filter.
    pub fn filter_dates(&self, min: Option<ObsDate>, max: Option<ObsDate>) -> Self {
        let observations = self
            .observations
            .iter()
            .filter(|o| min.map_or(true, |m| o.date > m) && max.map_or(true, |m| o.date < m))
            .copied()
            .collect();

        ConcentrationRecord {
            species: self.species.clone(),
            observations,
        }
    }
}
