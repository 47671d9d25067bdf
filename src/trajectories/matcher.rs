//! # Concentration matching
//!
//! Associates each trajectory file, and each configured starting-hour offset, with one daily
//! concentration observation.
//!
//! ## Alignments
//! -----------------
//! * **Positional** ([`ConcentrationMatcher::zip_positional`]) – the sorted file listing and
//!   the date-ordered record are zipped by position. The ordering of both sides is a caller
//!   contract; a length mismatch is reported with a warning and the zip stops at the shorter
//!   side.
//! * **Keyed by start date** ([`ConcentrationMatcher::by_date`]) – a file is matched to the
//!   observation of its own arrival day, read from the trace.
//!
//! For every matched observation, [`ConcentrationMatcher::offsets`] expands one
//! [`TrajectoryMatch`] per offset hour, timestamped at `date at midnight + offset` hours.
use camino::{Utf8Path, Utf8PathBuf};
use hifitime::Epoch;
use tracing::warn;

use crate::concentration::{ConcentrationObservation, ConcentrationRecord};
use crate::constants::Hour;
use crate::time::ObsDate;

/// One observation paired with one starting-hour offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryMatch {
    pub observation: ConcentrationObservation,
    pub offset_hour: Hour,
    pub timestamp: Epoch,
}

#[derive(Debug, Clone, Copy)]
pub struct ConcentrationMatcher<'a> {
    record: &'a ConcentrationRecord,
    offsets: &'a [Hour],
}

impl<'a> ConcentrationMatcher<'a> {
    pub fn new(record: &'a ConcentrationRecord, offsets: &'a [Hour]) -> Self {
        ConcentrationMatcher { record, offsets }
    }

    /// Pair files and observations by position.
    ///
    /// Arguments
    /// -----------------
    /// * `files` – the trajectory files, in listing order.
    ///
    /// Return
    /// ----------
    /// * One `(file, observation)` pair per position of the shorter side.
    pub fn zip_positional<'f>(
        &self,
        files: &'f [Utf8PathBuf],
    ) -> Vec<(&'f Utf8Path, ConcentrationObservation)> {
        if files.len() != self.record.len() {
            warn!(
                "{} trajectory files for {} {} observations: only the first {} pairs are used",
                files.len(),
                self.record.len(),
                self.record.species(),
                files.len().min(self.record.len())
            );
        }

        files
            .iter()
            .map(Utf8PathBuf::as_path)
            .zip(self.record.observations().iter().copied())
            .collect()
    }

    /// Observation of the arrival day of a trajectory, if the record has one.
    pub fn by_date(&self, date: &ObsDate) -> Option<ConcentrationObservation> {
        self.record.get(date).copied()
    }

    /// Expand an observation over the configured offset hours.
    pub fn offsets(
        &self,
        observation: ConcentrationObservation,
    ) -> impl Iterator<Item = TrajectoryMatch> + 'a {
        self.offsets.iter().map(move |&offset_hour| TrajectoryMatch {
            observation,
            offset_hour,
            timestamp: observation.date.at_offset(offset_hour),
        })
    }
}

#[cfg(test)]
mod matcher_test {
    use super::*;
    use hifitime::Unit;

    fn record() -> ConcentrationRecord {
        ConcentrationRecord::from_pairs(
            "PM10",
            (1..=3).map(|d| (ObsDate::new(2017, 3, d).unwrap(), 10.0 * d as f64)),
        )
        .unwrap()
    }

    fn files(n: usize) -> Vec<Utf8PathBuf> {
        (0..n)
            .map(|i| Utf8PathBuf::from(format!("traj_PAR_{i}")))
            .collect()
    }

    #[test]
    fn positional_zip() {
        let rec = record();
        let matcher = ConcentrationMatcher::new(&rec, &[0.0]);

        let files = files(3);
        let pairs = matcher.zip_positional(&files);
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[1].0, Utf8Path::new("traj_PAR_1"));
        assert_eq!(pairs[1].1.value, 20.0);
    }

    #[test]
    fn positional_zip_stops_at_shorter_side() {
        let rec = record();
        let matcher = ConcentrationMatcher::new(&rec, &[0.0]);

        assert_eq!(matcher.zip_positional(&files(2)).len(), 2);
        assert_eq!(matcher.zip_positional(&files(5)).len(), 3);
    }

    #[test]
    fn keyed_match() {
        let rec = record();
        let matcher = ConcentrationMatcher::new(&rec, &[0.0]);

        let obs = matcher.by_date(&ObsDate::new(2017, 3, 3).unwrap()).unwrap();
        assert_eq!(obs.value, 30.0);
        assert!(matcher.by_date(&ObsDate::new(2017, 4, 3).unwrap()).is_none());
    }

    #[test]
    fn offsets_shift_the_timestamp() {
        let rec = record();
        let offsets = [-6.0, 0.0, 12.0];
        let matcher = ConcentrationMatcher::new(&rec, &offsets);

        let obs = rec.observations()[0];
        let matches: Vec<TrajectoryMatch> = matcher.offsets(obs).collect();
        assert_eq!(matches.len(), 3);

        let midnight = obs.date.midnight();
        assert_eq!(matches[0].timestamp, midnight - Unit::Hour * 6.0);
        assert_eq!(matches[1].timestamp, midnight);
        assert_eq!(matches[2].timestamp, midnight + Unit::Hour * 12.0);
        assert!(matches.iter().all(|m| m.observation == obs));
    }
}
