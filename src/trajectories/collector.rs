//! # Trajectory collection
//!
//! Folder-level orchestration of the trajectory ingestion: list the trace files, parse each
//! one once, cut it at the first rain event, associate it with its concentration
//! observation(s), and flatten everything into one table of [`EndpointSample`]s.
//!
//! ## Ordering
//! -----------------
//! * The folder listing is sorted by file name; hidden files (leading `.`) and non-file
//!   entries are ignored.
//! * Samples are emitted file by file, then offset by offset, then row by row.
//!
//! ## Alignment
//! -----------------
//! See [`TrajectoryAlignment`]. In keyed mode a file whose arrival day has no observation is
//! skipped; a run where no file matches fails with [`PscfError::DataAlignment`].
use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, info, warn};

use super::matcher::ConcentrationMatcher;
use super::progress_bar::FileProgress;
use super::tdump_reader::read_tdump;
use super::truncation::truncate_at_rain;
use super::{EndpointSample, TrajectoryRow, TrajectorySample};
use crate::concentration::{ConcentrationObservation, ConcentrationRecord};
use crate::params::{PscfParams, TrajectoryAlignment};
use crate::pscf_errors::PscfError;

/// Trajectory files of a folder, sorted by name.
///
/// Return
/// ----------
/// * The regular, non-hidden files of `folder`, or [`PscfError::IoError`] if the folder
///   cannot be read.
pub fn list_trajectory_files(folder: &Utf8Path) -> Result<Vec<Utf8PathBuf>, PscfError> {
    let mut files = Vec::new();
    for entry in folder.read_dir_utf8()? {
        let entry = entry?;
        if entry.file_name().starts_with('.') || !entry.path().is_file() {
            continue;
        }
        files.push(entry.into_path());
    }
    files.sort();
    Ok(files)
}

/// Builds the endpoint table of a run.
#[derive(Debug, Clone, Copy)]
pub struct TrajectoryCollector<'a> {
    params: &'a PscfParams,
    record: &'a ConcentrationRecord,
}

impl<'a> TrajectoryCollector<'a> {
    /// Arguments
    /// -----------------
    /// * `params` – run configuration (folder, offsets, rain cut, hours, alignment).
    /// * `record` – the date-filtered concentration record.
    pub fn new(params: &'a PscfParams, record: &'a ConcentrationRecord) -> Self {
        TrajectoryCollector { params, record }
    }

    /// Parse, truncate and match every trajectory file of the configured folder.
    ///
    /// Return
    /// ----------
    /// * The flat endpoint table (possibly empty when the folder has no file), or the first
    ///   I/O, parse or alignment error.
    pub fn collect(&self) -> Result<Vec<EndpointSample>, PscfError> {
        let files = list_trajectory_files(&self.params.folder)?;
        if files.is_empty() {
            warn!("no trajectory file in {}", self.params.folder);
            return Ok(Vec::new());
        }
        info!(
            "collecting {} trajectory files from {} ({} offsets)",
            files.len(),
            self.params.folder,
            self.params.offset_hours.len()
        );

        let matcher = ConcentrationMatcher::new(self.record, &self.params.offset_hours);
        let endpoints = match self.params.alignment {
            TrajectoryAlignment::Positional => self.collect_positional(&matcher, &files)?,
            TrajectoryAlignment::ByStartDate => self.collect_by_start_date(&matcher, &files)?,
        };

        info!("{} trajectory endpoints collected", endpoints.len());
        Ok(endpoints)
    }

    fn collect_positional(
        &self,
        matcher: &ConcentrationMatcher<'_>,
        files: &[Utf8PathBuf],
    ) -> Result<Vec<EndpointSample>, PscfError> {
        let pairs = matcher.zip_positional(files);
        let mut progress = FileProgress::new(pairs.len());
        let mut endpoints = Vec::new();

        for (trace_idx, (path, observation)) in pairs.into_iter().enumerate() {
            let trace = read_tdump(path, self.params.hours_in_the_past)?;
            let rows = truncate_at_rain(&trace.rows, self.params.cut_with_rain);
            debug!(
                "{path}: {} rows kept out of {} for {}",
                rows.len(),
                trace.rows.len(),
                observation.date
            );
            emit(matcher, trace_idx, observation, rows, &mut endpoints);
            progress.inc();
        }

        progress.finish();
        Ok(endpoints)
    }

    fn collect_by_start_date(
        &self,
        matcher: &ConcentrationMatcher<'_>,
        files: &[Utf8PathBuf],
    ) -> Result<Vec<EndpointSample>, PscfError> {
        let mut progress = FileProgress::new(files.len());
        let mut endpoints = Vec::new();
        let mut matched = 0usize;

        for (trace_idx, path) in files.iter().enumerate() {
            let trace = read_tdump(path, self.params.hours_in_the_past)?;
            progress.inc();

            let Some(date) = trace.arrival_date().transpose()? else {
                debug!("{path}: empty trajectory, skipped");
                continue;
            };
            let Some(observation) = matcher.by_date(&date) else {
                debug!("{path}: no {} observation on {date}, skipped", self.record.species());
                continue;
            };

            let rows = truncate_at_rain(&trace.rows, self.params.cut_with_rain);
            emit(matcher, trace_idx, observation, rows, &mut endpoints);
            matched += 1;
        }

        progress.finish();
        if matched == 0 {
            return Err(PscfError::DataAlignment(format!(
                "none of the {} trajectory files in {} starts on a day of the {} record",
                files.len(),
                self.params.folder,
                self.record.species()
            )));
        }
        debug!("{matched} of {} trajectory files matched by date", files.len());
        Ok(endpoints)
    }
}

/// Append the samples of one trace, one copy per offset hour.
fn emit(
    matcher: &ConcentrationMatcher<'_>,
    trace: usize,
    observation: ConcentrationObservation,
    rows: &[TrajectoryRow],
    endpoints: &mut Vec<EndpointSample>,
) {
    for m in matcher.offsets(observation) {
        endpoints.extend(rows.iter().map(|row| EndpointSample {
            trace,
            sample: TrajectorySample {
                origin: m.observation.date,
                offset_hour: m.offset_hour,
                age: row.age,
                lat: row.lat,
                lon: row.lon,
                precipitation: row.precipitation,
            },
            timestamp: m.timestamp,
            concentration: m.observation.value,
        }));
    }
}
