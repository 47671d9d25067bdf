//! # PSCF computation
//!
//! The [`Pscf`] façade drives one Potential Source Contribution Function run and returns an
//! immutable [`PscfResult`].
//!
//! ## Pipeline
//! -----------------
//! 1. Filter the concentration record on the configured (exclusive) date range.
//! 2. Resolve the concentration threshold (fixed value, or percentile of the filtered record).
//! 3. Collect the trajectory endpoints (parse, rain cut, match, expand over offsets).
//! 4. Bin the endpoints on the half-degree mesh (`total` and `above` histograms).
//! 5. Derive the PSCF, density and weight fields.
//! 6. Optionally aggregate the `above` counts into 16 bearing sectors around the receptor.
//!
//! Any error aborts the run; there is no partial result.
//!
//! ## Inspection
//! -----------------
//! A [`PscfResult`] keeps the endpoint table, so the trajectories behind a cell can be
//! queried afterwards with [`PscfResult::endpoints_in_cell`] and
//! [`PscfResult::trajectories_through_cell`].
//!
//! ## Example
//! -----------------
//! ```rust,no_run
//! use camino::Utf8Path;
//! use pscf::{ConcentrationRecord, Pscf, PscfParams};
//!
//! let record = ConcentrationRecord::from_csv(Utf8Path::new("data/OPE.csv"), "PM10")?;
//! let params = PscfParams::builder()
//!     .station("OPE")
//!     .species("PM10")
//!     .receptor(48.56, 5.5)
//!     .folder("data/trajectories")
//!     .build()?;
//!
//! let result = Pscf::new(params, record).run()?;
//! println!("threshold: {:.2}", result.threshold);
//! # Ok::<(), pscf::PscfError>(())
//! ```
use hifitime::Epoch;
use itertools::Itertools;
use tracing::info;

use crate::concentration::threshold::resolve_threshold;
use crate::concentration::ConcentrationRecord;
use crate::constants::{Concentration, Degree, Hour};
use crate::grid::bearing::{BearingAggregator, SectorSummary};
use crate::grid::fields::PscfFields;
use crate::grid::{GridAxes, GridCounts};
use crate::params::PscfParams;
use crate::pscf_errors::PscfError;
use crate::time::ObsDate;
use crate::trajectories::collector::TrajectoryCollector;
use crate::trajectories::{EndpointSample, TrajectorySample};

/// One PSCF run: a configuration and a concentration record.
#[derive(Debug, Clone)]
pub struct Pscf {
    params: PscfParams,
    record: ConcentrationRecord,
}

/// Endpoints selected by a cell query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellSelection {
    /// Every endpoint of the cell
    #[default]
    All,
    /// Endpoints whose concentration is `>=` the threshold
    AboveThreshold,
}

/// Outputs of a PSCF run.
#[derive(Debug, Clone, PartialEq)]
pub struct PscfResult {
    pub threshold: Concentration,
    pub receptor: (Degree, Degree),
    pub axes: GridAxes,
    pub counts: GridCounts,
    pub fields: PscfFields,
    pub endpoints: Vec<EndpointSample>,
    pub sectors: Option<SectorSummary>,
    /// First and last days of the filtered record
    pub date_span: Option<(ObsDate, ObsDate)>,
}

/// A whole back-trajectory crossing an inspected cell.
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryPath {
    pub origin: ObsDate,
    pub offset_hour: Hour,
    pub timestamp: Epoch,
    pub concentration: Concentration,
    pub samples: Vec<TrajectorySample>,
}

impl Pscf {
    pub fn new(params: PscfParams, record: ConcentrationRecord) -> Self {
        Pscf { params, record }
    }

    pub fn params(&self) -> &PscfParams {
        &self.params
    }

    pub fn record(&self) -> &ConcentrationRecord {
        &self.record
    }

    /// Run the whole pipeline.
    ///
    /// Return
    /// ----------
    /// * The [`PscfResult`], or the first error met:
    ///   - [`PscfError::Config`] when no threshold can be resolved,
    ///   - [`PscfError::IoError`] / [`PscfError::Parse`] on trajectory files,
    ///   - [`PscfError::DataAlignment`] when no file matches the record (keyed alignment).
    pub fn run(&self) -> Result<PscfResult, PscfError> {
        let p = &self.params;

        let record = self.record.filter_dates(p.date_min, p.date_max);
        info!(
            "{} {} observations kept out of {} at {}",
            record.len(),
            p.species,
            self.record.len(),
            p.station
        );

        let threshold = resolve_threshold(p.percentile, p.threshold, &record)?;
        info!("concentration threshold: {threshold:.2}");

        let endpoints = TrajectoryCollector::new(p, &record).collect()?;

        let axes = GridAxes::new(&p.bounding_box);
        let counts = GridCounts::accumulate(&endpoints, &axes, threshold);
        info!(
            "{} endpoints gridded, {} above the threshold",
            counts.total_sum(),
            counts.above_sum()
        );

        let fields = PscfFields::compute(&counts, p.weighting);

        let sectors = p
            .sector_summary
            .then(|| BearingAggregator::new(p.lat0, p.lon0).aggregate(&axes, &counts.above));

        Ok(PscfResult {
            threshold,
            receptor: (p.lat0, p.lon0),
            axes,
            counts,
            fields,
            endpoints,
            sectors,
            date_span: record.date_span(),
        })
    }
}

impl PscfResult {
    fn selected(&self, endpoint: &EndpointSample, selection: CellSelection) -> bool {
        match selection {
            CellSelection::All => true,
            CellSelection::AboveThreshold => endpoint.concentration >= self.threshold,
        }
    }

    fn in_cell(&self, endpoint: &EndpointSample, cell: (usize, usize)) -> bool {
        self.axes.cell_of(endpoint.lon(), endpoint.lat()) == Some(cell)
    }

    /// Endpoints of the mesh cell containing `(lon, lat)`, empty outside the mesh.
    ///
    /// With [`CellSelection::All`] the result has `counts.total` endpoints for that cell.
    pub fn endpoints_in_cell(
        &self,
        lon: Degree,
        lat: Degree,
        selection: CellSelection,
    ) -> Vec<&EndpointSample> {
        let Some(cell) = self.axes.cell_of(lon, lat) else {
            return Vec::new();
        };
        self.endpoints
            .iter()
            .filter(|e| self.in_cell(e, cell) && self.selected(e, selection))
            .collect()
    }

    /// Full trajectories with at least one selected endpoint in the cell containing
    /// `(lon, lat)`.
    ///
    /// A trajectory is identified by its trace file and its offset hour; the returned paths
    /// are in collection order.
    pub fn trajectories_through_cell(
        &self,
        lon: Degree,
        lat: Degree,
        selection: CellSelection,
    ) -> Vec<TrajectoryPath> {
        let Some(cell) = self.axes.cell_of(lon, lat) else {
            return Vec::new();
        };

        let traces = self
            .endpoints
            .iter()
            .chunk_by(|e| (e.trace, e.sample.offset_hour.to_bits()));

        traces
            .into_iter()
            .filter_map(|(_, group)| {
                let group: Vec<&EndpointSample> = group.collect();
                let first = *group.first()?;
                let crosses = group
                    .iter()
                    .any(|e| self.in_cell(e, cell) && self.selected(e, selection));
                crosses.then(|| TrajectoryPath {
                    origin: first.origin(),
                    offset_hour: first.sample.offset_hour,
                    timestamp: first.timestamp,
                    concentration: first.concentration,
                    samples: group.iter().map(|e| e.sample).collect(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod pscf_test {
    use super::*;
    use crate::params::{BoundingBox, WeightingMode};
    use crate::unit_test_global::{FIXTURE_PARAMS, FIXTURE_RESULT};

    fn record() -> ConcentrationRecord {
        ConcentrationRecord::from_pairs(
            "PM10",
            (1..=3).map(|d| (ObsDate::new(2017, 3, d).unwrap(), 10.0 * d as f64)),
        )
        .unwrap()
    }

    fn run(weighting: Option<WeightingMode>) -> PscfResult {
        let mut params = FIXTURE_PARAMS.clone();
        params.weighting = weighting;
        Pscf::new(params, record()).run().unwrap()
    }

    #[test]
    fn run_counts_and_fields() {
        let result = &*FIXTURE_RESULT;

        assert_eq!(result.threshold, 15.0);
        assert_eq!(result.endpoints.len(), 6);
        assert_eq!(result.counts.total_sum(), 6);
        assert_eq!(result.counts.above_sum(), 4);

        let (i, j) = result.axes.cell_of(2.2, 48.2).unwrap();
        assert_eq!(result.counts.total[(i, j)], 3);
        assert_eq!(result.counts.above[(i, j)], 2);
        assert!((result.fields.pscf[(i, j)] - 2.0 / 3.0).abs() < 1e-12);
        assert!(result.fields.weight.is_none());

        let sectors = result.sectors.as_ref().unwrap();
        assert_eq!(sectors.total, 4);
        assert_eq!(
            result.date_span,
            Some((ObsDate::new(2017, 3, 1).unwrap(), ObsDate::new(2017, 3, 3).unwrap()))
        );
    }

    #[test]
    fn percentile_of_the_filtered_record() {
        let mut params = FIXTURE_PARAMS.clone();
        params.threshold = None;
        params.percentile = Some(75.0);
        params.date_min = Some(ObsDate::new(2017, 3, 1).unwrap());
        params.sector_summary = false;

        let result = Pscf::new(params, record()).run().unwrap();

        // 20 and 30 are left: the first two files are zipped with them
        assert!((result.threshold - 27.5).abs() < 1e-12);
        assert_eq!(result.endpoints.len(), 4);
        assert_eq!(result.counts.above_sum(), 2);
        assert!(result.sectors.is_none());
        assert_eq!(
            result.date_span.map(|(min, _)| min),
            Some(ObsDate::new(2017, 3, 2).unwrap())
        );
    }

    #[test]
    fn unresolvable_threshold_aborts_the_run() {
        let mut params = FIXTURE_PARAMS.clone();
        params.threshold = None;
        params.date_min = Some(ObsDate::new(2017, 3, 10).unwrap());

        let err = Pscf::new(params, record()).run().unwrap_err();
        assert!(matches!(err, PscfError::Config(_)));
    }

    #[test]
    fn auto_weighting_on_fixture() {
        // max(above) is 2, so the weight is ln(total) / ln(2)
        let result = run(Some(WeightingMode::Auto));
        let weight = result.fields.weight.as_ref().unwrap();
        let (i, j) = result.axes.cell_of(2.2, 48.2).unwrap();
        assert!((weight[(i, j)] - 3f64.ln() / 2f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn cell_queries() {
        let result = &*FIXTURE_RESULT;

        let all = result.endpoints_in_cell(2.4, 48.1, CellSelection::All);
        assert_eq!(all.len(), 3);
        let above = result.endpoints_in_cell(2.4, 48.1, CellSelection::AboveThreshold);
        assert_eq!(above.len(), 2);
        assert!(above.iter().all(|e| e.concentration >= 15.0));

        let paths = result.trajectories_through_cell(2.4, 48.1, CellSelection::AboveThreshold);
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].origin, ObsDate::new(2017, 3, 2).unwrap());
        assert_eq!(paths[0].samples.len(), 2);
        assert_eq!(paths[1].concentration, 30.0);

        assert!(result
            .trajectories_through_cell(-9.0, 38.0, CellSelection::All)
            .is_empty());
    }

    #[test]
    fn cell_queries_follow_an_offset_mesh() {
        let mut params = FIXTURE_PARAMS.clone();
        params.bounding_box = BoundingBox::new(37.25, 60.25, -9.75, 20.25);
        let result = Pscf::new(params, record()).run().unwrap();

        // (48.3, 2.4) now sits in the next cell on both axes
        let cell = result.axes.cell_of(2.2, 48.2).unwrap();
        assert_eq!(result.counts.total[cell], 2);
        let all = result.endpoints_in_cell(2.2, 48.2, CellSelection::All);
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|e| result.axes.cell_of(e.lon(), e.lat()) == Some(cell)));

        assert!(result
            .endpoints_in_cell(2.2, 70.0, CellSelection::All)
            .is_empty());
    }

    #[test]
    fn traces_of_the_same_day_stay_apart() {
        // keyed alignment can attribute several files to one day
        let mut result = FIXTURE_RESULT.clone();
        let day = ObsDate::new(2017, 3, 1).unwrap();
        for e in &mut result.endpoints {
            e.sample.origin = day;
        }

        let paths = result.trajectories_through_cell(2.4, 48.1, CellSelection::All);
        assert_eq!(paths.len(), 3);
        assert!(paths.iter().all(|p| p.samples.len() == 2));
        assert_eq!(
            paths.iter().map(|p| p.concentration).collect::<Vec<_>>(),
            vec![10.0, 20.0, 30.0]
        );
    }
}
