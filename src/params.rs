//! # PSCF configuration
//!
//! This module defines [`PscfParams`], the construction-time options of a PSCF run, and its
//! fluent, validating builder [`PscfParamsBuilder`].
//!
//! ## Overview
//!
//! The parameters fall into four groups:
//!
//! * **Receptor** – station name, receptor latitude/longitude, studied species.
//! * **Trajectories** – folder of trace files, informational file prefix, starting-hour
//!   offsets, hours in the past, rain truncation, file/record alignment.
//! * **Statistics** – date range filter, percentile or fixed concentration threshold,
//!   weighting function.
//! * **Map** – bounding box, coastline resolution tier, smoothing, windrose summary.
//!
//! ## Example
//!
//! ```rust,no_run
//! use pscf::params::{BoundingBox, PscfParams};
//!
//! let params = PscfParams::builder()
//!     .station("OPE")
//!     .species("PM10")
//!     .receptor(48.56, 5.5)
//!     .folder("trajectories/")
//!     .offset_hours(vec![-3.0, 0.0, 3.0])
//!     .percentile(75.0)
//!     .bounding_box(BoundingBox::new(37.5, 60.0, -10.0, 20.0))
//!     .build()
//!     .unwrap();
//! ```
use std::cmp::Ordering::{Equal, Greater, Less};
use std::fmt;
use std::str::FromStr;

use camino::Utf8PathBuf;
use tracing::warn;

use crate::constants::{Degree, Hour, DEFAULT_HOURS_IN_THE_PAST, DEFAULT_PERCENTILE};
use crate::pscf_errors::PscfError;
use crate::time::ObsDate;

/// Geographic extent of the PSCF mesh, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub lat_min: Degree,
    pub lat_max: Degree,
    pub lon_min: Degree,
    pub lon_max: Degree,
}

impl BoundingBox {
    pub fn new(lat_min: Degree, lat_max: Degree, lon_min: Degree, lon_max: Degree) -> Self {
        BoundingBox {
            lat_min,
            lat_max,
            lon_min,
            lon_max,
        }
    }

    /// Check that the box is ordered, finite and within the geographic ranges.
    pub fn validate(&self) -> Result<(), PscfError> {
        let finite = [self.lat_min, self.lat_max, self.lon_min, self.lon_max]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(PscfError::Config(
                "bounding box values must be finite".into(),
            ));
        }
        if self.lat_min >= self.lat_max || self.lon_min >= self.lon_max {
            return Err(PscfError::Config(format!(
                "bounding box must satisfy min < max, got {self}"
            )));
        }
        if self.lat_min < -90.0 || self.lat_max > 90.0 {
            return Err(PscfError::Config(format!(
                "bounding box latitudes must lie in [-90, 90], got {self}"
            )));
        }
        Ok(())
    }
}

/// France-centered default extent.
impl Default for BoundingBox {
    fn default() -> Self {
        BoundingBox::new(37.5, 60.0, -10.0, 20.0)
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "lat [{}, {}] lon [{}, {}]",
            self.lat_min, self.lat_max, self.lon_min, self.lon_max
        )
    }
}

/// Coastline/border resolution tier requested from the map renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MapResolution {
    /// 1:110m Natural Earth features
    #[default]
    Coarse,
    /// 1:50m Natural Earth features
    Medium,
}

impl MapResolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            MapResolution::Coarse => "110m",
            MapResolution::Medium => "50m",
        }
    }
}

impl FromStr for MapResolution {
    type Err = PscfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "110m" => Ok(MapResolution::Coarse),
            "50m" => Ok(MapResolution::Medium),
            other => Err(PscfError::Config(format!(
                "unknown map resolution '{other}', expected '110m' or '50m'"
            ))),
        }
    }
}

/// Shape of the weighting function applied to the PSCF field.
///
/// Only the continuous function exists. The four-band "manual" function of older
/// configurations is accepted by [`FromStr`] and resolved to [`WeightingMode::Auto`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeightingMode {
    /// `w = ln(n) / ln(max(m))`
    #[default]
    Auto,
}

impl FromStr for WeightingMode {
    type Err = PscfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "auto" => Ok(WeightingMode::Auto),
            "manual" => {
                warn!("the 'manual' weighting function is not available, using 'auto'");
                Ok(WeightingMode::Auto)
            }
            other => Err(PscfError::Config(format!(
                "unknown weighting mode '{other}', expected 'auto'"
            ))),
        }
    }
}

/// How trajectory files are associated with concentration observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrajectoryAlignment {
    /// The sorted file listing is zipped with the date-ordered record, position by position.
    #[default]
    Positional,
    /// Each file is matched to the observation of its own arrival date (first data row).
    ByStartDate,
}

impl FromStr for TrajectoryAlignment {
    type Err = PscfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "positional" => Ok(TrajectoryAlignment::Positional),
            "start_date" => Ok(TrajectoryAlignment::ByStartDate),
            other => Err(PscfError::Config(format!(
                "unknown alignment '{other}', expected 'positional' or 'start_date'"
            ))),
        }
    }
}

/// Construction-time options of a PSCF run.
///
/// Fields
/// -----------------
/// * `station` – name of the receptor site, used in titles only.
/// * `species` – name of the studied pollutant (the concentration column).
/// * `lat0`, `lon0` – receptor position, in degrees.
/// * `folder` – directory of the back-trajectory trace files.
/// * `prefix` – common prefix of the trace file names (informational).
/// * `offset_hours` – starting hours of the trajectories around midnight of each day.
///   With `[-3, 0, 3]` every trajectory file is used three times, each time associated
///   with the concentration of the day.
/// * `date_min`, `date_max` – exclusive bounds of the concentration record.
/// * `percentile` – percentile of the record used as threshold.
/// * `threshold` – fixed concentration threshold, overrides `percentile`.
/// * `weighting` – weighting function, `None` disables it.
/// * `bounding_box` – extent of the mesh.
/// * `cut_with_rain` – cut trajectories at the first rainy step.
/// * `hours_in_the_past` – life of a back-trajectory, in hourly steps.
/// * `resolution` – coastline resolution tier for the renderer.
/// * `smoothing` – Gaussian smoothing of plotted layers.
/// * `sector_summary` – compute the windrose summary.
/// * `alignment` – association rule between files and observations.
///
/// Defaults
/// -----------------
/// * `percentile`: 75, no fixed threshold
/// * `weighting`: `Some(WeightingMode::Auto)`
/// * `bounding_box`: lat 37.5..60, lon −10..20
/// * `cut_with_rain`: true
/// * `hours_in_the_past`: 72
/// * `resolution`: 110m
/// * `smoothing`, `sector_summary`: true
/// * `alignment`: positional
/// * `offset_hours`: `[0]`
#[derive(Debug, Clone)]
pub struct PscfParams {
    pub station: String,
    pub species: String,
    pub lat0: Degree,
    pub lon0: Degree,
    pub folder: Utf8PathBuf,
    pub prefix: String,
    pub offset_hours: Vec<Hour>,
    pub date_min: Option<ObsDate>,
    pub date_max: Option<ObsDate>,
    pub percentile: Option<f64>,
    pub threshold: Option<f64>,
    pub weighting: Option<WeightingMode>,
    pub bounding_box: BoundingBox,
    pub cut_with_rain: bool,
    pub hours_in_the_past: usize,
    pub resolution: MapResolution,
    pub smoothing: bool,
    pub sector_summary: bool,
    pub alignment: TrajectoryAlignment,
}

impl PscfParams {
    /// Create a new [`PscfParamsBuilder`] initialized with the default values.
    pub fn builder() -> PscfParamsBuilder {
        PscfParamsBuilder::new()
    }
}

impl Default for PscfParams {
    fn default() -> Self {
        PscfParams {
            station: String::new(),
            species: String::new(),
            lat0: 0.0,
            lon0: 0.0,
            folder: Utf8PathBuf::from("."),
            prefix: String::new(),
            offset_hours: vec![0.0],
            date_min: None,
            date_max: None,
            percentile: Some(DEFAULT_PERCENTILE),
            threshold: None,
            weighting: Some(WeightingMode::Auto),
            bounding_box: BoundingBox::default(),
            cut_with_rain: true,
            hours_in_the_past: DEFAULT_HOURS_IN_THE_PAST,
            resolution: MapResolution::default(),
            smoothing: true,
            sector_summary: true,
            alignment: TrajectoryAlignment::default(),
        }
    }
}

/// Builder for [`PscfParams`], with validation.
#[derive(Debug, Clone, Default)]
pub struct PscfParamsBuilder {
    params: PscfParams,
}

impl PscfParamsBuilder {
    pub fn new() -> Self {
        Self {
            params: PscfParams::default(),
        }
    }

    // --- Receptor ---
    pub fn station(mut self, v: impl Into<String>) -> Self {
        self.params.station = v.into();
        self
    }
    pub fn species(mut self, v: impl Into<String>) -> Self {
        self.params.species = v.into();
        self
    }
    pub fn receptor(mut self, lat0: Degree, lon0: Degree) -> Self {
        self.params.lat0 = lat0;
        self.params.lon0 = lon0;
        self
    }

    // --- Trajectories ---
    pub fn folder(mut self, v: impl Into<Utf8PathBuf>) -> Self {
        self.params.folder = v.into();
        self
    }
    pub fn prefix(mut self, v: impl Into<String>) -> Self {
        self.params.prefix = v.into();
        self
    }
    pub fn offset_hours(mut self, v: Vec<Hour>) -> Self {
        self.params.offset_hours = v;
        self
    }
    pub fn hours_in_the_past(mut self, v: usize) -> Self {
        self.params.hours_in_the_past = v;
        self
    }
    pub fn cut_with_rain(mut self, v: bool) -> Self {
        self.params.cut_with_rain = v;
        self
    }
    pub fn alignment(mut self, v: TrajectoryAlignment) -> Self {
        self.params.alignment = v;
        self
    }

    // --- Statistics ---
    pub fn date_min(mut self, v: ObsDate) -> Self {
        self.params.date_min = Some(v);
        self
    }
    pub fn date_max(mut self, v: ObsDate) -> Self {
        self.params.date_max = Some(v);
        self
    }
    pub fn percentile(mut self, v: f64) -> Self {
        self.params.percentile = Some(v);
        self
    }
    /// Remove the default percentile; a fixed threshold must then be given.
    pub fn no_percentile(mut self) -> Self {
        self.params.percentile = None;
        self
    }
    pub fn threshold(mut self, v: f64) -> Self {
        self.params.threshold = Some(v);
        self
    }
    pub fn weighting(mut self, v: Option<WeightingMode>) -> Self {
        self.params.weighting = v;
        self
    }

    // --- Map ---
    pub fn bounding_box(mut self, v: BoundingBox) -> Self {
        self.params.bounding_box = v;
        self
    }
    pub fn resolution(mut self, v: MapResolution) -> Self {
        self.params.resolution = v;
        self
    }
    pub fn smoothing(mut self, v: bool) -> Self {
        self.params.smoothing = v;
        self
    }
    pub fn sector_summary(mut self, v: bool) -> Self {
        self.params.sector_summary = v;
        self
    }

    /// Return true iff a <= b and comparable (i.e., not NaN).
    #[inline]
    fn le(a: f64, b: f64) -> bool {
        matches!(a.partial_cmp(&b), Some(Less) | Some(Equal))
    }

    /// Finalize the builder and produce a [`PscfParams`] instance.
    ///
    /// Validation rules
    /// -----------------
    /// * `lat0 ∈ [-90, 90]`, `lon0` finite.
    /// * `offset_hours` non-empty and finite.
    /// * `hours_in_the_past ≥ 1`.
    /// * `percentile ∈ [0, 100]` when given, `threshold` finite when given.
    /// * at least one of `percentile` or `threshold`.
    /// * `date_min < date_max` when both are given.
    /// * the bounding box is valid (see [`BoundingBox::validate`]).
    ///
    /// Return
    /// ----------
    /// * `Ok(PscfParams)` or [`PscfError::Config`] describing the first failed rule.
    pub fn build(self) -> Result<PscfParams, PscfError> {
        let p = &self.params;

        if !(Self::le(-90.0, p.lat0) && Self::le(p.lat0, 90.0)) || !p.lon0.is_finite() {
            return Err(PscfError::Config(format!(
                "invalid receptor position ({}, {})",
                p.lat0, p.lon0
            )));
        }
        if p.offset_hours.is_empty() {
            return Err(PscfError::Config(
                "at least one offset hour is required".into(),
            ));
        }
        if !p.offset_hours.iter().all(|h| h.is_finite()) {
            return Err(PscfError::Config("offset hours must be finite".into()));
        }
        if p.hours_in_the_past == 0 {
            return Err(PscfError::Config(
                "hours_in_the_past must be >= 1".into(),
            ));
        }
        if let Some(q) = p.percentile {
            if !(Self::le(0.0, q) && Self::le(q, 100.0)) {
                return Err(PscfError::Config(format!(
                    "percentile must lie in [0, 100], got {q}"
                )));
            }
        }
        if let Some(t) = p.threshold {
            if !t.is_finite() {
                return Err(PscfError::Config("threshold must be finite".into()));
            }
        }
        if p.percentile.is_none() && p.threshold.is_none() {
            return Err(PscfError::Config(
                "'percentile' or 'threshold' should be specified".into(),
            ));
        }
        if let (Some(min), Some(max)) = (p.date_min, p.date_max) {
            if min >= max {
                return Err(PscfError::Config(format!(
                    "date_min ({min}) must be before date_max ({max})"
                )));
            }
        }
        p.bounding_box.validate()?;

        if matches!(p.lat0.partial_cmp(&p.bounding_box.lat_min), Some(Less))
            || matches!(p.lat0.partial_cmp(&p.bounding_box.lat_max), Some(Greater))
        {
            warn!(
                "receptor latitude {} lies outside of the bounding box {}",
                p.lat0, p.bounding_box
            );
        }

        Ok(self.params)
    }
}
