//! # Render preparation
//!
//! Turns a [`PscfResult`] into render-ready layers. Nothing here draws: a renderer receives
//! meshes, values and titles, and is free to project them on a map.
//!
//! ## Layers
//! -----------------
//! | layer                    | values                    | window title               |
//! |--------------------------|---------------------------|----------------------------|
//! | [`LayerKind::Density`]   | `log10` trajectory density | `{station}_allBT`          |
//! | [`LayerKind::Pscf`]      | PSCF field                | `{station}{species}`       |
//! | [`PolarLayer`]           | sector shares (percent)   | `{station}{species}_windrose` |
//!
//! Map layers are smoothed with a Gaussian filter of `σ = 1` cell when the context asks for
//! it (kernel truncated at `4σ`, mirror-reflected boundary). The state needed to render is
//! carried by an explicit [`RenderContext`].
use crate::constants::{
    Degree, Field, Radian, POLAR_TICK_LABELS, SECTOR_WIDTH, SMOOTHING_SIGMA,
};
use crate::params::{BoundingBox, MapResolution, PscfParams};
use crate::pscf::PscfResult;

/// Display options of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderContext {
    pub station: String,
    pub species: String,
    pub resolution: MapResolution,
    pub smoothing: bool,
    pub bounding_box: BoundingBox,
}

/// Map layers of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Density,
    Pscf,
}

/// A gridded layer with its meshes and titles.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderLayer {
    pub title: String,
    pub window_title: String,
    /// Longitude of the cell centers, shaped like `values`
    pub lon_mesh: Field,
    /// Latitude of the cell centers, shaped like `values`
    pub lat_mesh: Field,
    pub values: Field,
    /// `(lat, lon)` of the receptor
    pub receptor: (Degree, Degree),
    pub bounding_box: BoundingBox,
    pub resolution: MapResolution,
}

/// The windrose of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct PolarLayer {
    pub title: String,
    pub window_title: String,
    /// Start angle of each bar
    pub angles: Vec<Radian>,
    pub width: Radian,
    /// Bar heights, in percent
    pub values: Vec<f64>,
    pub tick_labels: [&'static str; 8],
    /// Radial ticks, every 5 %
    pub radial_ticks: Vec<f64>,
}

impl RenderContext {
    pub fn from_params(params: &PscfParams) -> Self {
        RenderContext {
            station: params.station.clone(),
            species: params.species.clone(),
            resolution: params.resolution,
            smoothing: params.smoothing,
            bounding_box: params.bounding_box,
        }
    }

    fn pscf_title(&self, result: &PscfResult) -> String {
        let (dmin, dmax) = match result.date_span {
            Some((min, max)) => (min.to_string(), max.to_string()),
            None => ("n/a".to_string(), "n/a".to_string()),
        };
        format!(
            "{}, {} > {:.2}\nFrom {dmin} to {dmax}",
            self.station, self.species, result.threshold
        )
    }

    /// Prepare a map layer.
    pub fn layer(&self, result: &PscfResult, kind: LayerKind) -> RenderLayer {
        let (title, window_title, field) = match kind {
            LayerKind::Density => (
                format!("{}\nBacktrajectories probability (log(n))", self.station),
                format!("{}_allBT", self.station),
                &result.fields.density,
            ),
            LayerKind::Pscf => (
                self.pscf_title(result),
                format!("{}{}", self.station, self.species),
                &result.fields.pscf,
            ),
        };

        let values = if self.smoothing {
            gaussian_filter(field, SMOOTHING_SIGMA)
        } else {
            field.clone()
        };

        RenderLayer {
            title,
            window_title,
            lon_mesh: result.axes.lon_mesh(),
            lat_mesh: result.axes.lat_mesh(),
            values,
            receptor: result.receptor,
            bounding_box: self.bounding_box,
            resolution: self.resolution,
        }
    }

    /// Prepare the windrose, when the run computed the sector summary.
    pub fn polar_layer(&self, result: &PscfResult) -> Option<PolarLayer> {
        let summary = result.sectors.as_ref()?;
        let values = summary.percentages();

        let max = values.iter().copied().fold(0.0, f64::max).trunc();
        let radial_ticks = (0..)
            .map(|k| 5.0 * k as f64)
            .take_while(|t| *t < max)
            .collect();

        Some(PolarLayer {
            title: self.pscf_title(result),
            window_title: format!("{}{}_windrose", self.station, self.species),
            angles: summary.sectors.iter().map(|s| s.start).collect(),
            width: SECTOR_WIDTH,
            values,
            tick_labels: POLAR_TICK_LABELS,
            radial_ticks,
        })
    }
}

/// Index of `i` mirrored into `[0, n)`, repeating the edge sample (`d c b a | a b c d`).
fn reflect(i: isize, n: usize) -> usize {
    let period = 2 * n as isize;
    let m = i.rem_euclid(period);
    if m < n as isize {
        m as usize
    } else {
        (period - 1 - m) as usize
    }
}

fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    let radius = (4.0 * sigma + 0.5) as isize;
    let weights: Vec<f64> = (-radius..=radius)
        .map(|x| (-0.5 * (x as f64 / sigma).powi(2)).exp())
        .collect();
    let sum: f64 = weights.iter().sum();
    weights.into_iter().map(|w| w / sum).collect()
}

/// Separable Gaussian smoothing of a field, `sigma` in cells.
///
/// A non-positive `sigma` returns the field unchanged.
pub fn gaussian_filter(field: &Field, sigma: f64) -> Field {
    if sigma <= 0.0 || field.is_empty() {
        return field.clone();
    }
    let kernel = gaussian_kernel(sigma);
    let radius = (kernel.len() / 2) as isize;
    let (nrows, ncols) = field.shape();

    let convolve = |src: &Field, along_rows: bool| {
        Field::from_fn(nrows, ncols, |i, j| {
            kernel
                .iter()
                .enumerate()
                .map(|(k, w)| {
                    let shift = k as isize - radius;
                    let value = if along_rows {
                        src[(reflect(i as isize + shift, nrows), j)]
                    } else {
                        src[(i, reflect(j as isize + shift, ncols))]
                    };
                    w * value
                })
                .sum()
        })
    };

    let smoothed = convolve(field, true);
    convolve(&smoothed, false)
}
