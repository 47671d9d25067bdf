//! # Half-degree grid
//!
//! Binning of the trajectory endpoints on a fixed-resolution latitude/longitude mesh, and the
//! fields derived from it.
//!
//! ## Overview
//! -----------------
//! * [`GridAxes`] – lower edges of the longitude and latitude bins, built from a
//!   [`BoundingBox`].
//! * [`GridCounts`] – the `total` and `above`-threshold endpoint histograms.
//! * [`fields`](crate::grid::fields) – PSCF ratio, log-density and weighting fields.
//! * [`bearing`](crate::grid::bearing) – angular sectors around the receptor.
//!
//! ## Mesh
//! -----------------
//! For an axis `[min, max]`, lower edges are `min, min + 0.5, …` up to `max` inclusive, that
//! is `ceil((max − min + 0.01) / 0.5)` edges. The last bin closes at `last + 0.5`, so a point
//! at exactly `max` is inside the mesh. Every bin is **closed-open**: `[edge, edge + 0.5)`.
//!
//! Matrices are indexed `(longitude bin, latitude bin)`.
pub mod bearing;
pub mod fields;

use tracing::debug;

use crate::constants::{Concentration, CountGrid, Degree, Field, EDGE_EPS, RESOLUTION};
use crate::params::BoundingBox;
use crate::trajectories::EndpointSample;

/// Bin layout of the mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct GridAxes {
    lon_edges: Vec<Degree>,
    lat_edges: Vec<Degree>,
}

fn axis_edges(min: Degree, max: Degree) -> Vec<Degree> {
    let n = ((max - min + EDGE_EPS) / RESOLUTION).ceil() as usize;
    (0..n).map(|i| min + i as f64 * RESOLUTION).collect()
}

/// Bin of `x` against the stored lower edges, `None` outside `[first, last + 0.5)`.
fn axis_bin(edges: &[Degree], x: Degree) -> Option<usize> {
    let idx = edges.partition_point(|e| *e <= x).checked_sub(1)?;
    if idx + 1 == edges.len() && x >= edges[idx] + RESOLUTION {
        return None;
    }
    Some(idx)
}

impl GridAxes {
    pub fn new(bbox: &BoundingBox) -> Self {
        GridAxes {
            lon_edges: axis_edges(bbox.lon_min, bbox.lon_max),
            lat_edges: axis_edges(bbox.lat_min, bbox.lat_max),
        }
    }

    pub fn n_lon(&self) -> usize {
        self.lon_edges.len()
    }

    pub fn n_lat(&self) -> usize {
        self.lat_edges.len()
    }

    /// Lower edges of the longitude bins.
    pub fn lon_edges(&self) -> &[Degree] {
        &self.lon_edges
    }

    /// Lower edges of the latitude bins.
    pub fn lat_edges(&self) -> &[Degree] {
        &self.lat_edges
    }

    pub fn lon_centers(&self) -> impl Iterator<Item = Degree> + '_ {
        self.lon_edges.iter().map(|e| e + RESOLUTION / 2.0)
    }

    pub fn lat_centers(&self) -> impl Iterator<Item = Degree> + '_ {
        self.lat_edges.iter().map(|e| e + RESOLUTION / 2.0)
    }

    pub fn lon_bin(&self, lon: Degree) -> Option<usize> {
        axis_bin(&self.lon_edges, lon)
    }

    pub fn lat_bin(&self, lat: Degree) -> Option<usize> {
        axis_bin(&self.lat_edges, lat)
    }

    /// `(lon bin, lat bin)` of a point, or `None` outside the mesh.
    pub fn cell_of(&self, lon: Degree, lat: Degree) -> Option<(usize, usize)> {
        Some((self.lon_bin(lon)?, self.lat_bin(lat)?))
    }

    /// Longitude of every cell center, shaped like the count grids.
    pub fn lon_mesh(&self) -> Field {
        let centers: Vec<Degree> = self.lon_centers().collect();
        Field::from_fn(self.n_lon(), self.n_lat(), |i, _| centers[i])
    }

    /// Latitude of every cell center, shaped like the count grids.
    pub fn lat_mesh(&self) -> Field {
        let centers: Vec<Degree> = self.lat_centers().collect();
        Field::from_fn(self.n_lon(), self.n_lat(), |_, j| centers[j])
    }
}

/// Endpoint histograms of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct GridCounts {
    /// Every endpoint of the cell
    pub total: CountGrid,
    /// Endpoints whose concentration is `>=` the threshold
    pub above: CountGrid,
}

impl GridCounts {
    pub fn zeros(axes: &GridAxes) -> Self {
        GridCounts {
            total: CountGrid::zeros(axes.n_lon(), axes.n_lat()),
            above: CountGrid::zeros(axes.n_lon(), axes.n_lat()),
        }
    }

    /// Bin the endpoints on the mesh.
    ///
    /// Arguments
    /// -----------------
    /// * `endpoints` – the endpoint table of the run.
    /// * `axes` – the mesh.
    /// * `threshold` – concentration cutoff of the `above` grid (inclusive).
    ///
    /// Return
    /// ----------
    /// * The two histograms. Endpoints outside the mesh are dropped.
    pub fn accumulate(
        endpoints: &[EndpointSample],
        axes: &GridAxes,
        threshold: Concentration,
    ) -> Self {
        let mut counts = GridCounts::zeros(axes);
        let mut dropped = 0usize;

        for endpoint in endpoints {
            let Some((i, j)) = axes.cell_of(endpoint.lon(), endpoint.lat()) else {
                dropped += 1;
                continue;
            };
            counts.total[(i, j)] += 1;
            if endpoint.concentration >= threshold {
                counts.above[(i, j)] += 1;
            }
        }

        if dropped > 0 {
            debug!(
                "{dropped} of {} endpoints outside the mesh were dropped",
                endpoints.len()
            );
        }
        counts
    }

    pub fn total_sum(&self) -> u64 {
        self.total.iter().map(|&c| u64::from(c)).sum()
    }

    pub fn above_sum(&self) -> u64 {
        self.above.iter().map(|&c| u64::from(c)).sum()
    }
}

#[cfg(test)]
mod grid_test {
    use super::*;
    use crate::time::ObsDate;
    use crate::trajectories::TrajectorySample;
    use hifitime::Epoch;

    fn endpoint(lat: f64, lon: f64, concentration: f64) -> EndpointSample {
        let origin = ObsDate::new(2017, 3, 1).unwrap();
        EndpointSample {
            trace: 0,
            sample: TrajectorySample {
                origin,
                offset_hour: 0.0,
                age: 0.0,
                lat,
                lon,
                precipitation: 0.0,
            },
            timestamp: Epoch::from_gregorian_utc_at_midnight(2017, 3, 1),
            concentration,
        }
    }

    #[test]
    fn default_mesh_layout() {
        let axes = GridAxes::new(&BoundingBox::default());
        assert_eq!(axes.n_lon(), 61);
        assert_eq!(axes.n_lat(), 46);
        assert_eq!(axes.lon_edges()[0], -10.0);
        assert_eq!(axes.lon_edges()[60], 20.0);
        assert_eq!(axes.lat_edges()[45], 60.0);
    }

    #[test]
    fn bins_are_closed_open() {
        let axes = GridAxes::new(&BoundingBox::default());
        assert_eq!(axes.lon_bin(-10.0), Some(0));
        assert_eq!(axes.lon_bin(-9.5), Some(1));
        assert_eq!(axes.lon_bin(-9.51), Some(0));
        // the maximum falls in the last bin
        assert_eq!(axes.lon_bin(20.0), Some(60));
        assert_eq!(axes.lon_bin(20.49), Some(60));
        assert_eq!(axes.lon_bin(20.5), None);
        assert_eq!(axes.lon_bin(-10.01), None);
        assert_eq!(axes.lat_bin(f64::NAN), None);
    }

    #[test]
    fn points_on_inexact_edges_open_their_bin() {
        // 37.3 + i * 0.5 is not exactly representable
        let axes = GridAxes::new(&BoundingBox::new(37.3, 60.0, -10.1, 20.0));
        for (k, edge) in axes.lat_edges().iter().enumerate() {
            assert_eq!(axes.lat_bin(*edge), Some(k));
        }
        for (k, edge) in axes.lon_edges().iter().enumerate() {
            assert_eq!(axes.lon_bin(*edge), Some(k));
        }
        let last = *axes.lat_edges().last().unwrap();
        assert_eq!(axes.lat_bin(last + RESOLUTION), None);
        assert_eq!(axes.lat_bin(37.29), None);
    }

    #[test]
    fn meshes_hold_cell_centers() {
        let axes = GridAxes::new(&BoundingBox::new(40.0, 41.0, 0.0, 1.0));
        let lon = axes.lon_mesh();
        let lat = axes.lat_mesh();
        assert_eq!(lon.shape(), (3, 3));
        assert_eq!(lon[(1, 2)], 0.75);
        assert_eq!(lat[(1, 2)], 41.25);
    }

    #[test]
    fn accumulate_counts() {
        let axes = GridAxes::new(&BoundingBox::default());
        let endpoints = vec![
            endpoint(48.2, 2.2, 10.0),
            endpoint(48.3, 2.4, 15.0),
            endpoint(48.4, 2.1, 30.0),
            endpoint(49.1, 1.1, 20.0),
            // outside the mesh
            endpoint(70.0, 2.0, 50.0),
        ];
        let counts = GridCounts::accumulate(&endpoints, &axes, 15.0);

        assert_eq!(counts.total_sum(), 4);
        assert_eq!(counts.above_sum(), 3);

        let (i, j) = axes.cell_of(2.2, 48.2).unwrap();
        assert_eq!(counts.total[(i, j)], 3);
        // the threshold is inclusive
        assert_eq!(counts.above[(i, j)], 2);
    }
}
