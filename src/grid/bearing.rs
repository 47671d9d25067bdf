//! # Bearing sectors
//!
//! Angular distribution of the above-threshold endpoints around the receptor.
//!
//! ## Bearing
//! -----------------
//! For a cell center `(φ, λ)` and the receptor `(φ0, λ0)`, with `Δλ = λ0 − λ`:
//!
//! ```text
//! a = sin(Δλ)·cos φ
//! b = cos φ0·sin φ − sin φ0·cos φ·cos Δλ
//! θ = atan2(a, b) + π/2        (wrapped into [0, 2π))
//! ```
//!
//! The angle is measured **counter-clockwise from geographic East**: North is `π/2`, West is
//! `π`, South is `3π/2`.
//!
//! ## Sectors
//! -----------------
//! `[0, 2π)` is split in 16 sectors of `π/8`. Sector 0 takes every bearing `≤ π/8`, sector
//! `i` takes `(i·π/8, (i+1)·π/8]`. Each sector sums the `above` counts of its cells and is
//! reported as a share of the global sum.
use std::fmt;

use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, ContentArrangement, Row, Table};
use itertools::iproduct;

use super::GridAxes;
use crate::constants::{
    CountGrid, Degree, Field, Radian, DPI, N_SECTORS, SECTOR_LABELS, SECTOR_WIDTH,
};

/// Bearing computations relative to a receptor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BearingAggregator {
    lat0: Degree,
    lon0: Degree,
}

/// One angular sector of the summary.
#[derive(Debug, Clone, PartialEq)]
pub struct BearingSector {
    pub index: usize,
    pub label: &'static str,
    /// Lower bound (exclusive, except for sector 0)
    pub start: Radian,
    /// Upper bound (inclusive)
    pub end: Radian,
    pub count: u64,
    /// Share of the global above-threshold count, in percent
    pub percent: f64,
}

/// The 16 sectors around the receptor.
#[derive(Debug, Clone, PartialEq)]
pub struct SectorSummary {
    pub sectors: Vec<BearingSector>,
    pub total: u64,
}

impl BearingAggregator {
    pub fn new(lat0: Degree, lon0: Degree) -> Self {
        BearingAggregator { lat0, lon0 }
    }

    /// Bearing from the receptor to a point, counter-clockwise from East, in `[0, 2π)`.
    pub fn bearing(&self, lat: Degree, lon: Degree) -> Radian {
        let phi0 = self.lat0.to_radians();
        let phi = lat.to_radians();
        let dlambda = (self.lon0 - lon).to_radians();

        let a = dlambda.sin() * phi.cos();
        let b = phi0.cos() * phi.sin() - phi0.sin() * phi.cos() * dlambda.cos();

        let theta = a.atan2(b) + std::f64::consts::FRAC_PI_2;
        if theta < 0.0 {
            theta + DPI
        } else {
            theta
        }
    }

    /// Bearing of every cell center of the mesh.
    pub fn bearing_field(&self, axes: &GridAxes) -> Field {
        let lon: Vec<Degree> = axes.lon_centers().collect();
        let lat: Vec<Degree> = axes.lat_centers().collect();
        Field::from_fn(axes.n_lon(), axes.n_lat(), |i, j| self.bearing(lat[j], lon[i]))
    }

    /// Sum the `above` counts of the mesh per angular sector.
    pub fn aggregate(&self, axes: &GridAxes, above: &CountGrid) -> SectorSummary {
        let bearings = self.bearing_field(axes);
        let mut counts = [0u64; N_SECTORS];

        for (i, j) in iproduct!(0..axes.n_lon(), 0..axes.n_lat()) {
            counts[sector_index(bearings[(i, j)])] += u64::from(above[(i, j)]);
        }

        let total: u64 = counts.iter().sum();
        let sectors = counts
            .iter()
            .enumerate()
            .map(|(index, &count)| BearingSector {
                index,
                label: SECTOR_LABELS[index],
                start: index as f64 * SECTOR_WIDTH,
                end: (index + 1) as f64 * SECTOR_WIDTH,
                count,
                percent: if total > 0 {
                    count as f64 / total as f64 * 100.0
                } else {
                    0.0
                },
            })
            .collect();

        SectorSummary { sectors, total }
    }
}

/// Sector of a bearing in `[0, 2π)`.
pub fn sector_index(bearing: Radian) -> usize {
    (0..N_SECTORS)
        .find(|&i| bearing <= (i + 1) as f64 * SECTOR_WIDTH)
        .unwrap_or(N_SECTORS - 1)
}

impl SectorSummary {
    pub fn percentages(&self) -> Vec<f64> {
        self.sectors.iter().map(|s| s.percent).collect()
    }

    /// Sector with the largest count (the first one on ties).
    pub fn dominant(&self) -> Option<&BearingSector> {
        self.sectors
            .iter()
            .filter(|s| s.count > 0)
            .fold(None, |best: Option<&BearingSector>, s| match best {
                Some(b) if b.count >= s.count => Some(b),
                _ => Some(s),
            })
    }
}

impl fmt::Display for SectorSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        table.set_header(vec![
            Cell::new("Sector"),
            Cell::new("From [deg]"),
            Cell::new("To [deg]"),
            Cell::new("Count"),
            Cell::new("Share [%]"),
        ]);

        for s in &self.sectors {
            table.add_row(Row::from(vec![
                Cell::new(s.label),
                Cell::new(format!("{:.1}", s.start.to_degrees()))
                    .set_alignment(CellAlignment::Right),
                Cell::new(format!("{:.1}", s.end.to_degrees()))
                    .set_alignment(CellAlignment::Right),
                Cell::new(s.count).set_alignment(CellAlignment::Right),
                Cell::new(format!("{:.2}", s.percent)).set_alignment(CellAlignment::Right),
            ]));
        }

        writeln!(f, "{table}")?;
        write!(f, "{} endpoints above threshold", self.total)
    }
}
