//! # Constants and type definitions for PSCF
//!
//! This module centralizes the **grid constants**, **default configuration values**, and
//! **common type aliases** used throughout the `pscf` library.
//!
//! ## Overview
//!
//! - Grid resolution and edge margin of the half-degree mesh
//! - Angular sector layout of the windrose summary
//! - Defaults inherited from the reference PSCF workflow (percentile, hours in the past, ...)
//! - Core type aliases used across the crate

use std::f64::consts::PI;

// -------------------------------------------------------------------------------------------------
// Grid
// -------------------------------------------------------------------------------------------------

/// Width of a grid cell, in degrees (both latitude and longitude)
pub const RESOLUTION: f64 = 0.5;

/// Margin added to the upper bound of the mesh so the maximum falls inside the last bin
pub const EDGE_EPS: f64 = 0.01;

// -------------------------------------------------------------------------------------------------
// Windrose
// -------------------------------------------------------------------------------------------------

/// Number of angular sectors of the windrose summary
pub const N_SECTORS: usize = 16;

/// Angular width of one sector (22.5°), in radians
pub const SECTOR_WIDTH: f64 = PI / 8.0;

/// 2π
pub const DPI: f64 = 2. * PI;

/// Sector labels, counter-clockwise starting at geographic East
pub const SECTOR_LABELS: [&str; N_SECTORS] = [
    "E", "ENE", "NE", "NNE", "N", "NNW", "NW", "WNW", "W", "WSW", "SW", "SSW", "S", "SSE", "SE",
    "ESE",
];

/// Tick labels of the polar plot (one every 45°)
pub const POLAR_TICK_LABELS: [&str; 8] = ["E", "NE", "N", "NW", "W", "SW", "S", "SE"];

// -------------------------------------------------------------------------------------------------
// Defaults
// -------------------------------------------------------------------------------------------------

/// Default percentile used as concentration threshold
pub const DEFAULT_PERCENTILE: f64 = 75.0;

/// Default life of a back-trajectory, in hours
pub const DEFAULT_HOURS_IN_THE_PAST: usize = 72;

/// Name of the precipitation variable in the trajectory files
pub const RAIN_VARIABLE: &str = "RAINFALL";

/// Number of fixed columns at the start of every trajectory data row
pub const FIXED_COLUMNS: usize = 12;

/// Standard deviation (in cells) of the Gaussian filter applied to plotted layers
pub const SMOOTHING_SIGMA: f64 = 1.0;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Angle in radians
pub type Radian = f64;
/// Signed duration in hours
pub type Hour = f64;
/// Pollutant concentration, in the unit of the input record
pub type Concentration = f64;

/// Histogram of endpoint counts, indexed by `(longitude bin, latitude bin)`
pub type CountGrid = nalgebra::DMatrix<u32>;
/// Real-valued field on the same mesh as [`CountGrid`]
pub type Field = nalgebra::DMatrix<f64>;
