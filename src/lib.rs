pub mod concentration;
pub mod constants;
pub mod grid;
pub mod params;
pub mod pscf;
pub mod pscf_errors;
pub mod render;
pub mod time;
pub mod trajectories;

pub use concentration::{ConcentrationObservation, ConcentrationRecord};
pub use params::{BoundingBox, PscfParams, TrajectoryAlignment, WeightingMode};
pub use pscf::{CellSelection, Pscf, PscfResult};
pub use pscf_errors::PscfError;
pub use time::ObsDate;
