//! # Rain truncation
//!
//! Wet deposition scavenges the transported pollutant, so the part of a back-trajectory older
//! than the first rain event carries no information about the concentration at the receptor.
//!
//! A trace is cut **before** its first row with a strictly positive precipitation. A trace
//! without rain (or with truncation disabled) is kept whole.
use super::TrajectoryRow;

/// Number of leading rows kept by the rain truncation.
///
/// Arguments
/// -----------------
/// * `precipitation` – precipitation of each row, in trace order.
/// * `enabled` – when `false`, every row is kept.
///
/// Return
/// ----------
/// * The index of the first value `> 0`, or the slice length if none.
pub fn rain_cut_len(precipitation: &[f64], enabled: bool) -> usize {
    if !enabled {
        return precipitation.len();
    }
    precipitation
        .iter()
        .position(|&p| p > 0.0)
        .unwrap_or(precipitation.len())
}

/// Rows of a trace up to (excluding) the first rain event.
pub fn truncate_at_rain(rows: &[TrajectoryRow], enabled: bool) -> &[TrajectoryRow] {
    let precipitation: Vec<f64> = rows.iter().map(|r| r.precipitation).collect();
    &rows[..rain_cut_len(&precipitation, enabled)]
}

#[cfg(test)]
mod truncation_test {
    use super::*;

    #[test]
    fn cut_at_first_rain() {
        assert_eq!(rain_cut_len(&[0.0, 0.0, 3.0, 0.0, 5.0], true), 2);
        assert_eq!(rain_cut_len(&[1.0, 0.0], true), 0);
    }

    #[test]
    fn dry_or_disabled_trace_is_kept() {
        assert_eq!(rain_cut_len(&[0.0, 0.0, 0.0], true), 3);
        assert_eq!(rain_cut_len(&[0.0, 0.0, 3.0, 0.0, 5.0], false), 5);
        assert_eq!(rain_cut_len(&[], true), 0);
    }

    #[test]
    fn truncate_rows() {
        let row = |precipitation: f64| TrajectoryRow {
            traj_id: 1,
            grid_id: 1,
            year: 17,
            month: 3,
            day: 1,
            hour: 0,
            minute: 0,
            forecast_hour: 0.0,
            age: 0.0,
            lat: 48.0,
            lon: 2.0,
            alt: 500.0,
            precipitation,
            meteo: vec![precipitation],
        };
        let rows = vec![row(0.0), row(0.0), row(0.2), row(0.0)];

        assert_eq!(truncate_at_rain(&rows, true).len(), 2);
        assert_eq!(truncate_at_rain(&rows, false).len(), 4);
    }
}
