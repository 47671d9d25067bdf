//! # Concentration threshold
//!
//! The threshold (`concCrit`) splits the trajectory endpoints into "polluted" and
//! "background" ones. It is either a **fixed cutoff** given by the user or a **percentile**
//! of the concentration record. When both are configured the fixed cutoff wins.
//!
//! Percentiles use the linear-interpolation convention: for sorted values `x` of length `n`
//! and a percentile `p`, the rank `r = p/100 · (n − 1)` is interpolated between
//! `x[floor(r)]` and `x[ceil(r)]`.
use super::ConcentrationRecord;
use crate::constants::Concentration;
use crate::pscf_errors::PscfError;

/// Linear-interpolation percentile of `values` (`p` in percent).
///
/// Return
/// ----------
/// * `None` for an empty slice or a `p` outside `[0, 100]`.
pub fn percentile_linear(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() || !(0.0..=100.0).contains(&p) {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;

    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Resolve the concentration threshold of a run.
///
/// Arguments
/// -----------------
/// * `percentile` – percentile of `record` to use, in percent.
/// * `threshold` – fixed cutoff, overrides `percentile`.
/// * `record` – the (date-filtered) concentration record.
///
/// Return
/// ----------
/// * The threshold, or [`PscfError::Config`] when neither value is given or when the
///   percentile is requested on an empty record.
pub fn resolve_threshold(
    percentile: Option<f64>,
    threshold: Option<Concentration>,
    record: &ConcentrationRecord,
) -> Result<Concentration, PscfError> {
    if let Some(t) = threshold {
        return Ok(t);
    }

    let p = percentile.ok_or_else(|| {
        PscfError::Config("'percentile' or 'threshold' should be specified".into())
    })?;

    let values: Vec<f64> = record.values().collect();
    percentile_linear(&values, p).ok_or_else(|| {
        PscfError::Config(format!(
            "cannot compute the {p}th percentile of {} {} observations",
            values.len(),
            record.species()
        ))
    })
}

#[cfg(test)]
mod threshold_test {
    use super::*;
    use crate::time::ObsDate;
    use approx::assert_relative_eq;

    fn record(values: &[f64]) -> ConcentrationRecord {
        ConcentrationRecord::from_pairs(
            "PM10",
            values
                .iter()
                .enumerate()
                .map(|(i, v)| (ObsDate::new(2017, 1, i as u8 + 1).unwrap(), *v)),
        )
        .unwrap()
    }

    #[test]
    fn linear_percentile() {
        let values: Vec<f64> = (1..=10).map(f64::from).collect();
        assert_relative_eq!(percentile_linear(&values, 75.0).unwrap(), 7.75);
        assert_relative_eq!(percentile_linear(&values, 50.0).unwrap(), 5.5);
        assert_relative_eq!(percentile_linear(&values, 0.0).unwrap(), 1.0);
        assert_relative_eq!(percentile_linear(&values, 100.0).unwrap(), 10.0);
    }

    #[test]
    fn percentile_does_not_depend_on_order() {
        let values = [9.0, 2.0, 7.0, 1.0, 5.0];
        assert_relative_eq!(percentile_linear(&values, 75.0).unwrap(), 7.0);
        assert_relative_eq!(percentile_linear(&[4.0], 30.0).unwrap(), 4.0);
    }

    #[test]
    fn percentile_out_of_domain() {
        assert!(percentile_linear(&[], 75.0).is_none());
        assert!(percentile_linear(&[1.0], 101.0).is_none());
    }

    #[test]
    fn fixed_threshold_overrides_percentile() {
        let rec = record(&(1..=10).map(f64::from).collect::<Vec<_>>());
        assert_relative_eq!(resolve_threshold(Some(75.0), None, &rec).unwrap(), 7.75);
        assert_relative_eq!(
            resolve_threshold(Some(75.0), Some(15.0), &rec).unwrap(),
            15.0
        );
        assert_relative_eq!(resolve_threshold(None, Some(3.0), &rec).unwrap(), 3.0);
    }

    #[test]
    fn unresolvable_threshold() {
        let rec = record(&[1.0, 2.0]);
        assert!(matches!(
            resolve_threshold(None, None, &rec),
            Err(PscfError::Config(_))
        ));

        let empty = record(&[]);
        assert!(matches!(
            resolve_threshold(Some(75.0), None, &empty),
            Err(PscfError::Config(_))
        ));
    }
}
