//! # PSCF fields
//!
//! Fields derived from the endpoint histograms of a run.
//!
//! | field     | cell value where `total > 0`               | elsewhere |
//! |-----------|--------------------------------------------|-----------|
//! | `pscf`    | `above / total` (times `weight` if enabled) | `0`       |
//! | `density` | `log10(total)`                             | `0`       |
//! | `weight`  | `ln(total) / ln(max(above))`               | `0`       |
//!
//! Empty cells are masked to zero; no epsilon is ever added to a denominator.
//!
//! The weighting reduces the statistical noise of cells crossed by few trajectories. Its
//! denominator is only positive when `max(above) > 1`; otherwise the weighting is skipped and
//! the unweighted ratio is kept.
use tracing::warn;

use super::GridCounts;
use crate::constants::Field;
use crate::params::WeightingMode;

#[derive(Debug, Clone, PartialEq)]
pub struct PscfFields {
    /// Conditional probability field, weighted when a weight is present
    pub pscf: Field,
    /// `log10` of the trajectory density
    pub density: Field,
    /// Weighting applied to `pscf`, if any
    pub weight: Option<Field>,
}

impl PscfFields {
    /// Compute the fields of a run.
    ///
    /// Arguments
    /// -----------------
    /// * `counts` – the `total` and `above` histograms.
    /// * `weighting` – the weighting mode, `None` to disable the correction.
    pub fn compute(counts: &GridCounts, weighting: Option<WeightingMode>) -> Self {
        let total = &counts.total;
        let above = &counts.above;

        let mut pscf = total.zip_map(above, |n, m| {
            if n > 0 {
                f64::from(m) / f64::from(n)
            } else {
                0.0
            }
        });
        let density = total.map(|n| if n > 0 { f64::from(n).log10() } else { 0.0 });

        let weight = match weighting {
            Some(WeightingMode::Auto) => auto_weight(counts),
            None => None,
        };
        if let Some(w) = &weight {
            pscf.component_mul_assign(w);
        }

        PscfFields {
            pscf,
            density,
            weight,
        }
    }
}

fn auto_weight(counts: &GridCounts) -> Option<Field> {
    let max_above = counts.above.iter().copied().max().unwrap_or(0);
    if max_above <= 1 {
        warn!("maximum above-threshold count is {max_above}: weighting skipped");
        return None;
    }

    let denominator = f64::from(max_above).ln();
    Some(counts.total.map(|n| {
        if n > 0 {
            f64::from(n).ln() / denominator
        } else {
            0.0
        }
    }))
}
