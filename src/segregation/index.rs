use std::collections::BTreeMap;

use ndarray::Axis;
use serde::Serialize;
use tracing::trace;

use crate::{
    data::Observations,
    error::{Result, SegregationError},
    segregation::{CumulativeDistributions, Divergence},
};

/// Slack for roundoff at the edges of [0, 1]. Values beyond it are errors, never clamped.
pub const BOUND_TOLERANCE: f64 = 1e-12;

/// Index and population divergence for a single divergence function.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct IndexEntry {
    /// Normalized ordinal segregation index in [0, 1]. Floating-point roundoff can
    /// leave it outside the interval by at most [`BOUND_TOLERANCE`]; it is not clamped.
    pub index: f64,
    /// Average divergence of the population cumulative distribution (`Vg_<name>`).
    pub v_population: f64,
}

/// Segregation indices for each divergence function, plus the terms the
/// between/within decomposition needs.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SegregationIndexSet {
    entries: BTreeMap<Divergence, IndexEntry>,
    observations: usize,
}

impl SegregationIndexSet {
    /// Segregation index for `divergence`.
    #[inline] pub fn index(&self, divergence: Divergence) -> f64 { self.entries[&divergence].index }

    /// Population divergence term for `divergence`.
    #[inline] pub fn v_population(&self, divergence: Divergence) -> f64 { self.entries[&divergence].v_population }

    /// Total number of observations (`N_g`).
    #[inline] pub fn observations(&self) -> usize { self.observations }

    /// Iterate over (divergence, entry) pairs in fixed divergence order.
    pub fn iter(&self) -> impl Iterator<Item = (Divergence, &IndexEntry)> + '_ {
        self.entries.iter().map(|(&divergence, entry)| (divergence, entry))
    }

    /// Look up a value by key: a divergence name (`"variation"`), a population
    /// term (`"Vg_variation"`) or the observation count (`"N_g"`).
    pub fn get(&self, key: &str) -> Option<f64> {
        if key == "N_g" {
            return Some(self.observations as f64);
        }
        match key.strip_prefix("Vg_") {
            Some(name) => name.parse::<Divergence>().ok().map(|d| self.v_population(d)),
            None => key.parse::<Divergence>().ok().map(|d| self.index(d)),
        }
    }

    /// Flatten into the labeled key/value form (`information`, `Vg_information`, ..., `N_g`).
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        let mut map = BTreeMap::new();
        for (divergence, entry) in self.iter() {
            map.insert(divergence.name().to_string(), entry.index);
            map.insert(format!("Vg_{}", divergence.name()), entry.v_population);
        }
        map.insert("N_g".to_string(), self.observations as f64);
        map
    }
}

/// Compute all three ordinal segregation indices of `observations`, taking units as
/// given and ignoring any groups.
///
/// Units that mirror the population give an index of exactly 0. Indices near the
/// bounds may carry roundoff up to [`BOUND_TOLERANCE`].
pub fn compute(observations: &Observations) -> Result<SegregationIndexSet> {
    compute_sorted(observations, false)
}

/// As [`compute`], but trusts that rows are already sorted by (unit, category) when
/// `presorted` is set.
pub fn compute_sorted(observations: &Observations, presorted: bool) -> Result<SegregationIndexSet> {
    let distributions = CumulativeDistributions::build(observations, presorted)?;
    compute_from_distributions(&distributions)
}

/// Apply each divergence to prepared cumulative distributions and aggregate.
pub fn compute_from_distributions(distributions: &CumulativeDistributions) -> Result<SegregationIndexSet> {
    let thresholds = (distributions.num_levels() - 1) as f64;
    let counts = distributions.unit_counts();
    let total = distributions.total();

    let mut entries = BTreeMap::new();
    for divergence in Divergence::ALL {
        let v_population = divergence.apply_array(distributions.population()).sum() / thresholds;
        check_unit_interval(|| format!("Vg_{divergence}"), v_population)?;

        let v_units = divergence.apply_array(distributions.unit_cumulative()).sum_axis(Axis(1)) / thresholds;
        for (unit, &v_unit) in distributions.units().iter().zip(v_units.iter()) {
            check_unit_interval(|| format!("{divergence} divergence of unit {unit}"), v_unit)?;
        }

        let index = (counts * &(v_population - &v_units)).sum() / (total * v_population);
        check_unit_interval(|| divergence.name().to_string(), index)?;

        trace!(%divergence, v_population, index, "computed segregation index");
        entries.insert(divergence, IndexEntry { index, v_population });
    }

    Ok(SegregationIndexSet { entries, observations: total as usize })
}

fn check_unit_interval(quantity: impl FnOnce() -> String, value: f64) -> Result<()> {
    if value.is_finite() && (-BOUND_TOLERANCE..=1.0 + BOUND_TOLERANCE).contains(&value) {
        Ok(())
    } else {
        Err(SegregationError::numerical(quantity(), value))
    }
}
