use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::{
    data::Observations,
    error::{Result, SegregationError},
    segregation::{compute, compute_from_distributions, groups::per_group, CumulativeDistributions, Divergence},
};

/// Total segregation split into a between-group and a within-group part.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Components {
    pub total: f64,
    pub between: f64,
    pub within: f64,
}

impl Components {
    /// `between + within - total`; zero up to roundoff.
    #[inline] pub fn residual(&self) -> f64 { self.between + self.within - self.total }
}

/// Between/within decomposition for each divergence function.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Decomposition {
    components: BTreeMap<Divergence, Components>,
}

impl Decomposition {
    /// Components for `divergence`.
    #[inline] pub fn get(&self, divergence: Divergence) -> Components { self.components[&divergence] }

    pub fn iter(&self) -> impl Iterator<Item = (Divergence, Components)> + '_ {
        self.components.iter().map(|(&divergence, &components)| (divergence, components))
    }

    /// Flatten into `total_<name>`, `between_<name>` and `within_<name>` keys.
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        self.iter()
            .flat_map(|(divergence, c)| [
                (format!("total_{divergence}"), c.total),
                (format!("between_{divergence}"), c.between),
                (format!("within_{divergence}"), c.within),
            ])
            .collect()
    }
}

/// Decompose the segregation of units into a between-group part (each group taken as
/// a single unit) and a within-group part (per-group indices weighted by each group's
/// size and population divergence).
///
/// Each group is measured over the category levels of the whole dataset, so its
/// within-group index can differ from [`compute_per_group`](crate::compute_per_group)
/// when the group lacks a category. Every group needs at least two distinct categories.
pub fn decompose(observations: &Observations) -> Result<Decomposition> {
    decompose_with(observations, false)
}

pub(crate) fn decompose_with(observations: &Observations, parallel: bool) -> Result<Decomposition> {
    if !observations.is_grouped() {
        return Err(SegregationError::validation("decomposition needs a group column"));
    }

    let distributions = CumulativeDistributions::build(observations, false)?;
    let overall = compute_from_distributions(&distributions)?;
    let between = compute(&observations.groups_as_units()?)?;

    // Groups are measured over the overall levels so the parts add up to the total
    // even when a group lacks some category.
    let within_per_group = per_group(observations, Some(distributions.levels()), parallel)?;

    let total_observations = overall.observations() as f64;
    let components = Divergence::ALL.into_iter()
        .map(|divergence| {
            let weighted: f64 = within_per_group.values()
                .map(|group| group.observations() as f64 * group.v_population(divergence) * group.index(divergence))
                .sum();
            let within = weighted / (total_observations * overall.v_population(divergence));
            let components = Components {
                total: overall.index(divergence),
                between: between.index(divergence),
                within,
            };
            debug!(%divergence, total = components.total, between = components.between, within = components.within, "decomposed segregation");
            (divergence, components)
        })
        .collect();

    Ok(Decomposition { components })
}
