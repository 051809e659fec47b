use std::collections::BTreeSet;

use ndarray::{s, Array1, Array2, Axis};
use tracing::debug;

use crate::{data::{Observation, Observations}, error::{Result, SegregationError}, types::Level};

/// Cumulative category distributions of the whole population and of every unit.
///
/// Both drop the last cumulative entry (always 1), so each row has `C - 1` columns
/// for `C` category levels.
#[derive(Debug, Clone)]
pub struct CumulativeDistributions {
    levels: Vec<Level>,            // ordered category levels (C)
    units: Vec<Level>,             // ordered unit identifiers
    unit_counts: Array1<f64>,      // observations per unit
    population: Array1<f64>,       // C - 1 cumulative proportions
    unit_cumulative: Array2<f64>,  // units x (C - 1) cumulative proportions
}

impl CumulativeDistributions {
    /// Build distributions over the categories observed in `observations`.
    ///
    /// With `presorted` the rows are taken to be ordered by (unit, category) already,
    /// which holds for any single-group slice of a table sorted by (group, unit, category).
    pub fn build(observations: &Observations, presorted: bool) -> Result<Self> {
        let levels = observations.iter()
            .map(|o| o.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect::<Vec<_>>();
        Self::build_with_levels(observations, levels, presorted)
    }

    /// Build distributions over a fixed, ordered set of category levels.
    /// Levels absent from `observations` contribute zero counts.
    pub fn build_with_levels(observations: &Observations, levels: Vec<Level>, presorted: bool) -> Result<Self> {
        if observations.is_empty() {
            return Err(SegregationError::validation("no observations left after dropping missing values"));
        }
        if levels.len() < 2 {
            return Err(SegregationError::validation(format!(
                "need at least 2 distinct categories, found {}", levels.len()
            )));
        }
        if levels.windows(2).any(|w| w[0] >= w[1]) {
            return Err(SegregationError::validation("category levels must be strictly increasing"));
        }

        let mut rows: Vec<&Observation> = observations.iter().collect();
        if !presorted {
            rows.sort_by(|a, b| (&a.unit, &a.category).cmp(&(&b.unit, &b.category)));
        }

        // Counts per (unit, category); rows are grouped by unit after sorting.
        let num_levels = levels.len();
        let mut units: Vec<Level> = Vec::new();
        let mut counts: Vec<f64> = Vec::new();
        for chunk in rows.chunk_by(|a, b| a.unit == b.unit) {
            let unit = &chunk[0].unit;
            if units.last().is_some_and(|last| last >= unit) {
                return Err(SegregationError::validation(format!(
                    "observations are not sorted by unit (unit {unit} out of order)"
                )));
            }
            let mut row = vec![0.0; num_levels];
            for observation in chunk {
                let position = levels.binary_search(&observation.category).map_err(|_| {
                    SegregationError::validation(format!(
                        "category {} of unit {unit} is not one of the known levels", observation.category
                    ))
                })?;
                row[position] += 1.0;
            }
            units.push(unit.clone());
            counts.extend(row);
        }

        let counts = Array2::from_shape_vec((units.len(), num_levels), counts)
            .map_err(|e| SegregationError::validation(e.to_string()))?;
        let unit_counts = counts.sum_axis(Axis(1));
        if let Some(i) = unit_counts.iter().position(|&n| n <= 0.0) {
            return Err(SegregationError::validation(format!("unit {} has no observations", units[i])));
        }

        // Population: category totals, accumulated in level order, over the grand total.
        let mut population = counts.sum_axis(Axis(0));
        population.accumulate_axis_inplace(Axis(0), |&prev, curr| *curr += prev);
        let total = population[num_levels - 1];
        population /= total;

        // Per unit: running sums along each row over the unit's total.
        let mut unit_cumulative = counts;
        unit_cumulative.accumulate_axis_inplace(Axis(1), |&prev, curr| *curr += prev);
        unit_cumulative /= &unit_counts.view().insert_axis(Axis(1));

        debug!(units = units.len(), levels = num_levels, observations = total, "built cumulative distributions");

        Ok(Self {
            population: population.slice(s![..num_levels - 1]).to_owned(),
            unit_cumulative: unit_cumulative.slice(s![.., ..num_levels - 1]).to_owned(),
            levels,
            units,
            unit_counts,
        })
    }

    /// Ordered category levels the distributions are taken over.
    #[inline] pub fn levels(&self) -> &[Level] { &self.levels }

    /// Number of category levels `C`.
    #[inline] pub fn num_levels(&self) -> usize { self.levels.len() }

    /// Ordered unit identifiers, one per row of `unit_cumulative`.
    #[inline] pub fn units(&self) -> &[Level] { &self.units }

    /// Number of observations in each unit.
    #[inline] pub fn unit_counts(&self) -> &Array1<f64> { &self.unit_counts }

    /// Total number of observations `N`.
    #[inline] pub fn total(&self) -> f64 { self.unit_counts.sum() }

    /// Population cumulative proportions, without the final 1.
    #[inline] pub fn population(&self) -> &Array1<f64> { &self.population }

    /// Per-unit cumulative proportions, without the final column of ones.
    #[inline] pub fn unit_cumulative(&self) -> &Array2<f64> { &self.unit_cumulative }
}
