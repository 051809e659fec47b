use std::collections::BTreeMap;

use rayon::prelude::*;
use tracing::debug;

use crate::{
    data::Observations,
    error::{Result, SegregationError},
    segregation::{compute_from_distributions, CumulativeDistributions, SegregationIndexSet},
    types::Level,
};

/// Compute the segregation indices of each group independently, keyed by group.
///
/// Every group is evaluated over its own observed category levels, exactly as if its
/// rows were passed to [`compute`](crate::compute) on their own.
pub fn compute_per_group(observations: &Observations) -> Result<BTreeMap<Level, SegregationIndexSet>> {
    per_group(observations, None, false)
}

/// Sort once by (group, unit, category), then evaluate each group's slice without
/// re-sorting. With `levels`, every group is measured over that fixed level set.
pub(crate) fn per_group(
    observations: &Observations,
    levels: Option<&[Level]>,
    parallel: bool,
) -> Result<BTreeMap<Level, SegregationIndexSet>> {
    observations.check_unit_nesting()?;

    let mut sorted = observations.clone();
    sorted.sort();
    let partitions = sorted.partition_by_group()?;
    debug!(groups = partitions.len(), parallel, pinned_levels = levels.is_some(), "computing segregation per group");

    let evaluate = |(group, rows): (Level, Observations)| -> Result<(Level, SegregationIndexSet)> {
        // A pinned level set would otherwise hide a group with a single observed category.
        if levels.is_some() {
            let mut categories = rows.iter().map(|o| &o.category);
            let first = categories.next();
            if categories.all(|category| Some(category) == first) {
                return Err(SegregationError::validation("need at least 2 distinct categories, found 1").in_group(&group));
            }
        }
        let distributions = match levels {
            Some(levels) => CumulativeDistributions::build_with_levels(&rows, levels.to_vec(), true),
            None => CumulativeDistributions::build(&rows, true),
        };
        let result = distributions
            .and_then(|distributions| compute_from_distributions(&distributions))
            .map_err(|e| e.in_group(&group))?;
        Ok((group, result))
    };

    if parallel {
        partitions.into_par_iter().map(evaluate).collect()
    } else {
        partitions.into_iter().map(evaluate).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{compute, segregation::Divergence};

    fn district(group: &'static str, first_unit: i64, layout: &[[usize; 3]]) -> Vec<(i64, i64, &'static str)> {
        let mut rows = Vec::new();
        for (offset, counts) in layout.iter().enumerate() {
            for (category, &count) in counts.iter().enumerate() {
                rows.extend(std::iter::repeat_n((first_unit + offset as i64, category as i64, group), count));
            }
        }
        rows
    }

    #[test]
    fn each_group_matches_standalone_compute() {
        let north = district("north", 1, &[[5, 2, 1], [1, 3, 4], [2, 2, 2]]);
        let south = district("south", 10, &[[3, 3, 0], [0, 1, 6]]);

        let mut rows = north.clone();
        rows.extend(south.clone());
        let per_group = compute_per_group(&Observations::from_grouped_records(rows)).unwrap();
        assert_eq!(per_group.len(), 2);

        for (name, rows) in [("north", north), ("south", south)] {
            let standalone = compute(&Observations::from_grouped_records(rows)).unwrap();
            let grouped = &per_group[&Level::from(name)];
            assert_eq!(grouped.observations(), standalone.observations());
            for divergence in Divergence::ALL {
                assert!((grouped.index(divergence) - standalone.index(divergence)).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn parallel_matches_sequential() {
        let mut rows = district("a", 1, &[[4, 1, 1], [1, 1, 4]]);
        rows.extend(district("b", 5, &[[2, 2, 2], [3, 2, 1], [0, 2, 5]]));
        rows.extend(district("c", 9, &[[1, 5, 1], [6, 1, 0]]));
        let obs = Observations::from_grouped_records(rows);

        let sequential = per_group(&obs, None, false).unwrap();
        let parallel = per_group(&obs, None, true).unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn ungrouped_input_is_rejected() {
        let obs = Observations::from_records([(1, 1), (2, 2)]);
        assert!(matches!(compute_per_group(&obs), Err(SegregationError::Validation { .. })));
    }

    #[test]
    fn group_with_single_category_names_the_group() {
        let mut rows = district("ok", 1, &[[2, 1, 0], [0, 1, 2]]);
        rows.extend(district("flat", 5, &[[3, 0, 0], [2, 0, 0]]));
        let err = compute_per_group(&Observations::from_grouped_records(rows)).unwrap_err();
        assert!(err.to_string().contains("flat"), "{err}");
    }

    #[test]
    fn pinned_levels_reject_single_category_group() {
        let rows = [(1, 1, "a"), (1, 2, "a"), (2, 2, "a"), (2, 2, "a"), (3, 1, "b"), (3, 1, "b"), (4, 1, "b")];
        let obs = Observations::from_grouped_records(rows);
        let levels = [Level::Int(1), Level::Int(2)];

        let err = per_group(&obs, Some(&levels), false).unwrap_err();
        assert!(matches!(err, SegregationError::Validation { .. }), "{err:?}");
        assert!(err.to_string().contains("group b"), "{err}");
    }
}
