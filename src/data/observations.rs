use ahash::AHashMap;
use polars::frame::DataFrame;
use tracing::debug;

use crate::{data::frame::column_levels, error::{Result, SegregationError}, types::Level};

/// One row of input: a unit, its ordinal category and (optionally) the group that contains the unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub unit: Level,
    pub category: Level,
    pub group: Option<Level>,
}

/// A missing-free table of observations.
#[derive(Debug, Clone, Default)]
pub struct Observations {
    rows: Vec<Observation>,
    grouped: bool,
    dropped: usize, // rows removed because a selected column was null
}

impl Observations {
    /// Build an ungrouped table from `(unit, category)` pairs.
    pub fn from_records<U, C>(records: impl IntoIterator<Item = (U, C)>) -> Self
    where U: Into<Level>, C: Into<Level>,
    {
        let rows = records.into_iter()
            .map(|(unit, category)| Observation { unit: unit.into(), category: category.into(), group: None })
            .collect();
        Self { rows, grouped: false, dropped: 0 }
    }

    /// Build a grouped table from `(unit, category, group)` triples.
    pub fn from_grouped_records<U, C, G>(records: impl IntoIterator<Item = (U, C, G)>) -> Self
    where U: Into<Level>, C: Into<Level>, G: Into<Level>,
    {
        let rows = records.into_iter()
            .map(|(unit, category, group)| Observation {
                unit: unit.into(),
                category: category.into(),
                group: Some(group.into()),
            })
            .collect();
        Self { rows, grouped: true, dropped: 0 }
    }

    /// Select the unit, category and optional group columns from `df`.
    /// Rows with a null (or NaN) in any selected column are dropped.
    pub fn from_dataframe(df: &DataFrame, unit: &str, category: &str, group: Option<&str>) -> Result<Self> {
        let units = column_levels(df, unit)?;
        let categories = column_levels(df, category)?;
        let groups = group.map(|name| column_levels(df, name)).transpose()?;

        let mut rows = Vec::with_capacity(df.height());
        let mut dropped = 0;
        for i in 0..df.height() {
            let group = match &groups {
                Some(groups) => match &groups[i] {
                    Some(level) => Some(level.clone()),
                    None => { dropped += 1; continue }
                },
                None => None,
            };
            match (&units[i], &categories[i]) {
                (Some(unit), Some(category)) => rows.push(Observation {
                    unit: unit.clone(),
                    category: category.clone(),
                    group,
                }),
                _ => dropped += 1,
            }
        }

        debug!(rows = rows.len(), dropped, unit, category, ?group, "selected observations from data frame");
        Ok(Self { rows, grouped: groups.is_some(), dropped })
    }

    /// Number of observations.
    #[inline] pub fn len(&self) -> usize { self.rows.len() }

    /// Whether the table holds no observations.
    #[inline] pub fn is_empty(&self) -> bool { self.rows.is_empty() }

    /// Whether every observation carries a group.
    #[inline] pub fn is_grouped(&self) -> bool { self.grouped }

    /// Number of input rows removed for missing values.
    #[inline] pub fn dropped_rows(&self) -> usize { self.dropped }

    /// Iterate over the observations in their current order.
    #[inline]
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Observation> + ExactSizeIterator + '_ { self.rows.iter() }

    /// Stable sort by (group, unit, category).
    pub fn sort(&mut self) {
        self.rows.sort_by(|a, b| {
            (&a.group, &a.unit, &a.category).cmp(&(&b.group, &b.unit, &b.category))
        });
    }

    /// Check that no unit identifier appears in more than one group.
    pub fn check_unit_nesting(&self) -> Result<()> {
        let mut owner: AHashMap<&Level, &Level> = AHashMap::new();
        for row in &self.rows {
            let Some(group) = &row.group else { continue };
            match owner.get(&row.unit) {
                Some(&existing) if existing != group => {
                    return Err(SegregationError::validation(format!(
                        "unit {} appears in groups {} and {}", row.unit, existing, group
                    )));
                }
                Some(_) => {}
                None => { owner.insert(&row.unit, group); }
            }
        }
        Ok(())
    }

    /// Split into one table per group. Contiguous runs of the same group become one
    /// partition, so the table must already be sorted by group.
    pub(crate) fn partition_by_group(&self) -> Result<Vec<(Level, Observations)>> {
        if !self.grouped {
            return Err(SegregationError::validation("observations carry no group column"));
        }

        let mut partitions: Vec<(Level, Observations)> = Vec::new();
        for chunk in self.rows.chunk_by(|a, b| a.group == b.group) {
            let Some(group) = chunk[0].group.clone() else {
                return Err(SegregationError::validation("observation without a group in grouped table"));
            };
            if partitions.last().is_some_and(|(last, _)| *last >= group) {
                return Err(SegregationError::validation("observations are not sorted by group"));
            }
            partitions.push((group, Observations { rows: chunk.to_vec(), grouped: true, dropped: 0 }));
        }
        Ok(partitions)
    }

    /// Treat each group as a unit (used for the between-group index).
    pub(crate) fn groups_as_units(&self) -> Result<Observations> {
        let rows = self.rows.iter()
            .map(|row| {
                let group = row.group.clone()
                    .ok_or_else(|| SegregationError::validation("observations carry no group column"))?;
                Ok(Observation { unit: group, category: row.category.clone(), group: None })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Observations { rows, grouped: false, dropped: 0 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn from_dataframe_drops_rows_with_nulls() {
        let df = df!(
            "school" => [Some(1i64), Some(1), None, Some(2), Some(2)],
            "level" => [Some("a"), None, Some("b"), Some("b"), Some("a")],
        ).unwrap();

        let obs = Observations::from_dataframe(&df, "school", "level", None).unwrap();
        assert_eq!(obs.len(), 3);
        assert_eq!(obs.dropped_rows(), 2);
        assert!(!obs.is_grouped());

        let units: Vec<_> = obs.iter().map(|o| o.unit.clone()).collect();
        assert_eq!(units, vec![Level::Int(1), Level::Int(2), Level::Int(2)]);
    }

    #[test]
    fn from_dataframe_drops_null_groups_and_nan_categories() {
        let df = df!(
            "unit" => ["x", "x", "y", "y"],
            "cat" => [1.0f64, f64::NAN, 2.0, 1.0],
            "district" => [Some(7i64), Some(7), None, Some(8)],
        ).unwrap();

        let obs = Observations::from_dataframe(&df, "unit", "cat", Some("district")).unwrap();
        assert_eq!(obs.len(), 2);
        assert_eq!(obs.dropped_rows(), 2);
        assert!(obs.is_grouped());
        assert!(obs.iter().all(|o| matches!(o.category, Level::Float(_))));
    }

    #[test]
    fn from_dataframe_rejects_missing_column() {
        let df = df!("unit" => [1i64, 2], "cat" => [1i64, 2]).unwrap();
        let err = Observations::from_dataframe(&df, "unit", "tier", None).unwrap_err();
        assert!(matches!(err, SegregationError::Validation { .. }));
    }

    #[test]
    fn sort_orders_by_group_unit_category() {
        let mut obs = Observations::from_grouped_records([(2, 1, "b"), (1, 3, "a"), (1, 2, "a"), (3, 1, "a")]);
        obs.sort();
        let keys: Vec<_> = obs.iter()
            .map(|o| (o.group.clone().unwrap(), o.unit.clone(), o.category.clone()))
            .collect();
        assert_eq!(keys, vec![
            (Level::from("a"), Level::Int(1), Level::Int(2)),
            (Level::from("a"), Level::Int(1), Level::Int(3)),
            (Level::from("a"), Level::Int(3), Level::Int(1)),
            (Level::from("b"), Level::Int(2), Level::Int(1)),
        ]);
    }

    #[test]
    fn iter_runs_in_both_directions() {
        let obs = Observations::from_records([(1, "a"), (2, "b"), (3, "c")]);
        assert_eq!(obs.iter().len(), 3);
        let units: Vec<_> = obs.iter().rev().map(|o| o.unit.clone()).collect();
        assert_eq!(units, vec![Level::Int(3), Level::Int(2), Level::Int(1)]);
    }

    #[test]
    fn partition_by_group_splits_sorted_rows() {
        let mut obs = Observations::from_grouped_records([(1, 1, 10), (3, 2, 20), (2, 2, 10), (3, 1, 20)]);
        obs.sort();
        let parts = obs.partition_by_group().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].0, Level::Int(10));
        assert_eq!(parts[0].1.len(), 2);
        assert_eq!(parts[1].0, Level::Int(20));
        assert_eq!(parts[1].1.len(), 2);
    }

    #[test]
    fn partition_by_group_rejects_unsorted_rows() {
        let obs = Observations::from_grouped_records([(1, 1, 10), (2, 1, 20), (3, 1, 10)]);
        assert!(obs.partition_by_group().is_err());
    }

    #[test]
    fn unit_reused_across_groups_is_rejected() {
        let obs = Observations::from_grouped_records([(1, 1, "north"), (1, 2, "south")]);
        let err = obs.check_unit_nesting().unwrap_err();
        assert!(matches!(err, SegregationError::Validation { .. }));

        let nested = Observations::from_grouped_records([(1, 1, "north"), (1, 2, "north"), (2, 1, "south")]);
        assert!(nested.check_unit_nesting().is_ok());
    }

    #[test]
    fn groups_as_units_relabels_rows() {
        let obs = Observations::from_grouped_records([(1, 1, "north"), (2, 2, "south")]);
        let between = obs.groups_as_units().unwrap();
        assert!(!between.is_grouped());
        let units: Vec<_> = between.iter().map(|o| o.unit.clone()).collect();
        assert_eq!(units, vec![Level::from("north"), Level::from("south")]);

        let ungrouped = Observations::from_records([(1, 1)]);
        assert!(ungrouped.groups_as_units().is_err());
    }
}
