use std::collections::BTreeMap;

use polars::frame::DataFrame;

use crate::{
    config::SegregationConfig,
    data::Observations,
    error::{Result, SegregationError},
    segregation::{compute_sorted, decomposition::decompose_with, groups::per_group, Decomposition, SegregationIndexSet},
    types::Level,
};

/// Segregation calculator bound to a column configuration, for data-frame input.
#[derive(Clone, Debug, Default)]
pub struct Segregation {
    config: SegregationConfig,
}

impl Segregation {
    pub fn new(config: SegregationConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    #[inline] pub fn config(&self) -> &SegregationConfig { &self.config }

    /// Ordinal segregation across units, ignoring any group column.
    pub fn compute(&self, df: &DataFrame) -> Result<SegregationIndexSet> {
        let observations = Observations::from_dataframe(
            df, &self.config.unit_column, &self.config.category_column, None,
        )?;
        compute_sorted(&observations, self.config.presorted)
    }

    /// Ordinal segregation across units within each group.
    pub fn compute_per_group(&self, df: &DataFrame) -> Result<BTreeMap<Level, SegregationIndexSet>> {
        let observations = self.grouped_observations(df)?;
        per_group(&observations, None, self.config.parallel_groups)
    }

    /// Between/within decomposition of unit-level segregation.
    pub fn decompose(&self, df: &DataFrame) -> Result<Decomposition> {
        let observations = self.grouped_observations(df)?;
        decompose_with(&observations, self.config.parallel_groups)
    }

    fn grouped_observations(&self, df: &DataFrame) -> Result<Observations> {
        let group = self.config.group_column.as_deref()
            .ok_or_else(|| SegregationError::validation("no group column configured"))?;
        Observations::from_dataframe(df, &self.config.unit_column, &self.config.category_column, Some(group))
    }
}

/// Segregation of `df` across the units in column `unit` over the ordinal column `category`.
pub fn compute_frame(df: &DataFrame, unit: &str, category: &str) -> Result<SegregationIndexSet> {
    Segregation::new(SegregationConfig::new(unit, category)).compute(df)
}

/// Per-group segregation of `df`, keyed by the values of column `group`.
pub fn compute_per_group_frame(df: &DataFrame, unit: &str, category: &str, group: &str)
    -> Result<BTreeMap<Level, SegregationIndexSet>>
{
    Segregation::new(SegregationConfig::new(unit, category).with_group(group)).compute_per_group(df)
}

/// Between/within decomposition of `df` with units nested in the groups of column `group`.
pub fn decompose_frame(df: &DataFrame, unit: &str, category: &str, group: &str) -> Result<Decomposition> {
    Segregation::new(SegregationConfig::new(unit, category).with_group(group)).decompose(df)
}
