use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Column selection and evaluation options for data-frame input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SegregationConfig {
    /// Column holding the unit identifier (school, firm, ...).
    pub unit_column: String,
    /// Column holding the ordinal category.
    pub category_column: String,
    /// Column holding the group a unit belongs to (district, city, ...), if any.
    pub group_column: Option<String>,
    /// Rows already sorted by (unit, category); skips the sort in ungrouped computations.
    pub presorted: bool,
    /// Evaluate independent groups on the rayon thread pool.
    pub parallel_groups: bool,
}

impl Default for SegregationConfig {
    fn default() -> Self {
        Self {
            unit_column: "unit".to_string(),
            category_column: "category".to_string(),
            group_column: None,
            presorted: false,
            parallel_groups: false,
        }
    }
}

impl SegregationConfig {
    /// Config selecting `unit` and `category` columns, with defaults elsewhere.
    pub fn new(unit: impl Into<String>, category: impl Into<String>) -> Self {
        Self { unit_column: unit.into(), category_column: category.into(), ..Self::default() }
    }

    /// Select the group column.
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group_column = Some(group.into());
        self
    }

    /// Parse a config from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
