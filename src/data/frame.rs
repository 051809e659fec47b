//! Column extraction from Polars data frames.

use polars::{frame::DataFrame, prelude::DataType};

use crate::{error::{Result, SegregationError}, types::Level};

/// Read column `name` from `df` as ordered levels, with `None` for missing values.
///
/// Integer columns become `Level::Int`, float columns `Level::Float` (NaN counts as missing),
/// string columns `Level::Str`. Anything else is cast to string first.
pub(crate) fn column_levels(df: &DataFrame, name: &str) -> Result<Vec<Option<Level>>> {
    let column = df.column(name)
        .map_err(|_| SegregationError::validation(format!("missing column {name:?}")))?;

    let dtype = column.dtype();
    let levels = if dtype.is_integer() {
        let column = column.cast(&DataType::Int64)?;
        column.i64()?.into_iter().map(|v| v.map(Level::Int)).collect()
    } else if dtype.is_float() {
        let column = column.cast(&DataType::Float64)?;
        column.f64()?.into_iter()
            .map(|v| v.filter(|v| !v.is_nan()).map(Level::Float))
            .collect()
    } else {
        let column = if dtype != &DataType::String { column.cast(&DataType::String)? } else { column.clone() };
        column.str()?.into_iter().map(|v| v.map(Level::from)).collect()
    };
    Ok(levels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn integer_columns_widen_to_i64() {
        let df = df!("rbd" => [Some(3i32), None, Some(1)]).unwrap();
        assert_eq!(column_levels(&df, "rbd").unwrap(), vec![Some(Level::Int(3)), None, Some(Level::Int(1))]);
    }

    #[test]
    fn boolean_columns_become_strings() {
        let df = df!("flag" => [true, false]).unwrap();
        assert_eq!(column_levels(&df, "flag").unwrap(), vec![Some(Level::from("true")), Some(Level::from("false"))]);
    }
}
