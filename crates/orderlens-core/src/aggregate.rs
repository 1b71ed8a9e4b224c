// crates/orderlens-core/src/aggregate.rs

use polars::prelude::*;

use crate::error::Result;

/// Terminal artifact of the pipeline: one `(group_key, value)` row per
/// distinct key, sorted ascending by key.
#[derive(Debug, Clone)]
pub struct AggregateTable {
    pub key_column: String,
    pub value_column: String,
    pub table: DataFrame,
}

impl AggregateTable {
    pub fn len(&self) -> usize {
        self.table.height()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Rows as display-ready `(key, value)` pairs, for rendering and
    /// reference checks. Groups whose aggregate came out null are
    /// skipped.
    pub fn rows(&self) -> Result<Vec<(String, f64)>> {
        let keys = self.table.column(&self.key_column)?.as_materialized_series();
        let values = self.table.column(&self.value_column)?.f64()?;

        let mut out = Vec::with_capacity(self.table.height());
        for idx in 0..self.table.height() {
            let Some(value) = values.get(idx) else {
                continue;
            };
            let key = match keys.get(idx)? {
                AnyValue::String(text) => text.to_string(),
                AnyValue::StringOwned(text) => text.to_string(),
                other => other.to_string(),
            };
            out.push((key, value));
        }
        Ok(out)
    }
}

#[derive(Debug, Clone, Copy)]
enum Reduction {
    Sum,
    Mean,
}

/// `group_by(key).sum(value)`.
pub fn grouped_sum(
    df: &DataFrame,
    key: &str,
    value: &str,
    out_name: &str,
) -> Result<AggregateTable> {
    grouped(df, key, value, out_name, Reduction::Sum)
}

/// `group_by(key).mean(value)`.
pub fn grouped_mean(
    df: &DataFrame,
    key: &str,
    value: &str,
    out_name: &str,
) -> Result<AggregateTable> {
    grouped(df, key, value, out_name, Reduction::Mean)
}

fn grouped(
    df: &DataFrame,
    key: &str,
    value: &str,
    out_name: &str,
    how: Reduction,
) -> Result<AggregateTable> {
    let reduction = match how {
        Reduction::Sum => col(value).sum(),
        Reduction::Mean => col(value).mean(),
    };

    // Null group keys are dropped rather than forming a group of their
    // own; nulls in the value column are skipped by the reduction.
    let table = df
        .clone()
        .lazy()
        .filter(col(key).is_not_null())
        .group_by([col(key)])
        .agg([reduction.cast(DataType::Float64).alias(out_name)])
        .sort([key], SortMultipleOptions::default())
        .collect()?;

    Ok(AggregateTable {
        key_column: key.to_string(),
        value_column: out_name.to_string(),
        table,
    })
}
