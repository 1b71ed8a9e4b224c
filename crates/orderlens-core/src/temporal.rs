// crates/orderlens-core/src/temporal.rs

use polars::prelude::*;
use tracing::warn;

use crate::error::{Result, Stage};
use crate::schema;

/// Normalization output: every surviving row holds a valid, comparable
/// timestamp; `dropped_rows` counts the coerced-to-null casualties.
#[derive(Debug, Clone)]
pub struct NormalizedFrame {
    pub dataframe: DataFrame,
    pub dropped_rows: usize,
}

/// Converts `column` to `Datetime(Microseconds)`. Values that do not
/// parse (malformed strings, wrong type) become null instead of
/// raising, and null rows are then removed. Only the column being
/// absent altogether is fatal.
pub fn normalize_timestamps(df: &DataFrame, column: &str) -> Result<NormalizedFrame> {
    schema::require_columns(df, &[column], Stage::Normalize)?;

    let parsed = match df.column(column)?.dtype() {
        DataType::Datetime(_, _) => df.clone(),
        // Casting through String gives wrong-typed columns the same
        // coercion path as malformed strings.
        _ => df
            .clone()
            .lazy()
            .with_column(
                col(column)
                    .cast(DataType::String)
                    .str()
                    .to_datetime(
                        Some(TimeUnit::Microseconds),
                        None,
                        StrptimeOptions {
                            strict: false,
                            ..Default::default()
                        },
                        lit("raise"),
                    )
                    .alias(column),
            )
            .collect()?,
    };

    let kept = parsed
        .clone()
        .lazy()
        .filter(col(column).is_not_null())
        .collect()?;

    let dropped_rows = parsed.height() - kept.height();
    if dropped_rows > 0 {
        warn!(column, dropped_rows, "dropped rows with unparseable timestamps");
    }

    Ok(NormalizedFrame {
        dataframe: kept,
        dropped_rows,
    })
}
