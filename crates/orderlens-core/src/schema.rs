// crates/orderlens-core/src/schema.rs

use polars::prelude::DataFrame;

use crate::error::{PipelineError, Result, Stage};

/// Returns the required columns the frame does not have, in the order
/// they were asked for.
pub fn missing_columns(df: &DataFrame, required: &[&str]) -> Vec<String> {
    required
        .iter()
        .filter(|name| df.column(name).is_err())
        .map(|name| name.to_string())
        .collect()
}

/// Precondition check at a stage boundary. The data's semantic
/// identity depends on these columns, so absence halts the run rather
/// than degrading it.
pub fn require_columns(df: &DataFrame, required: &[&str], stage: Stage) -> Result<()> {
    let missing = missing_columns(df, required);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::MissingColumns {
            stage,
            columns: missing,
        })
    }
}
