// crates/orderlens-core/src/join.rs

use polars::prelude::*;

use crate::error::Result;

const LEFT_INDEX: &str = "__left_row";
const RIGHT_INDEX: &str = "__right_row";

/// Inner join on a shared key column. Rows with a null key never
/// match (`join_nulls` stays off), unmatched rows are dropped, and
/// conflicting non-key right columns get `right_suffix` appended.
///
/// Output order is left-table row order, then right-table row order
/// among ties. Aggregation downstream does not care, but tests need
/// reproducible frames, so both sides carry a transient row index the
/// result is sorted by.
///
/// Key presence is the validator's precondition, not checked here.
pub fn inner_join(
    left: &DataFrame,
    right: &DataFrame,
    key: &str,
    right_suffix: &str,
) -> Result<DataFrame> {
    let joined = left
        .clone()
        .lazy()
        .with_row_index(LEFT_INDEX, None)
        .join(
            right.clone().lazy().with_row_index(RIGHT_INDEX, None),
            [col(key)],
            [col(key)],
            JoinArgs::new(JoinType::Inner).with_suffix(Some(right_suffix.into())),
        )
        .sort_by_exprs(
            [col(LEFT_INDEX), col(RIGHT_INDEX)],
            SortMultipleOptions::default(),
        )
        .select([col("*").exclude([LEFT_INDEX, RIGHT_INDEX])])
        .collect()?;

    Ok(joined)
}
