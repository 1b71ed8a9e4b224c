// crates/orderlens-core/src/report.rs

use polars::prelude::DataFrame;
use tracing::{info, warn};

use crate::aggregate::{self, AggregateTable};
use crate::error::{Result, Stage};
use crate::join;
use crate::loader::{TableCache, TableSource};
use crate::range::{filter_range, DateRange};
use crate::schema;
use crate::temporal;

pub const JOIN_KEY: &str = "order_id";
pub const TIMESTAMP_COLUMN: &str = "shipping_limit_date";
pub const PAYMENT_TYPE: &str = "payment_type";
pub const PAYMENT_VALUE: &str = "payment_value";
pub const PAYMENT_INSTALLMENTS: &str = "payment_installments";
pub const PRICE: &str = "price";

pub const PAYMENT_SUM_COLUMN: &str = "total_payment_value";
pub const PRICE_MEAN_COLUMN: &str = "mean_price";

/// Suffix for payment columns whose names collide with item columns.
const PAYMENTS_SUFFIX: &str = "_payments";

#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub items: TableSource,
    pub payments: TableSource,
    /// `None` defaults to the full span of the normalized data.
    pub range: Option<DateRange>,
}

/// One of the two summaries. The pair is independent: a column missing
/// for one aggregate degrades that aggregate only.
#[derive(Debug, Clone)]
pub enum AggregateOutcome {
    Available(AggregateTable),
    Unavailable { missing: Vec<String> },
}

#[derive(Debug, Clone)]
pub struct ReportOutput {
    /// The window that was actually applied.
    pub range: DateRange,
    /// Joined rows surviving normalization and the range filter.
    pub row_count: usize,
    /// Rows discarded for an unparseable `shipping_limit_date`.
    pub dropped_invalid_dates: usize,
    pub payment_summary: AggregateOutcome,
    pub installment_price_summary: AggregateOutcome,
}

/// Terminal state of a run. An empty window is a normal, reportable
/// outcome, kept apart from `PipelineError` on purpose: callers render
/// it as a notice, not an error banner.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    Report(ReportOutput),
    /// The selected (or defaulted) window matched no rows. `range` is
    /// `None` when normalization left no rows to span at all.
    NoRowsInRange { range: Option<DateRange> },
}

/// Runs the full pipeline: load both tables (through the cache), check
/// keys, inner-join on `order_id`, normalize `shipping_limit_date`,
/// filter to the window, and compute the two grouped summaries.
///
/// Join fan-out: a payment row matched by N item rows appears N times
/// in the joined table, so its `payment_value` contributes N times to
/// `PaymentSummary`. This mirrors the source data model (payments are
/// per order, items per line) and is covered by tests.
pub fn run_report(cache: &mut TableCache, request: &ReportRequest) -> Result<RunOutcome> {
    let items = cache.fetch(&request.items)?;
    schema::require_columns(&items, &[JOIN_KEY], Stage::ItemsLoad)?;

    let payments = cache.fetch(&request.payments)?;
    schema::require_columns(&payments, &[JOIN_KEY], Stage::PaymentsLoad)?;

    let joined = join::inner_join(&items, &payments, JOIN_KEY, PAYMENTS_SUFFIX)?;
    info!(
        items = items.height(),
        payments = payments.height(),
        joined = joined.height(),
        "joined order items and payments"
    );
    schema::require_columns(&joined, &[TIMESTAMP_COLUMN], Stage::Join)?;

    let normalized = temporal::normalize_timestamps(&joined, TIMESTAMP_COLUMN)?;

    let range = match request.range {
        Some(range) => range,
        None => match DateRange::full_span(&normalized.dataframe, TIMESTAMP_COLUMN)? {
            Some(range) => range,
            None => {
                warn!("no rows with a valid timestamp; nothing to report");
                return Ok(RunOutcome::NoRowsInRange { range: None });
            }
        },
    };

    let filtered = filter_range(&normalized.dataframe, TIMESTAMP_COLUMN, &range)?;
    if filtered.is_empty() {
        info!(%range, "no rows in the selected window");
        return Ok(RunOutcome::NoRowsInRange { range: Some(range) });
    }

    let payment_summary = compute_aggregate(&filtered, &[PAYMENT_TYPE, PAYMENT_VALUE], |df| {
        aggregate::grouped_sum(df, PAYMENT_TYPE, PAYMENT_VALUE, PAYMENT_SUM_COLUMN)
    })?;
    let installment_price_summary =
        compute_aggregate(&filtered, &[PAYMENT_INSTALLMENTS, PRICE], |df| {
            aggregate::grouped_mean(df, PAYMENT_INSTALLMENTS, PRICE, PRICE_MEAN_COLUMN)
        })?;

    Ok(RunOutcome::Report(ReportOutput {
        range,
        row_count: filtered.height(),
        dropped_invalid_dates: normalized.dropped_rows,
        payment_summary,
        installment_price_summary,
    }))
}

fn compute_aggregate(
    df: &DataFrame,
    required: &[&str],
    build: impl FnOnce(&DataFrame) -> Result<AggregateTable>,
) -> Result<AggregateOutcome> {
    let missing = schema::missing_columns(df, required);
    if !missing.is_empty() {
        warn!(?missing, "aggregate skipped: required columns absent");
        return Ok(AggregateOutcome::Unavailable { missing });
    }
    Ok(AggregateOutcome::Available(build(df)?))
}
