// crates/orderlens-core/src/range.rs

use chrono::NaiveDate;
use polars::prelude::*;
use serde::Serialize;

use crate::error::{PipelineError, Result};

/// Inclusive calendar-date window `[start, end]`, `start <= end`
/// enforced at construction. Supplied by the caller or defaulted to
/// the full span of the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(PipelineError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Default window: `[date(min ts), date(max ts)]` of a normalized
    /// timestamp column. `None` when the frame has no rows to span.
    pub fn full_span(df: &DataFrame, column: &str) -> Result<Option<Self>> {
        let ts = df.column(column)?.datetime()?;
        let (Some(min), Some(max)) = (ts.min(), ts.max()) else {
            return Ok(None);
        };
        Ok(Some(Self {
            start: date_from_micros(min)?,
            end: date_from_micros(max)?,
        }))
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Keeps exactly the rows whose timestamp falls on a calendar day
/// within the range. Comparing on the date part makes both ends
/// inclusive of the whole day, so a span built from min/max retains
/// every row. An empty result is valid output, not a failure.
pub fn filter_range(df: &DataFrame, column: &str, range: &DateRange) -> Result<DataFrame> {
    let day = col(column).cast(DataType::Date);
    let filtered = df
        .clone()
        .lazy()
        .filter(
            day.clone()
                .gt_eq(lit(range.start()))
                .and(day.lt_eq(lit(range.end()))),
        )
        .collect()?;
    Ok(filtered)
}

fn date_from_micros(value: i64) -> Result<NaiveDate> {
    let secs = value.div_euclid(1_000_000);
    let micros = value.rem_euclid(1_000_000) as u32;
    chrono::DateTime::<chrono::Utc>::from_timestamp(secs, micros * 1_000)
        .map(|dt| dt.naive_utc().date())
        .ok_or_else(|| {
            PolarsError::ComputeError(format!("timestamp out of range: {value}").into()).into()
        })
}
