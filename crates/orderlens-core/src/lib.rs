//! Order/payment report pipeline: load two delimited tables, inner-join
//! them on `order_id`, normalize the shipping deadline column, restrict
//! to a date window, and compute the two grouped summaries.

pub mod aggregate;
pub mod error;
pub mod join;
pub mod loader;
pub mod range;
pub mod report;
pub mod schema;
pub mod temporal;

pub use aggregate::AggregateTable;
pub use error::{PipelineError, Result, Stage};
pub use loader::{TableCache, TableSource};
pub use range::DateRange;
pub use report::{
    run_report, AggregateOutcome, ReportOutput, ReportRequest, RunOutcome,
};
