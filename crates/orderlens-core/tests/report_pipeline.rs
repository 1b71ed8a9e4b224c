use std::path::PathBuf;

use chrono::NaiveDate;
use orderlens_core::{
    run_report, AggregateOutcome, AggregateTable, DateRange, PipelineError, ReportOutput,
    ReportRequest, RunOutcome, Stage, TableCache, TableSource,
};

fn fixture_source(label: &str, file: &str) -> TableSource {
    let base = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    TableSource::from_path(label, base.join("tests/data").join(file))
}

fn fixture_request(range: Option<DateRange>) -> ReportRequest {
    ReportRequest {
        items: fixture_source("Order Items Dataset", "order_items.csv"),
        payments: fixture_source("Order Payments Dataset", "order_payments.csv"),
        range,
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn expect_report(outcome: RunOutcome) -> ReportOutput {
    match outcome {
        RunOutcome::Report(report) => report,
        RunOutcome::NoRowsInRange { range } => {
            panic!("expected a report, got empty result for range {range:?}")
        }
    }
}

fn expect_available(outcome: &AggregateOutcome) -> &AggregateTable {
    match outcome {
        AggregateOutcome::Available(table) => table,
        AggregateOutcome::Unavailable { missing } => {
            panic!("aggregate unavailable, missing {missing:?}")
        }
    }
}

#[test]
fn default_range_report_matches_reference_aggregates() {
    let mut cache = TableCache::new();
    let outcome = run_report(&mut cache, &fixture_request(None)).expect("run failed");
    let report = expect_report(outcome);

    // o5 has no payment and o6 no line item, so neither joins; o3's
    // shipping date does not parse and is dropped after the join.
    assert_eq!(report.row_count, 4);
    assert_eq!(report.dropped_invalid_dates, 1);
    assert_eq!(report.range.start(), date(2017, 9, 19));
    assert_eq!(report.range.end(), date(2017, 12, 25));

    let payments = expect_available(&report.payment_summary).rows().unwrap();
    // o1's single 150.0 payment joins both of its line items, so
    // credit_card sums to 300, not 150.
    assert_eq!(
        payments,
        [
            ("boleto".to_string(), 100.0),
            ("credit_card".to_string(), 300.0),
            ("voucher".to_string(), 55.0),
        ]
    );

    let installments = expect_available(&report.installment_price_summary)
        .rows()
        .unwrap();
    assert_eq!(
        installments,
        [("1".to_string(), 77.5), ("3".to_string(), 50.0)]
    );
}

#[test]
fn explicit_window_restricts_the_report() {
    let range = DateRange::new(date(2017, 10, 1), date(2017, 12, 31)).unwrap();
    let mut cache = TableCache::new();
    let outcome = run_report(&mut cache, &fixture_request(Some(range))).expect("run failed");
    let report = expect_report(outcome);

    assert_eq!(report.row_count, 2);
    let payments = expect_available(&report.payment_summary).rows().unwrap();
    assert_eq!(
        payments,
        [("boleto".to_string(), 100.0), ("voucher".to_string(), 55.0)]
    );
}

#[test]
fn window_with_no_rows_is_reported_not_raised() {
    let range = DateRange::new(date(2018, 6, 1), date(2018, 6, 1)).unwrap();
    let mut cache = TableCache::new();
    let outcome = run_report(&mut cache, &fixture_request(Some(range))).expect("run failed");

    match outcome {
        RunOutcome::NoRowsInRange { range: Some(applied) } => assert_eq!(applied, range),
        other => panic!("expected NoRowsInRange, got {other:?}"),
    }
}

#[test]
fn missing_key_column_halts_before_the_join() {
    let items = TableSource::from_bytes(
        "Order Items Dataset",
        "items_no_key.csv",
        b"product_id,price,shipping_limit_date\np1,10.0,2018-01-01 00:00:00\n".to_vec(),
    );
    let request = ReportRequest {
        items,
        payments: fixture_source("Order Payments Dataset", "order_payments.csv"),
        range: None,
    };

    let mut cache = TableCache::new();
    let err = run_report(&mut cache, &request).unwrap_err();
    match err {
        PipelineError::MissingColumns { stage, columns } => {
            assert_eq!(stage, Stage::ItemsLoad);
            assert_eq!(columns, ["order_id"]);
        }
        other => panic!("expected MissingColumns, got {other:?}"),
    }
}

#[test]
fn absent_aggregate_columns_degrade_only_that_summary() {
    // Payments without payment_type: the payment summary is skipped,
    // the installment/price summary still computes.
    let payments = TableSource::from_bytes(
        "Order Payments Dataset",
        "payments_no_type.csv",
        b"order_id,payment_installments,payment_value\no1,2,80.0\n".to_vec(),
    );
    let items = TableSource::from_bytes(
        "Order Items Dataset",
        "items_minimal.csv",
        b"order_id,price,shipping_limit_date\no1,35.0,2018-03-04 10:00:00\n".to_vec(),
    );

    let mut cache = TableCache::new();
    let outcome = run_report(
        &mut cache,
        &ReportRequest {
            items,
            payments,
            range: None,
        },
    )
    .expect("run failed");
    let report = expect_report(outcome);

    match &report.payment_summary {
        AggregateOutcome::Unavailable { missing } => assert_eq!(missing, &["payment_type"]),
        other => panic!("expected Unavailable, got {other:?}"),
    }

    let installments = expect_available(&report.installment_price_summary)
        .rows()
        .unwrap();
    assert_eq!(installments, [("2".to_string(), 35.0)]);
}

#[test]
fn missing_source_file_is_distinguished_from_parse_failure() {
    let request = ReportRequest {
        items: TableSource::from_path("Order Items Dataset", "/no/such/order_items.csv"),
        payments: fixture_source("Order Payments Dataset", "order_payments.csv"),
        range: None,
    };

    let mut cache = TableCache::new();
    let err = run_report(&mut cache, &request).unwrap_err();
    assert!(matches!(err, PipelineError::SourceNotFound { .. }));
}

#[test]
fn repeated_runs_reuse_the_cache() {
    let mut cache = TableCache::new();
    let request = fixture_request(None);

    let first = expect_report(run_report(&mut cache, &request).expect("first run failed"));
    assert_eq!(cache.len(), 2);

    let second = expect_report(run_report(&mut cache, &request).expect("second run failed"));
    assert_eq!(first.row_count, second.row_count);
    assert_eq!(cache.len(), 2);
}
