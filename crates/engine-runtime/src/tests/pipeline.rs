use crate::{
    error::CopyError,
    execution::{
        executor::{self, CopyExecutor},
        job::CopyJob,
    },
};
use chrono::NaiveDate;
use connectors::memory::{destination::MemoryDestination, source::MemorySource};
use engine_processing::error::StageError;
use model::{
    core::{
        data_type::{ColumnKind, MixedKindPolicy},
        identifiers::TableRef,
        value::NativeValue,
    },
    execution::settings::{ColumnSpec, CopySettings, SplitMode},
};
use std::{cmp::Ordering, sync::Arc, time::Duration};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing_test::traced_test;

fn settings(columns: Vec<ColumnSpec>, batch_size: usize, parallelism: usize) -> CopySettings {
    CopySettings {
        source_table: TableRef::new(Some("shop"), "orders"),
        dest_table: TableRef::new(Some("public"), "orders"),
        columns,
        binary_columns: Default::default(),
        batch_size,
        split: SplitMode::KeyRange { key: "id".into() },
        parallelism,
        mixed_kinds: MixedKindPolicy::Reject,
    }
}

fn id_only(batch_size: usize, parallelism: usize) -> CopySettings {
    settings(vec![ColumnSpec::new("id")], batch_size, parallelism)
}

fn keys(n: i64) -> Vec<Vec<NativeValue>> {
    (1..=n).map(|i| vec![NativeValue::Int(i)]).collect()
}

fn job(settings: CopySettings, source: &MemorySource, destination: &MemoryDestination) -> CopyJob {
    CopyJob::new(
        settings,
        Arc::new(source.clone()),
        Arc::new(destination.clone()),
    )
}

fn sorted(mut rows: Vec<Vec<NativeValue>>) -> Vec<Vec<NativeValue>> {
    rows.sort_by(|a, b| a[0].compare(&b[0]).unwrap_or(Ordering::Equal));
    rows
}

fn assert_released(source: &MemorySource, destination: &MemoryDestination) {
    assert_eq!(source.open_handles(), 0, "source handles leaked");
    assert_eq!(destination.open_handles(), 0, "destination handles leaked");
}

#[tokio::test]
#[traced_test]
async fn copies_ten_thousand_rows_in_eleven_ranges() {
    let source = MemorySource::new(&["id"], keys(10_000));
    let destination = MemoryDestination::new();

    let report = executor::run(
        job(id_only(1000, 4), &source, &destination),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(report.tokens, 11);
    assert_eq!(report.rows_extracted, 10_000);
    assert_eq!(report.rows_loaded, 10_000);
    assert_eq!(report.raw_batches, report.transformed_batches);
    assert_eq!(report.transformed_batches, report.batches_loaded);
    assert_eq!(sorted(destination.rows()), keys(10_000));
    assert_released(&source, &destination);
    assert!(logs_contain("Copy finished."));
}

#[tokio::test]
async fn round_trips_every_column_kind() {
    let at = |d: u32| {
        NaiveDate::from_ymd_opt(2024, 3, d)
            .and_then(|date| date.and_hms_micro_opt(12, 30, 15, 250_000))
            .map(NativeValue::Timestamp)
            .unwrap()
    };
    let rows: Vec<Vec<NativeValue>> = (1..=25)
        .map(|i: i64| {
            vec![
                NativeValue::Int(i),
                if i % 5 == 0 { NativeValue::Null } else { NativeValue::text(format!("name-{i}")) },
                NativeValue::Float(i as f64 / 4.0),
                at((i % 28 + 1) as u32),
                NativeValue::Bytes(vec![0xff, 0x00, i as u8, 0xfe]),
            ]
        })
        .collect();

    let mut settings = settings(
        vec![
            ColumnSpec::new("id").with_kind(ColumnKind::Integer),
            ColumnSpec::new("name").with_kind(ColumnKind::Text),
            ColumnSpec::new("score").with_kind(ColumnKind::Float),
            ColumnSpec::new("created_at").with_kind(ColumnKind::Timestamp),
            ColumnSpec::new("payload"),
        ],
        4,
        3,
    );
    settings.binary_columns.insert(4);

    let source = MemorySource::new(&["id", "name", "score", "created_at", "payload"], rows.clone());
    let destination = MemoryDestination::new();

    let report = executor::run(job(settings, &source, &destination), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.rows_loaded, 25);
    assert_eq!(sorted(destination.rows()), rows);
    assert_released(&source, &destination);
}

#[tokio::test]
async fn dynamic_kinds_are_resolved_per_batch() {
    let rows = (1..=6)
        .map(|i| vec![NativeValue::Int(i), NativeValue::Float(i as f64 + 0.5)])
        .collect::<Vec<_>>();
    let source = MemorySource::new(&["id", "score"], rows.clone());
    let destination = MemoryDestination::new();
    let settings = settings(vec![ColumnSpec::new("id"), ColumnSpec::new("score")], 2, 2);

    executor::run(job(settings, &source, &destination), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(sorted(destination.rows()), rows);
}

#[tokio::test]
async fn partitioned_table_copies_every_partition() {
    let source = MemorySource::partitioned(
        &["id"],
        vec![
            ("p2023", keys(7)),
            ("p2024", (8..=20).map(|i| vec![NativeValue::Int(i)]).collect()),
            ("pmax", Vec::new()),
        ],
    );
    let destination = MemoryDestination::new();
    let mut settings = id_only(5, 2);
    settings.split = SplitMode::Partitioned;

    let report = executor::run(job(settings, &source, &destination), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.tokens, 3);
    assert_eq!(sorted(destination.rows()), keys(20));
    assert_released(&source, &destination);
}

#[tokio::test]
async fn refuses_non_empty_destination() {
    let source = MemorySource::new(&["id"], keys(10));
    let destination = MemoryDestination::new().with_rows(keys(1));

    let result = executor::run(job(id_only(5, 2), &source, &destination), CancellationToken::new()).await;

    match result {
        Err(CopyError::DestinationNotEmpty { table }) => assert_eq!(table, "public.orders"),
        other => panic!("unexpected result {other:?}"),
    }
    assert_eq!(source.rows_served(), 0);
    assert_released(&source, &destination);
}

#[tokio::test]
#[traced_test]
async fn load_failure_keeps_earlier_batches_only() {
    let source = MemorySource::new(&["id"], keys(10));
    let destination = MemoryDestination::new().failing_at(3);

    let result = executor::run(job(id_only(1, 1), &source, &destination), CancellationToken::new()).await;

    assert!(matches!(
        result,
        Err(CopyError::Stage(StageError::Load { .. }))
    ));
    assert_eq!(destination.rows().len(), 2);
    assert_released(&source, &destination);
    assert!(logs_contain("Copy failed."));
    assert!(logs_contain("duration_ms"));
}

#[tokio::test]
async fn mixed_kinds_fail_the_run() {
    let rows = vec![
        vec![NativeValue::Int(1), NativeValue::Int(10)],
        vec![NativeValue::Int(2), NativeValue::text("ten")],
    ];
    let source = MemorySource::new(&["id", "amount"], rows);
    let destination = MemoryDestination::new();
    let settings = settings(vec![ColumnSpec::new("id"), ColumnSpec::new("amount")], 10, 2);

    let result = executor::run(job(settings, &source, &destination), CancellationToken::new()).await;

    assert!(matches!(
        result,
        Err(CopyError::Stage(StageError::Conversion { .. }))
    ));
    assert!(destination.rows().is_empty());
    assert_released(&source, &destination);
}

#[tokio::test]
async fn stalled_loaders_bound_raw_batches() {
    let workers = 2;
    let gate = Arc::new(Semaphore::new(0));
    let source = MemorySource::new(&["id"], keys(200));
    let destination = MemoryDestination::new().gated(gate.clone());

    let executor = CopyExecutor::new(job(id_only(1, workers), &source, &destination));
    let metrics = executor.metrics();
    let handle = tokio::spawn(executor.run(CancellationToken::new()));

    tokio::time::sleep(Duration::from_millis(100)).await;
    let stalled = metrics.snapshot();
    assert!(
        stalled.raw_batches <= 5 * workers as u64,
        "{} raw batches produced with stalled loaders",
        stalled.raw_batches
    );
    assert_eq!(stalled.rows_loaded, 0);

    gate.add_permits(200);
    let report = handle.await.unwrap().unwrap();
    assert_eq!(report.rows_loaded, 200);
    assert_released(&source, &destination);
}

#[tokio::test]
async fn external_cancellation_stops_every_worker() {
    let gate = Arc::new(Semaphore::new(3));
    let source = MemorySource::new(&["id"], keys(100));
    let destination = MemoryDestination::new().gated(gate.clone());
    let cancel = CancellationToken::new();

    let handle = tokio::spawn(executor::run(
        job(id_only(1, 2), &source, &destination),
        cancel.clone(),
    ));
    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();
    // Both loaders are blocked on a batch; each finishes it and then stops.
    gate.add_permits(10);

    assert!(matches!(handle.await.unwrap(), Err(CopyError::Cancelled)));
    assert_eq!(destination.rows().len(), 5);
    assert_released(&source, &destination);
}
