#[cfg(test)]
mod tests {
    use crate::{
        TEST_MYSQL_URL, TEST_PG_URL, copy_job, copy_options, mysql_execute, pg_client, pg_count,
        pg_execute,
    };
    use chrono::NaiveDate;
    use connectors::sql::{mysql::adapter::MySqlSource, postgres::adapter::PgDestination};
    use engine_runtime::{error::CopyError, execution::executor};
    use model::execution::settings::SplitMode;
    use tokio_util::sync::CancellationToken;

    const ORDERS_MYSQL_DDL: &str = r#"
        CREATE TABLE parcopy_orders (
            id INT PRIMARY KEY,
            note VARCHAR(64),
            amount DOUBLE,
            placed_at DATETIME(6),
            receipt BLOB
        )"#;

    const ORDERS_PG_DDL: &str = r#"
        DROP TABLE IF EXISTS parcopy_orders;
        CREATE TABLE parcopy_orders (
            id BIGINT PRIMARY KEY,
            note TEXT,
            amount NUMERIC(12, 2),
            placed_at TIMESTAMP,
            receipt BYTEA
        );"#;

    /// Seeds `parcopy_orders` with ids 1..=n; every tenth note is NULL.
    async fn seed_orders(n: usize) {
        let insert = format!(
            r#"
            INSERT INTO parcopy_orders
            WITH RECURSIVE seq (n) AS (
                SELECT 1 UNION ALL SELECT n + 1 FROM seq WHERE n < {n}
            )
            SELECT n,
                   IF(n % 10 = 0, NULL, CONCAT('note-', n)),
                   n / 4,
                   TIMESTAMP('2024-01-01 00:00:00') + INTERVAL n SECOND,
                   UNHEX(LPAD(HEX(n), 8, '0'))
            FROM seq"#
        );
        mysql_execute(&[
            "DROP TABLE IF EXISTS parcopy_orders",
            ORDERS_MYSQL_DDL,
            "SET SESSION cte_max_recursion_depth = 100000",
            &insert,
        ])
        .await;
        pg_execute(ORDERS_PG_DDL).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    #[ignore = "requires MySQL and PostgreSQL test databases"]
    async fn copies_ten_thousand_rows() {
        seed_orders(10_000).await;

        let job = copy_job(&copy_options("testdb.parcopy_orders", 4, 1000)).await;
        assert_eq!(job.settings.split, SplitMode::KeyRange { key: "id".into() });

        let report = executor::run(job, CancellationToken::new()).await.unwrap();
        assert_eq!(report.tokens, 11);
        assert_eq!(report.rows_extracted, 10_000);
        assert_eq!(report.rows_loaded, 10_000);
        assert_eq!(pg_count("parcopy_orders").await, 10_000);

        let row = pg_client()
            .await
            .query_one(
                "SELECT note, amount::float8, placed_at, receipt FROM parcopy_orders WHERE id = 4242",
                &[],
            )
            .await
            .unwrap();
        assert_eq!(row.get::<_, Option<String>>(0).as_deref(), Some("note-4242"));
        assert_eq!(row.get::<_, f64>(1), 1060.5);
        assert_eq!(
            row.get::<_, chrono::NaiveDateTime>(2),
            NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(1, 10, 42)
                .unwrap()
        );
        assert_eq!(row.get::<_, Vec<u8>>(3), vec![0x00, 0x00, 0x10, 0x92]);

        let nulls: i64 = pg_client()
            .await
            .query_one("SELECT COUNT(*) FROM parcopy_orders WHERE note IS NULL", &[])
            .await
            .unwrap()
            .get(0);
        assert_eq!(nulls, 1_000);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    #[ignore = "requires MySQL and PostgreSQL test databases"]
    async fn refuses_populated_destination() {
        seed_orders(10).await;
        pg_execute("INSERT INTO parcopy_orders (id) VALUES (-1)").await;

        let job = copy_job(&copy_options("testdb.parcopy_orders", 2, 5)).await;
        let result = executor::run(job, CancellationToken::new()).await;

        assert!(matches!(result, Err(CopyError::DestinationNotEmpty { .. })));
        assert_eq!(pg_count("parcopy_orders").await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    #[ignore = "requires MySQL and PostgreSQL test databases"]
    async fn copies_partitioned_table() {
        mysql_execute(&[
            "DROP TABLE IF EXISTS parcopy_events",
            r#"CREATE TABLE parcopy_events (
                id INT NOT NULL,
                kind VARCHAR(16)
            )
            PARTITION BY RANGE (id) (
                PARTITION p0 VALUES LESS THAN (100),
                PARTITION p1 VALUES LESS THAN (200),
                PARTITION pmax VALUES LESS THAN MAXVALUE
            )"#,
            "INSERT INTO parcopy_events VALUES (1, 'a'), (99, 'b'), (150, 'c'), (5000, 'd')",
        ])
        .await;
        pg_execute(
            "DROP TABLE IF EXISTS parcopy_events; CREATE TABLE parcopy_events (id INTEGER, kind TEXT);",
        )
        .await;

        let job = copy_job(&copy_options("testdb.parcopy_events", 2, 2)).await;
        assert_eq!(job.settings.split, SplitMode::Partitioned);

        let report = executor::run(job, CancellationToken::new()).await.unwrap();
        assert_eq!(report.tokens, 3);
        assert_eq!(pg_count("parcopy_events").await, 4);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    #[ignore = "requires MySQL and PostgreSQL test databases"]
    async fn overlong_text_fails_the_load() {
        mysql_execute(&[
            "DROP TABLE IF EXISTS parcopy_names",
            "CREATE TABLE parcopy_names (id INT PRIMARY KEY, name VARCHAR(32))",
            "INSERT INTO parcopy_names VALUES (1, 'abc'), (2, 'abcdefghij')",
        ])
        .await;
        pg_execute(
            "DROP TABLE IF EXISTS parcopy_names; CREATE TABLE parcopy_names (id BIGINT, name VARCHAR(5));",
        )
        .await;

        let job = copy_job(&copy_options("testdb.parcopy_names", 1, 10)).await;
        let result = executor::run(job, CancellationToken::new()).await;

        match result {
            Err(CopyError::Stage(err)) => {
                assert!(err.to_string().contains("Failed to load batch"), "{err}")
            }
            other => panic!("expected a load failure, got {other:?}"),
        }
        assert_eq!(pg_count("parcopy_names").await, 0);
    }

    #[tokio::test]
    #[ignore = "requires MySQL and PostgreSQL test databases"]
    async fn pings_both_endpoints() {
        MySqlSource::new(TEST_MYSQL_URL).unwrap().ping().await.unwrap();
        PgDestination::new(TEST_PG_URL).unwrap().ping().await.unwrap();
    }
}
