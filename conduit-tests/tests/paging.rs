#[cfg(test)]
mod tests {
    use conduit::{
        DataAccess, DataError, Statement, Value, Vendor, data_error, stream::TryStreamExt,
    };
    use conduit_tests::{Event, MemoryConnection, MemoryDriver, init_logs, rows, scalar, silent_logs};

    const QUERY: &str = "SELECT n FROM numbers WHERE n > {0} ORDER BY n";

    fn numbers() -> MemoryDriver {
        MemoryDriver::new(Vendor::PostgreSql).respond(|command| {
            if command.text.starts_with("SELECT COUNT(1)") {
                Some(scalar("count", Value::Int64(Some(95))))
            } else if command.text.contains("LIMIT 10 OFFSET 90") {
                Some(rows(
                    &["n"],
                    (91..=95).map(|n| vec![Value::Int32(Some(n))]).collect(),
                ))
            } else {
                None
            }
        })
    }

    fn context(driver: &MemoryDriver) -> DataAccess<MemoryConnection> {
        DataAccess::connect(driver, "memory://paging").expect("Could not create the context")
    }

    #[tokio::test]
    async fn last_page_is_partial() {
        init_logs();
        let driver = numbers();
        let mut access = context(&driver);
        let page = access
            .fetch_page(Statement::new(QUERY).bind(0), 10, 10, |row| row.get::<i32>("n"))
            .await
            .unwrap();
        assert_eq!(page.row_count, 95);
        assert_eq!(page.page_count, 10);
        assert_eq!(page.data, [91, 92, 93, 94, 95]);
        assert_eq!(
            driver.executed(),
            [
                "SELECT COUNT(1) FROM (SELECT n FROM numbers WHERE n > :p0) AS count_wrapper",
                "SELECT page_result_set.* FROM (SELECT n FROM numbers WHERE n > :p0 ORDER BY n) page_result_set LIMIT 10 OFFSET 90",
            ]
        );
        // Both round trips share one open connection and carry the parameters
        let journal = driver.journal();
        assert_eq!(journal.first(), Some(&Event::Open));
        assert_eq!(journal.last(), Some(&Event::Close));
        assert_eq!(journal.len(), 4);
        for event in &journal[1..3] {
            let Event::Execute(command) = event else {
                panic!("Expected a command, found {:?}", event);
            };
            assert_eq!(command.parameters.len(), 1);
            assert_eq!(command.parameters[0].name, ":p0");
            assert_eq!(command.parameters[0].value, Value::Int32(Some(0)));
        }
    }

    #[tokio::test]
    async fn page_cursor_streams_the_window() {
        init_logs();
        let driver = numbers();
        let mut access = context(&driver);
        {
            let page = access
                .cursor_page(Statement::new(QUERY).bind(0), 10, 10)
                .await
                .unwrap();
            assert_eq!(page.row_count, 95);
            let rows = page.data.try_collect::<Vec<_>>().await.unwrap();
            assert_eq!(rows.len(), 5);
            assert_eq!(rows[4].get::<i64>("n").unwrap(), 95);
        }
        assert_eq!(access.references(), 0);
    }

    #[tokio::test]
    async fn page_fold_into_a_container() {
        init_logs();
        let driver = numbers();
        let mut access = context(&driver);
        let page = access
            .fetch_page_into(
                Statement::new(QUERY).bind(0),
                10,
                10,
                0i64,
                |sum, row| {
                    *sum += row.get::<i64>("n")?;
                    Ok(())
                },
            )
            .await
            .unwrap();
        assert_eq!(page.data, 91 + 92 + 93 + 94 + 95);
    }

    #[tokio::test]
    async fn empty_count_means_no_rows() {
        init_logs();
        let driver = MemoryDriver::new(Vendor::PostgreSql);
        let mut access = context(&driver);
        assert_eq!(access.row_count("SELECT * FROM t ORDER BY a").await.unwrap(), 0);
        assert_eq!(
            driver.executed(),
            ["SELECT COUNT(1) FROM (SELECT * FROM t) AS count_wrapper"]
        );
    }

    #[tokio::test]
    async fn invalid_requests_never_reach_the_backend() {
        init_logs();
        let driver = numbers();
        let mut access = context(&driver);
        silent_logs! {
            for (index, size) in [(0, 10), (1, 0)] {
                let error = access
                    .fetch_page(QUERY, index, size, |row| row.get::<i32>("n"))
                    .await
                    .expect_err("The window is invalid");
                assert!(matches!(data_error(&error), Some(DataError::Argument(..))));
            }
            let error = access
                .fetch_page("SELECT n FROM numbers", 1, 10, |row| row.get::<i32>("n"))
                .await
                .expect_err("Paging needs an ORDER BY");
            assert!(matches!(data_error(&error), Some(DataError::Format(..))));
        }
        assert!(driver.journal().is_empty());
    }
}
