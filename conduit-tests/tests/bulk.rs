#[cfg(test)]
mod tests {
    use conduit::{Argument, DataAccess, DataError, Value, Vendor, args, data_error};
    use conduit_tests::{Event, MemoryConnection, MemoryDriver, init_logs, silent_logs};
    use std::collections::BTreeMap;

    const INSERT: &str = "INSERT INTO t (a, b) VALUES ({0}, {1})";

    fn context(driver: &MemoryDriver) -> DataAccess<MemoryConnection> {
        DataAccess::connect(driver, "memory://bulk").expect("Could not create the context")
    }

    fn executed_values(driver: &MemoryDriver) -> Vec<Vec<Value>> {
        driver
            .journal()
            .into_iter()
            .filter_map(|e| match e {
                Event::Execute(command) if command.text.starts_with("INSERT") => Some(
                    command.parameters.into_iter().map(|p| p.value).collect(),
                ),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn rows_run_in_one_transaction() {
        init_logs();
        let driver = MemoryDriver::new(Vendor::PostgreSql);
        let mut access = context(&driver);
        let affected = access
            .execute_many(INSERT, [args![1, "a"], args![], args![2, "b"]])
            .await
            .unwrap();
        assert_eq!(affected.rows_affected, 2);
        assert_eq!(
            driver.executed(),
            [
                "BEGIN;",
                "INSERT INTO t (a, b) VALUES (:p0, :p1)",
                "INSERT INTO t (a, b) VALUES (:p0, :p1)",
                "COMMIT;"
            ]
        );
        assert_eq!(
            executed_values(&driver),
            [
                vec![Value::Int32(Some(1)), Value::Varchar(Some("a".into()))],
                vec![Value::Int32(Some(2)), Value::Varchar(Some("b".into()))],
            ]
        );
        assert!(!access.has_transaction());
        assert_eq!(access.references(), 0);
    }

    #[tokio::test]
    async fn nothing_to_run() {
        init_logs();
        let driver = MemoryDriver::new(Vendor::PostgreSql);
        let mut access = context(&driver);
        let affected = access
            .execute_many(INSERT, [Vec::<Argument>::new(), args![]])
            .await
            .unwrap();
        assert_eq!(affected.rows_affected, 0);
        let affected = access
            .execute_many_named(INSERT, Vec::<BTreeMap<String, i32>>::new())
            .await
            .unwrap();
        assert_eq!(affected.rows_affected, 0);
        assert!(driver.journal().is_empty());
    }

    #[tokio::test]
    async fn malformed_rows_are_rejected_up_front() {
        init_logs();
        let driver = MemoryDriver::new(Vendor::PostgreSql);
        let mut access = context(&driver);
        silent_logs! {
            let error = access
                .execute_many(INSERT, [args![1, "a"], args![2]])
                .await
                .expect_err("Rows must have the same length");
            assert!(matches!(data_error(&error), Some(DataError::Argument(..))));

            let rows = [
                BTreeMap::from([("A", 1), ("B", 2)]),
                BTreeMap::from([("A", 3), ("C", 4)]),
            ];
            let error = access
                .execute_many_named("INSERT INTO t (a, b) VALUES ({A}, {B})", &rows)
                .await
                .expect_err("Rows must bind the same names");
            assert!(matches!(data_error(&error), Some(DataError::Argument(..))));
        }
        assert!(driver.journal().is_empty());
    }

    #[tokio::test]
    async fn named_rows_follow_the_first_row() {
        init_logs();
        let driver = MemoryDriver::new(Vendor::PostgreSql);
        let mut access = context(&driver);
        let rows = [
            vec![("Id", 1), ("Qty", 10)],
            vec![("qty", 20), ("ID", 2)],
        ];
        access
            .execute_many_named("UPDATE t SET qty = {QTY} WHERE id = {id}", &rows)
            .await
            .unwrap();
        let values: Vec<Vec<Value>> = driver
            .journal()
            .into_iter()
            .filter_map(|e| match e {
                Event::Execute(command) if command.text.starts_with("UPDATE") => Some(
                    command.parameters.into_iter().map(|p| p.value).collect(),
                ),
                _ => None,
            })
            .collect();
        assert_eq!(
            values,
            [
                vec![Value::Int32(Some(1)), Value::Int32(Some(10))],
                vec![Value::Int32(Some(2)), Value::Int32(Some(20))],
            ]
        );
    }

    #[tokio::test]
    async fn failed_batch_is_rolled_back() {
        init_logs();
        let driver = MemoryDriver::new(Vendor::PostgreSql);
        let mut access = context(&driver);
        driver.fail_on("INSERT");
        silent_logs! {
            assert!(access.execute_many(INSERT, [args![1, "a"], args![2, "b"]]).await.is_err());
        }
        assert_eq!(
            driver.executed(),
            ["BEGIN;", "INSERT INTO t (a, b) VALUES (:p0, :p1)", "ROLLBACK;"]
        );
        assert!(!access.has_transaction());
        assert_eq!(driver.journal().last(), Some(&Event::Close));
    }

    #[tokio::test]
    async fn batch_joins_an_active_transaction() {
        init_logs();
        let driver = MemoryDriver::new(Vendor::PostgreSql);
        let mut access = context(&driver);
        let mut transaction = access.begin().await.unwrap();
        let id = transaction.id();
        transaction
            .execute_many(INSERT, [args![1, "a"], args![2, "b"]])
            .await
            .unwrap();
        assert!(transaction.has_transaction());
        transaction.commit().await.unwrap();
        assert_eq!(
            driver.executed(),
            [
                "BEGIN;",
                "INSERT INTO t (a, b) VALUES (:p0, :p1)",
                "INSERT INTO t (a, b) VALUES (:p0, :p1)",
                "COMMIT;"
            ]
        );
        for event in driver.journal() {
            if let Event::Execute(command) = event
                && command.text.starts_with("INSERT")
            {
                assert_eq!(command.transaction, Some(id));
            }
        }
    }
}
