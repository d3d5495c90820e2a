#[cfg(test)]
mod tests {
    use conduit::{Command, DataAccess, Statement, Vendor};
    use conduit_tests::{Event, MemoryDriver, init_logs, silent_logs};

    fn context(driver: &MemoryDriver) -> DataAccess<conduit_tests::MemoryConnection> {
        DataAccess::connect(driver, "memory://lifecycle").expect("Could not create the context")
    }

    #[tokio::test]
    async fn references_are_counted() {
        init_logs();
        let driver = MemoryDriver::new(Vendor::PostgreSql);
        let mut access = context(&driver);
        assert_eq!(access.references(), 0);
        access.ensure_open().await.unwrap();
        access.ensure_open().await.unwrap();
        assert_eq!(access.references(), 2);
        assert!(access.is_opened_here());
        access.release(true).unwrap();
        assert_eq!(driver.journal(), [Event::Open]);
        access.release(true).unwrap();
        assert_eq!(access.references(), 0);
        assert!(!access.is_opened_here());
        assert_eq!(driver.journal(), [Event::Open, Event::Close]);
        // Releasing more than acquired does nothing
        access.release(true).unwrap();
        assert_eq!(driver.journal(), [Event::Open, Event::Close]);
    }

    #[tokio::test]
    async fn release_without_close_hands_the_connection_over() {
        init_logs();
        let driver = MemoryDriver::new(Vendor::PostgreSql);
        let mut access = context(&driver);
        access.ensure_open().await.unwrap();
        access.release(false).unwrap();
        assert!(!access.is_opened_here());
        assert_eq!(driver.journal(), [Event::Open]);

        // Opened by someone else: operations neither count nor close
        access.ensure_open().await.unwrap();
        assert_eq!(access.references(), 0);
        access.execute("DELETE FROM t").await.unwrap();
        assert_eq!(
            driver.journal(),
            [Event::Open, Event::Execute(Command::new("DELETE FROM t"))]
        );
    }

    #[tokio::test]
    async fn operations_open_and_close_around_themselves() {
        init_logs();
        let driver = MemoryDriver::new(Vendor::PostgreSql);
        let mut access = context(&driver);
        let affected = access.execute("UPDATE t SET a = 1").await.unwrap();
        assert_eq!(affected.rows_affected, 1);
        assert_eq!(
            driver.journal(),
            [
                Event::Open,
                Event::Execute(Command::new("UPDATE t SET a = 1")),
                Event::Close
            ]
        );
        assert_eq!(access.references(), 0);
    }

    #[tokio::test]
    async fn failures_restore_the_counter() {
        init_logs();
        let driver = MemoryDriver::new(Vendor::PostgreSql);
        let mut access = context(&driver);
        driver.fail_open(true);
        silent_logs! {
            assert!(access.ensure_open().await.is_err());
        }
        assert_eq!(access.references(), 0);
        assert!(!access.is_opened_here());
        assert!(driver.journal().is_empty());

        driver.fail_open(false);
        driver.fail_on("boom");
        silent_logs! {
            assert!(access.execute("SELECT boom").await.is_err());
        }
        assert_eq!(access.references(), 0);
        assert_eq!(
            driver.journal(),
            [
                Event::Open,
                Event::Execute(Command::new("SELECT boom")),
                Event::Close
            ]
        );
    }

    #[tokio::test]
    async fn failed_reopen_keeps_earlier_references() {
        init_logs();
        let driver = MemoryDriver::new(Vendor::PostgreSql);
        let mut access = context(&driver);
        access.ensure_open().await.unwrap();
        access.ensure_open().await.unwrap();
        assert_eq!(access.references(), 2);
        driver.break_connections();
        driver.fail_open(true);
        silent_logs! {
            assert!(access.ensure_open().await.is_err());
        }
        assert_eq!(access.references(), 2);
        driver.fail_open(false);
        access.release(true).unwrap();
        assert_eq!(access.references(), 1);
        access.release(true).unwrap();
        assert_eq!(access.references(), 0);
        assert!(!access.is_opened_here());
        assert_eq!(driver.journal(), [Event::Open, Event::Close]);
    }

    #[tokio::test]
    async fn validation_happens_before_opening() {
        init_logs();
        let driver = MemoryDriver::new(Vendor::PostgreSql);
        let mut access = context(&driver);
        silent_logs! {
            assert!(access.execute("   ").await.is_err());
            assert!(access.execute(Statement::new("SELECT {0").bind(1)).await.is_err());
        }
        assert!(driver.journal().is_empty());
    }

    #[tokio::test]
    async fn broken_connections_are_reopened() {
        init_logs();
        let driver = MemoryDriver::new(Vendor::PostgreSql);
        let mut access = context(&driver);
        access.ensure_open().await.unwrap();
        driver.break_connections();
        access.ensure_open().await.unwrap();
        assert_eq!(driver.journal(), [Event::Open, Event::Close, Event::Open]);
    }

    #[tokio::test]
    async fn close_gives_the_connection_back() {
        init_logs();
        let driver = MemoryDriver::new(Vendor::PostgreSql);
        let mut access = context(&driver);
        access.ensure_open().await.unwrap();
        access.ensure_open().await.unwrap();
        access.close().await.unwrap();
        assert_eq!(access.references(), 0);
        assert_eq!(driver.journal(), [Event::Open, Event::Close]);
        // Nothing left to close
        access.close().await.unwrap();
        assert_eq!(driver.journal(), [Event::Open, Event::Close]);
    }
}
