use conduit::{
    Connection, DataAccess, DataError, args, data_error,
    stream::TryStreamExt,
};

const PAGED: &str = "SELECT n FROM conduit_pages ORDER BY n";

pub async fn paging<C: Connection>(access: &mut DataAccess<C>) {
    access
        .execute("DROP TABLE IF EXISTS conduit_pages")
        .await
        .expect("Failed to drop conduit_pages");
    access
        .execute("CREATE TABLE conduit_pages (n INTEGER PRIMARY KEY)")
        .await
        .expect("Failed to create conduit_pages");
    access
        .execute_many(
            "INSERT INTO conduit_pages (n) VALUES ({0})",
            (1..=95).map(|n| args![n]),
        )
        .await
        .expect("Failed to insert 95 rows");

    let page = access
        .fetch_page(PAGED, 10, 10, |row| row.get::<i32>("n"))
        .await
        .expect("Failed to fetch the last page");
    assert_eq!(page.row_count, 95);
    assert_eq!(page.page_count, 10);
    assert_eq!(page.data, [91, 92, 93, 94, 95]);

    let page = access
        .fetch_page(PAGED, 1, 10, |row| row.get::<i32>("n"))
        .await
        .expect("Failed to fetch the first page");
    assert_eq!(page.data, (1..=10).collect::<Vec<_>>());

    let page = access
        .fetch_page(PAGED, 11, 10, |row| row.get::<i32>("n"))
        .await
        .expect("Failed to fetch a page past the end");
    assert!(page.data.is_empty());
    assert_eq!(page.row_count, 95);

    {
        let page = access
            .cursor_page(PAGED, 3, 20)
            .await
            .expect("Failed to open a page cursor");
        assert_eq!(page.page_count, 5);
        let rows = page
            .data
            .try_collect::<Vec<_>>()
            .await
            .expect("Failed to stream the page");
        assert_eq!(rows.len(), 20);
        assert_eq!(rows[0].get::<i32>("n").expect("Unexpected type"), 41);
    }

    let error = access
        .fetch_page("SELECT n FROM conduit_pages", 1, 10, |row| row.get::<i32>("n"))
        .await
        .expect_err("A query without ORDER BY cannot be paged");
    assert!(matches!(data_error(&error), Some(DataError::Format(..))));
    let error = access
        .fetch_page(PAGED, 0, 10, |row| row.get::<i32>("n"))
        .await
        .expect_err("Pages are 1-based");
    assert!(matches!(data_error(&error), Some(DataError::Argument(..))));
    assert_eq!(access.references(), 0);
}
