use conduit::{
    Connection, DataAccess, DataError, FromRow, Parameters, Statement, data_error,
    stream::TryStreamExt,
};
use rust_decimal::Decimal;
use std::collections::HashMap;

#[derive(Parameters, FromRow, Debug, Clone, PartialEq)]
struct Book {
    id: i64,
    title: String,
    price: Option<Decimal>,
    #[conduit(ignore)]
    shelf: String,
}

pub async fn simple<C: Connection>(access: &mut DataAccess<C>) {
    access
        .execute("DROP TABLE IF EXISTS conduit_books")
        .await
        .expect("Failed to drop conduit_books");
    access
        .execute(
            "CREATE TABLE conduit_books (id BIGINT PRIMARY KEY, title VARCHAR(120) NOT NULL, price NUMERIC(10, 2))",
        )
        .await
        .expect("Failed to create conduit_books");
    assert_eq!(access.references(), 0);

    let book = Book {
        id: 1,
        title: "Solaris".into(),
        price: Some(Decimal::new(1250, 2)),
        shelf: "A1".into(),
    };
    let affected = access
        .execute(Statement::named(
            "INSERT INTO conduit_books (id, title, price) VALUES ({Id}, {Title}, {PRICE})",
            &book,
        ))
        .await
        .expect("Failed to insert a named book");
    assert_eq!(affected.rows_affected, 1);
    access
        .execute(
            Statement::new("INSERT INTO conduit_books (id, title, price) VALUES ({0}, {1}, {2})")
                .bind(2i64)
                .bind("Dune")
                .bind(None::<Decimal>),
        )
        .await
        .expect("Failed to insert a positional book");
    let values = HashMap::from([
        ("id".to_string(), conduit::AsValue::as_value(3i64)),
        ("title".to_string(), conduit::AsValue::as_value("Ubik")),
    ]);
    access
        .execute(Statement::named(
            "INSERT INTO conduit_books (id, title) VALUES ({id}, {title})",
            &values,
        ))
        .await
        .expect("Failed to insert a book from a map");

    let count = access
        .scalar_as::<i64>("SELECT COUNT(*) FROM conduit_books")
        .await
        .expect("Failed to count the books");
    assert_eq!(count, Some(3));
    let title = access
        .scalar_as::<String>(Statement::new("SELECT title FROM conduit_books WHERE id = {0}").bind(2i64))
        .await
        .expect("Failed to read a title");
    assert_eq!(title.as_deref(), Some("Dune"));
    let missing = access
        .scalar(Statement::new("SELECT title FROM conduit_books WHERE id = {0}").bind(99i64))
        .await
        .expect("Failed to read a missing title");
    assert!(missing.is_null());

    let books = access
        .fetch_all(
            "SELECT id, title, price FROM conduit_books ORDER BY id",
            Book::from_row,
        )
        .await
        .expect("Failed to fetch the books");
    assert_eq!(books.len(), 3);
    assert_eq!(
        books[0],
        Book {
            shelf: String::new(),
            ..book
        }
    );
    assert_eq!(books[1].price, None);
    assert_eq!(books[2].title, "Ubik");

    let titles = access
        .fetch_into(
            "SELECT title FROM conduit_books ORDER BY title DESC",
            Vec::new(),
            |titles: &mut Vec<String>, row| {
                titles.push(row.get("title")?);
                Ok(())
            },
        )
        .await
        .expect("Failed to fold the titles");
    assert_eq!(titles, ["Ubik", "Solaris", "Dune"]);

    let rows = access
        .cursor("SELECT id FROM conduit_books WHERE price IS NULL ORDER BY id")
        .try_collect::<Vec<_>>()
        .await
        .expect("Failed to stream the books");
    let ids = rows
        .iter()
        .map(|row| row.get_index::<i64>(0))
        .collect::<conduit::Result<Vec<_>>>()
        .expect("Unexpected id type");
    assert_eq!(ids, [2, 3]);

    let count = access
        .row_count("SELECT * FROM conduit_books ORDER BY title")
        .await
        .expect("Failed to count the rows of a query");
    assert_eq!(count, 3);

    let error = access
        .execute(Statement::new("SELECT {0").bind(1))
        .await
        .expect_err("Unbalanced braces must fail");
    assert!(matches!(data_error(&error), Some(DataError::Format(..))));
    let error = access
        .execute(Statement::new("SELECT {0}").bind(1).bind_named("a", 2))
        .await
        .expect_err("Mixed bindings must fail");
    assert!(matches!(data_error(&error), Some(DataError::Argument(..))));
    assert_eq!(access.references(), 0);
    assert!(!access.is_opened_here());
}
