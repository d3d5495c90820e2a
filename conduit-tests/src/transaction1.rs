use conduit::{Connection, DataAccess, DataError, IsolationLevel, Statement, data_error};

async fn count<C: Connection>(access: &mut DataAccess<C>) -> i64 {
    access
        .scalar_as::<i64>("SELECT COUNT(*) FROM conduit_accounts")
        .await
        .expect("Failed to count the accounts")
        .unwrap_or_default()
}

pub async fn transaction1<C: Connection>(access: &mut DataAccess<C>) {
    access
        .execute("DROP TABLE IF EXISTS conduit_accounts")
        .await
        .expect("Failed to drop conduit_accounts");
    access
        .execute("CREATE TABLE conduit_accounts (id INTEGER PRIMARY KEY, owner VARCHAR(40))")
        .await
        .expect("Failed to create conduit_accounts");
    let insert = |id: i32| {
        Statement::new("INSERT INTO conduit_accounts (id, owner) VALUES ({0}, {1})")
            .bind(id)
            .bind(format!("owner {}", id))
    };

    // Commit
    let mut transaction = access.begin().await.expect("Could not begin a transaction");
    transaction
        .execute(insert(1))
        .await
        .expect("Failed to insert in the transaction");
    transaction
        .execute(insert(2))
        .await
        .expect("Failed to insert in the transaction");
    transaction
        .commit()
        .await
        .expect("Failed to commit the transaction");
    assert_eq!(count(access).await, 2);

    // Rollback
    let mut transaction = access
        .begin_with(IsolationLevel::Serializable)
        .await
        .expect("Could not begin a serializable transaction");
    transaction
        .execute(insert(3))
        .await
        .expect("Failed to insert in the transaction");
    assert_eq!(count(&mut *transaction).await, 3);
    transaction
        .end()
        .await
        .expect("Failed to roll back the transaction");
    assert_eq!(count(access).await, 2);

    // Dropped without ending
    {
        let mut transaction = access.begin().await.expect("Could not begin a transaction");
        transaction
            .execute(insert(4))
            .await
            .expect("Failed to insert in the transaction");
        transaction.complete().expect("Failed to complete");
    }
    assert!(!access.has_transaction());
    assert_eq!(count(access).await, 3, "A completed dropped scope commits");

    // The context is in use
    access.ensure_open().await.expect("Failed to open");
    let error = access
        .begin()
        .await
        .err()
        .expect("A context already holding its connection cannot start a transaction");
    assert!(matches!(
        data_error(&error),
        Some(DataError::TransactionConflict(..))
    ));
    access.release(true).expect("Failed to release");
    assert_eq!(access.references(), 0);
}
