use conduit::{Connection, DataAccess, Parameters, args};

#[derive(Parameters)]
#[conduit(rename_all = "PascalCase")]
struct Item {
    item_id: i32,
    label: String,
}

pub async fn bulk<C: Connection>(access: &mut DataAccess<C>) {
    access
        .execute("DROP TABLE IF EXISTS conduit_items")
        .await
        .expect("Failed to drop conduit_items");
    access
        .execute("CREATE TABLE conduit_items (item_id INTEGER PRIMARY KEY, label VARCHAR(40))")
        .await
        .expect("Failed to create conduit_items");

    let affected = access
        .execute_many(
            "INSERT INTO conduit_items (item_id, label) VALUES ({0}, {1})",
            [args![1, "one"], args![], args![2, "two"], args![3, "three"]],
        )
        .await
        .expect("Failed to insert positional rows");
    assert_eq!(affected.rows_affected, 3);

    let items = [
        Item {
            item_id: 4,
            label: "four".into(),
        },
        Item {
            item_id: 5,
            label: "five".into(),
        },
    ];
    let affected = access
        .execute_many_named(
            "INSERT INTO conduit_items (item_id, label) VALUES ({ItemId}, {Label})",
            &items,
        )
        .await
        .expect("Failed to insert named rows");
    assert_eq!(affected.rows_affected, 2);

    let duplicated = [
        Item {
            item_id: 10,
            label: "ten".into(),
        },
        Item {
            item_id: 1,
            label: "one again".into(),
        },
    ];
    assert!(
        access
            .execute_many_named(
                "INSERT INTO conduit_items (item_id, label) VALUES ({ItemId}, {Label})",
                &duplicated,
            )
            .await
            .is_err(),
        "A duplicated key must fail the batch"
    );
    let count = access
        .scalar_as::<i64>("SELECT COUNT(*) FROM conduit_items")
        .await
        .expect("Failed to count the items");
    assert_eq!(count, Some(5), "The failed batch must be rolled back");
    assert!(!access.has_transaction());
    assert_eq!(access.references(), 0);
}
