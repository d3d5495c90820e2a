#[cfg(test)]
mod tests {
    use conduit::{FromRow, Parameters, RowLabeled, Value};
    use rust_decimal::Decimal;
    use time::macros::date;
    use uuid::Uuid;

    #[derive(Parameters, FromRow, Debug, PartialEq)]
    struct Order {
        id: i64,
        #[conduit(name = "customer_name")]
        customer: String,
        total: Option<Decimal>,
        placed: time::Date,
        #[conduit(ignore)]
        notes: Vec<String>,
    }

    #[derive(Parameters, FromRow, Debug, PartialEq)]
    #[conduit(rename_all = "PascalCase")]
    struct Shipment {
        shipment_id: Uuid,
        r#type: String,
        #[conduit(name = "weight_kg")]
        weight: f64,
    }

    #[derive(Parameters)]
    #[conduit(rename_all = "SCREAMING_SNAKE_CASE")]
    struct Filter {
        min_total: i32,
        only_open: bool,
    }

    fn row(names: &[&str], values: Vec<Value>) -> RowLabeled {
        RowLabeled::new(
            names.iter().map(|v| v.to_string()).collect(),
            values.into(),
        )
    }

    #[test]
    fn parameters_follow_field_order_and_names() {
        let order = Order {
            id: 7,
            customer: "Ada".into(),
            total: None,
            placed: date!(2024 - 03 - 01),
            notes: vec!["fragile".into()],
        };
        assert_eq!(
            order.parameters(),
            [
                ("id".to_string(), Value::Int64(Some(7))),
                ("customer_name".to_string(), Value::Varchar(Some("Ada".into()))),
                ("total".to_string(), Value::Decimal(None)),
                ("placed".to_string(), Value::Date(Some(date!(2024 - 03 - 01)))),
            ]
        );
    }

    #[test]
    fn rename_all_applies_to_every_field_but_explicit_names() {
        let id = Uuid::nil();
        let shipment = Shipment {
            shipment_id: id,
            r#type: "express".into(),
            weight: 2.5,
        };
        let names = shipment
            .parameters()
            .into_iter()
            .map(|(k, _)| k)
            .collect::<Vec<_>>();
        assert_eq!(names, ["ShipmentId", "Type", "weight_kg"]);
        let names = Filter {
            min_total: 10,
            only_open: true,
        }
        .parameters()
        .into_iter()
        .map(|(k, _)| k)
        .collect::<Vec<_>>();
        assert_eq!(names, ["MIN_TOTAL", "ONLY_OPEN"]);
    }

    #[test]
    fn from_row_reads_named_columns() {
        let order = Order::from_row(row(
            &["placed", "total", "customer_name", "id"],
            vec![
                Value::Date(Some(date!(2024 - 03 - 01))),
                Value::Decimal(Some(Decimal::new(1999, 2))),
                Value::Varchar(Some("Ada".into())),
                Value::Int32(Some(7)),
            ],
        ))
        .unwrap();
        assert_eq!(
            order,
            Order {
                id: 7,
                customer: "Ada".into(),
                total: Some(Decimal::new(1999, 2)),
                placed: date!(2024 - 03 - 01),
                notes: Vec::new(),
            }
        );

        let shipment = Shipment::from_row(row(
            &["ShipmentId", "Type", "weight_kg"],
            vec![
                Value::Uuid(Some(Uuid::nil())),
                Value::Varchar(Some("ground".into())),
                Value::Float64(Some(12.0)),
            ],
        ))
        .unwrap();
        assert_eq!(shipment.r#type, "ground");
        assert_eq!(shipment.weight, 12.0);
    }

    #[test]
    fn from_row_fails_on_missing_columns() {
        let result = Order::from_row(row(&["id"], vec![Value::Int64(Some(1))]));
        assert!(result.is_err());
        let result = Shipment::from_row(row(
            &["ShipmentId", "Type", "weight_kg"],
            vec![
                Value::Varchar(Some("not a uuid".into())),
                Value::Varchar(Some("ground".into())),
                Value::Float64(Some(12.0)),
            ],
        ));
        assert!(result.is_err());
    }
}
