#[cfg(test)]
mod tests {
    use conduit::{
        Binder, Context, PageWindow, PagingCache, Parameters, Settings, Statement, Value, Vendor,
        paging_commands,
    };
    use indoc::indoc;

    #[derive(Parameters)]
    #[conduit(rename_all = "camelCase")]
    struct Search {
        customer_id: i64,
        min_total: f64,
    }

    const SEARCH: &str = indoc! {"
        SELECT id, total
        FROM orders
        WHERE customer = {customerId} AND total >= {MINTOTAL}
        ORDER BY id
    "};

    fn search() -> Statement {
        Statement::named(
            SEARCH,
            &Search {
                customer_id: 3,
                min_total: 9.5,
            },
        )
    }

    #[test]
    fn one_statement_every_vendor() {
        for vendor in Vendor::ALL {
            let command = Binder::new(vendor.sql_writer()).bind(search()).unwrap();
            let prefix = vendor.sql_writer().parameter_prefix();
            assert!(
                command
                    .text
                    .contains(&format!("customer = {prefix}customerId AND total >= {prefix}minTotal")),
                "{vendor}: {}",
                command.text
            );
            assert_eq!(command.parameters.len(), 2);
            assert_eq!(command.parameters[0].name, format!("{prefix}customerId"));
            assert_eq!(command.parameters[1].value, Value::Float64(Some(9.5)));
        }
    }

    #[test]
    fn second_page_per_vendor() {
        let cache = PagingCache::new();
        let window = PageWindow::new(2, 10).unwrap();
        let page = |vendor: Vendor| {
            let writer = vendor.sql_writer();
            let command = Binder::new(writer).bind(search()).unwrap();
            paging_commands(writer, Context::new("db", &cache), &command, window)
                .unwrap()
        };
        let body = "SELECT id, total\nFROM orders\nWHERE customer = :customerId AND total >= :minTotal\nORDER BY id";
        let commands = page(Vendor::PostgreSql);
        assert_eq!(
            commands.page.text,
            format!("SELECT page_result_set.* FROM ({body}) page_result_set LIMIT 10 OFFSET 10")
        );
        assert_eq!(
            commands.count.text,
            "SELECT COUNT(1) FROM (SELECT id, total\nFROM orders\nWHERE customer = :customerId AND total >= :minTotal) AS count_wrapper"
        );
        assert_eq!(commands.count.parameters, commands.page.parameters);

        let commands = page(Vendor::MySql);
        assert!(commands.page.text.ends_with(") page_result_set LIMIT 10,10"));

        let commands = page(Vendor::SqlServer);
        assert!(
            commands
                .page
                .text
                .ends_with("ORDER BY id OFFSET 10 ROWS FETCH NEXT 10 ROWS ONLY")
        );

        let commands = page(Vendor::SqlServerLegacy);
        assert!(commands.page.text.contains("ROW_NUMBER() OVER(ORDER BY id) AS paging_row_number"));
        assert!(commands.page.text.ends_with(
            "WHERE paging_row_number >= 11 AND paging_row_number <= 20 ORDER BY paging_row_number"
        ));
        // The numbered template is cached per connection and query
        assert!(!cache.is_empty());
    }

    #[test]
    fn settings_pick_the_vendor() {
        for (url, vendor) in [
            ("postgres://localhost/shop", Vendor::PostgreSql),
            ("postgresql://localhost/shop", Vendor::PostgreSql),
            ("mysql://localhost/shop", Vendor::MySql),
            ("mssql://localhost/shop", Vendor::SqlServer),
            ("oracle://localhost/shop", Vendor::Oracle),
            ("sqlite://shop.db", Vendor::Sqlite),
        ] {
            assert_eq!(Settings::new(url).unwrap().vendor, vendor, "{url}");
        }
        assert!(Settings::new("ftp://localhost/shop").is_err());
        assert!(Settings::new("not a url").is_err());
    }
}
