use crate::{
    IsolationLevel, PageWindow, Result, SqlWriter, Vendor,
    scan::{require_order_by, trim_statement},
    writer::{Context, write_page_wrapper},
};
use std::fmt::Write;

/// MySQL / MariaDB: `LIMIT offset,count` paging.
#[derive(Default, Debug, Clone, Copy)]
pub struct MySqlWriter {}

impl SqlWriter for MySqlWriter {
    fn vendor(&self) -> Vendor {
        Vendor::MySql
    }

    fn parameter_prefix(&self) -> char {
        '?'
    }

    fn write_page(
        &self,
        _context: Context,
        out: &mut String,
        sql: &str,
        window: PageWindow,
    ) -> Result<()> {
        let sql = trim_statement(sql);
        require_order_by(sql)?;
        write_page_wrapper(out, sql);
        let _ = write!(out, " LIMIT {},{}", window.offset(), window.size);
        Ok(())
    }

    fn write_transaction_begin(&self, out: &mut String, isolation: Option<IsolationLevel>) {
        if let Some(isolation) = isolation {
            out.push_str("SET TRANSACTION ISOLATION LEVEL ");
            self.write_isolation_level(out, isolation);
            out.push_str(";\n");
        }
        out.push_str("START TRANSACTION;");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PagingCache;

    #[test]
    fn limit_takes_offset_then_count() {
        let cache = PagingCache::new();
        let mut out = String::new();
        MySqlWriter::default()
            .write_page(
                Context::new("mysql://db", &cache),
                &mut out,
                "SELECT * FROM books ORDER BY title",
                PageWindow::new(3, 20).unwrap(),
            )
            .unwrap();
        assert_eq!(
            out,
            "SELECT page_result_set.* FROM (SELECT * FROM books ORDER BY title) page_result_set LIMIT 40,20"
        );
    }

    #[test]
    fn first_page_is_a_regular_page() {
        let cache = PagingCache::new();
        let mut out = String::new();
        MySqlWriter::default()
            .write_first_page(
                Context::new("mysql://db", &cache),
                &mut out,
                "SELECT * FROM books ORDER BY title",
                PageWindow::new(1, 20).unwrap(),
            )
            .unwrap();
        assert!(out.ends_with(" LIMIT 0,20"));
    }
}
