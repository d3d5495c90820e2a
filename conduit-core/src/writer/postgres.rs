use crate::{
    PageWindow, Result, SqlWriter, Vendor,
    scan::{require_order_by, trim_statement},
    writer::{Context, write_page_wrapper},
};
use std::fmt::Write;

/// PostgreSQL: `LIMIT count OFFSET offset` paging.
#[derive(Default, Debug, Clone, Copy)]
pub struct PostgresWriter {}

impl SqlWriter for PostgresWriter {
    fn vendor(&self) -> Vendor {
        Vendor::PostgreSql
    }

    fn parameter_prefix(&self) -> char {
        ':'
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
        let _ = write!(out, " LIMIT {} OFFSET {}", window.size, window.offset());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{IsolationLevel, PagingCache};

    #[test]
    fn limit_takes_count_then_offset() {
        let cache = PagingCache::new();
        let mut out = String::new();
        PostgresWriter::default()
            .write_page(
                Context::new("postgres://db", &cache),
                &mut out,
                "SELECT * FROM books ORDER BY title;",
                PageWindow::new(3, 20).unwrap(),
            )
            .unwrap();
        assert_eq!(
            out,
            "SELECT page_result_set.* FROM (SELECT * FROM books ORDER BY title) page_result_set LIMIT 20 OFFSET 40"
        );
    }

    #[test]
    fn begin_with_isolation() {
        let mut out = String::new();
        PostgresWriter::default().write_transaction_begin(&mut out, Some(IsolationLevel::Serializable));
        assert_eq!(out, "BEGIN TRANSACTION ISOLATION LEVEL SERIALIZABLE;");
    }
}
