use crate::{
    DataError, IsolationLevel, PageWindow, Result, SqlWriter, Vendor,
    scan::{find_keyword, leading_keyword, require_order_by, split_order_by, trim_statement},
    writer::Context,
};
use std::fmt::Write;

/// SQL Server 2012 and later: OFFSET / FETCH paging.
#[derive(Default, Debug, Clone, Copy)]
pub struct SqlServerWriter {}

/// SQL Server before 2012: paging through `ROW_NUMBER()`.
#[derive(Default, Debug, Clone, Copy)]
pub struct SqlServerLegacyWriter {}

/// Rewrites `SELECT` into `SELECT TOP(rowEnd)`, after `DISTINCT` / `ALL` when present.
fn write_top(out: &mut String, sql: &str, window: PageWindow) -> Result<()> {
    let sql = trim_statement(sql);
    require_order_by(sql)?;
    let Some(select) = find_keyword(sql, "SELECT") else {
        return Err(DataError::format("Paging requires a SELECT statement"));
    };
    let mut position = select.end;
    if let Some(len) = leading_keyword(&sql[position..], "DISTINCT")
        .or_else(|| leading_keyword(&sql[position..], "ALL"))
    {
        position += len;
    }
    out.reserve(sql.len() + 16);
    out.push_str(&sql[..position]);
    let _ = write!(out, " TOP({})", window.row_end());
    out.push_str(&sql[position..]);
    Ok(())
}

fn write_transaction_begin(
    out: &mut String,
    writer: &dyn SqlWriter,
    isolation: Option<IsolationLevel>,
) {
    if let Some(isolation) = isolation {
        out.push_str("SET TRANSACTION ISOLATION LEVEL ");
        writer.write_isolation_level(out, isolation);
        out.push_str(";\n");
    }
    out.push_str("BEGIN TRANSACTION;");
}

fn write_isolation_level(out: &mut String, isolation: IsolationLevel) {
    out.push_str(match isolation {
        IsolationLevel::ReadUncommitted => "READ UNCOMMITTED",
        IsolationLevel::ReadCommitted => "READ COMMITTED",
        IsolationLevel::RepeatableRead => "REPEATABLE READ",
        IsolationLevel::Serializable => "SERIALIZABLE",
        IsolationLevel::Snapshot => "SNAPSHOT",
    });
}

impl SqlWriter for SqlServerWriter {
    fn vendor(&self) -> Vendor {
        Vendor::SqlServer
    }

    fn parameter_prefix(&self) -> char {
        '@'
    }

    fn write_first_page(
        &self,
        _context: Context,
        out: &mut String,
        sql: &str,
        window: PageWindow,
    ) -> Result<()> {
        write_top(out, sql, window)
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
        out.reserve(sql.len() + 48);
        out.push_str(sql);
        let _ = write!(
            out,
            " OFFSET {} ROWS FETCH NEXT {} ROWS ONLY",
            window.offset(),
            window.size
        );
        Ok(())
    }

    fn write_isolation_level(&self, out: &mut String, isolation: IsolationLevel) {
        write_isolation_level(out, isolation);
    }

    fn write_transaction_begin(&self, out: &mut String, isolation: Option<IsolationLevel>) {
        write_transaction_begin(out, self, isolation);
    }

    fn write_transaction_commit(&self, out: &mut String) {
        out.push_str("COMMIT TRANSACTION;");
    }

    fn write_transaction_rollback(&self, out: &mut String) {
        out.push_str("ROLLBACK TRANSACTION;");
    }
}

impl SqlServerLegacyWriter {
    /// Numbered subquery wrapping `sql`, open on the lower bound of the row filter.
    pub fn numbered_template(sql: &str) -> Result<String> {
        let sql = trim_statement(sql);
        let (body, order) = split_order_by(sql);
        let Some(order) = order else {
            return Err(DataError::format(
                "Paging requires an explicit ordering: the query has no top-level ORDER BY",
            ));
        };
        let Some(from) = find_keyword(body, "FROM") else {
            return Err(DataError::format("Paging requires a query with a FROM clause"));
        };
        Ok(format!(
            "SELECT page_result_set.* FROM ({}, ROW_NUMBER() OVER({}) AS paging_row_number {}) page_result_set WHERE paging_row_number >= ",
            body[..from.start].trim_end(),
            order,
            &body[from.start..],
        ))
    }
}

impl SqlWriter for SqlServerLegacyWriter {
    fn vendor(&self) -> Vendor {
        Vendor::SqlServerLegacy
    }

    fn parameter_prefix(&self) -> char {
        '@'
    }

    fn write_first_page(
        &self,
        _context: Context,
        out: &mut String,
        sql: &str,
        window: PageWindow,
    ) -> Result<()> {
        write_top(out, sql, window)
    }

    fn write_page(
        &self,
        context: Context,
        out: &mut String,
        sql: &str,
        window: PageWindow,
    ) -> Result<()> {
        let template = context
            .cache
            .get_or_try_insert(context.connection, sql, || Self::numbered_template(sql))?;
        out.push_str(&template);
        let _ = write!(
            out,
            "{} AND paging_row_number <= {} ORDER BY paging_row_number",
            window.row_start(),
            window.row_end()
        );
        Ok(())
    }

    fn write_isolation_level(&self, out: &mut String, isolation: IsolationLevel) {
        write_isolation_level(out, isolation);
    }

    fn write_transaction_begin(&self, out: &mut String, isolation: Option<IsolationLevel>) {
        write_transaction_begin(out, self, isolation);
    }

    fn write_transaction_commit(&self, out: &mut String) {
        out.push_str("COMMIT TRANSACTION;");
    }

    fn write_transaction_rollback(&self, out: &mut String) {
        out.push_str("ROLLBACK TRANSACTION;");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PagingCache;

    #[test]
    fn first_page_uses_top() {
        let cache = PagingCache::new();
        let context = Context::new("server=a", &cache);
        let mut out = String::new();
        SqlServerWriter::default()
            .write_first_page(
                context,
                &mut out,
                "SELECT DISTINCT name FROM users ORDER BY name;",
                PageWindow::new(1, 25).unwrap(),
            )
            .unwrap();
        assert_eq!(out, "SELECT DISTINCT TOP(25) name FROM users ORDER BY name");
    }

    #[test]
    fn page_uses_offset_fetch() {
        let cache = PagingCache::new();
        let mut out = String::new();
        SqlServerWriter::default()
            .write_page(
                Context::new("server=a", &cache),
                &mut out,
                "SELECT * FROM users ORDER BY id",
                PageWindow::new(3, 20).unwrap(),
            )
            .unwrap();
        assert_eq!(
            out,
            "SELECT * FROM users ORDER BY id OFFSET 40 ROWS FETCH NEXT 20 ROWS ONLY"
        );
        assert!(cache.is_empty());
    }

    #[test]
    fn legacy_page_numbers_rows_and_caches_the_template() {
        let cache = PagingCache::new();
        let context = Context::new("server=a", &cache);
        let writer = SqlServerLegacyWriter::default();
        let sql = "SELECT u.id, u.name FROM users u WHERE u.active = @Active ORDER BY u.name, u.id";
        let mut out = String::new();
        writer
            .write_page(context, &mut out, sql, PageWindow::new(2, 10).unwrap())
            .unwrap();
        assert_eq!(
            out,
            "SELECT page_result_set.* FROM (SELECT u.id, u.name, ROW_NUMBER() OVER(ORDER BY u.name, u.id) AS paging_row_number \
             FROM users u WHERE u.active = @Active) page_result_set WHERE paging_row_number >= 11 \
             AND paging_row_number <= 20 ORDER BY paging_row_number"
        );
        assert_eq!(cache.len(), 1);
        assert!(cache.get("server=a", sql).is_some());
        assert!(cache.get("server=b", sql).is_none());

        let mut out = String::new();
        writer
            .write_page(context, &mut out, sql, PageWindow::new(3, 10).unwrap())
            .unwrap();
        assert!(out.ends_with(">= 21 AND paging_row_number <= 30 ORDER BY paging_row_number"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn unordered_queries_are_rejected() {
        let cache = PagingCache::new();
        let context = Context::new("server=a", &cache);
        let window = PageWindow::new(2, 10).unwrap();
        let mut out = String::new();
        assert!(
            SqlServerLegacyWriter::default()
                .write_page(context, &mut out, "SELECT * FROM users", window)
                .is_err()
        );
        assert!(
            SqlServerWriter::default()
                .write_first_page(context, &mut out, "SELECT * FROM users", window)
                .is_err()
        );
        assert!(cache.is_empty());
    }

    #[test]
    fn transaction_statements() {
        let writer = SqlServerWriter::default();
        let mut out = String::new();
        writer.write_transaction_begin(&mut out, Some(IsolationLevel::Snapshot));
        assert_eq!(
            out,
            "SET TRANSACTION ISOLATION LEVEL SNAPSHOT;\nBEGIN TRANSACTION;"
        );
    }
}
