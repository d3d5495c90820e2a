use crate::{
    IsolationLevel, PageWindow, Result, SqlWriter, Vendor,
    scan::{require_order_by, trim_statement},
    writer::{Context, write_page_wrapper},
};
use std::fmt::Write;

/// SQLite: `LIMIT count OFFSET offset` paging.
#[derive(Default, Debug, Clone, Copy)]
pub struct SqliteWriter {}

impl SqlWriter for SqliteWriter {
    fn vendor(&self) -> Vendor {
        Vendor::Sqlite
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

    /// Transactions are always serializable, the level is not configurable per transaction.
    fn write_transaction_begin(&self, out: &mut String, isolation: Option<IsolationLevel>) {
        if let Some(isolation) = isolation
            && isolation != IsolationLevel::Serializable
        {
            log::warn!(
                "SQLite transactions are serializable, ignoring isolation level {:?}",
                isolation
            );
        }
        out.push_str("BEGIN;");
    }
}
