use crate::{
    IsolationLevel, PageWindow, Result, SqlWriter, Vendor,
    scan::{require_order_by, split_order_by, trim_statement},
    writer::Context,
};
use std::fmt::Write;

/// Oracle: paging through `ROWNUM` over the ordered query.
#[derive(Default, Debug, Clone, Copy)]
pub struct OracleWriter {}

impl OracleWriter {
    /// Numbered subquery wrapping `sql`, open on the lower bound of the row filter.
    pub fn numbered_template(sql: &str) -> Result<String> {
        let sql = trim_statement(sql);
        require_order_by(sql)?;
        Ok(format!(
            "SELECT page_result_set.* FROM (SELECT page_temp.*, ROWNUM AS paging_row_number FROM ({}) page_temp) page_result_set WHERE paging_row_number >= ",
            sql
        ))
    }
}

impl SqlWriter for OracleWriter {
    fn vendor(&self) -> Vendor {
        Vendor::Oracle
    }

    fn parameter_prefix(&self) -> char {
        ':'
    }

    fn write_row_count(&self, out: &mut String, sql: &str) {
        let (body, _) = split_order_by(trim_statement(sql));
        out.push_str("SELECT COUNT(1) FROM (");
        out.push_str(body);
        out.push_str(") count_wrapper");
    }

    fn write_first_page(
        &self,
        _context: Context,
        out: &mut String,
        sql: &str,
        window: PageWindow,
    ) -> Result<()> {
        let sql = trim_statement(sql);
        require_order_by(sql)?;
        let _ = write!(
            out,
            "SELECT * FROM ({}) page_result_set WHERE ROWNUM <= {}",
            sql,
            window.row_end()
        );
        Ok(())
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
            "{} AND paging_row_number <= {}",
            window.row_start(),
            window.row_end()
        );
        Ok(())
    }

    fn write_isolation_level(&self, out: &mut String, isolation: IsolationLevel) {
        out.push_str(match isolation {
            IsolationLevel::ReadUncommitted | IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::RepeatableRead
            | IsolationLevel::Serializable
            | IsolationLevel::Snapshot => "SERIALIZABLE",
        });
    }

    /// Transactions start implicitly, only an explicit isolation level needs a statement.
    fn write_transaction_begin(&self, out: &mut String, isolation: Option<IsolationLevel>) {
        if let Some(isolation) = isolation {
            out.push_str("SET TRANSACTION ISOLATION LEVEL ");
            self.write_isolation_level(out, isolation);
        }
    }

    fn write_transaction_commit(&self, out: &mut String) {
        out.push_str("COMMIT");
    }

    fn write_transaction_rollback(&self, out: &mut String) {
        out.push_str("ROLLBACK");
    }
}
