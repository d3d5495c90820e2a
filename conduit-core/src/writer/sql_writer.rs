use crate::{
    IsolationLevel, PageWindow, Result, Vendor,
    scan::{split_order_by, trim_statement},
    writer::Context,
};

/// Vendor strategy: parameter syntax, paging rewrites and transaction statements of one backend.
///
/// Strategies are stateless, [`Vendor::sql_writer`] hands out a shared instance.
pub trait SqlWriter: Send + Sync {
    fn vendor(&self) -> Vendor;

    /// Character introducing a parameter marker in command text.
    fn parameter_prefix(&self) -> char;

    /// Emit the marker of a parameter, the prefix is not repeated when `name` already has it.
    fn write_parameter_name(&self, out: &mut String, name: &str) {
        let prefix = self.parameter_prefix();
        if !name.starts_with(prefix) {
            out.push(prefix);
        }
        out.push_str(name);
    }

    fn parameter_name(&self, name: &str) -> String {
        let mut out = String::with_capacity(name.len() + 1);
        self.write_parameter_name(&mut out, name);
        out
    }

    /// Emit the query counting the rows of `sql`, its trailing ORDER BY removed.
    fn write_row_count(&self, out: &mut String, sql: &str) {
        let (body, _) = split_order_by(trim_statement(sql));
        out.push_str("SELECT COUNT(1) FROM (");
        out.push_str(body);
        out.push_str(") AS count_wrapper");
    }

    /// Emit the first page of `sql`. Defaults to the generic page rewrite.
    fn write_first_page(
        &self,
        context: Context,
        out: &mut String,
        sql: &str,
        window: PageWindow,
    ) -> Result<()> {
        self.write_page(context, out, sql, window)
    }

    /// Emit the rows of `window` out of the ordered query `sql`.
    fn write_page(
        &self,
        context: Context,
        out: &mut String,
        sql: &str,
        window: PageWindow,
    ) -> Result<()>;

    /// Emit the isolation level name.
    fn write_isolation_level(&self, out: &mut String, isolation: IsolationLevel) {
        out.push_str(match isolation {
            IsolationLevel::ReadUncommitted => "READ UNCOMMITTED",
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::RepeatableRead | IsolationLevel::Snapshot => "REPEATABLE READ",
            IsolationLevel::Serializable => "SERIALIZABLE",
        });
    }

    /// Emit BEGIN statement.
    fn write_transaction_begin(&self, out: &mut String, isolation: Option<IsolationLevel>) {
        out.push_str("BEGIN");
        if let Some(isolation) = isolation {
            out.push_str(" TRANSACTION ISOLATION LEVEL ");
            self.write_isolation_level(out, isolation);
        }
        out.push(';');
    }

    /// Emit COMMIT statement.
    fn write_transaction_commit(&self, out: &mut String) {
        out.push_str("COMMIT;");
    }

    /// Emit ROLLBACK statement.
    fn write_transaction_rollback(&self, out: &mut String) {
        out.push_str("ROLLBACK;");
    }
}

/// Emit `sql` wrapped as the derived table `page_result_set`, ready for a trailing limit clause.
pub(crate) fn write_page_wrapper(out: &mut String, sql: &str) {
    out.reserve(sql.len() + 64);
    out.push_str("SELECT page_result_set.* FROM (");
    out.push_str(sql);
    out.push_str(") page_result_set");
}
