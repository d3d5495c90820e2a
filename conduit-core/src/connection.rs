use crate::{Command, Driver, Executor, Result};
use std::future::Future;

/// Physical state reported by a connection handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Open,
    Closed,
    /// The connection failed and must be closed before it can be opened again.
    Broken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IsolationLevel {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
    /// Snapshot isolation where supported, the closest level elsewhere.
    Snapshot,
}

/// One connection handle of a backend.
///
/// The handle is reopenable: `open` after `close` establishes a new session.
/// A handle serves one caller at a time, concurrent use goes through separate handles.
pub trait Connection: Executor {
    /// Stable identity of the target database, used to key cached paging templates.
    fn identity(&self) -> &str;

    fn state(&self) -> ConnectionState;

    fn open(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Closes the session. Closing a closed connection does nothing.
    fn close(&mut self) -> Result<()>;

    fn begin(
        &mut self,
        isolation: Option<IsolationLevel>,
    ) -> impl Future<Output = Result<()>> + Send {
        let mut sql = String::new();
        self.driver()
            .sql_writer()
            .write_transaction_begin(&mut sql, isolation);
        execute_statement(self, sql)
    }

    fn commit(&mut self) -> impl Future<Output = Result<()>> + Send {
        let mut sql = String::new();
        self.driver().sql_writer().write_transaction_commit(&mut sql);
        execute_statement(self, sql)
    }

    fn rollback(&mut self) -> impl Future<Output = Result<()>> + Send {
        let mut sql = String::new();
        self.driver().sql_writer().write_transaction_rollback(&mut sql);
        execute_statement(self, sql)
    }
}

fn execute_statement<C: Connection>(
    connection: &mut C,
    sql: String,
) -> impl Future<Output = Result<()>> + Send {
    async move {
        if !sql.is_empty() {
            connection.execute(Command::new(sql)).await?;
        }
        Ok(())
    }
}
