use crate::{
    Argument, Connection, DataAccess, DataError, Error, FromValue, IsolationLevel,
    PagingResult, Parameters, Result, RowLabeled, RowsAffected, Statement, TransactionScope,
    Value,
    stream::{BoxStream, StreamExt},
};
use tokio::runtime::{Builder, Runtime};

/// Synchronous facade over [`DataAccess`], driving every operation on its own
/// current-thread runtime.
///
/// Meant for code that is not async. Calling it from within a tokio runtime panics.
pub struct BlockingAccess<C: Connection> {
    runtime: Runtime,
    access: DataAccess<C>,
}

impl<C: Connection> BlockingAccess<C> {
    pub fn new(access: DataAccess<C>) -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::new(e).context("While building the blocking runtime"))?;
        Ok(Self { runtime, access })
    }

    pub fn access(&self) -> &DataAccess<C> {
        &self.access
    }

    pub fn into_inner(self) -> DataAccess<C> {
        self.access
    }

    pub fn begin(&mut self) -> Result<BlockingScope<'_, C>> {
        let scope = self.runtime.block_on(self.access.begin())?;
        Ok(BlockingScope {
            runtime: &self.runtime,
            scope: Some(scope),
        })
    }

    pub fn begin_with(&mut self, isolation: IsolationLevel) -> Result<BlockingScope<'_, C>> {
        let scope = self.runtime.block_on(self.access.begin_with(isolation))?;
        Ok(BlockingScope {
            runtime: &self.runtime,
            scope: Some(scope),
        })
    }

    pub fn close(&mut self) -> Result<()> {
        self.runtime.block_on(self.access.close())
    }
}

/// Blocking operations, shared by [`BlockingAccess`] and [`BlockingScope`].
pub trait BlockingExecutor {
    type Connection: Connection;

    fn parts(&mut self) -> Result<(&Runtime, &mut DataAccess<Self::Connection>)>;

    fn ensure_open(&mut self) -> Result<()> {
        let (runtime, access) = self.parts()?;
        runtime.block_on(access.ensure_open())
    }

    fn release(&mut self, force_close: bool) -> Result<()> {
        let (_, access) = self.parts()?;
        access.release(force_close)
    }

    fn execute(&mut self, statement: impl Into<Statement>) -> Result<RowsAffected> {
        let (runtime, access) = self.parts()?;
        runtime.block_on(access.execute(statement))
    }

    fn scalar(&mut self, statement: impl Into<Statement>) -> Result<Value> {
        let (runtime, access) = self.parts()?;
        runtime.block_on(access.scalar(statement))
    }

    fn scalar_as<T: FromValue>(&mut self, statement: impl Into<Statement>) -> Result<Option<T>> {
        let (runtime, access) = self.parts()?;
        runtime.block_on(access.scalar_as(statement))
    }

    /// Iterator over the rows of `statement`, each one fetched on demand.
    fn cursor(&mut self, statement: impl Into<Statement>) -> Result<BlockingCursor<'_>> {
        let statement = statement.into();
        let (runtime, access) = self.parts()?;
        Ok(BlockingCursor {
            runtime,
            rows: access.cursor(statement).boxed(),
        })
    }

    fn fetch_all<T>(
        &mut self,
        statement: impl Into<Statement>,
        map: impl FnMut(RowLabeled) -> Result<T>,
    ) -> Result<Vec<T>> {
        let (runtime, access) = self.parts()?;
        runtime.block_on(access.fetch_all(statement, map))
    }

    fn fetch_into<T>(
        &mut self,
        statement: impl Into<Statement>,
        container: T,
        fill: impl FnMut(&mut T, RowLabeled) -> Result<()>,
    ) -> Result<T> {
        let (runtime, access) = self.parts()?;
        runtime.block_on(access.fetch_into(statement, container, fill))
    }

    fn row_count(&mut self, statement: impl Into<Statement>) -> Result<u64> {
        let (runtime, access) = self.parts()?;
        runtime.block_on(access.row_count(statement))
    }

    fn fetch_page<T>(
        &mut self,
        statement: impl Into<Statement>,
        index: u32,
        size: u32,
        map: impl FnMut(RowLabeled) -> Result<T>,
    ) -> Result<PagingResult<Vec<T>>> {
        let (runtime, access) = self.parts()?;
        runtime.block_on(access.fetch_page(statement, index, size, map))
    }

    fn fetch_page_into<T>(
        &mut self,
        statement: impl Into<Statement>,
        index: u32,
        size: u32,
        container: T,
        fill: impl FnMut(&mut T, RowLabeled) -> Result<()>,
    ) -> Result<PagingResult<T>> {
        let (runtime, access) = self.parts()?;
        runtime.block_on(access.fetch_page_into(statement, index, size, container, fill))
    }

    fn execute_many<R, I>(&mut self, text: &str, rows: I) -> Result<RowsAffected>
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = Argument>,
    {
        let (runtime, access) = self.parts()?;
        runtime.block_on(access.execute_many(text, rows))
    }

    fn execute_many_named<P, I>(&mut self, text: &str, rows: I) -> Result<RowsAffected>
    where
        I: IntoIterator<Item = P>,
        P: Parameters,
    {
        let (runtime, access) = self.parts()?;
        runtime.block_on(access.execute_many_named(text, rows))
    }
}

impl<C: Connection> BlockingExecutor for BlockingAccess<C> {
    type Connection = C;

    fn parts(&mut self) -> Result<(&Runtime, &mut DataAccess<C>)> {
        Ok((&self.runtime, &mut self.access))
    }
}

/// Blocking transaction scope, ends the transaction when dropped.
pub struct BlockingScope<'a, C: Connection> {
    runtime: &'a Runtime,
    scope: Option<TransactionScope<'a, C>>,
}

impl<'a, C: Connection> BlockingScope<'a, C> {
    fn scope(&mut self) -> Result<&mut TransactionScope<'a, C>> {
        self.scope
            .as_mut()
            .ok_or_else(|| DataError::resource_state("Transaction scope has already ended"))
    }

    pub fn complete(&mut self) -> Result<()> {
        self.scope()?.complete()
    }

    pub fn end(mut self) -> Result<()> {
        match self.scope.take() {
            Some(scope) => self.runtime.block_on(scope.end()),
            None => Ok(()),
        }
    }

    pub fn commit(mut self) -> Result<()> {
        self.complete()?;
        self.end()
    }

    pub fn rollback(self) -> Result<()> {
        self.end()
    }
}

impl<'a, C: Connection> BlockingExecutor for BlockingScope<'a, C> {
    type Connection = C;

    fn parts(&mut self) -> Result<(&Runtime, &mut DataAccess<C>)> {
        let runtime = self.runtime;
        Ok((runtime, &mut **self.scope()?))
    }
}

impl<'a, C: Connection> Drop for BlockingScope<'a, C> {
    fn drop(&mut self) {
        if let Some(scope) = self.scope.take()
            && let Err(e) = self.runtime.block_on(scope.end())
        {
            log::error!("{:#}", e.context("While ending a dropped transaction scope"));
        }
    }
}

/// Rows of a query, pulled one at a time on the blocking runtime.
pub struct BlockingCursor<'a> {
    runtime: &'a Runtime,
    rows: BoxStream<'a, Result<RowLabeled>>,
}

impl Iterator for BlockingCursor<'_> {
    type Item = Result<RowLabeled>;

    fn next(&mut self) -> Option<Self::Item> {
        self.runtime.block_on(self.rows.next())
    }
}
