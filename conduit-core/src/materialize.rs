use crate::{
    Argument, Command, Connection, DataAccess, DataError, FromValue, PageWindow,
    PagingResult, Parameters, Result, RowLabeled, RowsAffected, Statement, Value,
    paging::{paging_commands, row_count_command},
    stream::{Stream, TryStreamExt},
};
use async_stream::try_stream;
use std::pin::pin;

impl<C: Connection> DataAccess<C> {
    /// Runs `statement` and returns the affected rows.
    pub async fn execute(&mut self, statement: impl Into<Statement>) -> Result<RowsAffected> {
        let command = self.prepare(statement)?;
        self.execute_command(command).await
    }

    /// Runs `statement` and returns the first column of the first row, `Value::Null` when empty.
    pub async fn scalar(&mut self, statement: impl Into<Statement>) -> Result<Value> {
        let command = self.prepare(statement)?;
        self.scalar_command(command).await
    }

    /// Typed variant of [`DataAccess::scalar`], `None` when the result is null.
    pub async fn scalar_as<T: FromValue>(
        &mut self,
        statement: impl Into<Statement>,
    ) -> Result<Option<T>> {
        let value = self.scalar(statement).await?;
        if value.is_null() {
            return Ok(None);
        }
        T::try_from_value(value).map(Some)
    }

    /// Streams the rows of `statement`.
    ///
    /// The connection stays referenced until the stream is dropped.
    pub fn cursor(
        &mut self,
        statement: impl Into<Statement>,
    ) -> impl Stream<Item = Result<RowLabeled>> + Send {
        let statement = statement.into();
        try_stream! {
            let command = self.prepare(statement)?;
            let mut lease = self.lease().await?;
            let mut rows = pin!(lease.connection().fetch(command));
            while let Some(row) = rows.try_next().await? {
                yield row;
            }
        }
    }

    /// Collects the rows of `statement` through `map`.
    pub async fn fetch_all<T>(
        &mut self,
        statement: impl Into<Statement>,
        map: impl FnMut(RowLabeled) -> Result<T>,
    ) -> Result<Vec<T>> {
        let command = self.prepare(statement)?;
        self.fetch_command(command, Vec::new(), collect_into(map))
            .await
    }

    /// Folds the rows of `statement` into `container`.
    pub async fn fetch_into<T>(
        &mut self,
        statement: impl Into<Statement>,
        container: T,
        fill: impl FnMut(&mut T, RowLabeled) -> Result<()>,
    ) -> Result<T> {
        let command = self.prepare(statement)?;
        self.fetch_command(command, container, fill).await
    }

    /// Number of rows `statement` returns, its ordering dropped.
    pub async fn row_count(&mut self, statement: impl Into<Statement>) -> Result<u64> {
        let command = self.prepare(statement)?;
        let count = row_count_command(self.sql_writer(), &command);
        let value = self.scalar_command(count).await?;
        count_of(value)
    }

    /// One page of the ordered `statement`, with the totals of the whole query.
    ///
    /// `index` is 1-based. The query must end with an ORDER BY, it decides which rows land on the page.
    pub async fn fetch_page<T>(
        &mut self,
        statement: impl Into<Statement>,
        index: u32,
        size: u32,
        map: impl FnMut(RowLabeled) -> Result<T>,
    ) -> Result<PagingResult<Vec<T>>> {
        self.fetch_page_into(statement, index, size, Vec::new(), collect_into(map))
            .await
    }

    /// Folding variant of [`DataAccess::fetch_page`].
    pub async fn fetch_page_into<T>(
        &mut self,
        statement: impl Into<Statement>,
        index: u32,
        size: u32,
        container: T,
        mut fill: impl FnMut(&mut T, RowLabeled) -> Result<()>,
    ) -> Result<PagingResult<T>> {
        let window = PageWindow::new(index, size)?;
        let command = self.prepare(statement)?;
        let commands = paging_commands(
            self.sql_writer(),
            self.paging_context(),
            &command,
            window,
        )?;
        let mut lease = self.lease().await?;
        let connection = lease.connection();
        let row_count = count_of(connection.scalar(commands.count).await?)?;
        let mut container = container;
        {
            let mut rows = pin!(connection.fetch(commands.page));
            while let Some(row) = rows.try_next().await? {
                fill(&mut container, row)?;
            }
        }
        Ok(PagingResult::new(container, row_count, window.size))
    }

    /// Streaming variant of [`DataAccess::fetch_page`], the totals are known before the first row.
    pub async fn cursor_page(
        &mut self,
        statement: impl Into<Statement>,
        index: u32,
        size: u32,
    ) -> Result<PagingResult<impl Stream<Item = Result<RowLabeled>> + Send>> {
        let window = PageWindow::new(index, size)?;
        let command = self.prepare(statement)?;
        let commands = paging_commands(
            self.sql_writer(),
            self.paging_context(),
            &command,
            window,
        )?;
        let row_count = {
            let mut lease = self.lease().await?;
            count_of(lease.connection().scalar(commands.count).await?)?
        };
        let page = commands.page;
        let rows = try_stream! {
            let mut lease = self.lease().await?;
            let mut rows = pin!(lease.connection().fetch(page));
            while let Some(row) = rows.try_next().await? {
                yield row;
            }
        };
        Ok(PagingResult::new(rows, row_count, window.size))
    }

    /// Runs `text` once per row of positional values, summing the affected rows.
    ///
    /// The first non empty row fixes the parameters, the following ones only
    /// overwrite their values. All rows are validated before anything runs.
    /// Without an active local transaction the batch runs in one.
    pub async fn execute_many<R, I>(&mut self, text: &str, rows: I) -> Result<RowsAffected>
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = Argument>,
    {
        let mut rows = rows
            .into_iter()
            .map(|row| row.into_iter().collect::<Vec<_>>())
            .filter(|row| !row.is_empty());
        let Some(first) = rows.next() else {
            return Ok(RowsAffected::default());
        };
        let command = self.prepare(Statement::positional(text, first))?;
        let mut batch = Vec::new();
        for (i, row) in rows.enumerate() {
            if row.len() != command.parameters.len() {
                return Err(DataError::argument(format!(
                    "Row {} has {} values while the first row has {}",
                    i + 1,
                    row.len(),
                    command.parameters.len()
                )));
            }
            batch.push(row.into_iter().map(Argument::into_value).collect());
        }
        self.execute_batch(command, batch).await
    }

    /// Runs `text` once per row of named values, summing the affected rows.
    ///
    /// The names of the first row fix the parameters, the following rows are
    /// matched by name, case-insensitively.
    pub async fn execute_many_named<P, I>(&mut self, text: &str, rows: I) -> Result<RowsAffected>
    where
        I: IntoIterator<Item = P>,
        P: Parameters,
    {
        let mut rows = rows.into_iter();
        let Some(first) = rows.next() else {
            return Ok(RowsAffected::default());
        };
        let names: Vec<String> = first.parameters().into_iter().map(|(k, _)| k).collect();
        let command = self.prepare(Statement::named(text, &first))?;
        let mut batch = Vec::new();
        for (i, row) in rows.enumerate() {
            let mut values = row.parameters();
            let row_values = names
                .iter()
                .map(|name| {
                    values
                        .iter()
                        .position(|(k, _)| k.eq_ignore_ascii_case(name))
                        .map(|p| values.swap_remove(p).1)
                        .ok_or_else(|| {
                            DataError::argument(format!(
                                "Row {} does not bind the parameter `{}` of the first row",
                                i + 1,
                                name
                            ))
                        })
                })
                .collect::<Result<Vec<_>>>()?;
            batch.push(row_values);
        }
        self.execute_batch(command, batch).await
    }

    async fn execute_batch(
        &mut self,
        command: Command,
        rows: Vec<Vec<Value>>,
    ) -> Result<RowsAffected> {
        if self.has_transaction() {
            return self.run_batch(command, rows).await;
        }
        let mut transaction = self.begin().await?;
        let result = transaction.run_batch(command, rows).await;
        match result {
            Ok(affected) => {
                transaction.complete()?;
                transaction.end().await?;
                Ok(affected)
            }
            Err(e) => {
                if let Err(rollback) = transaction.end().await {
                    log::error!("{:#}", rollback.context("While rolling back a failed batch"));
                }
                Err(e)
            }
        }
    }

    async fn run_batch(
        &mut self,
        mut command: Command,
        rows: Vec<Vec<Value>>,
    ) -> Result<RowsAffected> {
        self.bind_to_command(&mut command);
        let mut lease = self.lease().await?;
        let connection = lease.connection();
        let mut total = connection.execute(command.clone()).await?;
        for (i, values) in rows.into_iter().enumerate() {
            command.rebind(values)?;
            let affected = connection
                .execute(command.clone())
                .await
                .map_err(|e| e.context(format!("While executing row {} of the batch", i + 1)))?;
            total.extend([affected]);
        }
        log::debug!("Batch affected {} rows", total.rows_affected);
        Ok(total)
    }

    async fn execute_command(&mut self, command: Command) -> Result<RowsAffected> {
        let mut lease = self.lease().await?;
        lease.connection().execute(command).await
    }

    async fn scalar_command(&mut self, command: Command) -> Result<Value> {
        let mut lease = self.lease().await?;
        lease.connection().scalar(command).await
    }

    async fn fetch_command<T>(
        &mut self,
        command: Command,
        mut container: T,
        mut fill: impl FnMut(&mut T, RowLabeled) -> Result<()>,
    ) -> Result<T> {
        let mut lease = self.lease().await?;
        let mut rows = pin!(lease.connection().fetch(command));
        while let Some(row) = rows.try_next().await? {
            fill(&mut container, row)?;
        }
        Ok(container)
    }
}

fn collect_into<T>(
    mut map: impl FnMut(RowLabeled) -> Result<T>,
) -> impl FnMut(&mut Vec<T>, RowLabeled) -> Result<()> {
    move |rows, row| {
        rows.push(map(row)?);
        Ok(())
    }
}

fn count_of(value: Value) -> Result<u64> {
    if value.is_null() {
        return Ok(0);
    }
    u64::try_from_value(value).map_err(|e| e.context("While reading the row count"))
}
