use crate::{
    Command, Driver, QueryResult, Result, RowLabeled, RowsAffected, Value,
    stream::{Stream, StreamExt, TryStreamExt},
};
use std::{future::Future, pin::pin};

pub trait Executor: Send + Sized {
    type Driver: Driver;

    fn driver(&self) -> &Self::Driver;

    /// General method to send any command and return any result type (either row or count)
    fn run<'s>(
        &'s mut self,
        command: Command,
    ) -> impl Stream<Item = Result<QueryResult>> + Send + 's;

    /// Execute the command and returns the rows.
    fn fetch<'s>(
        &'s mut self,
        command: Command,
    ) -> impl Stream<Item = Result<RowLabeled>> + Send + 's {
        self.run(command).filter_map(|v| async move {
            match v {
                Ok(QueryResult::Row(v)) => Some(Ok(v)),
                Err(e) => Some(Err(e)),
                _ => None,
            }
        })
    }

    /// Execute the command and return the total number of rows affected.
    fn execute(&mut self, command: Command) -> impl Future<Output = Result<RowsAffected>> + Send {
        self.run(command)
            .filter_map(|v| async move {
                match v {
                    Ok(QueryResult::Affected(v)) => Some(Ok(v)),
                    Err(e) => Some(Err(e)),
                    _ => None,
                }
            })
            .try_collect()
    }

    /// Execute the command and return the first column of the first row, `Value::Null` when there is none.
    fn scalar(&mut self, command: Command) -> impl Future<Output = Result<Value>> + Send {
        async move {
            let mut rows = pin!(self.fetch(command));
            Ok(rows
                .try_next()
                .await?
                .and_then(|row| row.values.into_vec().into_iter().next())
                .unwrap_or_default())
        }
    }
}
