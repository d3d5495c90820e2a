use crate::{
    Connection, DataAccess, DataError, ExclusiveConnection, IsolationLevel, Result,
};
use std::{
    fmt::{self, Display},
    ops::{Deref, DerefMut},
};

/// Identifier of a local transaction within its context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionId(pub(crate) u64);

impl Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Local transaction registered in the context slot. Owns the pinned connection.
#[derive(Debug)]
pub(crate) struct LocalTransaction {
    pub(crate) id: TransactionId,
    pub(crate) isolation: Option<IsolationLevel>,
    pub(crate) completed: bool,
    pub(crate) abandoned: bool,
    pub(crate) exclusive: ExclusiveConnection,
}

/// Scope of the local transaction of a [`DataAccess`].
///
/// Dereferences to the context, so commands issued through the scope run in the
/// transaction. Ending the scope commits when [`TransactionScope::complete`] was
/// called and rolls back otherwise:
///
/// ```ignore
/// let mut transaction = access.begin().await?;
/// transaction.execute(Statement::new("DELETE FROM carts WHERE owner = {0}").bind(owner)).await?;
/// transaction.complete()?;
/// transaction.end().await?;
/// ```
///
/// A scope dropped without `end` is settled by the context before its next
/// operation, or by [`DataAccess::close`].
///
/// Beginning while a transaction is active returns a scope joining the same
/// transaction: ending any of the scopes ends the shared transaction, the
/// remaining ones then fail with a resource state error. Dropping a joined
/// scope leaves the transaction to its owner.
pub struct TransactionScope<'a, C: Connection> {
    access: &'a mut DataAccess<C>,
    id: TransactionId,
    joined: bool,
    ended: bool,
}

impl<'a, C: Connection> TransactionScope<'a, C> {
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Whether the scope joined a transaction started by another scope.
    pub fn is_joined(&self) -> bool {
        self.joined
    }

    /// Marks the transaction as committable.
    pub fn complete(&mut self) -> Result<()> {
        match self.access.transaction.as_mut() {
            Some(transaction) if transaction.id == self.id => {
                transaction.completed = true;
                Ok(())
            }
            _ => Err(ended(self.id)),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.access
            .transaction
            .as_ref()
            .is_some_and(|t| t.id == self.id && t.completed)
    }

    pub fn isolation(&self) -> Option<IsolationLevel> {
        self.access
            .transaction
            .as_ref()
            .filter(|t| t.id == self.id)
            .and_then(|t| t.isolation)
    }

    /// Tears the transaction down: commit if completed, rollback otherwise.
    ///
    /// The commit or rollback failure is returned. Releasing the pinned
    /// connection always happens, its own failure is only logged.
    pub async fn end(mut self) -> Result<()> {
        self.ended = true;
        self.access.end_transaction(self.id).await
    }

    /// Completes and ends the transaction.
    pub async fn commit(mut self) -> Result<()> {
        self.complete()?;
        self.end().await
    }

    /// Ends the transaction without completing it.
    pub async fn rollback(self) -> Result<()> {
        self.end().await
    }
}

impl<'a, C: Connection> Deref for TransactionScope<'a, C> {
    type Target = DataAccess<C>;

    fn deref(&self) -> &Self::Target {
        self.access
    }
}

impl<'a, C: Connection> DerefMut for TransactionScope<'a, C> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.access
    }
}

impl<'a, C: Connection> Drop for TransactionScope<'a, C> {
    fn drop(&mut self) {
        if !self.ended && !self.joined {
            self.access.abandon(self.id);
        }
    }
}

fn ended(id: TransactionId) -> crate::Error {
    DataError::resource_state(format!("Transaction {} has already ended", id))
}

impl<C: Connection> DataAccess<C> {
    /// Starts a local transaction, see [`TransactionScope`].
    pub async fn begin(&mut self) -> Result<TransactionScope<'_, C>> {
        self.begin_transaction(None).await
    }

    /// Starts a local transaction with an isolation level.
    pub async fn begin_with(
        &mut self,
        isolation: IsolationLevel,
    ) -> Result<TransactionScope<'_, C>> {
        self.begin_transaction(Some(isolation)).await
    }

    pub fn has_transaction(&self) -> bool {
        self.transaction.as_ref().is_some_and(|t| !t.abandoned)
    }

    async fn begin_transaction(
        &mut self,
        isolation: Option<IsolationLevel>,
    ) -> Result<TransactionScope<'_, C>> {
        if self.ambient_active() {
            let error = DataError::transaction_conflict(
                "A local transaction cannot start while an ambient transaction is active",
            );
            log::error!("{:#}", error);
            return Err(error);
        }
        self.settle().await?;
        if let Some(id) = self.transaction.as_ref().map(|t| t.id) {
            log::debug!("Transaction {} is already active, joining it", id);
            return Ok(TransactionScope {
                access: self,
                id,
                joined: true,
                ended: false,
            });
        }
        let Some(exclusive) = self.acquire_exclusive().await? else {
            let error = DataError::transaction_conflict(
                "The connection is in use by another operation of this context",
            );
            log::error!("{:#}", error);
            return Err(error);
        };
        if let Err(e) = self.connection.begin(isolation).await {
            if let Err(release) = self.release_exclusive(exclusive) {
                log::warn!("{:#}", release);
            }
            let e = e.context("While starting a local transaction");
            log::error!("{:#}", e);
            return Err(e);
        }
        self.transaction_counter += 1;
        let id = TransactionId(self.transaction_counter);
        log::debug!("Transaction {} started", id);
        self.transaction = Some(LocalTransaction {
            id,
            isolation,
            completed: false,
            abandoned: false,
            exclusive,
        });
        Ok(TransactionScope {
            access: self,
            id,
            joined: false,
            ended: false,
        })
    }

    pub(crate) async fn end_transaction(&mut self, id: TransactionId) -> Result<()> {
        let Some(transaction) = self.transaction.take_if(|t| t.id == id) else {
            return Err(ended(id));
        };
        let result = if transaction.completed {
            self.connection.commit().await
        } else {
            self.connection.rollback().await
        };
        if let Err(e) = self.release_exclusive(transaction.exclusive) {
            log::warn!(
                "{:#}",
                e.context(format!("While releasing the connection of transaction {}", id))
            );
        }
        match result {
            Ok(()) => {
                log::debug!(
                    "Transaction {} {}",
                    id,
                    if transaction.completed {
                        "committed"
                    } else {
                        "rolled back"
                    }
                );
                Ok(())
            }
            Err(e) => {
                let e = e.context(format!(
                    "While {} transaction {}",
                    if transaction.completed {
                        "committing"
                    } else {
                        "rolling back"
                    },
                    id
                ));
                log::error!("{:#}", e);
                Err(e)
            }
        }
    }

    pub(crate) fn abandon(&mut self, id: TransactionId) {
        if let Some(transaction) = self.transaction.as_mut()
            && transaction.id == id
        {
            log::warn!(
                "Transaction {} was dropped without being ended, it will be settled before the next operation",
                id
            );
            transaction.abandoned = true;
        }
    }

    /// Ends a transaction whose scope was dropped.
    pub(crate) async fn settle(&mut self) -> Result<()> {
        match self.transaction.as_ref() {
            Some(transaction) if transaction.abandoned => {
                let id = transaction.id;
                self.end_transaction(id).await
            }
            _ => Ok(()),
        }
    }
}
