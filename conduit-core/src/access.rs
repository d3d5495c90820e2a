use crate::{
    AmbientTransaction, Binder, Command, Connection, ConnectionState, DataError, Driver,
    NoAmbientTransaction, PagingCache, Result, Settings, SqlWriter, Statement, Vendor,
    transaction::LocalTransaction, writer::Context,
};
use std::{sync::Arc, time::Duration};

/// Owner of one connection handle: reference-counted opening, at most one local
/// transaction, statement binding against the vendor strategy.
///
/// A context serializes its own operations through `&mut self`. It is not meant
/// to be shared between tasks: callers needing parallelism create one context per task.
pub struct DataAccess<C: Connection> {
    pub(crate) connection: C,
    opened_here: bool,
    references: usize,
    pub(crate) transaction: Option<LocalTransaction>,
    pub(crate) transaction_counter: u64,
    ambient: Arc<dyn AmbientTransaction>,
    cache: Arc<PagingCache>,
    command_timeout: Option<Duration>,
}

/// Token for a connection pinned by one owner, see [`DataAccess::acquire_exclusive`].
///
/// It records whether acquiring it opened the connection, in which case
/// releasing it closes the connection again.
#[derive(Debug)]
#[must_use]
pub struct ExclusiveConnection {
    opened: bool,
}

impl ExclusiveConnection {
    pub fn opened(&self) -> bool {
        self.opened
    }
}

pub struct DataAccessBuilder<C: Connection> {
    connection: C,
    ambient: Arc<dyn AmbientTransaction>,
    cache: Arc<PagingCache>,
    command_timeout: Option<Duration>,
}

impl<C: Connection> DataAccessBuilder<C> {
    /// Checker consulted before starting a local transaction.
    pub fn ambient(mut self, ambient: Arc<dyn AmbientTransaction>) -> Self {
        self.ambient = ambient;
        self
    }
    /// Paging template cache, the process-wide one when not set.
    pub fn cache(mut self, cache: Arc<PagingCache>) -> Self {
        self.cache = cache;
        self
    }
    /// Timeout given to commands that do not carry their own.
    pub fn command_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.command_timeout = timeout;
        self
    }
    pub fn build(self) -> DataAccess<C> {
        DataAccess {
            connection: self.connection,
            opened_here: false,
            references: 0,
            transaction: None,
            transaction_counter: 0,
            ambient: self.ambient,
            cache: self.cache,
            command_timeout: self.command_timeout,
        }
    }
}

impl<C: Connection> DataAccess<C> {
    pub fn new(connection: C) -> Self {
        Self::builder(connection).build()
    }

    pub fn builder(connection: C) -> DataAccessBuilder<C> {
        DataAccessBuilder {
            connection,
            ambient: Arc::new(NoAmbientTransaction),
            cache: PagingCache::global(),
            command_timeout: None,
        }
    }

    /// Context over a new, still closed, connection to `url`.
    pub fn connect(driver: &C::Driver, url: &str) -> Result<Self>
    where
        C::Driver: Driver<Connection = C>,
    {
        Ok(Self::new(driver.connection(url)?))
    }

    /// Context configured from `settings`, whose vendor must be the driver's.
    pub fn from_settings(driver: &C::Driver, settings: &Settings) -> Result<Self>
    where
        C::Driver: Driver<Connection = C>,
    {
        if driver.vendor() != settings.vendor {
            return Err(DataError::argument(format!(
                "Settings target `{}` but the driver `{}` serves `{}`",
                settings.vendor,
                <C::Driver as Driver>::NAME,
                driver.vendor()
            )));
        }
        Ok(Self::builder(driver.connection(&settings.url)?)
            .command_timeout(settings.command_timeout)
            .build())
    }

    pub fn connection(&self) -> &C {
        &self.connection
    }

    pub fn vendor(&self) -> Vendor {
        self.connection.driver().vendor()
    }

    pub fn sql_writer(&self) -> &'static dyn SqlWriter {
        self.connection.driver().sql_writer()
    }

    pub fn cache(&self) -> &Arc<PagingCache> {
        &self.cache
    }

    /// Number of outstanding `ensure_open` calls of this context.
    pub fn references(&self) -> usize {
        self.references
    }

    /// Whether this context performed the physical open of the connection.
    pub fn is_opened_here(&self) -> bool {
        self.opened_here
    }

    pub(crate) fn paging_context(&self) -> Context<'_> {
        Context::new(self.connection.identity(), &self.cache)
    }

    /// Opens the connection unless it is already open, counting the reference when this context owns it.
    ///
    /// A broken connection is closed first. A failing open leaves the counter untouched.
    pub async fn ensure_open(&mut self) -> Result<()> {
        if self.connection.state() == ConnectionState::Broken {
            log::warn!(
                "Connection to `{}` is broken, closing it before reopening",
                self.connection.identity()
            );
            self.connection.close()?;
        }
        if self.connection.state() == ConnectionState::Closed {
            self.connection.open().await.map_err(|e| {
                let e = e.context(format!(
                    "While opening the connection to `{}`",
                    self.connection.identity()
                ));
                log::error!("{:#}", e);
                e
            })?;
            self.opened_here = true;
        }
        if self.opened_here {
            self.references += 1;
            log::trace!("Connection references: {}", self.references);
        }
        Ok(())
    }

    /// Gives back one reference taken by `ensure_open`.
    ///
    /// The last reference closes the connection when `force_close` is set,
    /// otherwise the connection stays open and the caller becomes responsible for it.
    pub fn release(&mut self, force_close: bool) -> Result<()> {
        if !self.opened_here {
            return Ok(());
        }
        self.references = self.references.saturating_sub(1);
        log::trace!("Connection references: {}", self.references);
        if self.references == 0 {
            self.opened_here = false;
            if force_close {
                self.connection.close()?;
            }
        }
        Ok(())
    }

    /// Pins the connection for a single owner, `None` when this context already opened it.
    pub async fn acquire_exclusive(&mut self) -> Result<Option<ExclusiveConnection>> {
        if self.opened_here {
            return Ok(None);
        }
        if self.connection.state() == ConnectionState::Broken {
            self.connection.close()?;
        }
        let mut opened = false;
        if self.connection.state() == ConnectionState::Closed {
            self.connection.open().await?;
            opened = true;
        }
        Ok(Some(ExclusiveConnection { opened }))
    }

    /// Releases a pinned connection, closing it when the token opened it.
    pub fn release_exclusive(&mut self, token: ExclusiveConnection) -> Result<()> {
        if token.opened {
            self.connection.close()?;
        }
        Ok(())
    }

    /// Binds `statement` against the vendor strategy and attaches the active transaction.
    ///
    /// Nothing is sent to the backend, all validation errors surface here.
    pub fn prepare(&self, statement: impl Into<Statement>) -> Result<Command> {
        let mut command = Binder::new(self.sql_writer()).bind(statement.into())?;
        if command.timeout.is_none() {
            command.timeout = self.command_timeout;
        }
        self.bind_to_command(&mut command);
        Ok(command)
    }

    /// Attaches the active local transaction to `command`, no-op when there is none
    /// or when its scope was dropped and awaits settlement.
    pub fn bind_to_command(&self, command: &mut Command) {
        if let Some(transaction) = self.transaction.as_ref().filter(|t| !t.abandoned) {
            command.transaction = Some(transaction.id);
        }
    }

    /// Borrows the open connection for one operation, releasing the reference on drop.
    pub(crate) async fn lease(&mut self) -> Result<Lease<'_, C>> {
        self.settle().await?;
        self.ensure_open().await?;
        Ok(Lease { access: self })
    }

    pub(crate) fn ambient_active(&self) -> bool {
        self.ambient.is_active()
    }

    /// Settles a dropped transaction scope and closes the connection if this context opened it.
    pub async fn close(&mut self) -> Result<()> {
        self.settle().await?;
        if self.opened_here {
            self.references = 0;
            self.opened_here = false;
            self.connection.close()?;
        }
        Ok(())
    }
}

/// One outstanding reference on the connection of a context.
pub(crate) struct Lease<'a, C: Connection> {
    access: &'a mut DataAccess<C>,
}

impl<'a, C: Connection> Lease<'a, C> {
    pub(crate) fn connection(&mut self) -> &mut C {
        &mut self.access.connection
    }
}

impl<'a, C: Connection> Drop for Lease<'a, C> {
    fn drop(&mut self) {
        if let Err(e) = self.access.release(true) {
            log::error!("{:#}", e.context("While releasing the connection"));
        }
    }
}
