use conduit::{
    Command, Connection, ConnectionState, DataError, Driver, Error, Executor, QueryResult, Result,
    RowLabeled, RowsAffected, Value, Vendor,
    stream::{self, Stream},
};
use parking_lot::{Mutex, RwLock};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// What a [`MemoryConnection`] went through, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Open,
    Close,
    Execute(Command),
}

type Responder = dyn Fn(&Command) -> Option<Vec<QueryResult>> + Send + Sync;

#[derive(Default)]
struct Shared {
    journal: Mutex<Vec<Event>>,
    responder: RwLock<Option<Box<Responder>>>,
    failures: Mutex<Vec<String>>,
    fail_open: AtomicBool,
    broken: AtomicBool,
}

/// Scriptable backend recording every call in a journal shared by its connections.
///
/// Commands get the rows scripted with [`MemoryDriver::respond`]. Without a
/// script a SELECT returns no rows and anything else affects one row.
#[derive(Clone)]
pub struct MemoryDriver {
    vendor: Vendor,
    shared: Arc<Shared>,
}

impl MemoryDriver {
    pub fn new(vendor: Vendor) -> Self {
        Self {
            vendor,
            shared: Default::default(),
        }
    }

    pub fn respond(
        self,
        responder: impl Fn(&Command) -> Option<Vec<QueryResult>> + Send + Sync + 'static,
    ) -> Self {
        *self.shared.responder.write() = Some(Box::new(responder));
        self
    }

    /// Commands whose text contains `pattern` fail.
    pub fn fail_on(&self, pattern: &str) {
        self.shared.failures.lock().push(pattern.into());
    }

    pub fn fail_open(&self, fail: bool) {
        self.shared.fail_open.store(fail, Ordering::Relaxed);
    }

    /// Open connections report a broken state until they are closed.
    pub fn break_connections(&self) {
        self.shared.broken.store(true, Ordering::Relaxed);
    }

    pub fn journal(&self) -> Vec<Event> {
        self.shared.journal.lock().clone()
    }

    /// Text of the executed commands.
    pub fn executed(&self) -> Vec<String> {
        self.shared
            .journal
            .lock()
            .iter()
            .filter_map(|e| match e {
                Event::Execute(command) => Some(command.text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear_journal(&self) {
        self.shared.journal.lock().clear();
    }

    fn record(&self, event: Event) {
        self.shared.journal.lock().push(event);
    }

    fn answer(&self, command: &Command) -> Result<Vec<QueryResult>> {
        if let Some(pattern) = self
            .shared
            .failures
            .lock()
            .iter()
            .find(|p| command.text.contains(p.as_str()))
        {
            return Err(Error::msg(format!(
                "Scripted failure on `{}` while running `{}`",
                pattern, command.text
            )));
        }
        if let Some(results) = self
            .shared
            .responder
            .read()
            .as_ref()
            .and_then(|respond| respond(command))
        {
            return Ok(results);
        }
        let query = command
            .text
            .trim_start()
            .get(..6)
            .is_some_and(|v| v.eq_ignore_ascii_case("select"));
        Ok(if query {
            Vec::new()
        } else {
            vec![RowsAffected::new(1).into()]
        })
    }
}

impl Driver for MemoryDriver {
    type Connection = MemoryConnection;

    const NAME: &'static str = "memory";

    fn vendor(&self) -> Vendor {
        self.vendor
    }

    fn connection(&self, url: &str) -> Result<MemoryConnection> {
        Ok(MemoryConnection {
            driver: self.clone(),
            identity: url.into(),
            open: false,
        })
    }
}

pub struct MemoryConnection {
    driver: MemoryDriver,
    identity: String,
    open: bool,
}

impl Executor for MemoryConnection {
    type Driver = MemoryDriver;

    fn driver(&self) -> &Self::Driver {
        &self.driver
    }

    fn run<'s>(
        &'s mut self,
        command: Command,
    ) -> impl Stream<Item = Result<QueryResult>> + Send + 's {
        let results = if self.open {
            self.driver.record(Event::Execute(command.clone()));
            self.driver.answer(&command)
        } else {
            Err(DataError::resource_state(format!(
                "Connection `{}` is not open",
                self.identity
            )))
        };
        stream::iter(match results {
            Ok(results) => results.into_iter().map(Ok).collect(),
            Err(e) => vec![Err(e)],
        })
    }
}

impl Connection for MemoryConnection {
    fn identity(&self) -> &str {
        &self.identity
    }

    fn state(&self) -> ConnectionState {
        if !self.open {
            ConnectionState::Closed
        } else if self.driver.shared.broken.load(Ordering::Relaxed) {
            ConnectionState::Broken
        } else {
            ConnectionState::Open
        }
    }

    async fn open(&mut self) -> Result<()> {
        if self.open {
            return Err(DataError::resource_state(format!(
                "Connection `{}` is already open",
                self.identity
            )));
        }
        if self.driver.shared.fail_open.load(Ordering::Relaxed) {
            return Err(Error::msg(format!("Could not open `{}`", self.identity)));
        }
        self.driver.record(Event::Open);
        self.open = true;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.open {
            self.driver.record(Event::Close);
            self.driver.shared.broken.store(false, Ordering::Relaxed);
            self.open = false;
        }
        Ok(())
    }
}

/// Rows sharing the column `names`, ready to be returned by a responder.
pub fn rows(names: &[&str], rows: Vec<Vec<Value>>) -> Vec<QueryResult> {
    let names: conduit::RowNames = names.iter().map(|v| v.to_string()).collect();
    rows.into_iter()
        .map(|values| RowLabeled::new(names.clone(), values.into()).into())
        .collect()
}

/// A single row with a single column.
pub fn scalar(name: &str, value: Value) -> Vec<QueryResult> {
    rows(&[name], vec![vec![value]])
}
