use crate::{Connection, Result, SqlWriter, Vendor};

/// Entry point of a backend: names it, selects its vendor strategy and creates connections.
pub trait Driver: Send + Sync + Sized {
    type Connection: Connection<Driver = Self>;

    const NAME: &'static str;

    fn vendor(&self) -> Vendor;

    fn sql_writer(&self) -> &'static dyn SqlWriter {
        self.vendor().sql_writer()
    }

    /// Creates a closed connection handle for `url`, nothing is opened yet.
    fn connection(&self, url: &str) -> Result<Self::Connection>;
}
