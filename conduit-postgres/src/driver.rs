use crate::PostgresConnection;
use conduit_core::{Driver, Result, Vendor};

#[derive(Default, Debug, Clone, Copy)]
pub struct PostgresDriver {}

impl PostgresDriver {
    pub const fn new() -> Self {
        Self {}
    }
}

impl Driver for PostgresDriver {
    type Connection = PostgresConnection;

    const NAME: &'static str = "postgres";

    fn vendor(&self) -> Vendor {
        Vendor::PostgreSql
    }

    fn connection(&self, url: &str) -> Result<PostgresConnection> {
        PostgresConnection::new(url)
    }
}
