mod context;
mod mysql;
mod oracle;
mod postgres;
mod sql_server;
mod sql_writer;
mod sqlite;

pub use context::*;
pub use mysql::*;
pub use oracle::*;
pub use postgres::*;
pub use sql_server::*;
pub use sql_writer::*;
pub use sqlite::*;
