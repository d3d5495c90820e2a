mod access;
mod ambient;
mod as_value;
mod blocking;
mod command;
mod connection;
mod driver;
mod error;
mod executor;
mod materialize;
mod paging;
mod parameter;
mod query;
pub mod scan;
mod settings;
mod transaction;
mod transformer;
mod util;
mod value;
mod vendor;
pub mod writer;

pub use ::anyhow::Context as ErrorContext;
pub use access::*;
pub use ambient::*;
pub use as_value::*;
pub use blocking::*;
pub use command::*;
pub use connection::*;
pub use driver::*;
pub use error::*;
pub use executor::*;
pub use paging::*;
pub use parameter::*;
pub use query::*;
pub use settings::*;
pub use transaction::*;
pub use transformer::*;
pub use util::*;
pub use value::*;
pub use vendor::*;
pub use writer::*;
pub mod stream {
    pub use ::futures::stream::*;
}
pub use ::futures::future;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
