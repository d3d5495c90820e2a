mod connection;
mod driver;
mod util;
mod value_holder;

pub use connection::*;
pub use driver::*;
pub use value_holder::*;
