mod bulk;
mod memory;
mod paging;
mod simple;
mod transaction1;

use bulk::bulk;
use conduit::{Connection, DataAccess};
use log::LevelFilter;
pub use memory::*;
use paging::paging;
use simple::simple;
use std::env;
use transaction1::transaction1;

#[doc(hidden)]
pub use log;

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

/// Scenarios every backend must pass, run against a live database.
pub async fn execute_tests<C: Connection>(mut access: DataAccess<C>) {
    simple(&mut access).await;
    bulk(&mut access).await;
    paging(&mut access).await;
    transaction1(&mut access).await;
    access.close().await.expect("Could not close the context");
}

#[macro_export]
macro_rules! silent_logs {
    ($($code:tt)+) => {{
        let level = $crate::log::max_level();
        $crate::log::set_max_level($crate::log::LevelFilter::Off);
        $($code)+
        $crate::log::set_max_level(level);
    }};
}
