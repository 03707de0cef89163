pub mod config;
pub mod logging;

pub mod fetch;
pub mod filter;
pub mod records;
pub mod samples;
pub mod subset;
