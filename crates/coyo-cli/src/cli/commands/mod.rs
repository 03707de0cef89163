//! CLI command handlers. Each command is in its own file.

mod download;
mod export_samples;
mod filter;
mod subset;

pub use download::run_download;
pub use export_samples::run_export_samples;
pub use filter::run_filter;
pub use subset::run_subset;
