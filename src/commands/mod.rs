//! CLI subcommand implementations

mod classify;
mod init;
mod scan;

pub use classify::classify_inputs;
pub use init::init_config;
pub use scan::{run_scan, OutputFormat, ScanArgs};
