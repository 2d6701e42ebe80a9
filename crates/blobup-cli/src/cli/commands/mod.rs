//! Subcommand implementations.

mod start;
mod status;
mod upload;

pub use start::run_start;
pub use status::run_status;
pub use upload::run_upload;

pub(crate) use start::{build_manager, load_config};
