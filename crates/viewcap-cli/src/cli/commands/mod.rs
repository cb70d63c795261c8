//! CLI command handlers, one per file.

mod prune;
mod record;
mod referer;

pub use prune::run_prune;
pub use record::{run_record, RecordArgs};
pub use referer::run_referer;
