//! Logging infrastructure for structured console and file output.

mod logger;
mod subscriber;
mod utils;

pub use logger::{JobEntry, JobStatus, Logger};
pub use subscriber::init_subscriber;

/// Target of stage header events (`==>` lines).
pub const STAGE_TARGET: &str = "backup_scheduler::stage";
