//! Job lifecycle on top of OS schedulers.
//!
//! [`schedule_jobs`], [`remove_jobs`] and [`status_jobs`] drive any
//! [`Handler`]; [`new_handler`] builds the backend for the current platform.
pub mod arguments;
pub mod crontab;
pub mod error;
pub mod event;
pub mod handler;
pub mod job;
pub mod lifecycle;
pub mod permission;
pub mod systemd;

pub use arguments::CommandArguments;
pub use error::{HandlerError, HandlerResult, JobError};
pub use event::Event;
pub use handler::{Handler, SchedulerKind, new_handler};
pub use job::JobConfig;
pub use lifecycle::{remove_jobs, schedule_jobs, status_jobs};
pub use permission::Permission;
