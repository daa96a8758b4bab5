//! SQLite implementations of the collaborator stores
//!
//! The dashboard owns these tables; the engagement core reaches them
//! through the `services` traits. These implementations let the
//! dashboard hand the core real stores without adapter glue.

pub mod activity;
pub mod report_log;
pub mod roster;

pub use activity::SqliteActivityLog;
pub use report_log::SqliteReportLog;
pub use roster::SqliteRoster;
