//! Database schema bootstrap
//!
//! The dashboard owns the roster, activity log, and report log; this
//! module only creates the schema they share with the engagement core.

pub mod init;

pub use init::*;
