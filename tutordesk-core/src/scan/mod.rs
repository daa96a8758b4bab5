//! Live badge-scan pipeline
//!
//! Raw decoded text flows through the debouncer, the code matcher, and
//! the attendance resolver: raw scan text → [`ScanDebouncer`] →
//! [`match_code`] → [`AttendanceResolver`] → attendance intent + feedback
//! state. The scanning device itself (camera, decoder) is an external
//! collaborator; this pipeline starts at the decoded string.

pub mod debouncer;
pub mod matcher;
pub mod resolver;
pub mod session;

pub use debouncer::ScanDebouncer;
pub use matcher::match_code;
pub use resolver::{AttendanceResolver, ScanOutcome};
pub use session::ScanSession;
