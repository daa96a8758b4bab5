//! Report composition and delivery workflow
//!
//! An operator-initiated report request seeds a [`ReportJob`] with one or
//! many recipients. The [`ReportQueue`] drives content generation per
//! recipient, holds the result for operator review, dispatches delivery,
//! and records per-recipient delivery state so the workflow can resume
//! the next day without re-notifying anyone.

pub mod content;
pub mod job;
pub mod queue;
pub mod tracker;

pub use content::{ActivitySummary, GeneratedReport, ReportContentGenerator, FALLBACK_TEXT};
pub use job::{AdvanceOutcome, GenerationTicket, JobState, ReportJob};
pub use queue::{QueueState, ReportQueue};
pub use tracker::DeliveryTracker;
