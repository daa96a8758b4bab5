//! Collaborator seams for the engagement core
//!
//! The roster, activity log, and report log are owned by the dashboard;
//! text generation, message delivery, and audio feedback are external
//! services. The core talks to all of them through these traits so the
//! workflows stay testable with in-memory doubles.

pub mod delivery;
pub mod generator;

pub use delivery::HttpDeliveryChannel;
pub use generator::HttpTextGenerator;

use crate::error::Result;
use crate::report::ActivitySummary;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tutordesk_common::events::{ReportKind, ToneKind};
use tutordesk_common::model::{QuizResult, Student, StudentIntent, Submission};
use uuid::Uuid;

/// Read/propose access to the student roster
///
/// The core reads point-in-time snapshots and proposes mutations as
/// intents; the owning store applies them.
#[async_trait]
pub trait RosterStore: Send + Sync {
    /// Current roster snapshot, in stable roster order
    async fn snapshot(&self) -> Result<Vec<Student>>;

    /// Apply a mutation intent to one student
    async fn apply_intent(&self, student: Uuid, intent: StudentIntent) -> Result<()>;
}

/// Read access to the activity log, most recent entries first
#[async_trait]
pub trait ActivityStore: Send + Sync {
    /// Most recent submissions for one student since `since`
    async fn recent_submissions(
        &self,
        student: Uuid,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Submission>>;

    /// Most recent quiz results for one student since `since`
    async fn recent_results(
        &self,
        student: Uuid,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<QuizResult>>;
}

/// Persisted last-delivery instants, keyed by (recipient, kind)
#[async_trait]
pub trait ReportLogStore: Send + Sync {
    /// When the last report of `kind` went to `student`, if ever
    async fn last_delivered(
        &self,
        student: Uuid,
        kind: ReportKind,
    ) -> Result<Option<DateTime<Utc>>>;

    /// Overwrite the last-delivery instant (last-write-wins)
    async fn record(&self, student: Uuid, kind: ReportKind, at: DateTime<Utc>) -> Result<()>;
}

/// External text-generation service
///
/// Fallible and slow; callers must degrade on failure instead of
/// propagating it to the operator.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Produce report text from an activity summary
    async fn generate(&self, summary: &ActivitySummary) -> Result<String>;
}

/// External message channel
///
/// The report queue treats delivery as fire-and-forget: a failure is
/// logged but never blocks or rolls back the queue's advance.
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    /// Hand one message to the gateway
    async fn send(&self, phone: &str, text: &str) -> Result<()>;
}

/// Audio feedback collaborator
///
/// Best-effort: implementations swallow their own failures.
#[async_trait]
pub trait AudioFeedback: Send + Sync {
    /// Speak a short phrase
    async fn speak(&self, text: &str);

    /// Play a cue tone
    async fn tone(&self, kind: ToneKind);
}

/// No-op audio feedback for embeddings without an audio device
pub struct NullFeedback;

#[async_trait]
impl AudioFeedback for NullFeedback {
    async fn speak(&self, _text: &str) {}

    async fn tone(&self, _kind: ToneKind) {}
}
