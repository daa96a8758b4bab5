//! Event types for the Tutordesk event system
//!
//! Provides shared event definitions and the EventBus used by the
//! engagement core and the dashboard shell. Events are broadcast via the
//! EventBus and serialize with a `type` tag so the dashboard can forward
//! them to connected clients unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Scanner feedback status shown on the scan surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanStatus {
    /// Waiting for the next scan
    Ready,
    /// Attendance recorded
    Success,
    /// Scan matched but no action was taken
    Warning,
    /// Scan did not match any student
    Error,
}

/// Audio cue kind played by the feedback collaborator
///
/// `AlreadyPresent` and `Unknown` outcomes both map to `Error` on the
/// audio side; the outcomes themselves stay distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToneKind {
    /// Positive confirmation cue
    Success,
    /// Negative "no action taken" cue
    Error,
}

/// Report kind requested by the operator
///
/// A closed variant: adding a kind is a compile-time-checked extension,
/// not a string comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportKind {
    /// Same-day absence notification, deterministic template
    AbsenceAlert,
    /// Weekly summary, delegated to the text-generation service
    PeriodicShort,
    /// Monthly summary, delegated to the text-generation service
    PeriodicLong,
}

impl ReportKind {
    /// Whether this kind is deduplicated by the delivery tracker
    pub fn is_periodic(&self) -> bool {
        matches!(self, ReportKind::PeriodicShort | ReportKind::PeriodicLong)
    }

    /// Stable identifier used as the report-log key
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::AbsenceAlert => "absence-alert",
            ReportKind::PeriodicShort => "periodic-short",
            ReportKind::PeriodicLong => "periodic-long",
        }
    }

    /// Human label for the summarized period, passed to the generator
    pub fn period_label(&self) -> &'static str {
        match self {
            ReportKind::AbsenceAlert => "today",
            ReportKind::PeriodicShort => "the past week",
            ReportKind::PeriodicLong => "the past month",
        }
    }
}

/// Tutordesk engagement events
///
/// Every outcome and state transition of the engagement core is exposed
/// here for the surrounding UI or automation layer to render.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EngagementEvent {
    /// A newly-present student was recorded
    ///
    /// Triggers:
    /// - Roster view: refresh attendance column
    /// - Leaderboard: refresh points
    AttendanceMarked {
        /// Student UUID
        student_id: Uuid,
        /// Student display name
        student_name: String,
        /// Points awarded with the attendance
        points_awarded: i64,
        /// When attendance was recorded
        timestamp: DateTime<Utc>,
    },

    /// Scan surface feedback changed
    ///
    /// Triggers:
    /// - Scan surface: render status, message, and student card
    /// - Audio collaborator: play the cue in `tone`
    ScanFeedback {
        /// New feedback status
        status: ScanStatus,
        /// Operator-visible message
        message: String,
        /// Matched student, if any
        student_id: Option<Uuid>,
        /// Paid-status of the matched student (rendering only)
        paid: Option<bool>,
        /// Audio cue accompanying this feedback, if any
        tone: Option<ToneKind>,
        /// When feedback changed
        timestamp: DateTime<Utc>,
    },

    /// Scan surface feedback returned to `Ready` after the display window
    ScanFeedbackReset {
        /// When the reset was applied
        timestamp: DateTime<Utc>,
    },

    /// A report job was opened over a recipient batch
    ReportJobOpened {
        /// Requested report kind
        kind: ReportKind,
        /// Number of recipients in the batch
        recipient_count: usize,
        /// When the job opened
        timestamp: DateTime<Utc>,
    },

    /// Content generation started for one recipient
    ///
    /// Triggers:
    /// - Review panel: show generation-in-progress state
    ReportGenerating {
        /// 0-based recipient index
        index: usize,
        /// Kind being generated
        kind: ReportKind,
        /// When generation started
        timestamp: DateTime<Utc>,
    },

    /// Generated content is ready for operator review
    ReportReady {
        /// 0-based recipient index
        index: usize,
        /// True when the fallback text was substituted for a failed
        /// generation call
        degraded: bool,
        /// When content became ready
        timestamp: DateTime<Utc>,
    },

    /// A report was handed to the delivery channel
    ReportSent {
        /// Recipient UUID
        student_id: Uuid,
        /// Kind that was sent
        kind: ReportKind,
        /// 0-based recipient index within the job
        index: usize,
        /// When the send was dispatched
        timestamp: DateTime<Utc>,
    },

    /// The operator skipped a recipient without sending
    ReportRecipientSkipped {
        /// Recipient UUID
        student_id: Uuid,
        /// 0-based recipient index within the job
        index: usize,
        /// When the skip happened
        timestamp: DateTime<Utc>,
    },

    /// The report job reached its terminal state
    ReportJobFinished {
        /// True when the operator cancelled before the last recipient
        cancelled: bool,
        /// When the job finished
        timestamp: DateTime<Utc>,
    },
}

impl EngagementEvent {
    /// Get event type as string for filtering
    pub fn event_type(&self) -> &str {
        match self {
            EngagementEvent::AttendanceMarked { .. } => "AttendanceMarked",
            EngagementEvent::ScanFeedback { .. } => "ScanFeedback",
            EngagementEvent::ScanFeedbackReset { .. } => "ScanFeedbackReset",
            EngagementEvent::ReportJobOpened { .. } => "ReportJobOpened",
            EngagementEvent::ReportGenerating { .. } => "ReportGenerating",
            EngagementEvent::ReportReady { .. } => "ReportReady",
            EngagementEvent::ReportSent { .. } => "ReportSent",
            EngagementEvent::ReportRecipientSkipped { .. } => "ReportRecipientSkipped",
            EngagementEvent::ReportJobFinished { .. } => "ReportJobFinished",
        }
    }
}

/// Central event distribution bus
///
/// Uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EngagementEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with the given channel capacity
    ///
    /// Capacity bounds how many events a slow subscriber may lag behind
    /// before old events are dropped for it.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<EngagementEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists,
    /// `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: EngagementEvent,
    ) -> Result<usize, broadcast::error::SendError<EngagementEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    ///
    /// Used for events where it's acceptable that no component is
    /// currently listening (feedback updates, progress).
    pub fn emit_lossy(&self, event: EngagementEvent) {
        let _ = self.tx.send(event);
    }

    /// Current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eventbus_new() {
        let bus = EventBus::new(100);
        assert_eq!(bus.capacity(), 100);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_eventbus_emit_and_receive() {
        let bus = EventBus::new(10);
        let mut rx = bus.subscribe();

        bus.emit(EngagementEvent::AttendanceMarked {
            student_id: Uuid::new_v4(),
            student_name: "Mina Park".to_string(),
            points_awarded: 10,
            timestamp: Utc::now(),
        })
        .expect("emit should succeed");

        let received = rx.try_recv().expect("should receive event");
        assert_eq!(received.event_type(), "AttendanceMarked");
    }

    #[test]
    fn test_eventbus_emit_lossy_without_subscribers() {
        let bus = EventBus::new(2);
        // No subscribers; must not panic
        bus.emit_lossy(EngagementEvent::ScanFeedbackReset {
            timestamp: Utc::now(),
        });
    }

    #[test]
    fn test_eventbus_multiple_subscribers() {
        let bus = EventBus::new(10);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        bus.emit(EngagementEvent::ReportJobFinished {
            cancelled: false,
            timestamp: Utc::now(),
        })
        .expect("emit should succeed");

        assert_eq!(rx1.try_recv().unwrap().event_type(), "ReportJobFinished");
        assert_eq!(rx2.try_recv().unwrap().event_type(), "ReportJobFinished");
    }

    #[test]
    fn test_event_serialization_tag() {
        let event = EngagementEvent::ScanFeedback {
            status: ScanStatus::Error,
            message: "code not registered".to_string(),
            student_id: None,
            paid: None,
            tone: Some(ToneKind::Error),
            timestamp: Utc::now(),
        };

        let json = serde_json::to_string(&event).expect("serialize");
        assert!(json.contains("\"type\":\"ScanFeedback\""));
        assert!(json.contains("\"status\":\"Error\""));

        let back: EngagementEvent = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.event_type(), "ScanFeedback");
    }

    #[test]
    fn test_report_kind_keys() {
        assert_eq!(ReportKind::AbsenceAlert.as_str(), "absence-alert");
        assert_eq!(ReportKind::PeriodicShort.as_str(), "periodic-short");
        assert_eq!(ReportKind::PeriodicLong.as_str(), "periodic-long");
        assert!(!ReportKind::AbsenceAlert.is_periodic());
        assert!(ReportKind::PeriodicShort.is_periodic());
        assert!(ReportKind::PeriodicLong.is_periodic());
    }

    #[test]
    fn test_report_kind_serde_kebab_case() {
        let json = serde_json::to_string(&ReportKind::PeriodicShort).unwrap();
        assert_eq!(json, "\"periodic-short\"");
        let back: ReportKind = serde_json::from_str("\"absence-alert\"").unwrap();
        assert_eq!(back, ReportKind::AbsenceAlert);
    }
}
