//! Per-surface scan feedback state
//!
//! Each open scan surface owns one session. Feedback set by the resolver
//! stays visible for a fixed display window, then resets to `Ready`.
//! Resets are explicit clock-keyed transitions applied through
//! [`ScanSession::poll_reset`], not wall-clock timers, so tests advance
//! time instead of sleeping.

use chrono::{DateTime, Utc};
use tutordesk_common::events::ScanStatus;
use uuid::Uuid;

/// Feedback state of one scan surface
#[derive(Debug)]
pub struct ScanSession {
    status: ScanStatus,
    message: String,
    feedback_student: Option<Uuid>,
    reset_at: Option<DateTime<Utc>>,
}

impl ScanSession {
    /// Create a session in the `Ready` state
    pub fn new() -> Self {
        Self {
            status: ScanStatus::Ready,
            message: String::new(),
            feedback_student: None,
            reset_at: None,
        }
    }

    /// Replace the current feedback
    ///
    /// A pending reset from an earlier scan is superseded: the new
    /// deadline replaces it (cancel-and-replace, not merge).
    pub fn set_feedback(
        &mut self,
        status: ScanStatus,
        message: String,
        feedback_student: Option<Uuid>,
        reset_at: DateTime<Utc>,
    ) {
        self.status = status;
        self.message = message;
        self.feedback_student = feedback_student;
        self.reset_at = Some(reset_at);
    }

    /// Apply a due reset
    ///
    /// Returns `true` when the pending deadline had passed and the
    /// session returned to `Ready`.
    pub fn poll_reset(&mut self, now: DateTime<Utc>) -> bool {
        match self.reset_at {
            Some(deadline) if now >= deadline => {
                self.status = ScanStatus::Ready;
                self.message.clear();
                self.feedback_student = None;
                self.reset_at = None;
                true
            }
            _ => false,
        }
    }

    /// Current feedback status
    pub fn status(&self) -> ScanStatus {
        self.status
    }

    /// Current operator-visible message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Student the current feedback refers to, if any
    pub fn feedback_student(&self) -> Option<Uuid> {
        self.feedback_student
    }

    /// Pending reset deadline, if feedback is showing
    pub fn reset_at(&self) -> Option<DateTime<Utc>> {
        self.reset_at
    }
}

impl Default for ScanSession {
    fn default() -> Self {
        Self::new()
    }
}
