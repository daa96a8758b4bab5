//! Attendance resolution
//!
//! Combines the debouncer, the code matcher, and the current roster
//! snapshot to decide what one accepted scan means, and issues at most
//! one attendance-change intent per newly-present student.

use crate::error::Result;
use crate::scan::debouncer::ScanDebouncer;
use crate::scan::matcher::match_code;
use crate::scan::session::ScanSession;
use crate::services::{AudioFeedback, RosterStore};
use chrono::Duration;
use std::sync::Arc;
use tracing::{debug, info};
use tutordesk_common::config::ScanConfig;
use tutordesk_common::events::{EngagementEvent, EventBus, ScanStatus, ToneKind};
use tutordesk_common::model::{Student, StudentIntent};
use tutordesk_common::Clock;

/// What one accepted scan resolved to
///
/// `AlreadyPresent` and `Unknown` are distinct outcomes even though both
/// play the error tone.
#[derive(Debug, Clone)]
pub enum ScanOutcome {
    /// No roster entry matched the scanned text
    Unknown,
    /// The matched student already has attendance recorded today
    AlreadyPresent(Student),
    /// The matched student was newly recorded present
    NewAttendance(Student),
}

/// Scan-to-attendance resolver for one scan surface
///
/// Owns the surface's debounce and feedback state. Reads the roster as a
/// fresh snapshot per scan and proposes mutations through intents; it
/// never holds a reference into the roster between scans.
pub struct AttendanceResolver {
    roster: Arc<dyn RosterStore>,
    feedback: Arc<dyn AudioFeedback>,
    bus: EventBus,
    clock: Arc<dyn Clock>,
    debouncer: ScanDebouncer,
    session: ScanSession,
    attendance_points: i64,
    feedback_window: Duration,
}

impl AttendanceResolver {
    /// Create a resolver for a newly-opened scan surface
    pub fn new(
        roster: Arc<dyn RosterStore>,
        feedback: Arc<dyn AudioFeedback>,
        bus: EventBus,
        clock: Arc<dyn Clock>,
        config: &ScanConfig,
    ) -> Self {
        Self {
            roster,
            feedback,
            bus,
            clock,
            debouncer: ScanDebouncer::new(Duration::seconds(
                config.debounce_window_secs as i64,
            )),
            session: ScanSession::new(),
            attendance_points: config.attendance_points,
            feedback_window: Duration::seconds(config.feedback_reset_secs as i64),
        }
    }

    /// Process one raw scan
    ///
    /// Returns `Ok(None)` when the debouncer suppressed a repeat: no new
    /// outcome, previous feedback unchanged. Otherwise resolves the scan,
    /// applies feedback, and for a new attendance emits the roster intent
    /// exactly once. Unmatched or malformed input resolves to
    /// [`ScanOutcome::Unknown`]; this method never panics on scanner
    /// garbage.
    pub async fn handle_scan(&mut self, raw_text: &str) -> Result<Option<ScanOutcome>> {
        let now = self.clock.now();

        if !self.debouncer.accept(raw_text, now) {
            debug!(raw = raw_text, "duplicate scan suppressed");
            return Ok(None);
        }

        let roster = self.roster.snapshot().await?;
        let outcome = match match_code(raw_text, &roster) {
            None => ScanOutcome::Unknown,
            Some(student) if student.attended_today => {
                ScanOutcome::AlreadyPresent(student.clone())
            }
            Some(student) => ScanOutcome::NewAttendance(student.clone()),
        };

        let reset_at = now + self.feedback_window;
        match &outcome {
            ScanOutcome::Unknown => {
                debug!(raw = raw_text, "scan did not match any student");
                let message = "Code not registered".to_string();
                self.session.set_feedback(
                    ScanStatus::Error,
                    message.clone(),
                    None,
                    reset_at,
                );
                self.feedback.tone(ToneKind::Error).await;
                self.bus.emit_lossy(EngagementEvent::ScanFeedback {
                    status: ScanStatus::Error,
                    message,
                    student_id: None,
                    paid: None,
                    tone: Some(ToneKind::Error),
                    timestamp: now,
                });
            }
            ScanOutcome::AlreadyPresent(student) => {
                debug!(student = %student.guid, "attendance already recorded today");
                let message = format!("{} is already recorded today", student.name);
                self.session.set_feedback(
                    ScanStatus::Warning,
                    message.clone(),
                    Some(student.guid),
                    reset_at,
                );
                // Intentional reuse of the negative cue: no action taken
                self.feedback.tone(ToneKind::Error).await;
                self.bus.emit_lossy(EngagementEvent::ScanFeedback {
                    status: ScanStatus::Warning,
                    message,
                    student_id: Some(student.guid),
                    paid: Some(student.paid),
                    tone: Some(ToneKind::Error),
                    timestamp: now,
                });
            }
            ScanOutcome::NewAttendance(student) => {
                self.roster
                    .apply_intent(
                        student.guid,
                        StudentIntent::mark_present(self.attendance_points),
                    )
                    .await?;
                info!(
                    student = %student.guid,
                    points = self.attendance_points,
                    "attendance recorded"
                );

                let greeting = format!("Welcome, {}!", student.first_name());
                self.session.set_feedback(
                    ScanStatus::Success,
                    greeting.clone(),
                    Some(student.guid),
                    reset_at,
                );
                self.feedback.tone(ToneKind::Success).await;
                self.feedback.speak(&greeting).await;
                self.bus.emit_lossy(EngagementEvent::AttendanceMarked {
                    student_id: student.guid,
                    student_name: student.name.clone(),
                    points_awarded: self.attendance_points,
                    timestamp: now,
                });
                self.bus.emit_lossy(EngagementEvent::ScanFeedback {
                    status: ScanStatus::Success,
                    message: greeting,
                    student_id: Some(student.guid),
                    paid: Some(student.paid),
                    tone: Some(ToneKind::Success),
                    timestamp: now,
                });
            }
        }

        Ok(Some(outcome))
    }

    /// Apply a due feedback reset
    ///
    /// The embedding layer calls this from its own tick. Returns `true`
    /// when the session returned to `Ready`.
    pub fn poll_reset(&mut self) -> bool {
        let now = self.clock.now();
        if self.session.poll_reset(now) {
            self.bus
                .emit_lossy(EngagementEvent::ScanFeedbackReset { timestamp: now });
            true
        } else {
            false
        }
    }

    /// Current feedback state of this surface
    pub fn session(&self) -> &ScanSession {
        &self.session
    }
}
