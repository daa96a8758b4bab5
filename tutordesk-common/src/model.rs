//! Domain records shared between the engagement core and the dashboard
//!
//! The roster, activity log, and report log are owned by the surrounding
//! dashboard. The core reads snapshots of these records and proposes
//! mutations through [`StudentIntent`] values; it never writes the owning
//! stores directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Roster entry snapshot
///
/// A point-in-time copy of one student row. Snapshots are taken per
/// operation; the core holds no long-lived reference into the roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    /// Student UUID
    pub guid: Uuid,
    /// Display name
    pub name: String,
    /// Unique badge code, matched case-insensitively
    pub code: String,
    /// Phone number reports are delivered to
    pub phone: String,
    /// Attendance flag for the current day
    pub attended_today: bool,
    /// Paid-status flag (feedback rendering only)
    pub paid: bool,
    /// Consecutive-attendance streak in days
    pub streak_days: i64,
    /// Accumulated reward points
    pub points: i64,
}

impl Student {
    /// First whitespace-separated token of the display name
    ///
    /// Used for spoken greetings; falls back to the full name when the
    /// name contains no whitespace.
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }
}

/// Requested roster mutation
///
/// The core emits intents; the owning store applies them. Fields left as
/// `None` are untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudentIntent {
    /// Set the current-day attendance flag
    pub attendance: Option<bool>,
    /// Adjust reward points by this amount
    pub points_delta: Option<i64>,
    /// Record when the last periodic report went out
    pub last_report_at: Option<DateTime<Utc>>,
}

impl StudentIntent {
    /// Intent marking a student present and awarding points
    pub fn mark_present(points: i64) -> Self {
        Self {
            attendance: Some(true),
            points_delta: Some(points),
            last_report_at: None,
        }
    }

    /// Intent recording the last-report timestamp
    pub fn report_delivered(at: DateTime<Utc>) -> Self {
        Self {
            attendance: None,
            points_delta: None,
            last_report_at: Some(at),
        }
    }
}

/// Assignment submission (activity log, read-only for the core)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    /// Submission UUID
    pub guid: Uuid,
    /// Student UUID
    pub student_guid: Uuid,
    /// Assignment title
    pub title: String,
    /// Grade, if the submission has been graded
    pub grade: Option<f64>,
    /// When the submission arrived
    pub submitted_at: DateTime<Utc>,
}

/// Quiz result (activity log, read-only for the core)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizResult {
    /// Result UUID
    pub guid: Uuid,
    /// Student UUID
    pub student_guid: Uuid,
    /// Score, always graded
    pub score: f64,
    /// When the quiz was taken
    pub taken_at: DateTime<Utc>,
}
