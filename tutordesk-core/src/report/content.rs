//! Report content generation
//!
//! Absence alerts are rendered from a deterministic template. Periodic
//! reports summarize a trailing activity window and delegate the prose to
//! the external text-generation service; when that call fails the fixed
//! fallback text is substituted so the operator can still edit and send.

use crate::error::Result;
use crate::services::{ActivityStore, TextGenerator};
use chrono::Duration;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};
use tutordesk_common::events::ReportKind;
use tutordesk_common::model::Student;
use tutordesk_common::Clock;

/// Substituted when the generation service fails
pub const FALLBACK_TEXT: &str = "The report could not be generated.";

/// Trailing window: days, submissions taken, quiz results taken
const SHORT_WINDOW: (i64, usize, usize) = (7, 2, 1);
const LONG_WINDOW: (i64, usize, usize) = (30, 5, 3);

/// Scalars handed to the external text generator
#[derive(Debug, Clone, Serialize)]
pub struct ActivitySummary {
    /// Student display name
    pub student_name: String,
    /// Size of the combined submissions + results set
    pub task_count: usize,
    /// Mean over graded submissions and all result scores; 0 when
    /// nothing in the window is graded
    pub average_score: f64,
    /// Paid-status flag
    pub is_paid: bool,
    /// Issuer name for the report signature
    pub issuer_name: String,
    /// Human label of the summarized period
    pub period_label: String,
    /// 1 when present today or on a positive streak, else 0
    pub attendance_indicator: u8,
}

/// One generated report
#[derive(Debug, Clone)]
pub struct GeneratedReport {
    /// Report text, possibly the fallback
    pub text: String,
    /// True when the fallback was substituted for a failed generation
    pub degraded: bool,
}

/// Produces message text for one recipient and kind
pub struct ReportContentGenerator {
    activity: Arc<dyn ActivityStore>,
    generator: Arc<dyn TextGenerator>,
    clock: Arc<dyn Clock>,
    issuer_name: String,
}

impl ReportContentGenerator {
    /// Create a content generator
    pub fn new(
        activity: Arc<dyn ActivityStore>,
        generator: Arc<dyn TextGenerator>,
        clock: Arc<dyn Clock>,
        issuer_name: String,
    ) -> Self {
        Self {
            activity,
            generator,
            clock,
            issuer_name,
        }
    }

    /// Generate content for one recipient
    ///
    /// Absence alerts complete synchronously from the template; periodic
    /// kinds suspend on the activity stores and the generation service.
    /// Never fails: every failure path degrades to the fallback text.
    pub async fn generate(&self, student: &Student, kind: ReportKind) -> GeneratedReport {
        match kind {
            ReportKind::AbsenceAlert => GeneratedReport {
                text: self.absence_template(student),
                degraded: false,
            },
            ReportKind::PeriodicShort => self.generate_periodic(student, kind, SHORT_WINDOW).await,
            ReportKind::PeriodicLong => self.generate_periodic(student, kind, LONG_WINDOW).await,
        }
    }

    fn absence_template(&self, student: &Student) -> String {
        format!(
            "Dear parent, {} was absent from today's session at the center. \
             Please contact us if this is unexpected. — {}",
            student.name, self.issuer_name
        )
    }

    async fn generate_periodic(
        &self,
        student: &Student,
        kind: ReportKind,
        (window_days, submission_limit, result_limit): (i64, usize, usize),
    ) -> GeneratedReport {
        let summary = match self
            .build_summary(student, kind, window_days, submission_limit, result_limit)
            .await
        {
            Ok(summary) => summary,
            Err(e) => {
                warn!(student = %student.guid, error = %e, "activity summary failed; substituting fallback");
                return GeneratedReport {
                    text: FALLBACK_TEXT.to_string(),
                    degraded: true,
                };
            }
        };

        match self.generator.generate(&summary).await {
            Ok(text) => GeneratedReport {
                text,
                degraded: false,
            },
            Err(e) => {
                warn!(student = %student.guid, error = %e, "text generation failed; substituting fallback");
                GeneratedReport {
                    text: FALLBACK_TEXT.to_string(),
                    degraded: true,
                }
            }
        }
    }

    /// Compute the activity scalars for one student and window
    pub async fn build_summary(
        &self,
        student: &Student,
        kind: ReportKind,
        window_days: i64,
        submission_limit: usize,
        result_limit: usize,
    ) -> Result<ActivitySummary> {
        let since = self.clock.now() - Duration::days(window_days);
        let submissions = self
            .activity
            .recent_submissions(student.guid, since, submission_limit)
            .await?;
        let results = self
            .activity
            .recent_results(student.guid, since, result_limit)
            .await?;

        let task_count = submissions.len() + results.len();
        // Submissions contribute their grade only when graded; results
        // always contribute their score
        let graded: Vec<f64> = submissions
            .iter()
            .filter_map(|s| s.grade)
            .chain(results.iter().map(|r| r.score))
            .collect();
        let average_score = if graded.is_empty() {
            0.0
        } else {
            graded.iter().sum::<f64>() / graded.len() as f64
        };
        let attendance_indicator = u8::from(student.attended_today || student.streak_days > 0);

        debug!(
            student = %student.guid,
            task_count,
            average_score,
            attendance_indicator,
            "activity summary computed"
        );

        Ok(ActivitySummary {
            student_name: student.name.clone(),
            task_count,
            average_score,
            is_paid: student.paid,
            issuer_name: self.issuer_name.clone(),
            period_label: kind.period_label().to_string(),
            attendance_indicator,
        })
    }

    /// Issuer name substituted into templates
    pub fn issuer_name(&self) -> &str {
        &self.issuer_name
    }
}
