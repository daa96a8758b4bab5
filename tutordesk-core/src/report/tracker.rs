//! Delivery tracking
//!
//! Records when each recipient last received each periodic report kind
//! and decides who is due again. Absence alerts represent a same-day
//! event and are never recorded or deduplicated.

use crate::error::Result;
use crate::services::ReportLogStore;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::debug;
use tutordesk_common::events::ReportKind;
use tutordesk_common::model::Student;
use uuid::Uuid;

/// Per-recipient delivery state over the report-log store
pub struct DeliveryTracker {
    store: Arc<dyn ReportLogStore>,
    due_after: Duration,
}

impl DeliveryTracker {
    /// Create a tracker; recipients become due again `due_days` after
    /// their last delivery
    pub fn new(store: Arc<dyn ReportLogStore>, due_days: i64) -> Self {
        Self {
            store,
            due_after: Duration::days(due_days),
        }
    }

    /// Whether `recipient` is due for a report of `kind` at `now`
    ///
    /// Periodic kinds are due when no record exists or the last delivery
    /// is more than the due period before `now`. Absence alerts are
    /// always due.
    pub async fn is_due(
        &self,
        recipient: Uuid,
        kind: ReportKind,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        if !kind.is_periodic() {
            return Ok(true);
        }

        match self.store.last_delivered(recipient, kind).await? {
            None => Ok(true),
            Some(last) => Ok(now - last > self.due_after),
        }
    }

    /// Record a delivery at `now` (last-write-wins)
    ///
    /// No-op for absence alerts, which are untracked.
    pub async fn record(
        &self,
        recipient: Uuid,
        kind: ReportKind,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if !kind.is_periodic() {
            debug!(recipient = %recipient, "absence alert not tracked");
            return Ok(());
        }

        self.store.record(recipient, kind, now).await?;
        debug!(recipient = %recipient, kind = kind.as_str(), "delivery recorded");
        Ok(())
    }

    /// Filter a roster snapshot down to the recipients due for `kind`
    ///
    /// Used to seed a report batch that resumes where the previous day's
    /// run left off: recipients already notified drop out.
    pub async fn filter_due(
        &self,
        students: &[Student],
        kind: ReportKind,
        now: DateTime<Utc>,
    ) -> Result<Vec<Student>> {
        let mut due = Vec::new();
        for student in students {
            if self.is_due(student.guid, kind, now).await? {
                due.push(student.clone());
            }
        }
        Ok(due)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory report log
    struct MemoryReportLog {
        records: Mutex<HashMap<(Uuid, ReportKind), DateTime<Utc>>>,
    }

    impl MemoryReportLog {
        fn new() -> Self {
            Self {
                records: Mutex::new(HashMap::new()),
            }
        }

        fn len(&self) -> usize {
            self.records.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ReportLogStore for MemoryReportLog {
        async fn last_delivered(
            &self,
            student: Uuid,
            kind: ReportKind,
        ) -> Result<Option<DateTime<Utc>>> {
            Ok(self.records.lock().unwrap().get(&(student, kind)).copied())
        }

        async fn record(
            &self,
            student: Uuid,
            kind: ReportKind,
            at: DateTime<Utc>,
        ) -> Result<()> {
            self.records.lock().unwrap().insert((student, kind), at);
            Ok(())
        }
    }

    fn tracker(store: Arc<MemoryReportLog>) -> DeliveryTracker {
        DeliveryTracker::new(store, 14)
    }

    #[tokio::test]
    async fn test_due_with_no_prior_record() {
        let store = Arc::new(MemoryReportLog::new());
        let tracker = tracker(Arc::clone(&store));
        let recipient = Uuid::new_v4();

        assert!(tracker
            .is_due(recipient, ReportKind::PeriodicShort, Utc::now())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_not_due_immediately_after_record() {
        let store = Arc::new(MemoryReportLog::new());
        let tracker = tracker(Arc::clone(&store));
        let recipient = Uuid::new_v4();
        let now = Utc::now();

        tracker
            .record(recipient, ReportKind::PeriodicShort, now)
            .await
            .unwrap();

        assert!(!tracker
            .is_due(recipient, ReportKind::PeriodicShort, now)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_due_again_past_the_period() {
        let store = Arc::new(MemoryReportLog::new());
        let tracker = tracker(Arc::clone(&store));
        let recipient = Uuid::new_v4();
        let now = Utc::now();

        tracker
            .record(recipient, ReportKind::PeriodicShort, now)
            .await
            .unwrap();

        // Exactly 14 days later: not yet more than the period
        assert!(!tracker
            .is_due(recipient, ReportKind::PeriodicShort, now + Duration::days(14))
            .await
            .unwrap());

        // 15 days later: due again
        assert!(tracker
            .is_due(recipient, ReportKind::PeriodicShort, now + Duration::days(15))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_kinds_tracked_independently() {
        let store = Arc::new(MemoryReportLog::new());
        let tracker = tracker(Arc::clone(&store));
        let recipient = Uuid::new_v4();
        let now = Utc::now();

        tracker
            .record(recipient, ReportKind::PeriodicShort, now)
            .await
            .unwrap();

        assert!(!tracker
            .is_due(recipient, ReportKind::PeriodicShort, now)
            .await
            .unwrap());
        assert!(tracker
            .is_due(recipient, ReportKind::PeriodicLong, now)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_absence_alerts_always_due_and_never_recorded() {
        let store = Arc::new(MemoryReportLog::new());
        let tracker = tracker(Arc::clone(&store));
        let recipient = Uuid::new_v4();
        let now = Utc::now();

        tracker
            .record(recipient, ReportKind::AbsenceAlert, now)
            .await
            .unwrap();

        assert_eq!(store.len(), 0);
        assert!(tracker
            .is_due(recipient, ReportKind::AbsenceAlert, now)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_record_overwrites_last_write_wins() {
        let store = Arc::new(MemoryReportLog::new());
        let tracker = tracker(Arc::clone(&store));
        let recipient = Uuid::new_v4();
        let first = Utc::now();
        let second = first + Duration::days(20);

        tracker
            .record(recipient, ReportKind::PeriodicShort, first)
            .await
            .unwrap();
        tracker
            .record(recipient, ReportKind::PeriodicShort, second)
            .await
            .unwrap();

        // Due is computed from the overwritten (later) instant
        assert!(!tracker
            .is_due(recipient, ReportKind::PeriodicShort, second + Duration::days(1))
            .await
            .unwrap());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_filter_due_drops_recent_recipients() {
        let store = Arc::new(MemoryReportLog::new());
        let tracker = tracker(Arc::clone(&store));
        let now = Utc::now();

        let make = |i: u128| Student {
            guid: Uuid::from_u128(i),
            name: format!("Student {}", i),
            code: format!("M10{:02}", i),
            phone: String::new(),
            attended_today: false,
            paid: true,
            streak_days: 0,
            points: 0,
        };
        let students = vec![make(1), make(2), make(3)];

        // Student 2 was notified yesterday
        tracker
            .record(students[1].guid, ReportKind::PeriodicShort, now - Duration::days(1))
            .await
            .unwrap();

        let due = tracker
            .filter_due(&students, ReportKind::PeriodicShort, now)
            .await
            .unwrap();
        let due_ids: Vec<Uuid> = due.iter().map(|s| s.guid).collect();
        assert_eq!(due_ids, vec![students[0].guid, students[2].guid]);
    }
}
