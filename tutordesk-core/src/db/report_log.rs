//! Report log over the report_log table

use crate::error::Result;
use crate::services::ReportLogStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use tutordesk_common::events::ReportKind;
use uuid::Uuid;

/// SQLite-backed report log
#[derive(Clone)]
pub struct SqliteReportLog {
    db: SqlitePool,
}

impl SqliteReportLog {
    /// Create a report log over an initialized pool
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ReportLogStore for SqliteReportLog {
    async fn last_delivered(
        &self,
        student: Uuid,
        kind: ReportKind,
    ) -> Result<Option<DateTime<Utc>>> {
        let row: Option<(DateTime<Utc>,)> = sqlx::query_as(
            "SELECT delivered_at FROM report_log WHERE student_guid = ? AND kind = ?",
        )
        .bind(student.to_string())
        .bind(kind.as_str())
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(|r| r.0))
    }

    async fn record(&self, student: Uuid, kind: ReportKind, at: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO report_log (student_guid, kind, delivered_at)
            VALUES (?, ?, ?)
            ON CONFLICT(student_guid, kind) DO UPDATE SET delivered_at = excluded.delivered_at
            "#,
        )
        .bind(student.to_string())
        .bind(kind.as_str())
        .bind(at)
        .execute(&self.db)
        .await?;

        debug!(student = %student, kind = kind.as_str(), "delivery instant recorded");
        Ok(())
    }
}
