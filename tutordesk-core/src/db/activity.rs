//! Activity log over the submissions and quiz_results tables

use crate::error::{Error, Result};
use crate::services::ActivityStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tutordesk_common::model::{QuizResult, Submission};
use uuid::Uuid;

/// SQLite-backed activity log
#[derive(Clone)]
pub struct SqliteActivityLog {
    db: SqlitePool,
}

impl SqliteActivityLog {
    /// Create an activity log over an initialized pool
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ActivityStore for SqliteActivityLog {
    async fn recent_submissions(
        &self,
        student: Uuid,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Submission>> {
        let rows = sqlx::query_as::<_, (String, String, String, Option<f64>, DateTime<Utc>)>(
            r#"
            SELECT guid, student_guid, title, grade, submitted_at
            FROM submissions
            WHERE student_guid = ? AND submitted_at >= ?
            ORDER BY submitted_at DESC
            LIMIT ?
            "#,
        )
        .bind(student.to_string())
        .bind(since)
        .bind(limit as i64)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(Submission {
                    guid: parse_uuid(&row.0)?,
                    student_guid: parse_uuid(&row.1)?,
                    title: row.2,
                    grade: row.3,
                    submitted_at: row.4,
                })
            })
            .collect()
    }

    async fn recent_results(
        &self,
        student: Uuid,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<QuizResult>> {
        let rows = sqlx::query_as::<_, (String, String, f64, DateTime<Utc>)>(
            r#"
            SELECT guid, student_guid, score, taken_at
            FROM quiz_results
            WHERE student_guid = ? AND taken_at >= ?
            ORDER BY taken_at DESC
            LIMIT ?
            "#,
        )
        .bind(student.to_string())
        .bind(since)
        .bind(limit as i64)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(QuizResult {
                    guid: parse_uuid(&row.0)?,
                    student_guid: parse_uuid(&row.1)?,
                    score: row.2,
                    taken_at: row.3,
                })
            })
            .collect()
    }
}

fn parse_uuid(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|e| Error::Internal(format!("invalid UUID in database: {}", e)))
}
