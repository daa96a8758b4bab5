//! Roster store over the students table

use crate::error::{Error, Result};
use crate::services::RosterStore;
use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::debug;
use tutordesk_common::model::{Student, StudentIntent};
use uuid::Uuid;

/// SQLite-backed roster
#[derive(Clone)]
pub struct SqliteRoster {
    db: SqlitePool,
}

impl SqliteRoster {
    /// Create a roster store over an initialized pool
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RosterStore for SqliteRoster {
    /// Snapshot in insertion order
    ///
    /// Insertion order is the roster order the matcher's substring
    /// tie-break documents, so it must stay stable across reads.
    async fn snapshot(&self) -> Result<Vec<Student>> {
        let rows = sqlx::query_as::<_, (String, String, String, String, bool, bool, i64, i64)>(
            r#"
            SELECT guid, name, code, phone, attended_today, paid, streak_days, points
            FROM students
            ORDER BY rowid ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        rows.into_iter()
            .map(|row| {
                let guid = Uuid::parse_str(&row.0)
                    .map_err(|e| Error::Internal(format!("invalid student UUID: {}", e)))?;
                Ok(Student {
                    guid,
                    name: row.1,
                    code: row.2,
                    phone: row.3,
                    attended_today: row.4,
                    paid: row.5,
                    streak_days: row.6,
                    points: row.7,
                })
            })
            .collect()
    }

    async fn apply_intent(&self, student: Uuid, intent: StudentIntent) -> Result<()> {
        let guid = student.to_string();

        if let Some(attendance) = intent.attendance {
            sqlx::query("UPDATE students SET attended_today = ? WHERE guid = ?")
                .bind(attendance)
                .bind(&guid)
                .execute(&self.db)
                .await?;
        }

        if let Some(delta) = intent.points_delta {
            sqlx::query("UPDATE students SET points = points + ? WHERE guid = ?")
                .bind(delta)
                .bind(&guid)
                .execute(&self.db)
                .await?;
        }

        if let Some(at) = intent.last_report_at {
            sqlx::query("UPDATE students SET last_report_at = ? WHERE guid = ?")
                .bind(at)
                .bind(&guid)
                .execute(&self.db)
                .await?;
        }

        debug!(student = %student, "intent applied");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutordesk_common::db::create_schema;

    async fn setup() -> SqlitePool {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        create_schema(&pool).await.unwrap();
        pool
    }

    async fn insert_student(pool: &SqlitePool, guid: &str, name: &str, code: &str) {
        sqlx::query("INSERT INTO students (guid, name, code, phone) VALUES (?, ?, ?, '+15550100')")
            .bind(guid)
            .bind(name)
            .bind(code)
            .execute(pool)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_snapshot_preserves_insertion_order() {
        let pool = setup().await;
        insert_student(&pool, &Uuid::from_u128(1).to_string(), "Zoe", "M10").await;
        insert_student(&pool, &Uuid::from_u128(2).to_string(), "Amy", "M102").await;

        let roster = SqliteRoster::new(pool);
        let snapshot = roster.snapshot().await.unwrap();

        assert_eq!(snapshot.len(), 2);
        // Insertion order, not alphabetical
        assert_eq!(snapshot[0].name, "Zoe");
        assert_eq!(snapshot[1].name, "Amy");
    }

    #[tokio::test]
    async fn test_attendance_intent_applies() {
        let pool = setup().await;
        let guid = Uuid::from_u128(1);
        insert_student(&pool, &guid.to_string(), "Mina Park", "M1023").await;

        let roster = SqliteRoster::new(pool);
        roster
            .apply_intent(guid, StudentIntent::mark_present(10))
            .await
            .unwrap();

        let snapshot = roster.snapshot().await.unwrap();
        assert!(snapshot[0].attended_today);
        assert_eq!(snapshot[0].points, 10);
    }

    #[tokio::test]
    async fn test_points_accumulate_across_intents() {
        let pool = setup().await;
        let guid = Uuid::from_u128(1);
        insert_student(&pool, &guid.to_string(), "Mina Park", "M1023").await;

        let roster = SqliteRoster::new(pool);
        roster
            .apply_intent(guid, StudentIntent::mark_present(10))
            .await
            .unwrap();
        roster
            .apply_intent(
                guid,
                StudentIntent {
                    attendance: None,
                    points_delta: Some(5),
                    last_report_at: None,
                },
            )
            .await
            .unwrap();

        let snapshot = roster.snapshot().await.unwrap();
        assert_eq!(snapshot[0].points, 15);
    }

    #[tokio::test]
    async fn test_last_report_intent_applies() {
        let pool = setup().await;
        let guid = Uuid::from_u128(1);
        insert_student(&pool, &guid.to_string(), "Mina Park", "M1023").await;

        let roster = SqliteRoster::new(pool.clone());
        let at = chrono::Utc::now();
        roster
            .apply_intent(guid, StudentIntent::report_delivered(at))
            .await
            .unwrap();

        let stored: Option<chrono::DateTime<chrono::Utc>> =
            sqlx::query_scalar("SELECT last_report_at FROM students WHERE guid = ?")
                .bind(guid.to_string())
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(stored, Some(at));
    }

    #[tokio::test]
    async fn test_empty_intent_is_a_no_op() {
        let pool = setup().await;
        let guid = Uuid::from_u128(1);
        insert_student(&pool, &guid.to_string(), "Mina Park", "M1023").await;

        let roster = SqliteRoster::new(pool);
        roster
            .apply_intent(guid, StudentIntent::default())
            .await
            .unwrap();

        let snapshot = roster.snapshot().await.unwrap();
        assert!(!snapshot[0].attended_today);
        assert_eq!(snapshot[0].points, 0);
    }
}
