//! Database initialization
//!
//! Opens the SQLite pool and creates tables on first run. All statements
//! are idempotent, so calling this on an existing database is safe.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await?;

    // WAL keeps the scan surface responsive while report queries run
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create all tables (idempotent - safe to call multiple times)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_students_table(pool).await?;
    create_submissions_table(pool).await?;
    create_quiz_results_table(pool).await?;
    create_report_log_table(pool).await?;
    Ok(())
}

async fn create_students_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS students (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            code TEXT NOT NULL UNIQUE,
            phone TEXT NOT NULL DEFAULT '',
            attended_today INTEGER NOT NULL DEFAULT 0,
            paid INTEGER NOT NULL DEFAULT 0,
            streak_days INTEGER NOT NULL DEFAULT 0,
            points INTEGER NOT NULL DEFAULT 0,
            last_report_at TIMESTAMP,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_submissions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS submissions (
            guid TEXT PRIMARY KEY,
            student_guid TEXT NOT NULL REFERENCES students(guid),
            title TEXT NOT NULL DEFAULT '',
            grade REAL,
            submitted_at TIMESTAMP NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_quiz_results_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS quiz_results (
            guid TEXT PRIMARY KEY,
            student_guid TEXT NOT NULL REFERENCES students(guid),
            score REAL NOT NULL,
            taken_at TIMESTAMP NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_report_log_table(pool: &SqlitePool) -> Result<()> {
    // One row per (recipient, kind); record() overwrites delivered_at
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS report_log (
            student_guid TEXT NOT NULL REFERENCES students(guid),
            kind TEXT NOT NULL,
            delivered_at TIMESTAMP NOT NULL,
            PRIMARY KEY (student_guid, kind)
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_schema_idempotent() {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        create_schema(&pool).await.unwrap();
        // Second run must not fail
        create_schema(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn test_student_round_trip() {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        create_schema(&pool).await.unwrap();

        sqlx::query(
            "INSERT INTO students (guid, name, code, phone) VALUES (?, ?, ?, ?)",
        )
        .bind("7f1e9bd2-4c55-4f3b-9c61-2a40f3a1c001")
        .bind("Mina Park")
        .bind("M1023")
        .bind("+15550100")
        .execute(&pool)
        .await
        .unwrap();

        let (name, attended): (String, bool) = sqlx::query_as(
            "SELECT name, attended_today FROM students WHERE code = ?",
        )
        .bind("M1023")
        .fetch_one(&pool)
        .await
        .unwrap();

        assert_eq!(name, "Mina Park");
        assert!(!attended);
    }

    #[tokio::test]
    async fn test_report_log_key_is_recipient_and_kind() {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        create_schema(&pool).await.unwrap();

        sqlx::query("INSERT INTO students (guid, name, code) VALUES ('s1', 'A', 'C1')")
            .execute(&pool)
            .await
            .unwrap();

        sqlx::query(
            "INSERT INTO report_log (student_guid, kind, delivered_at) VALUES ('s1', 'periodic-short', '2026-01-05T00:00:00Z')",
        )
        .execute(&pool)
        .await
        .unwrap();

        // Same recipient, different kind: separate row
        sqlx::query(
            "INSERT INTO report_log (student_guid, kind, delivered_at) VALUES ('s1', 'periodic-long', '2026-01-06T00:00:00Z')",
        )
        .execute(&pool)
        .await
        .unwrap();

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM report_log")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count.0, 2);
    }
}
