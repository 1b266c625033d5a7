//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use study_assistant_core::domain::{NewStudySession, StudySession, SubjectProgress, User};
use study_assistant_core::ports::{DatabaseService, PortError, PortResult};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    user_id: Uuid,
    #[allow(dead_code)]
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            user_id: self.user_id,
        }
    }
}

#[derive(FromRow)]
struct StudySessionRecord {
    id: Uuid,
    user_id: Uuid,
    topic: String,
    subject: Option<String>,
    duration_minutes: i32,
    questions_answered: i32,
    materials_analyzed: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
}
impl StudySessionRecord {
    fn to_domain(self) -> StudySession {
        StudySession {
            id: self.id,
            user_id: self.user_id,
            topic: self.topic,
            subject: self.subject,
            duration_minutes: self.duration_minutes,
            questions_answered: self.questions_answered,
            materials_analyzed: self.materials_analyzed,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct SubjectProgressRecord {
    id: Uuid,
    user_id: Uuid,
    subject: String,
    total_study_time: i32,
    sessions_count: i32,
    average_accuracy: f64,
    last_activity: DateTime<Utc>,
}
impl SubjectProgressRecord {
    fn to_domain(self) -> SubjectProgress {
        SubjectProgress {
            id: self.id,
            user_id: self.user_id,
            subject: self.subject,
            total_study_time: self.total_study_time,
            sessions_count: self.sessions_count,
            average_accuracy: self.average_accuracy,
            last_activity: self.last_activity,
        }
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn get_or_create_user(&self, user_id: Uuid) -> PortResult<User> {
        sqlx::query("INSERT INTO users (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT user_id, created_at FROM users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", user_id)),
            _ => PortError::Unexpected(e.to_string()),
        })?;

        Ok(record.to_domain())
    }

    async fn record_study_session(
        &self,
        new_session: NewStudySession,
    ) -> PortResult<StudySession> {
        let questions_answered = new_session.result.questions.len() as i32;

        // A failed analysis still records the session for time tracking,
        // but with no stored payload.
        let materials_analyzed = if new_session.result.is_failed() {
            None
        } else {
            Some(
                serde_json::to_value(&new_session.result)
                    .map_err(|e| PortError::Unexpected(e.to_string()))?,
            )
        };

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let record = sqlx::query_as::<_, StudySessionRecord>(
            "INSERT INTO study_sessions \
             (id, user_id, topic, subject, duration_minutes, questions_answered, materials_analyzed) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id, user_id, topic, subject, duration_minutes, questions_answered, \
                       materials_analyzed, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(new_session.user_id)
        .bind(&new_session.topic)
        .bind(&new_session.subject)
        .bind(new_session.duration_minutes)
        .bind(questions_answered)
        .bind(&materials_analyzed)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        if let Some(subject) = &new_session.subject {
            // First use of this (user, subject) pair creates the row; the
            // unique constraint settles concurrent first-creators, and the
            // locked re-read below sees whichever row won.
            sqlx::query(
                "INSERT INTO subject_progress (id, user_id, subject) VALUES ($1, $2, $3) \
                 ON CONFLICT (user_id, subject) DO NOTHING",
            )
            .bind(Uuid::new_v4())
            .bind(new_session.user_id)
            .bind(subject)
            .execute(&mut *tx)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

            let mut progress = sqlx::query_as::<_, SubjectProgressRecord>(
                "SELECT id, user_id, subject, total_study_time, sessions_count, \
                        average_accuracy, last_activity \
                 FROM subject_progress WHERE user_id = $1 AND subject = $2 FOR UPDATE",
            )
            .bind(new_session.user_id)
            .bind(subject)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .to_domain();

            // TODO: feed real answer correctness here once the client
            // reports quiz results; nothing upstream scores answers yet.
            progress.absorb_session(new_session.duration_minutes, 0.0);

            sqlx::query(
                "UPDATE subject_progress \
                 SET total_study_time = $1, sessions_count = $2, average_accuracy = $3, \
                     last_activity = $4 \
                 WHERE id = $5",
            )
            .bind(progress.total_study_time)
            .bind(progress.sessions_count)
            .bind(progress.average_accuracy)
            .bind(progress.last_activity)
            .bind(progress.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        }

        // Dropping the transaction without this commit rolls back both the
        // session insert and the progress update.
        tx.commit()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(record.to_domain())
    }

    async fn get_sessions_by_user(&self, user_id: Uuid) -> PortResult<Vec<StudySession>> {
        let records = sqlx::query_as::<_, StudySessionRecord>(
            "SELECT id, user_id, topic, subject, duration_minutes, questions_answered, \
                    materials_analyzed, created_at \
             FROM study_sessions WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get_progress_by_user(&self, user_id: Uuid) -> PortResult<Vec<SubjectProgress>> {
        let records = sqlx::query_as::<_, SubjectProgressRecord>(
            "SELECT id, user_id, subject, total_study_time, sessions_count, \
                    average_accuracy, last_activity \
             FROM subject_progress WHERE user_id = $1 ORDER BY subject ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn delete_user_data(&self, user_id: Uuid) -> PortResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Dependents first, then the owning row.
        sqlx::query("DELETE FROM subject_progress WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        sqlx::query("DELETE FROM study_sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(())
    }
}
