use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use crate::application::ports::{RepositoryError, TaskRepository};
use crate::domain::{AudioFile, AudioTask, TaskId, TaskState, Transcript};

/// Postgres task store.
///
/// The claim and outcome saves are single conditional UPDATEs, so each runs
/// atomically regardless of isolation level; the claim's WHERE clause carries
/// the whole single-flight condition. SQLSTATE 40001/40P01 map to
/// `RepositoryError::Conflict` so outcome saves can retry.
pub struct PgTaskRepository {
    pool: PgPool,
}

impl PgTaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_sqlx_err(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(db) = &e {
        // 40001 serialization_failure, 40P01 deadlock_detected
        if matches!(db.code().as_deref(), Some("40001") | Some("40P01")) {
            return RepositoryError::Conflict(db.message().to_string());
        }
    }
    RepositoryError::QueryFailed(e.to_string())
}

fn row_to_task(row: &PgRow) -> Result<AudioTask, RepositoryError> {
    let map = |e: sqlx::Error| RepositoryError::QueryFailed(e.to_string());

    let id: Uuid = row.try_get("id").map_err(map)?;
    let state: String = row.try_get("state").map_err(map)?;
    let state = state.parse::<TaskState>().map_err(RepositoryError::QueryFailed)?;

    let audio_data: Option<Vec<u8>> = row.try_get("audio_data").map_err(map)?;
    let audio_filename: Option<String> = row.try_get("audio_filename").map_err(map)?;
    let audio = match (audio_data, audio_filename) {
        (Some(data), Some(filename)) => Some(AudioFile::new(data, filename)),
        _ => None,
    };

    let transcription: Option<String> = row.try_get("transcription").map_err(map)?;
    let transcription_secs: Option<f64> = row.try_get("transcription_secs").map_err(map)?;
    let result_filename: Option<String> = row.try_get("result_filename").map_err(map)?;
    let transcript = match (transcription, result_filename) {
        (Some(text), Some(result_filename)) => Some(Transcript {
            text,
            result_filename,
            elapsed: Duration::from_secs_f64(transcription_secs.unwrap_or_default()),
        }),
        _ => None,
    };

    let priority: String = row.try_get("priority").map_err(map)?;
    let priority = priority.parse().map_err(RepositoryError::QueryFailed)?;

    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(map)?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(map)?;

    Ok(AudioTask {
        id: TaskId::from_uuid(id),
        name: row.try_get("name").map_err(map)?,
        state,
        audio,
        transcript,
        error_message: row.try_get("error_message").map_err(map)?,
        priority,
        category: row.try_get("category").map_err(map)?,
        tags: row.try_get("tags").map_err(map)?,
        owner: row.try_get("owner_name").map_err(map)?,
        created_at,
        updated_at,
    })
}

const SELECT_COLUMNS: &str = "id, name, state, audio_data, audio_filename, transcription, \
     transcription_secs, result_filename, error_message, priority, category, tags, owner_name, \
     created_at, updated_at";

#[async_trait]
impl TaskRepository for PgTaskRepository {
    #[instrument(skip(self, task), fields(task_id = %task.id))]
    async fn create(&self, task: &AudioTask) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO audio_tasks
                (id, name, state, audio_data, audio_filename, transcription,
                 transcription_secs, result_filename, error_message, priority, category, tags,
                 owner_name, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(task.id.as_uuid())
        .bind(&task.name)
        .bind(task.state.as_str())
        .bind(task.audio.as_ref().map(|a| a.data.to_vec()))
        .bind(task.audio.as_ref().map(|a| a.filename.clone()))
        .bind(task.transcript.as_ref().map(|t| t.text.clone()))
        .bind(task.transcript.as_ref().map(|t| t.elapsed.as_secs_f64()))
        .bind(task.transcript.as_ref().map(|t| t.result_filename.clone()))
        .bind(&task.error_message)
        .bind(task.priority.as_str())
        .bind(&task.category)
        .bind(&task.tags)
        .bind(&task.owner)
        .bind(task.created_at)
        .bind(task.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(())
    }

    #[instrument(skip(self), fields(task_id = %id))]
    async fn get_by_id(&self, id: TaskId) -> Result<Option<AudioTask>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM audio_tasks WHERE id = $1",
            SELECT_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        row.as_ref().map(row_to_task).transpose()
    }

    #[instrument(skip(self, task), fields(task_id = %task.id))]
    async fn update(&self, task: &AudioTask) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE audio_tasks
            SET name = $2, state = $3, audio_data = $4, audio_filename = $5,
                transcription = $6, transcription_secs = $7, result_filename = $8,
                error_message = $9, priority = $10, category = $11, tags = $12,
                owner_name = $13, updated_at = $14
            WHERE id = $1
            "#,
        )
        .bind(task.id.as_uuid())
        .bind(&task.name)
        .bind(task.state.as_str())
        .bind(task.audio.as_ref().map(|a| a.data.to_vec()))
        .bind(task.audio.as_ref().map(|a| a.filename.clone()))
        .bind(task.transcript.as_ref().map(|t| t.text.clone()))
        .bind(task.transcript.as_ref().map(|t| t.elapsed.as_secs_f64()))
        .bind(task.transcript.as_ref().map(|t| t.result_filename.clone()))
        .bind(&task.error_message)
        .bind(task.priority.as_str())
        .bind(&task.category)
        .bind(&task.tags)
        .bind(&task.owner)
        .bind(task.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(task.id.to_string()));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(task_id = %id))]
    async fn delete(&self, id: TaskId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM audio_tasks WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(())
    }

    #[instrument(skip(self), fields(state = %state))]
    async fn list_by_state(&self, state: TaskState) -> Result<Vec<AudioTask>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM audio_tasks WHERE state = $1 ORDER BY created_at ASC, id ASC",
            SELECT_COLUMNS
        ))
        .bind(state.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        rows.iter().map(row_to_task).collect()
    }

    #[instrument(skip(self))]
    async fn has_transcribing(&self) -> Result<bool, RepositoryError> {
        let row =
            sqlx::query("SELECT EXISTS (SELECT 1 FROM audio_tasks WHERE state = 'TRANSCRIBING')")
                .fetch_one(&self.pool)
                .await
                .map_err(map_sqlx_err)?;

        row.try_get::<bool, _>(0)
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))
    }

    #[instrument(skip(self))]
    async fn next_pending(&self) -> Result<Option<AudioTask>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM audio_tasks WHERE state = 'PENDING' \
             ORDER BY created_at ASC, id ASC LIMIT 1",
            SELECT_COLUMNS
        ))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        row.as_ref().map(row_to_task).transpose()
    }

    #[instrument(skip(self), fields(task_id = %id))]
    async fn pending_position(&self, id: TaskId) -> Result<Option<usize>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT pos FROM (
                SELECT id, ROW_NUMBER() OVER (ORDER BY created_at ASC, id ASC) AS pos
                FROM audio_tasks
                WHERE state = 'PENDING'
            ) queue
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        match row {
            Some(row) => {
                let pos: i64 = row
                    .try_get("pos")
                    .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;
                Ok(Some(pos as usize))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self), fields(task_id = %id))]
    async fn claim_for_transcription(&self, id: TaskId) -> Result<bool, RepositoryError> {
        // The NOT EXISTS re-checks the single-flight condition inside the
        // statement itself; the caller's earlier `has_transcribing` read may
        // be stale by the time the claim runs.
        let result = sqlx::query(
            "UPDATE audio_tasks SET state = 'TRANSCRIBING', updated_at = $2 \
             WHERE id = $1 AND state = 'PENDING' \
             AND NOT EXISTS (SELECT 1 FROM audio_tasks WHERE state = 'TRANSCRIBING')",
        )
        .bind(id.as_uuid())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self, transcript), fields(task_id = %id))]
    async fn save_completion(
        &self,
        id: TaskId,
        transcript: &Transcript,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE audio_tasks
            SET state = 'DONE', transcription = $2, transcription_secs = $3,
                result_filename = $4, error_message = NULL, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(&transcript.text)
        .bind(transcript.elapsed.as_secs_f64())
        .bind(&transcript.result_filename)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self, error_message), fields(task_id = %id))]
    async fn save_failure(
        &self,
        id: TaskId,
        error_message: &str,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE audio_tasks
            SET state = 'ERROR', transcription = NULL, transcription_secs = NULL,
                result_filename = NULL, error_message = $2, updated_at = $3
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(error_message)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(result.rows_affected() == 1)
    }
}
