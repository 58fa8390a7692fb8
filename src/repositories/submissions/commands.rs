use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use time::PrimitiveDateTime;

use crate::db::models::Submission;
use crate::db::types::{AnalysisStatus, SubmissionType};

use super::types::{CompletionUpdate, NewListeningSubmission, NewWritingSubmission, COLUMNS};

async fn insert_submission(
    conn: &mut PgConnection,
    id: &str,
    user_id: &str,
    submission_type: SubmissionType,
    status: AnalysisStatus,
    created_at: PrimitiveDateTime,
) -> Result<Submission, sqlx::Error> {
    sqlx::query_as::<_, Submission>(&format!(
        "INSERT INTO submissions (
            id, user_id, submission_type, status, overall_score, error_message,
            assessed_at, created_at, updated_at
        ) VALUES ($1, $2, $3, $4, NULL, NULL, NULL, $5, $5)
        RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(user_id)
    .bind(submission_type)
    .bind(status)
    .bind(created_at)
    .fetch_one(conn)
    .await
}

/// Inserts the submission row and its writing details in one transaction.
pub(crate) async fn create_writing(
    pool: &PgPool,
    params: NewWritingSubmission<'_>,
) -> Result<Submission, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let submission = insert_submission(
        &mut tx,
        params.id,
        params.user_id,
        SubmissionType::Writing,
        params.status,
        params.created_at,
    )
    .await?;

    sqlx::query(
        "INSERT INTO writing_submissions (submission_id, topic, text_body, word_count)
         VALUES ($1, $2, $3, $4)",
    )
    .bind(params.id)
    .bind(params.topic)
    .bind(params.text_body)
    .bind(params.word_count)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(submission)
}

/// Inserts the submission row and its listening details in one transaction.
pub(crate) async fn create_listening(
    pool: &PgPool,
    params: NewListeningSubmission<'_>,
) -> Result<Submission, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let submission = insert_submission(
        &mut tx,
        params.id,
        params.user_id,
        SubmissionType::Listening,
        params.status,
        params.created_at,
    )
    .await?;

    sqlx::query(
        "INSERT INTO listening_submissions (
            submission_id, topic, audio_url, duration_seconds, transcription
        ) VALUES ($1, $2, $3, $4, NULL)",
    )
    .bind(params.id)
    .bind(params.topic)
    .bind(params.audio_url)
    .bind(params.duration_seconds)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(submission)
}

/// Stores the assessment result and moves the submission to `completed`.
///
/// Returns `false` (and writes nothing) when the submission is no longer
/// in progress.
pub(crate) async fn complete(
    pool: &PgPool,
    submission_id: &str,
    submission_type: SubmissionType,
    update: CompletionUpdate,
) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let moved = sqlx::query(
        "UPDATE submissions
         SET status = $1,
             overall_score = $2,
             error_message = NULL,
             assessed_at = $3,
             updated_at = $3
         WHERE id = $4 AND status = $5",
    )
    .bind(AnalysisStatus::Completed)
    .bind(update.overall_score)
    .bind(update.completed_at)
    .bind(submission_id)
    .bind(AnalysisStatus::InProgress)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if moved == 0 {
        tx.rollback().await?;
        return Ok(false);
    }

    sqlx::query(
        "INSERT INTO assessment_results (
            submission_id, grammar_score, vocabulary_score, coherence_score, fluency_score,
            pronunciation_score, feedback_summary, suggestions, created_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(submission_id)
    .bind(update.grammar_score)
    .bind(update.vocabulary_score)
    .bind(update.coherence_score)
    .bind(update.fluency_score)
    .bind(update.pronunciation_score)
    .bind(&update.feedback_summary)
    .bind(Json(&update.suggestions))
    .bind(update.completed_at)
    .execute(&mut *tx)
    .await?;

    if submission_type == SubmissionType::Listening {
        sqlx::query("UPDATE listening_submissions SET transcription = $1 WHERE submission_id = $2")
            .bind(update.transcription.as_deref())
            .bind(submission_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(true)
}

/// Moves a non-terminal submission to `failed`. Returns whether a row changed.
pub(crate) async fn mark_failed(
    pool: &PgPool,
    submission_id: &str,
    error_message: &str,
    now: PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let updated = sqlx::query(
        "UPDATE submissions
         SET status = $1,
             error_message = $2,
             updated_at = $3
         WHERE id = $4 AND status IN ($5, $6)",
    )
    .bind(AnalysisStatus::Failed)
    .bind(error_message)
    .bind(now)
    .bind(submission_id)
    .bind(AnalysisStatus::Pending)
    .bind(AnalysisStatus::InProgress)
    .execute(pool)
    .await?
    .rows_affected();

    Ok(updated > 0)
}

/// Fails every non-terminal submission untouched since `cutoff`.
pub(crate) async fn fail_stale(
    pool: &PgPool,
    cutoff: PrimitiveDateTime,
    error_message: &str,
    now: PrimitiveDateTime,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "UPDATE submissions
         SET status = $1,
             error_message = $2,
             updated_at = $3
         WHERE status IN ($4, $5)
           AND updated_at < $6
         RETURNING id",
    )
    .bind(AnalysisStatus::Failed)
    .bind(error_message)
    .bind(now)
    .bind(AnalysisStatus::Pending)
    .bind(AnalysisStatus::InProgress)
    .bind(cutoff)
    .fetch_all(pool)
    .await
}
