use sqlx::PgPool;

use crate::db::models::{AssessmentResult, ListeningSubmission, Submission, WritingSubmission};

use super::types::{SubmissionFilter, SubmissionListRow, COLUMNS, RESULT_COLUMNS};

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Submission>, sqlx::Error> {
    sqlx::query_as::<_, Submission>(&format!("SELECT {COLUMNS} FROM submissions WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Ownership is part of the lookup so foreign ids are indistinguishable from
/// missing ones.
pub(crate) async fn find_owned(
    pool: &PgPool,
    user_id: &str,
    id: &str,
) -> Result<Option<Submission>, sqlx::Error> {
    sqlx::query_as::<_, Submission>(&format!(
        "SELECT {COLUMNS} FROM submissions WHERE id = $1 AND user_id = $2"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn find_writing_details(
    pool: &PgPool,
    submission_id: &str,
) -> Result<Option<WritingSubmission>, sqlx::Error> {
    sqlx::query_as::<_, WritingSubmission>(
        "SELECT submission_id, topic, text_body, word_count
         FROM writing_submissions
         WHERE submission_id = $1",
    )
    .bind(submission_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn find_listening_details(
    pool: &PgPool,
    submission_id: &str,
) -> Result<Option<ListeningSubmission>, sqlx::Error> {
    sqlx::query_as::<_, ListeningSubmission>(
        "SELECT submission_id, topic, audio_url, duration_seconds, transcription
         FROM listening_submissions
         WHERE submission_id = $1",
    )
    .bind(submission_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn find_result(
    pool: &PgPool,
    submission_id: &str,
) -> Result<Option<AssessmentResult>, sqlx::Error> {
    sqlx::query_as::<_, AssessmentResult>(&format!(
        "SELECT {RESULT_COLUMNS} FROM assessment_results WHERE submission_id = $1"
    ))
    .bind(submission_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_by_user(
    pool: &PgPool,
    user_id: &str,
    filter: SubmissionFilter,
    skip: i64,
    limit: i64,
) -> Result<Vec<SubmissionListRow>, sqlx::Error> {
    sqlx::query_as::<_, SubmissionListRow>(
        "SELECT s.id,
                s.submission_type,
                s.status,
                s.overall_score,
                s.created_at,
                s.assessed_at,
                COALESCE(w.topic, l.topic) AS topic,
                w.word_count,
                l.duration_seconds,
                (r.submission_id IS NOT NULL) AS has_result
         FROM submissions s
         LEFT JOIN writing_submissions w ON w.submission_id = s.id
         LEFT JOIN listening_submissions l ON l.submission_id = s.id
         LEFT JOIN assessment_results r ON r.submission_id = s.id
         WHERE s.user_id = $1
           AND ($2::analysisstatus IS NULL OR s.status = $2)
           AND ($3::submissiontype IS NULL OR s.submission_type = $3)
         ORDER BY s.created_at DESC, s.id
         OFFSET $4
         LIMIT $5",
    )
    .bind(user_id)
    .bind(filter.status)
    .bind(filter.submission_type)
    .bind(skip)
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_by_user(
    pool: &PgPool,
    user_id: &str,
    filter: SubmissionFilter,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*)
         FROM submissions
         WHERE user_id = $1
           AND ($2::analysisstatus IS NULL OR status = $2)
           AND ($3::submissiontype IS NULL OR submission_type = $3)",
    )
    .bind(user_id)
    .bind(filter.status)
    .bind(filter.submission_type)
    .fetch_one(pool)
    .await
}
