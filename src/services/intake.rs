//! Validation and persistence of incoming exam responses.
//!
//! Both exam types land in the same `submissions` table plus one detail row,
//! written together so a submission never exists without its content.

use thiserror::Error;
use uuid::Uuid;

use crate::core::time::primitive_now_utc;
use crate::db::models::Submission;
use crate::db::types::AnalysisStatus;
use crate::repositories;
use crate::schemas::submission::{ListeningSubmitRequest, WritingSubmitRequest};
use crate::services::storage;

#[derive(Debug, Error)]
pub(crate) enum IntakeError {
    #[error("{0}")]
    Invalid(String),
    #[error("failed to store submission: {0}")]
    Database(#[from] sqlx::Error),
}

/// Writing response that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct WritingIntake {
    pub(crate) topic: String,
    pub(crate) text_body: String,
    pub(crate) word_count: i32,
}

/// Listening response that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ListeningIntake {
    pub(crate) topic: String,
    pub(crate) audio_url: String,
    pub(crate) duration_seconds: f64,
}

/// Number of whitespace-separated tokens.
pub(crate) fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

// Postgres text columns cannot hold NUL.
fn reject_nul(field: &str, value: &str) -> Result<(), IntakeError> {
    if value.contains('\0') {
        return Err(IntakeError::Invalid(format!("{field} must not contain NUL characters")));
    }
    Ok(())
}

pub(crate) fn validate_writing(request: WritingSubmitRequest) -> Result<WritingIntake, IntakeError> {
    let text_body = request
        .text_body
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| IntakeError::Invalid("Text body is required".to_string()))?;
    let topic = request.topic.unwrap_or_default();
    reject_nul("text_body", &text_body)?;
    reject_nul("topic", &topic)?;

    let word_count = i32::try_from(word_count(&text_body))
        .map_err(|_| IntakeError::Invalid("Text body is too long".to_string()))?;

    Ok(WritingIntake { topic, text_body, word_count })
}

/// Storage keys must be ones issued to `user_id` by the upload endpoint.
pub(crate) fn validate_listening(
    user_id: &str,
    request: ListeningSubmitRequest,
) -> Result<ListeningIntake, IntakeError> {
    let audio_url = request
        .audio_url
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .ok_or_else(|| IntakeError::Invalid("Audio URL is required".to_string()))?;
    let topic = request.topic.unwrap_or_default();
    reject_nul("audio_url", &audio_url)?;
    reject_nul("topic", &topic)?;

    if storage::is_storage_key(&audio_url) && !storage::is_owned_audio_key(user_id, &audio_url) {
        return Err(IntakeError::Invalid("Audio URL does not reference your upload".to_string()));
    }

    let duration_seconds = request.duration_seconds.unwrap_or(0.0);
    if !duration_seconds.is_finite() || duration_seconds < 0.0 {
        return Err(IntakeError::Invalid(
            "duration_seconds must be a non-negative number".to_string(),
        ));
    }

    Ok(ListeningIntake { topic, audio_url, duration_seconds })
}

/// Stores the submission in `in_progress`, ready for dispatch.
pub(crate) async fn create_writing(
    pool: &sqlx::PgPool,
    user_id: &str,
    intake: &WritingIntake,
) -> Result<Submission, IntakeError> {
    let id = Uuid::new_v4().to_string();
    let submission = repositories::submissions::create_writing(
        pool,
        repositories::submissions::NewWritingSubmission {
            id: &id,
            user_id,
            topic: &intake.topic,
            text_body: &intake.text_body,
            word_count: intake.word_count,
            status: AnalysisStatus::InProgress,
            created_at: primitive_now_utc(),
        },
    )
    .await?;

    tracing::info!(
        submission_id = %submission.id,
        user_id = %user_id,
        word_count = intake.word_count,
        "Writing submission stored"
    );
    Ok(submission)
}

pub(crate) async fn create_listening(
    pool: &sqlx::PgPool,
    user_id: &str,
    intake: &ListeningIntake,
) -> Result<Submission, IntakeError> {
    let id = Uuid::new_v4().to_string();
    let submission = repositories::submissions::create_listening(
        pool,
        repositories::submissions::NewListeningSubmission {
            id: &id,
            user_id,
            topic: &intake.topic,
            audio_url: &intake.audio_url,
            duration_seconds: intake.duration_seconds,
            status: AnalysisStatus::InProgress,
            created_at: primitive_now_utc(),
        },
    )
    .await?;

    tracing::info!(
        submission_id = %submission.id,
        user_id = %user_id,
        duration_seconds = intake.duration_seconds,
        "Listening submission stored"
    );
    Ok(submission)
}
