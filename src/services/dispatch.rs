//! Runs one submission through the assessor and records the outcome.
//!
//! Every dispatched submission leaves this module in a terminal state unless
//! the database itself is unreachable; in that case the startup sweep in
//! [`super::maintenance`] fails it later.

use std::time::{Duration, Instant};

use thiserror::Error;

use crate::core::metrics;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Submission;
use crate::db::types::{AnalysisStatus, SubmissionType};
use crate::repositories;
use crate::services::assessment::{Assessment, AssessmentError};
use crate::services::intake::{ListeningIntake, WritingIntake};
use crate::services::storage;

pub(crate) const PERSIST_FAILED_MESSAGE: &str = "Failed to store assessment result";

#[derive(Debug)]
pub(crate) enum AssessmentContent {
    Writing(WritingIntake),
    Listening(ListeningIntake),
}

#[derive(Debug)]
pub(crate) enum DispatchOutcome {
    Completed { submission: Submission, transcription: Option<String> },
    Failed { submission_id: String, reason: String },
}

#[derive(Debug, Error)]
pub(crate) enum DispatchError {
    #[error("assessment task aborted: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("database error during dispatch: {0}")]
    Database(#[from] sqlx::Error),
    #[error("submission {0} disappeared during dispatch")]
    Missing(String),
    #[error("submission {id} cannot be assessed from status {status:?}")]
    NotInProgress { id: String, status: AnalysisStatus },
}

/// Assesses an `in_progress` submission on its own task and waits for it.
///
/// The task keeps running if the caller is dropped, so the row still reaches
/// `completed` or `failed` when the client disconnects mid-request.
pub(crate) async fn dispatch(
    state: &AppState,
    submission: Submission,
    content: AssessmentContent,
) -> Result<DispatchOutcome, DispatchError> {
    if !submission.status.can_transition_to(AnalysisStatus::Completed) {
        return Err(DispatchError::NotInProgress { id: submission.id, status: submission.status });
    }

    let state = state.clone();
    tokio::spawn(async move { run(&state, submission, content).await }).await?
}

async fn run(
    state: &AppState,
    submission: Submission,
    content: AssessmentContent,
) -> Result<DispatchOutcome, DispatchError> {
    let timer = Instant::now();
    let submission_id = submission.id;
    let submission_type = submission.submission_type;

    let verdict = assess(state, &content)
        .await
        .and_then(|assessment| assessment.into_completion(primitive_now_utc()));

    let update = match verdict {
        Ok(update) => update,
        Err(err) => {
            tracing::warn!(
                submission_id = %submission_id,
                submission_type = submission_type.as_str(),
                error = %err,
                "Assessment failed"
            );
            let reason = err.public_message();
            fail(state, &submission_id, submission_type, &reason, timer.elapsed()).await?;
            return Ok(DispatchOutcome::Failed { submission_id, reason });
        }
    };

    let overall_score = update.overall_score;
    let transcription = update.transcription.clone();

    let stored = match repositories::submissions::complete(
        state.db(),
        &submission_id,
        submission_type,
        update,
    )
    .await
    {
        Ok(stored) => stored,
        Err(err) => {
            tracing::error!(
                submission_id = %submission_id,
                error = %err,
                "Failed to persist assessment result"
            );
            if let Err(mark_err) =
                fail(state, &submission_id, submission_type, PERSIST_FAILED_MESSAGE, timer.elapsed())
                    .await
            {
                tracing::error!(
                    submission_id = %submission_id,
                    error = %mark_err,
                    "Failed to mark submission as failed"
                );
            }
            return Err(err.into());
        }
    };

    let submission = reload(state, &submission_id).await?;

    if !stored {
        // Swept or otherwise finalised while the assessor was running.
        tracing::warn!(
            submission_id = %submission_id,
            status = submission.status.as_str(),
            terminal = submission.status.is_terminal(),
            "Submission left in_progress before assessment finished"
        );
        let reason = submission
            .error_message
            .unwrap_or_else(|| "Submission was finalised by another process".to_string());
        return Ok(DispatchOutcome::Failed { submission_id, reason });
    }

    metrics::record_assessment(submission_type, AnalysisStatus::Completed, timer.elapsed());
    tracing::info!(
        submission_id = %submission_id,
        submission_type = submission_type.as_str(),
        status = AnalysisStatus::Completed.as_str(),
        overall_score,
        "Assessment completed"
    );

    Ok(DispatchOutcome::Completed { submission, transcription })
}

async fn assess(
    state: &AppState,
    content: &AssessmentContent,
) -> Result<Assessment, AssessmentError> {
    let assessor = state.assessor();
    match content {
        AssessmentContent::Writing(writing) => {
            assessor.assess_writing(&writing.topic, &writing.text_body, writing.word_count).await
        }
        AssessmentContent::Listening(listening) => {
            let audio_url = resolve_audio_url(state, &listening.audio_url).await?;
            assessor.assess_speaking(&listening.topic, &audio_url, listening.duration_seconds).await
        }
    }
}

/// Object keys become presigned GET URLs; anything with a scheme is passed on.
async fn resolve_audio_url(state: &AppState, reference: &str) -> Result<String, AssessmentError> {
    if !storage::is_storage_key(reference) {
        return Ok(reference.to_string());
    }

    let Some(store) = state.storage() else {
        return Ok(reference.to_string());
    };

    let expires_in =
        Duration::from_secs(state.settings().storage().presigned_url_expire_minutes * 60);
    store
        .presign_get(reference, expires_in)
        .await
        .map_err(|err| AssessmentError::AudioUnavailable(err.to_string()))
}

async fn fail(
    state: &AppState,
    submission_id: &str,
    submission_type: SubmissionType,
    reason: &str,
    elapsed: Duration,
) -> Result<(), sqlx::Error> {
    let updated =
        repositories::submissions::mark_failed(state.db(), submission_id, reason, primitive_now_utc())
            .await?;

    metrics::record_assessment(submission_type, AnalysisStatus::Failed, elapsed);
    tracing::info!(
        submission_id = %submission_id,
        submission_type = submission_type.as_str(),
        status = AnalysisStatus::Failed.as_str(),
        updated,
        "Submission marked as failed"
    );
    Ok(())
}

async fn reload(state: &AppState, submission_id: &str) -> Result<Submission, DispatchError> {
    repositories::submissions::find_by_id(state.db(), submission_id)
        .await?
        .ok_or_else(|| DispatchError::Missing(submission_id.to_string()))
}
