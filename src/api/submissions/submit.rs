use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::extract::ApiJson;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::db::types::AnalysisStatus;
use crate::schemas::submission::{
    AssessmentFailedResponse, ListeningSubmitRequest, ListeningSubmitResponse, SubmitResponse,
    WritingSubmitRequest,
};
use crate::services::dispatch::{self, AssessmentContent, DispatchOutcome};
use crate::services::intake::{self, IntakeError};

pub(in crate::api::submissions) async fn submit_writing(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<WritingSubmitRequest>,
) -> Result<Response, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let writing = intake::validate_writing(payload).map_err(intake_error)?;

    let submission =
        intake::create_writing(state.db(), &user.id, &writing).await.map_err(intake_error)?;

    let outcome = dispatch::dispatch(&state, submission, AssessmentContent::Writing(writing))
        .await
        .map_err(|e| ApiError::internal(e, "Failed to assess writing submission"))?;

    Ok(match outcome {
        DispatchOutcome::Completed { submission, .. } => Json(SubmitResponse {
            success: true,
            submission_id: submission.id,
            score: submission.overall_score,
            status: submission.status,
            message: "Writing submitted successfully".to_string(),
        })
        .into_response(),
        DispatchOutcome::Failed { submission_id, reason } => {
            assessment_failed(submission_id, reason)
        }
    })
}

pub(in crate::api::submissions) async fn submit_listening(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ListeningSubmitRequest>,
) -> Result<Response, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let listening = intake::validate_listening(&user.id, payload).map_err(intake_error)?;

    let submission =
        intake::create_listening(state.db(), &user.id, &listening).await.map_err(intake_error)?;

    let outcome = dispatch::dispatch(&state, submission, AssessmentContent::Listening(listening))
        .await
        .map_err(|e| ApiError::internal(e, "Failed to assess listening submission"))?;

    Ok(match outcome {
        DispatchOutcome::Completed { submission, transcription } => Json(ListeningSubmitResponse {
            base: SubmitResponse {
                success: true,
                submission_id: submission.id,
                score: submission.overall_score,
                status: submission.status,
                message: "Audio submitted successfully".to_string(),
            },
            transcription,
        })
        .into_response(),
        DispatchOutcome::Failed { submission_id, reason } => {
            assessment_failed(submission_id, reason)
        }
    })
}

fn assessment_failed(submission_id: String, reason: String) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(AssessmentFailedResponse {
            success: false,
            submission_id,
            status: AnalysisStatus::Failed,
            error: reason,
        }),
    )
        .into_response()
}

fn intake_error(err: IntakeError) -> ApiError {
    match err {
        IntakeError::Invalid(message) => ApiError::BadRequest(message),
        IntakeError::Database(err) => ApiError::internal(err, "Failed to store submission"),
    }
}
