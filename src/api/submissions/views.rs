use axum::{
    extract::{Path, State},
    Json,
};

use crate::api::errors::ApiError;
use crate::api::extract::ApiQuery;
use crate::api::guards::CurrentUser;
use crate::api::pagination::{self, PaginatedResponse};
use crate::core::state::AppState;
use crate::db::types::SubmissionType;
use crate::repositories;
use crate::repositories::submissions::SubmissionFilter;
use crate::schemas::submission::{
    AssessmentResultResponse, ListSubmissionsQuery, SubmissionDetailResponse, SubmissionDetails,
    SubmissionListItem,
};

pub(in crate::api::submissions) async fn list_submissions(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListSubmissionsQuery>,
) -> Result<Json<PaginatedResponse<SubmissionListItem>>, ApiError> {
    let (skip, limit) = pagination::clamp(params.skip, params.limit);
    let filter =
        SubmissionFilter { status: params.status, submission_type: params.submission_type };

    let rows = repositories::submissions::list_by_user(state.db(), &user.id, filter, skip, limit)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list submissions"))?;
    let total_count = repositories::submissions::count_by_user(state.db(), &user.id, filter)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count submissions"))?;

    Ok(Json(PaginatedResponse {
        items: rows.into_iter().map(SubmissionListItem::from).collect(),
        total_count,
        skip,
        limit,
    }))
}

pub(in crate::api::submissions) async fn get_submission(
    Path(submission_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<SubmissionDetailResponse>, ApiError> {
    let submission = repositories::submissions::find_owned(state.db(), &user.id, &submission_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch submission"))?
        .ok_or_else(|| ApiError::NotFound("Submission not found".to_string()))?;

    let details = match submission.submission_type {
        SubmissionType::Writing => {
            repositories::submissions::find_writing_details(state.db(), &submission.id)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to fetch writing details"))?
                .map(SubmissionDetails::from)
        }
        SubmissionType::Listening => {
            repositories::submissions::find_listening_details(state.db(), &submission.id)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to fetch listening details"))?
                .map(SubmissionDetails::from)
        }
    };

    let result = repositories::submissions::find_result(state.db(), &submission.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch assessment result"))?
        .map(AssessmentResultResponse::from);

    Ok(Json(SubmissionDetailResponse { submission: submission.into(), details, result }))
}
