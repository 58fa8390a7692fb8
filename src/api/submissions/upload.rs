use std::time::Duration;

use axum::{extract::State, Json};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::extract::ApiJson;
use crate::api::guards::CurrentUser;
use crate::api::validation::validate_audio_upload;
use crate::core::state::AppState;
use crate::schemas::submission::{AudioUploadUrlRequest, AudioUploadUrlResponse};
use crate::services::storage::audio_object_key;

/// Hands out a presigned PUT for a recording; the returned key is what the
/// client later submits as `audio_url`.
pub(in crate::api::submissions) async fn audio_upload_url(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<AudioUploadUrlRequest>,
) -> Result<Json<AudioUploadUrlResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let extension = validate_audio_upload(
        &payload.filename,
        &payload.content_type,
        &state.settings().storage().allowed_audio_extensions,
    )?;

    let storage = state.storage().ok_or_else(|| {
        ApiError::ServiceUnavailable("Audio upload is not available".to_string())
    })?;

    let key = audio_object_key(&user.id, &extension);
    let expires_in = state.settings().storage().presigned_url_expire_minutes * 60;
    let upload_url = storage
        .presign_put(&key, payload.content_type.trim(), Duration::from_secs(expires_in))
        .await
        .map_err(|e| ApiError::internal(e, "Failed to generate upload URL"))?;

    tracing::info!(user_id = %user.id, key = %key, "Issued audio upload URL");

    Ok(Json(AudioUploadUrlResponse { upload_url, audio_url: key, method: "PUT", expires_in }))
}
