use crate::api::errors::ApiError;
use std::path::Path;

pub(crate) const MIN_PASSWORD_LEN: usize = 8;
pub(crate) const MIN_USERNAME_LEN: usize = 3;
pub(crate) const MAX_USERNAME_LEN: usize = 64;

pub(crate) fn validate_username(username: &str) -> Result<(), ApiError> {
    let len = username.chars().count();
    let valid = (MIN_USERNAME_LEN..=MAX_USERNAME_LEN).contains(&len)
        && username.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
    if valid {
        Ok(())
    } else {
        Err(ApiError::BadRequest("Invalid username format".to_string()))
    }
}

pub(crate) fn validate_password_len(password: &str) -> Result<(), ApiError> {
    if password.chars().count() >= MIN_PASSWORD_LEN {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        )))
    }
}

/// Returns the lowercased extension of an acceptable recording.
pub(crate) fn validate_audio_upload(
    filename: &str,
    content_type: &str,
    allowed_extensions: &[String],
) -> Result<String, ApiError> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .ok_or_else(|| ApiError::BadRequest("File must have an extension".to_string()))?;

    if !allowed_extensions.iter().any(|allowed| allowed == &extension) {
        return Err(ApiError::BadRequest(format!("File extension '{extension}' is not allowed")));
    }

    let mime = content_type.trim().to_ascii_lowercase();
    let mime = mime.split(';').next().unwrap_or_default().trim();
    if mime_allowed_for_extension(mime, &extension) {
        Ok(extension)
    } else {
        Err(ApiError::BadRequest(format!(
            "MIME type '{mime}' does not match extension '.{extension}'"
        )))
    }
}

fn mime_allowed_for_extension(mime: &str, extension: &str) -> bool {
    match extension {
        "mp3" => matches!(mime, "audio/mpeg" | "audio/mp3"),
        "wav" => matches!(mime, "audio/wav" | "audio/x-wav" | "audio/wave"),
        "ogg" => matches!(mime, "audio/ogg" | "application/ogg"),
        "webm" => matches!(mime, "audio/webm" | "video/webm"),
        "m4a" => matches!(mime, "audio/mp4" | "audio/x-m4a" | "audio/m4a"),
        _ => false,
    }
}
