mod submit;
mod upload;
mod views;

use axum::{routing::get, routing::post, Router};

use crate::core::state::AppState;

/// Routes nested under `/submit`.
pub(crate) fn submit_router() -> Router<AppState> {
    Router::new()
        .route("/writing", post(submit::submit_writing))
        .route("/listening", post(submit::submit_listening))
        .route("/listening/upload-url", post(upload::audio_upload_url))
}

/// Routes nested under `/submissions`.
pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(views::list_submissions))
        .route("/:submission_id", get(views::get_submission))
}

#[cfg(test)]
mod tests;
