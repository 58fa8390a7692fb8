use axum::{routing::get, Json, Router};

use crate::api::errors::ApiError;
use crate::api::extract::ApiQuery;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::db::types::SubmissionType;
use crate::schemas::exam::{ExamTopicResponse, TopicCatalogResponse, TopicQuery};
use crate::services::catalog;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/topics", get(list_topics))
        .route("/writing", get(writing_exam))
        .route("/listening", get(listening_exam))
}

async fn list_topics(CurrentUser(_user): CurrentUser) -> Json<TopicCatalogResponse> {
    Json(TopicCatalogResponse {
        writing_topics: catalog::WRITING_TOPICS.to_vec(),
        listening_topics: catalog::LISTENING_TOPICS.to_vec(),
    })
}

async fn writing_exam(
    CurrentUser(_user): CurrentUser,
    ApiQuery(query): ApiQuery<TopicQuery>,
) -> Result<Json<ExamTopicResponse>, ApiError> {
    Ok(Json(exam_topic(SubmissionType::Writing, query)))
}

async fn listening_exam(
    CurrentUser(_user): CurrentUser,
    ApiQuery(query): ApiQuery<TopicQuery>,
) -> Result<Json<ExamTopicResponse>, ApiError> {
    Ok(Json(exam_topic(SubmissionType::Listening, query)))
}

/// The requested index is echoed back even when it fell back to topic 0.
fn exam_topic(exam_type: SubmissionType, query: TopicQuery) -> ExamTopicResponse {
    let topic_index = query.topic.unwrap_or(0);
    ExamTopicResponse {
        exam_type,
        topic: catalog::select_topic(exam_type, topic_index),
        topic_index,
    }
}
