use serde::{Deserialize, Serialize};

use crate::db::types::SubmissionType;

#[derive(Debug, Deserialize)]
pub(crate) struct TopicQuery {
    #[serde(default)]
    pub(crate) topic: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TopicCatalogResponse {
    pub(crate) writing_topics: Vec<&'static str>,
    pub(crate) listening_topics: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamTopicResponse {
    pub(crate) exam_type: SubmissionType,
    pub(crate) topic: &'static str,
    pub(crate) topic_index: i64,
}
