use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::{AnalysisStatus, SubmissionType};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) username: String,
    pub(crate) hashed_password: String,
    pub(crate) full_name: String,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Submission {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) submission_type: SubmissionType,
    pub(crate) status: AnalysisStatus,
    pub(crate) overall_score: Option<f64>,
    pub(crate) error_message: Option<String>,
    pub(crate) assessed_at: Option<PrimitiveDateTime>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct WritingSubmission {
    pub(crate) submission_id: String,
    pub(crate) topic: String,
    pub(crate) text_body: String,
    pub(crate) word_count: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct ListeningSubmission {
    pub(crate) submission_id: String,
    pub(crate) topic: String,
    pub(crate) audio_url: String,
    pub(crate) duration_seconds: f64,
    pub(crate) transcription: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct AssessmentResult {
    pub(crate) submission_id: String,
    pub(crate) grammar_score: Option<f64>,
    pub(crate) vocabulary_score: Option<f64>,
    pub(crate) coherence_score: Option<f64>,
    pub(crate) fluency_score: Option<f64>,
    pub(crate) pronunciation_score: Option<f64>,
    pub(crate) feedback_summary: String,
    pub(crate) suggestions: Json<Vec<String>>,
    pub(crate) created_at: PrimitiveDateTime,
}
