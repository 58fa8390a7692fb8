use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{AssessmentResult, ListeningSubmission, Submission, WritingSubmission};
use crate::db::types::{AnalysisStatus, SubmissionType};
use crate::repositories::submissions::SubmissionListRow;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct WritingSubmitRequest {
    #[serde(default)]
    #[validate(length(max = 1000, message = "topic is too long"))]
    pub(crate) topic: Option<String>,
    #[serde(default)]
    pub(crate) text_body: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ListeningSubmitRequest {
    #[serde(default)]
    #[validate(length(max = 1000, message = "topic is too long"))]
    pub(crate) topic: Option<String>,
    #[serde(default)]
    pub(crate) audio_url: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "duration_seconds must be non-negative"))]
    pub(crate) duration_seconds: Option<f64>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AudioUploadUrlRequest {
    #[validate(length(min = 1, max = 255, message = "filename is required"))]
    pub(crate) filename: String,
    #[validate(length(min = 1, max = 100, message = "content_type is required"))]
    pub(crate) content_type: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct AudioUploadUrlResponse {
    pub(crate) upload_url: String,
    pub(crate) audio_url: String,
    pub(crate) method: &'static str,
    pub(crate) expires_in: u64,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmitResponse {
    pub(crate) success: bool,
    pub(crate) submission_id: String,
    pub(crate) score: Option<f64>,
    pub(crate) status: AnalysisStatus,
    pub(crate) message: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ListeningSubmitResponse {
    #[serde(flatten)]
    pub(crate) base: SubmitResponse,
    pub(crate) transcription: Option<String>,
}

/// Body of the 500 returned when the submission was stored but its
/// assessment failed.
#[derive(Debug, Serialize)]
pub(crate) struct AssessmentFailedResponse {
    pub(crate) success: bool,
    pub(crate) submission_id: String,
    pub(crate) status: AnalysisStatus,
    pub(crate) error: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListSubmissionsQuery {
    #[serde(default)]
    pub(crate) status: Option<AnalysisStatus>,
    #[serde(default, rename = "type")]
    pub(crate) submission_type: Option<SubmissionType>,
    #[serde(default)]
    pub(crate) skip: i64,
    #[serde(default = "crate::api::pagination::default_limit")]
    pub(crate) limit: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmissionListItem {
    pub(crate) id: String,
    pub(crate) submission_type: SubmissionType,
    pub(crate) status: AnalysisStatus,
    pub(crate) overall_score: Option<f64>,
    pub(crate) topic: Option<String>,
    pub(crate) word_count: Option<i32>,
    pub(crate) duration_seconds: Option<f64>,
    pub(crate) has_result: bool,
    pub(crate) created_at: String,
    pub(crate) assessed_at: Option<String>,
}

impl From<SubmissionListRow> for SubmissionListItem {
    fn from(row: SubmissionListRow) -> Self {
        Self {
            id: row.id,
            submission_type: row.submission_type,
            status: row.status,
            overall_score: row.overall_score,
            topic: row.topic,
            word_count: row.word_count,
            duration_seconds: row.duration_seconds,
            has_result: row.has_result,
            created_at: format_primitive(row.created_at),
            assessed_at: row.assessed_at.map(format_primitive),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmissionResponse {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) submission_type: SubmissionType,
    pub(crate) status: AnalysisStatus,
    pub(crate) overall_score: Option<f64>,
    pub(crate) error_message: Option<String>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
    pub(crate) assessed_at: Option<String>,
}

impl From<Submission> for SubmissionResponse {
    fn from(submission: Submission) -> Self {
        Self {
            id: submission.id,
            user_id: submission.user_id,
            submission_type: submission.submission_type,
            status: submission.status,
            overall_score: submission.overall_score,
            error_message: submission.error_message,
            created_at: format_primitive(submission.created_at),
            updated_at: format_primitive(submission.updated_at),
            assessed_at: submission.assessed_at.map(format_primitive),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub(crate) enum SubmissionDetails {
    Writing { topic: String, text_body: String, word_count: i32 },
    Listening {
        topic: String,
        audio_url: String,
        duration_seconds: f64,
        transcription: Option<String>,
    },
}

impl From<WritingSubmission> for SubmissionDetails {
    fn from(details: WritingSubmission) -> Self {
        Self::Writing {
            topic: details.topic,
            text_body: details.text_body,
            word_count: details.word_count,
        }
    }
}

impl From<ListeningSubmission> for SubmissionDetails {
    fn from(details: ListeningSubmission) -> Self {
        Self::Listening {
            topic: details.topic,
            audio_url: details.audio_url,
            duration_seconds: details.duration_seconds,
            transcription: details.transcription,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AssessmentResultResponse {
    pub(crate) grammar_score: Option<f64>,
    pub(crate) vocabulary_score: Option<f64>,
    pub(crate) coherence_score: Option<f64>,
    pub(crate) fluency_score: Option<f64>,
    pub(crate) pronunciation_score: Option<f64>,
    pub(crate) feedback_summary: String,
    pub(crate) suggestions: Vec<String>,
    pub(crate) created_at: String,
}

impl From<AssessmentResult> for AssessmentResultResponse {
    fn from(result: AssessmentResult) -> Self {
        Self {
            grammar_score: result.grammar_score,
            vocabulary_score: result.vocabulary_score,
            coherence_score: result.coherence_score,
            fluency_score: result.fluency_score,
            pronunciation_score: result.pronunciation_score,
            feedback_summary: result.feedback_summary,
            suggestions: result.suggestions.0,
            created_at: format_primitive(result.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmissionDetailResponse {
    pub(crate) submission: SubmissionResponse,
    pub(crate) details: Option<SubmissionDetails>,
    pub(crate) result: Option<AssessmentResultResponse>,
}
