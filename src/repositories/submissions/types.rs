use time::PrimitiveDateTime;

use crate::db::types::{AnalysisStatus, SubmissionType};

pub(crate) const COLUMNS: &str = "\
    id, user_id, submission_type, status, overall_score, error_message, assessed_at, \
    created_at, updated_at";

pub(crate) const RESULT_COLUMNS: &str = "\
    submission_id, grammar_score, vocabulary_score, coherence_score, fluency_score, \
    pronunciation_score, feedback_summary, suggestions, created_at";

pub(crate) struct NewWritingSubmission<'a> {
    pub(crate) id: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) topic: &'a str,
    pub(crate) text_body: &'a str,
    pub(crate) word_count: i32,
    pub(crate) status: AnalysisStatus,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) struct NewListeningSubmission<'a> {
    pub(crate) id: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) topic: &'a str,
    pub(crate) audio_url: &'a str,
    pub(crate) duration_seconds: f64,
    pub(crate) status: AnalysisStatus,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug)]
pub(crate) struct CompletionUpdate {
    pub(crate) overall_score: f64,
    pub(crate) grammar_score: Option<f64>,
    pub(crate) vocabulary_score: Option<f64>,
    pub(crate) coherence_score: Option<f64>,
    pub(crate) fluency_score: Option<f64>,
    pub(crate) pronunciation_score: Option<f64>,
    pub(crate) feedback_summary: String,
    pub(crate) suggestions: Vec<String>,
    pub(crate) transcription: Option<String>,
    pub(crate) completed_at: PrimitiveDateTime,
}

#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct SubmissionFilter {
    pub(crate) status: Option<AnalysisStatus>,
    pub(crate) submission_type: Option<SubmissionType>,
}

/// Dashboard row: the submission plus the summary fields of whichever detail
/// record it owns.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct SubmissionListRow {
    pub(crate) id: String,
    pub(crate) submission_type: SubmissionType,
    pub(crate) status: AnalysisStatus,
    pub(crate) overall_score: Option<f64>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) assessed_at: Option<PrimitiveDateTime>,
    pub(crate) topic: Option<String>,
    pub(crate) word_count: Option<i32>,
    pub(crate) duration_seconds: Option<f64>,
    pub(crate) has_result: bool,
}
