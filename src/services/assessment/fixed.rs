use async_trait::async_trait;

use super::{Assessment, AssessmentError, Assessor};

const FIXED_SCORE: f64 = 90.0;

/// Offline assessor that hands back the same encouraging verdict for every
/// response. Used in development and tests where no backend is reachable.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct StaticAssessor;

#[async_trait]
impl Assessor for StaticAssessor {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn assess_writing(
        &self,
        topic: &str,
        _text: &str,
        word_count: i32,
    ) -> Result<Assessment, AssessmentError> {
        tracing::debug!(topic_len = topic.len(), word_count, "Static writing assessment");

        Ok(Assessment {
            success: true,
            overall_score: Some(FIXED_SCORE),
            grammar: Some(FIXED_SCORE),
            vocabulary: Some(FIXED_SCORE),
            coherence: Some(FIXED_SCORE),
            fluency: Some(FIXED_SCORE),
            pronunciation: None,
            feedback_summary:
                "Great work! Your writing demonstrates good command of the language.".to_string(),
            suggestions: vec![
                "Try to use more complex sentence structures".to_string(),
                "Expand your vocabulary with synonyms".to_string(),
                "Pay attention to paragraph transitions".to_string(),
            ],
            transcription: None,
            error: None,
        })
    }

    async fn assess_speaking(
        &self,
        topic: &str,
        _audio_url: &str,
        duration_seconds: f64,
    ) -> Result<Assessment, AssessmentError> {
        tracing::debug!(topic_len = topic.len(), duration_seconds, "Static speaking assessment");

        Ok(Assessment {
            success: true,
            overall_score: Some(FIXED_SCORE),
            grammar: Some(FIXED_SCORE),
            vocabulary: Some(FIXED_SCORE),
            coherence: Some(FIXED_SCORE),
            fluency: Some(FIXED_SCORE),
            pronunciation: Some(FIXED_SCORE),
            feedback_summary: "Excellent speaking performance! Your pronunciation is clear."
                .to_string(),
            suggestions: vec![
                "Work on your intonation patterns".to_string(),
                "Try to speak more naturally".to_string(),
                "Reduce filler words like 'um' and 'uh'".to_string(),
            ],
            transcription: None,
            error: None,
        })
    }
}
