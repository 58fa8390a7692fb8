//! Client side of the external scoring collaborator.
//!
//! The service never scores anything itself: every writing or speaking
//! response goes through an [`Assessor`], and the outcome is normalised into a
//! single [`Assessment`] shape shared by both exam types.

mod fixed;
mod remote;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use time::PrimitiveDateTime;

use crate::core::config::{AssessmentMode, Settings};
use crate::repositories::submissions::CompletionUpdate;

pub(crate) use fixed::StaticAssessor;
pub(crate) use remote::RemoteAssessor;

#[async_trait]
pub(crate) trait Assessor: Send + Sync {
    fn name(&self) -> &'static str;

    async fn assess_writing(
        &self,
        topic: &str,
        text: &str,
        word_count: i32,
    ) -> Result<Assessment, AssessmentError>;

    /// `audio_url` is always fetchable by the backend (storage keys are
    /// presigned before this call).
    async fn assess_speaking(
        &self,
        topic: &str,
        audio_url: &str,
        duration_seconds: f64,
    ) -> Result<Assessment, AssessmentError>;
}

/// Structured verdict returned by the collaborator for either exam type.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub(crate) struct Assessment {
    pub(crate) success: bool,
    #[serde(default, alias = "score")]
    pub(crate) overall_score: Option<f64>,
    #[serde(default, alias = "grammar_score")]
    pub(crate) grammar: Option<f64>,
    #[serde(default, alias = "vocabulary_score")]
    pub(crate) vocabulary: Option<f64>,
    #[serde(default, alias = "coherence_score")]
    pub(crate) coherence: Option<f64>,
    #[serde(default, alias = "fluency_score")]
    pub(crate) fluency: Option<f64>,
    #[serde(default, alias = "pronunciation_score")]
    pub(crate) pronunciation: Option<f64>,
    #[serde(default, alias = "feedback")]
    pub(crate) feedback_summary: String,
    #[serde(default)]
    pub(crate) suggestions: Vec<String>,
    #[serde(default)]
    pub(crate) transcription: Option<String>,
    #[serde(default)]
    pub(crate) error: Option<String>,
}

#[derive(Debug, Error)]
pub(crate) enum AssessmentError {
    #[error("assessment rejected: {0}")]
    Rejected(String),
    #[error("assessment request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("assessment backend returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid assessment response: {0}")]
    InvalidResponse(String),
    #[error("audio unavailable: {0}")]
    AudioUnavailable(String),
}

impl AssessmentError {
    /// Message safe to show to the submitting user.
    pub(crate) fn public_message(&self) -> String {
        match self {
            Self::Rejected(reason) => reason.clone(),
            Self::AudioUnavailable(_) => "Audio recording could not be accessed".to_string(),
            Self::Transport(_) | Self::Status { .. } | Self::InvalidResponse(_) => {
                "Assessment service is unavailable, please resubmit later".to_string()
            }
        }
    }
}

impl Assessment {
    fn skill_scores(&self) -> impl Iterator<Item = f64> + '_ {
        [self.grammar, self.vocabulary, self.coherence, self.fluency, self.pronunciation]
            .into_iter()
            .flatten()
    }

    /// The collaborator's overall score, or the mean of the skill scores
    /// rounded to one decimal.
    pub(crate) fn overall(&self) -> Option<f64> {
        if let Some(score) = self.overall_score {
            return Some(score);
        }

        let (sum, count) = self.skill_scores().fold((0.0, 0u32), |(sum, n), s| (sum + s, n + 1));
        (count > 0).then(|| (sum / f64::from(count) * 10.0).round() / 10.0)
    }

    /// Turns a successful verdict into the rows the dispatcher persists.
    pub(crate) fn into_completion(
        self,
        completed_at: PrimitiveDateTime,
    ) -> Result<CompletionUpdate, AssessmentError> {
        if !self.success {
            return Err(AssessmentError::Rejected(
                self.error.unwrap_or_else(|| "Assessment was not successful".to_string()),
            ));
        }

        let all_scores = self.overall_score.into_iter().chain(self.skill_scores());
        if let Some(bad) = all_scores.into_iter().find(|score| !score.is_finite() || *score < 0.0) {
            return Err(AssessmentError::InvalidResponse(format!("score out of range: {bad}")));
        }

        let overall_score = self.overall().ok_or_else(|| {
            AssessmentError::InvalidResponse("no overall or per-skill scores".to_string())
        })?;

        Ok(CompletionUpdate {
            overall_score,
            grammar_score: self.grammar,
            vocabulary_score: self.vocabulary,
            coherence_score: self.coherence,
            fluency_score: self.fluency,
            pronunciation_score: self.pronunciation,
            feedback_summary: self.feedback_summary,
            suggestions: self.suggestions,
            transcription: self.transcription.filter(|text| !text.trim().is_empty()),
            completed_at,
        })
    }
}

pub(crate) fn build_assessor(settings: &Settings) -> anyhow::Result<Arc<dyn Assessor>> {
    let assessor: Arc<dyn Assessor> = match settings.assessment().mode {
        AssessmentMode::Static => Arc::new(StaticAssessor),
        AssessmentMode::Remote => Arc::new(RemoteAssessor::from_settings(settings)?),
    };

    tracing::info!(assessor = assessor.name(), "Assessment collaborator configured");
    Ok(assessor)
}
