use std::time::{Duration, Instant};

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::core::config::Settings;

use super::{Assessment, AssessmentError, Assessor};

const MAX_ERROR_BODY_CHARS: usize = 500;

#[derive(Debug, Serialize)]
struct WritingPayload<'a> {
    topic: &'a str,
    text: &'a str,
    word_count: i32,
}

#[derive(Debug, Serialize)]
struct SpeakingPayload<'a> {
    topic: &'a str,
    audio_url: &'a str,
    duration_seconds: f64,
}

/// HTTP client for the assessment backend.
///
/// `POST {base}/assess/writing` and `POST {base}/assess/speaking`, JSON in and
/// out. A single attempt per submission; the user resubmits on failure.
#[derive(Debug, Clone)]
pub(crate) struct RemoteAssessor {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RemoteAssessor {
    pub(crate) fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let assessment = settings.assessment();
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .timeout(Duration::from_secs(assessment.timeout_seconds))
            .build()
            .context("Failed to build assessment HTTP client")?;

        Ok(Self::new(client, &assessment.base_url, &assessment.api_key))
    }

    pub(crate) fn new(client: Client, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    async fn post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<Assessment, AssessmentError> {
        let url = format!("{}{path}", self.base_url);
        let timer = Instant::now();

        let mut request = self.client.post(&url).json(payload);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        tracing::info!(
            url = %url,
            status = status.as_u16(),
            duration_seconds = timer.elapsed().as_secs_f64(),
            "Assessment backend responded"
        );

        if !status.is_success() {
            return Err(AssessmentError::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        serde_json::from_str::<Assessment>(&body)
            .map_err(|err| AssessmentError::InvalidResponse(err.to_string()))
    }
}

#[async_trait]
impl Assessor for RemoteAssessor {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn assess_writing(
        &self,
        topic: &str,
        text: &str,
        word_count: i32,
    ) -> Result<Assessment, AssessmentError> {
        self.post("/assess/writing", &WritingPayload { topic, text, word_count }).await
    }

    async fn assess_speaking(
        &self,
        topic: &str,
        audio_url: &str,
        duration_seconds: f64,
    ) -> Result<Assessment, AssessmentError> {
        self.post("/assess/speaking", &SpeakingPayload { topic, audio_url, duration_seconds }).await
    }
}
