use std::time::Duration;

use anyhow::{Context, Result};
use bytes::Bytes;
use reqwest::{multipart, Client};
use serde::{Deserialize, Serialize};

/// Upper bound for a health probe, independent of the client-wide timeout.
const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(2);

/// HTTP client for the model inference backend that owns the TTS and ASR
/// models.
#[derive(Debug, Clone)]
pub struct InferenceServiceClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TtsSynthesisRequest {
    pub text: String,
    pub model: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TtsSynthesisResponse {
    pub waveform: Vec<f32>,
    pub sampling_rate: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AsrResponse {
    pub text: String,
}

impl InferenceServiceClient {
    pub fn new(base_url: String, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build().context("Failed to build inference HTTP client")?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn synthesize(&self, request: TtsSynthesisRequest) -> Result<TtsSynthesisResponse> {
        let url = format!("{}/tts/synthesize", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("TTS request to {} failed", url))?;

        let response = check_status(response, "TTS synthesis").await?;
        let result: TtsSynthesisResponse = response
            .json()
            .await
            .context("Malformed TTS synthesis response")?;
        Ok(result)
    }

    pub async fn transcribe(
        &self,
        audio: Bytes,
        file_name: &str,
        model_dir: &str,
        device: &str,
    ) -> Result<AsrResponse> {
        let url = format!("{}/asr/transcribe", self.base_url);

        let audio_part = multipart::Part::bytes(audio.to_vec())
            .file_name(file_name.to_string())
            .mime_str("audio/wav")?;
        let form = multipart::Form::new()
            .part("audio", audio_part)
            .text("model_dir", model_dir.to_string())
            .text("device", device.to_string());

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .with_context(|| format!("ASR request to {} failed", url))?;

        let response = check_status(response, "ASR transcription").await?;
        let result: AsrResponse = response
            .json()
            .await
            .context("Malformed ASR transcription response")?;
        Ok(result)
    }

    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(HEALTH_CHECK_TIMEOUT)
            .send()
            .await?;
        Ok(response.status().is_success())
    }
}

async fn check_status(response: reqwest::Response, what: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    anyhow::bail!("{} failed: HTTP {}: {}", what, status, body)
}
