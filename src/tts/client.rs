use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error};

use crate::inference_service::{InferenceServiceClient, TtsSynthesisRequest};
use super::interface::{TTSInterface, Waveform};

/// TTS client that forwards synthesis to the inference service
pub struct TTSClient {
    inference: Arc<InferenceServiceClient>,
    model: String,
}

impl TTSClient {
    pub fn new(inference: Arc<InferenceServiceClient>, model: String) -> Self {
        Self { inference, model }
    }
}

#[async_trait]
impl TTSInterface for TTSClient {
    async fn synthesize(&self, text: &str) -> Result<Waveform, anyhow::Error> {
        debug!("Sending TTS request: model={}, chars={}", self.model, text.chars().count());

        let response = self
            .inference
            .synthesize(TtsSynthesisRequest {
                text: text.to_string(),
                model: self.model.clone(),
            })
            .await?;

        if response.sampling_rate == 0 || response.waveform.is_empty() {
            error!("TTS synthesis returned no audio for model {}", self.model);
            anyhow::bail!("TTS synthesis returned no audio");
        }

        let waveform = Waveform {
            samples: response.waveform,
            sampling_rate: response.sampling_rate,
        };
        debug!("TTS synthesis successful: {:.2}s of audio", waveform.duration_secs());
        Ok(waveform)
    }
}
