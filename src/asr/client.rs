use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::inference_service::InferenceServiceClient;
use super::interface::ASRInterface;

/// ASR client that forwards recognition to the inference service
pub struct ASRClient {
    inference: Arc<InferenceServiceClient>,
    device: String,
}

impl ASRClient {
    pub fn new(inference: Arc<InferenceServiceClient>, device: String) -> Self {
        Self { inference, device }
    }
}

#[async_trait]
impl ASRInterface for ASRClient {
    async fn transcribe(
        &self,
        model_dir: &Path,
        audio: Bytes,
        file_name: &str,
    ) -> Result<String, anyhow::Error> {
        debug!(
            "Sending ASR request: {} bytes, model_dir={:?}, device={}",
            audio.len(),
            model_dir,
            self.device
        );

        let model_dir = model_dir.to_string_lossy();
        let response = self
            .inference
            .transcribe(audio, file_name, &model_dir, &self.device)
            .await?;

        Ok(response.text.trim().to_string())
    }
}
