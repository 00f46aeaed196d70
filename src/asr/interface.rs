use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;

/// ASR interface - inference runs in the external model service
#[async_trait]
pub trait ASRInterface: Send + Sync {
    /// Transcribe `audio` with the checkpoint found in `model_dir`.
    async fn transcribe(
        &self,
        model_dir: &Path,
        audio: Bytes,
        file_name: &str,
    ) -> Result<String, anyhow::Error>;
}
