use std::sync::Arc;

use crate::asr::{ASRClient, ASRInterface, ModelProvisioner};
use crate::config::Config;
use crate::inference_service::InferenceServiceClient;
use crate::tts::{SoundFileStore, TTSClient, TTSInterface};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sound_files: Arc<SoundFileStore>,
    pub model_provisioner: Arc<ModelProvisioner>,
    pub inference: Arc<InferenceServiceClient>,
    pub tts: Arc<dyn TTSInterface>,
    pub asr: Arc<dyn ASRInterface>,
}

impl AppState {
    /// Wire the production engines against the configured inference service.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let inference = inference_client(&config)?;

        let tts = Arc::new(TTSClient::new(
            inference.clone(),
            config.inference.tts_model.clone(),
        ));
        let asr = Arc::new(ASRClient::new(
            inference.clone(),
            config.inference.device.clone(),
        ));

        Self::assemble(config, inference, tts, asr)
    }

    /// Same wiring with caller-supplied engines.
    pub fn with_engines(
        config: Config,
        tts: Arc<dyn TTSInterface>,
        asr: Arc<dyn ASRInterface>,
    ) -> anyhow::Result<Self> {
        let inference = inference_client(&config)?;
        Self::assemble(config, inference, tts, asr)
    }

    fn assemble(
        config: Config,
        inference: Arc<InferenceServiceClient>,
        tts: Arc<dyn TTSInterface>,
        asr: Arc<dyn ASRInterface>,
    ) -> anyhow::Result<Self> {
        let sound_files = Arc::new(SoundFileStore::new(
            config.sound_files.dir.clone(),
            config.sound_files.max_files,
        ));
        let model_provisioner = Arc::new(ModelProvisioner::new(
            config.asr_model.local_path.clone(),
            config.asr_model.remote_url.clone(),
            config.asr_model.download_timeout(),
        )?);

        Ok(Self {
            config: Arc::new(config),
            sound_files,
            model_provisioner,
            inference,
            tts,
            asr,
        })
    }
}

fn inference_client(config: &Config) -> anyhow::Result<Arc<InferenceServiceClient>> {
    Ok(Arc::new(InferenceServiceClient::new(
        config.inference.base_url.clone(),
        config.inference.request_timeout(),
    )?))
}
