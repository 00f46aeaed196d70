use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::Result;

/// Environment prefix for overrides, e.g. `UTTS_SOUND_FILES__MAX_FILES=20`.
pub const ENV_PREFIX: &str = "UTTS";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub sound_files: SoundFilesConfig,
    #[serde(default)]
    pub asr_model: AsrModelConfig,
    #[serde(default)]
    pub inference: InferenceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound for request bodies (uploaded audio, text).
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_max_upload_bytes() -> usize {
    25 * 1024 * 1024
}

/// Where synthesized audio is written and how many files are kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoundFilesConfig {
    #[serde(default = "default_sound_files_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_max_files")]
    pub max_files: usize,
}

fn default_sound_files_dir() -> PathBuf {
    PathBuf::from("sound_files")
}

fn default_max_files() -> usize {
    10
}

/// Location of the ASR model bundle and the archive it is fetched from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsrModelConfig {
    #[serde(default = "default_local_path")]
    pub local_path: PathBuf,
    #[serde(default = "default_remote_url")]
    pub remote_url: String,
    /// Checkpoint directory inside the bundle handed to the recognizer.
    #[serde(default = "default_checkpoint")]
    pub checkpoint: String,
    #[serde(default)]
    pub download_timeout_secs: Option<u64>,
}

fn default_local_path() -> PathBuf {
    PathBuf::from("api/UTTS/results")
}

fn default_remote_url() -> String {
    "https://github.com/gheyret/uyghur-asr-ctc/releases/download/data/results.7z".to_string()
}

fn default_checkpoint() -> String {
    "UModel".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    #[serde(default = "default_inference_url")]
    pub base_url: String,
    #[serde(default = "default_tts_model")]
    pub tts_model: String,
    #[serde(default = "default_device")]
    pub device: String,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_inference_url() -> String {
    "http://localhost:8001".to_string()
}

fn default_tts_model() -> String {
    "facebook/mms-tts-uig-script_arabic".to_string()
}

fn default_device() -> String {
    "cpu".to_string()
}

impl Config {
    /// Load configuration from an optional file, layered over defaults and
    /// under `UTTS_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.max_upload_bytes == 0 {
            anyhow::bail!("server.max_upload_bytes must be greater than 0");
        }
        if self.sound_files.max_files == 0 {
            anyhow::bail!("sound_files.max_files must be at least 1");
        }
        if self.asr_model.remote_url.trim().is_empty() {
            anyhow::bail!("asr_model.remote_url must not be empty");
        }
        if self.inference.base_url.trim().is_empty() {
            anyhow::bail!("inference.base_url must not be empty");
        }
        Ok(())
    }

    /// Directory handed to the recognizer: the checkpoint inside the bundle.
    pub fn asr_checkpoint_dir(&self) -> PathBuf {
        self.asr_model.local_path.join(&self.asr_model.checkpoint)
    }
}

impl AsrModelConfig {
    pub fn download_timeout(&self) -> Option<Duration> {
        self.download_timeout_secs.map(Duration::from_secs)
    }
}

impl InferenceConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl Default for SoundFilesConfig {
    fn default() -> Self {
        Self {
            dir: default_sound_files_dir(),
            max_files: default_max_files(),
        }
    }
}

impl Default for AsrModelConfig {
    fn default() -> Self {
        Self {
            local_path: default_local_path(),
            remote_url: default_remote_url(),
            checkpoint: default_checkpoint(),
            download_timeout_secs: None,
        }
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            base_url: default_inference_url(),
            tts_model: default_tts_model(),
            device: default_device(),
            request_timeout_secs: None,
        }
    }
}
