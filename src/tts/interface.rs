use async_trait::async_trait;

/// Mono audio produced by a synthesis call.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub samples: Vec<f32>,
    pub sampling_rate: u32,
}

impl Waveform {
    pub fn duration_secs(&self) -> f32 {
        if self.sampling_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sampling_rate as f32
    }
}

/// TTS interface trait - inference runs in the external model service
#[async_trait]
pub trait TTSInterface: Send + Sync {
    /// Synthesize `text` into a waveform.
    async fn synthesize(&self, text: &str) -> Result<Waveform, anyhow::Error>;
}
