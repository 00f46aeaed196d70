pub mod interface;
pub mod client;
pub mod sound_files;

pub use interface::{TTSInterface, Waveform};
pub use client::TTSClient;
pub use sound_files::SoundFileStore;
