pub mod asr;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod inference_service;
pub mod routes;
pub mod state;
pub mod tts;
pub mod utils;

pub use config::Config;
pub use state::AppState;
