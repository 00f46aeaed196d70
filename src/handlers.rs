use axum::{
    extract::{FromRequest, Multipart, Query, Request, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::errors::{AppError, AppResult};
use crate::state::AppState;
use crate::tts::sound_files::encode_wav;
use crate::utils::script_converter::{Script, ScriptConverter};

/// Multipart field carrying the uploaded recording.
const SOUND_FIELD: &str = "sound";
const DEFAULT_UPLOAD_NAME: &str = "recording.wav";

pub async fn hello_world() -> Json<Value> {
    Json(json!({ "message": "Hello World" }))
}

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let sound_files = match state.sound_files.list() {
        Ok(files) => files.len(),
        Err(e) => {
            warn!("Failed to list sound files for health check: {:#}", e);
            0
        }
    };
    let inference_healthy = state.inference.health_check().await.unwrap_or(false);
    Json(json!({
        "status": "ok",
        "inference_service": inference_healthy,
        "asr_model_ready": state.model_provisioner.is_ready(),
        "sound_files": sound_files,
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct TtsParams {
    /// Script the text is written in; converted to Arabic script before synthesis.
    pub script: Option<String>,
}

pub async fn text_to_speech(
    State(state): State<AppState>,
    Query(params): Query<TtsParams>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Response> {
    let mut text = parse_text_body(&headers, &body)?;

    if let Some(script) = params.script.as_deref() {
        let source: Script = script.parse()?;
        text = ScriptConverter::new(source, Script::Uas, false)?.convert(&text);
        debug!("Converted TTS input from {} to UAS", source);
    }

    let waveform = state.tts.synthesize(&text).await?;
    let audio = Bytes::from(encode_wav(&waveform)?);
    let path = state.sound_files.store(&text, audio.clone()).await?;
    info!("Synthesized {:?}", path);

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let disposition = format!(
        "inline; filename*=UTF-8''{}",
        urlencoding::encode(&file_name)
    );

    Ok((
        [
            (header::CONTENT_TYPE, "audio/wav".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        audio,
    )
        .into_response())
}

/// Accepts plain text, or a JSON string / `{"text": ...}` object when the
/// request is sent as JSON.
fn parse_text_body(headers: &HeaderMap, body: &Bytes) -> AppResult<String> {
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("application/json"))
        .unwrap_or(false);

    let text = if is_json {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {}", e)))?;
        match value {
            Value::String(text) => text,
            Value::Object(mut map) => match map.remove("text") {
                Some(Value::String(text)) => text,
                _ => return Err(AppError::BadRequest("JSON body has no \"text\" string".into())),
            },
            _ => return Err(AppError::BadRequest("JSON body must be a string".into())),
        }
    } else {
        String::from_utf8(body.to_vec())
            .map_err(|_| AppError::BadRequest("Text must be valid UTF-8".into()))?
    };

    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::BadRequest("No text provided".into()));
    }
    Ok(text.to_string())
}

pub async fn speech_to_text(
    State(state): State<AppState>,
    request: Request,
) -> AppResult<Json<String>> {
    let (audio, file_name) = read_audio(&state, request).await?;
    if audio.is_empty() {
        return Err(AppError::BadRequest("No audio file provided".into()));
    }

    if state.model_provisioner.ensure_model().await? {
        info!(
            "Provisioned ASR model at {:?}",
            state.model_provisioner.local_path()
        );
    }

    let model_dir = state.config.asr_checkpoint_dir();
    let text = state.asr.transcribe(&model_dir, audio, &file_name).await?;
    Ok(Json(text))
}

/// Raw request bodies are taken as-is; multipart uploads must carry the
/// recording in the `sound` field.
async fn read_audio(state: &AppState, request: Request) -> AppResult<(Bytes, String)> {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("multipart/form-data"))
        .unwrap_or(false);

    if !is_multipart {
        let audio = Bytes::from_request(request, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        return Ok((audio, DEFAULT_UPLOAD_NAME.to_string()));
    }

    let mut multipart = Multipart::from_request(request, state)
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(SOUND_FIELD) {
            continue;
        }
        let file_name = field
            .file_name()
            .unwrap_or(DEFAULT_UPLOAD_NAME)
            .to_string();
        let audio = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        return Ok((audio, file_name));
    }

    Err(AppError::BadRequest("No audio file provided".into()))
}

#[derive(Debug, Deserialize)]
pub struct ConvertRequest {
    pub text: String,
    #[serde(default = "default_source_script")]
    pub source: String,
    #[serde(default = "default_target_script")]
    pub target: String,
    #[serde(default)]
    pub apostrophe: bool,
}

fn default_source_script() -> String {
    Script::Uls.code().to_string()
}

fn default_target_script() -> String {
    Script::Uas.code().to_string()
}

#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    pub text: String,
    pub source: Script,
    pub target: Script,
}

pub async fn convert_script(Json(request): Json<ConvertRequest>) -> AppResult<Json<ConvertResponse>> {
    let source: Script = request.source.parse()?;
    let target: Script = request.target.parse()?;
    let converter = ScriptConverter::new(source, target, request.apostrophe)?;

    Ok(Json(ConvertResponse {
        text: converter.convert(&request.text),
        source,
        target,
    }))
}
