//! Shared types for the aria TTS server.
//!
//! Wire types carry `camelCase` renames so downstream consumers see the
//! same field names the HTTP API documents. Model names are canonically
//! bare (no extension) — file extensions are appended only at path
//! resolution time by the registry.

use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::TtsError;

// Untrusted names are joined into directory paths, so the character set is
// closed: no separators, no leading dot, nothing that can climb out of the
// storage root.
static RE_SAFE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").unwrap());
static RE_FORMAT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z0-9]{1,8}$").unwrap());

// ─── Voice model types ─────────────────────────────────────────────────────

/// A resolved voice model: the payload/config file pair Piper needs to
/// render one voice. Both files must exist before synthesis is attempted;
/// partial presence counts as absent.
#[derive(Debug, Clone)]
pub struct VoiceModel {
    pub name: String,
    pub model_path: PathBuf,
    pub config_path: PathBuf,
}

/// One models-directory entry as reported by `GET /models`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelEntry {
    pub name: String,
    pub config_name: String,
    pub ready: bool,
}

// ─── Synthesis request / result ────────────────────────────────────────────

/// Incoming synthesis request. Constructed per call, never persisted.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisRequest {
    pub text: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub delivery: DeliveryMode,
}

/// How the generated audio is returned to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// Base64 in the response body; the artifact is deleted immediately.
    #[default]
    Inline,
    /// The artifact is retained under its public identifier, served by
    /// `GET /audio/{file}` and reclaimed by the retention sweep.
    File,
}

/// Result of one synthesis run.
#[derive(Debug, Clone)]
pub struct SynthesisOutput {
    pub model: String,
    /// Byte length of the generated audio.
    pub size: usize,
    pub audio: AudioPayload,
}

#[derive(Debug, Clone)]
pub enum AudioPayload {
    Inline { base64: String },
    Stored { file_name: String },
}

// ─── Name validation ───────────────────────────────────────────────────────

/// Validate an untrusted model name before it is joined into a path.
pub fn validate_model_name(name: &str) -> Result<(), TtsError> {
    if RE_SAFE_NAME.is_match(name) {
        Ok(())
    } else {
        Err(TtsError::InvalidInput(format!(
            "invalid model name: {name:?}"
        )))
    }
}

/// Validate an artifact file name from the download surface. Same closed
/// character set as model names.
pub fn validate_artifact_name(name: &str) -> Result<(), TtsError> {
    if RE_SAFE_NAME.is_match(name) {
        Ok(())
    } else {
        Err(TtsError::InvalidInput(format!(
            "invalid audio file name: {name:?}"
        )))
    }
}

/// Validate a requested output format (used as a file extension).
pub fn validate_format(format: &str) -> Result<(), TtsError> {
    if RE_FORMAT.is_match(format) {
        Ok(())
    } else {
        Err(TtsError::InvalidInput(format!(
            "invalid output format: {format:?}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_names_accept_voice_identifiers() {
        assert!(validate_model_name("en_US-amy-low").is_ok());
        assert!(validate_model_name("de_DE-thorsten-high").is_ok());
        assert!(validate_model_name("a").is_ok());
    }

    #[test]
    fn model_names_reject_traversal() {
        assert!(validate_model_name("").is_err());
        assert!(validate_model_name("../etc/passwd").is_err());
        assert!(validate_model_name("a/b").is_err());
        assert!(validate_model_name("a\\b").is_err());
        assert!(validate_model_name(".hidden").is_err());
        assert!(validate_model_name("..").is_err());
    }

    #[test]
    fn artifact_names_accept_uuid_file_names() {
        assert!(validate_artifact_name("550e8400-e29b-41d4-a716-446655440000.wav").is_ok());
    }

    #[test]
    fn artifact_names_reject_separators() {
        assert!(validate_artifact_name("../secret.wav").is_err());
        assert!(validate_artifact_name("a/b.wav").is_err());
    }

    #[test]
    fn formats_are_short_lowercase_tokens() {
        assert!(validate_format("wav").is_ok());
        assert!(validate_format("mp3").is_ok());
        assert!(validate_format("").is_err());
        assert!(validate_format("WAV").is_err());
        assert!(validate_format("wav/../x").is_err());
        assert!(validate_format("longformat1").is_err());
    }

    #[test]
    fn request_defaults_to_inline_delivery() {
        let req: SynthesisRequest = serde_json::from_str(r#"{"text":"hi"}"#).unwrap();
        assert_eq!(req.delivery, DeliveryMode::Inline);
        assert!(req.model.is_none());
        assert!(req.format.is_none());
    }

    #[test]
    fn request_parses_file_delivery() {
        let req: SynthesisRequest =
            serde_json::from_str(r#"{"text":"hi","model":"en_US-amy-low","delivery":"file"}"#)
                .unwrap();
        assert_eq!(req.delivery, DeliveryMode::File);
        assert_eq!(req.model.as_deref(), Some("en_US-amy-low"));
    }
}
