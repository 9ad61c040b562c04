//! Error taxonomy for the synthesis pipeline.
//!
//! Every core failure surfaces as one of these variants; none is retried
//! automatically. The HTTP layer maps variants onto status codes and a
//! JSON error envelope via [`TtsError::kind`].

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TtsError {
    /// Caller-side validation failure — rejected before any subprocess runs.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The registry still reports the model absent after provisioning.
    #[error("voice model not found: {0}")]
    ModelNotFound(String),

    /// The download subprocess failed, timed out, or could not be spawned.
    #[error("model download failed: {0}")]
    ProvisioningFailed(String),

    /// The engine executable is missing or could not be spawned.
    #[error("synthesis engine unavailable: {0}")]
    EngineUnavailable(String),

    /// The engine ran but exited non-zero. Carries the captured stderr.
    #[error("synthesis failed (exit code {}): {stderr}", .code.map_or_else(|| "unknown".to_string(), |c| c.to_string()))]
    SynthesisFailed { code: Option<i32>, stderr: String },

    /// The engine exited zero but its output file could not be read.
    #[error("generated audio unreadable: {0}")]
    ArtifactUnreadable(String),

    /// The synthesis deadline elapsed and the engine was killed.
    #[error("synthesis timed out after {0:?}")]
    Timeout(Duration),
}

impl TtsError {
    /// Stable machine-readable kind, surfaced in the HTTP error envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::ModelNotFound(_) => "model_not_found",
            Self::ProvisioningFailed(_) => "provisioning_failed",
            Self::EngineUnavailable(_) => "engine_unavailable",
            Self::SynthesisFailed { .. } => "synthesis_failed",
            Self::ArtifactUnreadable(_) => "artifact_unreadable",
            Self::Timeout(_) => "timeout",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_stable() {
        assert_eq!(TtsError::InvalidInput("x".into()).kind(), "invalid_input");
        assert_eq!(TtsError::ModelNotFound("x".into()).kind(), "model_not_found");
        assert_eq!(
            TtsError::ProvisioningFailed("x".into()).kind(),
            "provisioning_failed"
        );
        assert_eq!(
            TtsError::EngineUnavailable("x".into()).kind(),
            "engine_unavailable"
        );
        assert_eq!(
            TtsError::SynthesisFailed {
                code: Some(1),
                stderr: String::new()
            }
            .kind(),
            "synthesis_failed"
        );
        assert_eq!(
            TtsError::ArtifactUnreadable("x".into()).kind(),
            "artifact_unreadable"
        );
        assert_eq!(TtsError::Timeout(Duration::from_secs(1)).kind(), "timeout");
    }

    #[test]
    fn synthesis_failed_display_carries_diagnostics() {
        let err = TtsError::SynthesisFailed {
            code: Some(1),
            stderr: "bad config".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("exit code 1"), "msg={msg}");
        assert!(msg.contains("bad config"), "msg={msg}");
    }

    #[test]
    fn synthesis_failed_display_without_exit_code() {
        let err = TtsError::SynthesisFailed {
            code: None,
            stderr: "killed".into(),
        };
        assert!(err.to_string().contains("exit code unknown"));
    }
}
