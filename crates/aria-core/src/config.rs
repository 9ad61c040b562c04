//! Engine configuration — explicit and immutable.
//!
//! Built once at startup from environment variables and CLI flags, then
//! passed to each component at construction time. Nothing reads ambient
//! state after that.

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the synthesis pipeline.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Executable hosting the Piper engine. Synthesis runs
    /// `<engine> -m piper ...`; downloads run
    /// `<engine> -m piper.download_voices ...`.
    pub engine: String,
    /// Voice model storage root.
    pub models_dir: PathBuf,
    /// Output artifact directory, shared with the retention sweep.
    pub audio_dir: PathBuf,
    /// Model used when a request names none.
    pub default_model: String,
    /// Output format used when a request names none.
    pub default_format: String,
    /// Maximum accepted request text length, in bytes.
    pub max_text_length: usize,
    /// Deadline for one synthesis subprocess. The child is killed past it.
    pub synth_timeout: Duration,
    /// Deadline for one voice download subprocess.
    pub provision_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            engine: "python3".into(),
            models_dir: "models".into(),
            audio_dir: "audio".into(),
            default_model: "en_US-amy-low".into(),
            default_format: "wav".into(),
            max_text_length: 5000,
            synth_timeout: Duration::from_secs(60),
            provision_timeout: Duration::from_secs(300),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_conventions() {
        let config = AppConfig::default();
        assert_eq!(config.engine, "python3");
        assert_eq!(config.default_model, "en_US-amy-low");
        assert_eq!(config.default_format, "wav");
        assert_eq!(config.max_text_length, 5000);
        assert_eq!(config.synth_timeout, Duration::from_secs(60));
    }
}
