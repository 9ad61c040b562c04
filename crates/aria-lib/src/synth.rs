//! Piper subprocess invocation and output capture.
//!
//! One engine process per request:
//!
//! ```text
//! synthesize(req) → validate → ensure model ready (provision if absent)
//!     → spawn piper → stream text to stdin → drain stderr ∥ await exit
//!     → read artifact → encode → delete artifact
//! ```
//!
//! The artifact is removed on every exit path past a successful spawn —
//! engine failure, timeout, and read failure included. The one exception
//! is a successful `file` delivery, which retains the artifact for
//! `GET /audio/{file}` and hands reclamation to the retention sweep.

use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStderr, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use aria_core::config::AppConfig;
use aria_core::error::TtsError;
use aria_core::types::{
    AudioPayload, DeliveryMode, SynthesisOutput, SynthesisRequest, VoiceModel, validate_format,
};

use crate::provision::Provisioner;
use crate::voices::VoiceRegistry;

/// Cloneable handle to the synthesis pipeline.
#[derive(Clone)]
pub struct SpeechEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    config: Arc<AppConfig>,
    registry: VoiceRegistry,
    provisioner: Provisioner,
}

impl SpeechEngine {
    pub fn new(config: AppConfig) -> Self {
        let config = Arc::new(config);
        Self {
            inner: Arc::new(EngineInner {
                registry: VoiceRegistry::new(config.models_dir.clone()),
                provisioner: Provisioner::new(config.clone()),
                config,
            }),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn registry(&self) -> &VoiceRegistry {
        &self.inner.registry
    }

    /// Run the full pipeline for one request.
    pub async fn synthesize(&self, req: &SynthesisRequest) -> Result<SynthesisOutput, TtsError> {
        let config = &self.inner.config;
        self.validate(req)?;

        let format = req.format.as_deref().unwrap_or(&config.default_format);
        validate_format(format)?;

        let model_name = req.model.as_deref().unwrap_or(&config.default_model);
        let model = self
            .inner
            .provisioner
            .ensure_ready(&self.inner.registry, model_name)
            .await?;

        tokio::fs::create_dir_all(&config.audio_dir)
            .await
            .map_err(|e| {
                TtsError::EngineUnavailable(format!("cannot prepare audio directory: {e}"))
            })?;

        let file_name = format!("{}.{format}", Uuid::new_v4());
        let artifact = config.audio_dir.join(&file_name);

        let invocation = EngineInvocation::spawn(config, &model, &artifact)?;
        let captured = drive(invocation, &req.text, &artifact, config.synth_timeout).await;

        // Cleanup invariant: past spawn the artifact never outlives the
        // request, except a successful `file` delivery which hands it to
        // the sweeper.
        let retain = captured.is_ok() && req.delivery == DeliveryMode::File;
        if !retain {
            remove_artifact(&artifact).await;
        }

        let bytes = captured?;
        let size = bytes.len();
        info!(model = %model.name, size, "synthesis complete");

        let audio = match req.delivery {
            DeliveryMode::Inline => AudioPayload::Inline {
                base64: BASE64.encode(&bytes),
            },
            DeliveryMode::File => AudioPayload::Stored { file_name },
        };
        Ok(SynthesisOutput {
            model: model.name,
            size,
            audio,
        })
    }

    fn validate(&self, req: &SynthesisRequest) -> Result<(), TtsError> {
        if req.text.trim().is_empty() {
            return Err(TtsError::InvalidInput("text is required".into()));
        }
        let max = self.inner.config.max_text_length;
        if req.text.len() > max {
            return Err(TtsError::InvalidInput(format!(
                "text too long (max {max} characters)"
            )));
        }
        Ok(())
    }
}

/// Everything between spawn and cleanup: feed stdin, await exit, read the
/// artifact. Separated out so the caller can run cleanup unconditionally
/// on this function's result.
async fn drive(
    mut invocation: EngineInvocation,
    text: &str,
    artifact: &Path,
    deadline: Duration,
) -> Result<Vec<u8>, TtsError> {
    invocation.feed_text(text).await?;
    invocation.wait(deadline).await?;
    tokio::fs::read(artifact).await.map_err(|e| {
        TtsError::ArtifactUnreadable(format!("failed to read {}: {e}", artifact.display()))
    })
}

// ─── Engine invocation ─────────────────────────────────────────────────────

/// A spawned engine process being driven to completion.
///
/// Linear lifecycle: spawn → feed_text → wait. Stderr is drained on its
/// own task from spawn time so engine chatter can never back-pressure the
/// exit await. `kill_on_drop` covers early returns between those steps.
struct EngineInvocation {
    child: Child,
    stderr: JoinHandle<String>,
}

impl EngineInvocation {
    fn spawn(config: &AppConfig, model: &VoiceModel, output: &Path) -> Result<Self, TtsError> {
        let mut child = Command::new(&config.engine)
            .args(["-m", "piper", "--model", model.name.as_str(), "--data-dir"])
            .arg(&config.models_dir)
            .arg("--output-file")
            .arg(output)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                TtsError::EngineUnavailable(format!("failed to spawn {}: {e}", config.engine))
            })?;

        let stderr = collect_stderr(child.stderr.take());
        Ok(Self { child, stderr })
    }

    /// Write the request text to stdin and close the stream, signalling
    /// end of input. A write failure is fatal for the invocation.
    async fn feed_text(&mut self, text: &str) -> Result<(), TtsError> {
        let mut stdin = self.child.stdin.take().ok_or_else(|| {
            TtsError::EngineUnavailable("engine stdin was not captured".into())
        })?;
        let fed = async {
            stdin.write_all(text.as_bytes()).await?;
            stdin.shutdown().await
        }
        .await;
        fed.map_err(|e| TtsError::SynthesisFailed {
            code: None,
            stderr: format!("failed to stream text to engine stdin: {e}"),
        })
    }

    /// Await exit within `deadline`. Zero exit succeeds; non-zero fails
    /// with the drained stderr; past the deadline the child is killed.
    async fn wait(mut self, deadline: Duration) -> Result<(), TtsError> {
        let status = match tokio::time::timeout(deadline, self.child.wait()).await {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                return Err(TtsError::EngineUnavailable(format!(
                    "failed to await engine exit: {e}"
                )));
            }
            Err(_) => {
                let _ = self.child.kill().await;
                warn!(deadline = ?deadline, "engine killed after deadline");
                return Err(TtsError::Timeout(deadline));
            }
        };

        if status.success() {
            if let Ok(chatter) = self.stderr.await {
                if !chatter.trim().is_empty() {
                    debug!(stderr = %chatter.trim(), "engine stderr");
                }
            }
            Ok(())
        } else {
            let stderr = self.stderr.await.unwrap_or_default();
            Err(TtsError::SynthesisFailed {
                code: status.code(),
                stderr: stderr.trim().to_string(),
            })
        }
    }
}

/// Accumulate a child's stderr on its own task so the reader can never
/// deadlock the exit await through pipe back-pressure.
pub(crate) fn collect_stderr(stderr: Option<ChildStderr>) -> JoinHandle<String> {
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut stderr) = stderr {
            let _ = stderr.read_to_end(&mut buf).await;
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// Delete a request's artifact. Missing-at-delete is benign (the sweeper
/// or a concurrent delete may have won the race); other failures are
/// logged and never escalated — they must not mask the capture outcome.
pub(crate) async fn remove_artifact(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "artifact removed"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "failed to remove artifact"),
    }
}
