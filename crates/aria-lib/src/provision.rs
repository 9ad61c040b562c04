//! On-demand voice model provisioning via the Piper download tool.
//!
//! Concurrent requests for the same missing model serialize on a
//! per-model lock, so one download subprocess runs and the followers
//! re-check readiness after the leader finishes. Distinct models download
//! independently.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;

use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::{debug, info};

use aria_core::config::AppConfig;
use aria_core::error::TtsError;
use aria_core::types::VoiceModel;

use crate::synth::collect_stderr;
use crate::voices::{self, VoiceRegistry};

pub struct Provisioner {
    config: Arc<AppConfig>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Provisioner {
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self {
            config,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve `name` and make sure both artifacts are on disk, downloading
    /// them if absent. Blocks the caller until the model is ready or the
    /// download has failed; no automatic retry.
    pub async fn ensure_ready(
        &self,
        registry: &VoiceRegistry,
        name: &str,
    ) -> Result<VoiceModel, TtsError> {
        let model = registry.resolve(name)?;
        if voices::is_ready(&model).await {
            return Ok(model);
        }

        let lock = self.model_lock(name).await;
        let _guard = lock.lock().await;

        // Another request may have finished the download while we waited.
        if voices::is_ready(&model).await {
            return Ok(model);
        }

        info!(model = %name, "downloading voice model");
        self.download(name).await?;

        if voices::is_ready(&model).await {
            Ok(model)
        } else {
            // The download reported success but the artifact pair is still
            // incomplete — surfaced as-is, never silently retried.
            Err(TtsError::ModelNotFound(name.to_string()))
        }
    }

    async fn model_lock(&self, name: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(name.to_string()).or_default().clone()
    }

    async fn download(&self, name: &str) -> Result<(), TtsError> {
        tokio::fs::create_dir_all(&self.config.models_dir)
            .await
            .map_err(|e| {
                TtsError::ProvisioningFailed(format!("cannot prepare models directory: {e}"))
            })?;

        let mut child = Command::new(&self.config.engine)
            .args(["-m", "piper.download_voices", name, "--data-dir"])
            .arg(&self.config.models_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                TtsError::ProvisioningFailed(format!("failed to spawn download process: {e}"))
            })?;

        let stderr = collect_stderr(child.stderr.take());

        let status = match tokio::time::timeout(self.config.provision_timeout, child.wait()).await
        {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                return Err(TtsError::ProvisioningFailed(format!(
                    "failed to await download process: {e}"
                )));
            }
            Err(_) => {
                let _ = child.kill().await;
                return Err(TtsError::ProvisioningFailed(format!(
                    "download timed out after {:?}",
                    self.config.provision_timeout
                )));
            }
        };

        if status.success() {
            debug!(model = %name, "voice model download complete");
            Ok(())
        } else {
            let stderr = stderr.await.unwrap_or_default();
            Err(TtsError::ProvisioningFailed(format!(
                "download process exited with {status}: {}",
                stderr.trim()
            )))
        }
    }
}
