//! Voice model registry — resolves model names to on-disk artifact pairs.
//!
//! Read-only: resolution never touches the filesystem beyond existence
//! checks, and "not ready" is the expected trigger for provisioning, not
//! an error.

use std::io;
use std::path::{Path, PathBuf};

use aria_core::error::TtsError;
use aria_core::types::{ModelEntry, VoiceModel, validate_model_name};

const MODEL_SUFFIX: &str = ".onnx";
const CONFIG_SUFFIX: &str = ".onnx.json";

/// View over the voice model storage root.
#[derive(Debug, Clone)]
pub struct VoiceRegistry {
    models_dir: PathBuf,
}

impl VoiceRegistry {
    pub fn new(models_dir: impl Into<PathBuf>) -> Self {
        Self {
            models_dir: models_dir.into(),
        }
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    /// Resolve a bare model name to its artifact pair. Validates the name
    /// against path traversal; the files need not exist — check
    /// [`is_ready`] for that.
    pub fn resolve(&self, name: &str) -> Result<VoiceModel, TtsError> {
        validate_model_name(name)?;
        Ok(VoiceModel {
            name: name.to_string(),
            model_path: self.models_dir.join(format!("{name}{MODEL_SUFFIX}")),
            config_path: self.models_dir.join(format!("{name}{CONFIG_SUFFIX}")),
        })
    }

    /// Project every `.onnx` entry in the storage root into a
    /// [`ModelEntry`], with readiness per the paired-artifact invariant.
    pub async fn list(&self) -> io::Result<Vec<ModelEntry>> {
        let mut dir = match tokio::fs::read_dir(&self.models_dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut models = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            // `.onnx.json` does not end with `.onnx`, so config files are
            // naturally excluded here.
            let Some(name) = file_name.strip_suffix(MODEL_SUFFIX) else {
                continue;
            };
            let config_name = format!("{name}{CONFIG_SUFFIX}");
            let ready = file_exists(&self.models_dir.join(&config_name)).await;
            models.push(ModelEntry {
                name: name.to_string(),
                config_name,
                ready,
            });
        }

        models.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(models)
    }
}

/// Both artifacts present — the paired-file invariant for synthesis.
pub async fn is_ready(model: &VoiceModel) -> bool {
    file_exists(&model.model_path).await && file_exists(&model.config_path).await
}

async fn file_exists(path: &Path) -> bool {
    matches!(tokio::fs::metadata(path).await, Ok(meta) if meta.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn touch(path: &Path) {
        tokio::fs::write(path, b"").await.unwrap();
    }

    #[tokio::test]
    async fn resolve_appends_extensions_once() {
        let registry = VoiceRegistry::new("/voices");
        let model = registry.resolve("en_US-amy-low").unwrap();
        assert_eq!(model.name, "en_US-amy-low");
        assert_eq!(
            model.model_path,
            PathBuf::from("/voices/en_US-amy-low.onnx")
        );
        assert_eq!(
            model.config_path,
            PathBuf::from("/voices/en_US-amy-low.onnx.json")
        );
    }

    #[tokio::test]
    async fn resolve_rejects_traversal_names() {
        let registry = VoiceRegistry::new("/voices");
        assert!(matches!(
            registry.resolve("../amy"),
            Err(TtsError::InvalidInput(_))
        ));
        assert!(registry.resolve("a/b").is_err());
    }

    #[tokio::test]
    async fn readiness_requires_both_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let registry = VoiceRegistry::new(dir.path());
        let model = registry.resolve("amy").unwrap();

        assert!(!is_ready(&model).await);

        touch(&model.model_path).await;
        assert!(!is_ready(&model).await, "payload alone is not ready");

        touch(&model.config_path).await;
        assert!(is_ready(&model).await);

        tokio::fs::remove_file(&model.model_path).await.unwrap();
        assert!(!is_ready(&model).await, "config alone is not ready");
    }

    #[tokio::test]
    async fn list_projects_onnx_entries_with_readiness() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("amy.onnx")).await;
        touch(&dir.path().join("amy.onnx.json")).await;
        touch(&dir.path().join("ryan.onnx")).await;
        touch(&dir.path().join("notes.txt")).await;

        let registry = VoiceRegistry::new(dir.path());
        let models = registry.list().await.unwrap();

        assert_eq!(models.len(), 2);
        assert_eq!(models[0].name, "amy");
        assert_eq!(models[0].config_name, "amy.onnx.json");
        assert!(models[0].ready);
        assert_eq!(models[1].name, "ryan");
        assert!(!models[1].ready, "ryan has no config file");
    }

    #[tokio::test]
    async fn list_of_missing_directory_is_empty() {
        let registry = VoiceRegistry::new("/nonexistent/voices");
        assert!(registry.list().await.unwrap().is_empty());
    }
}
