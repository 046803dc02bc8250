//! Model resolution: local resources cache first, Hugging Face Hub otherwise

use crate::classifier::ZeroShotClassifier;
use crate::nli::NliPipelineLoader;
use candle_core::Device;
use dialogsense_core::{Error, InferenceOptions, Result};
use hf_hub::{api::sync::Api, Repo, RepoType};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default resources root holding cached models
pub const DEFAULT_RESOURCES_DIR: &str = "resources";

/// Files a model directory must contain
pub const REQUIRED_FILES: &[&str] = &["config.json", "tokenizer.json"];

/// Weight files, in order of preference
pub const WEIGHT_FILES: &[&str] = &["model.safetensors", "pytorch_model.bin"];

/// Files copied when the hub has them
pub const OPTIONAL_FILES: &[&str] = &["tokenizer_config.json", "special_tokens_map.json"];

/// Device type for inference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    /// CPU inference (always available)
    Cpu,
    /// CUDA GPU inference (if available)
    Cuda(usize), // GPU index
    /// Metal (Apple Silicon)
    Metal(usize),
}

impl FromStr for DeviceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        let (kind, index) = match lower.split_once(':') {
            Some((kind, index)) => {
                let index = index
                    .parse::<usize>()
                    .map_err(|_| Error::config(format!("invalid device index in '{}'", s)))?;
                (kind, index)
            }
            None => (lower.as_str(), 0),
        };

        match kind {
            "cpu" => Ok(Self::Cpu),
            "cuda" | "gpu" => Ok(Self::Cuda(index)),
            "metal" | "mps" => Ok(Self::Metal(index)),
            _ => Err(Error::config(format!("unknown device '{}'", s))),
        }
    }
}

impl DeviceType {
    /// Create Candle device from device type
    pub fn create_device(self) -> Result<Device> {
        match self {
            Self::Cpu => Ok(Device::Cpu),
            Self::Cuda(idx) => Device::new_cuda(idx).map_err(|e| {
                Error::model_load(format!("Failed to create CUDA device: {}", e))
            }),
            Self::Metal(idx) => Device::new_metal(idx).map_err(|e| {
                Error::model_load(format!("Failed to create Metal device: {}", e))
            }),
        }
    }
}

/// Remote model source
pub trait HubFetcher {
    /// Download `repo_id` at `revision` into `destination`, creating it
    fn fetch(&self, repo_id: &str, revision: &str, destination: &Path) -> Result<()>;
}

/// Loads a classifier from a populated model directory
pub trait PipelineLoader {
    fn load(
        &self,
        model_dir: &Path,
        name: &str,
        options: &InferenceOptions,
    ) -> Result<Box<dyn ZeroShotClassifier>>;
}

/// Fetches model files from the Hugging Face Hub
#[derive(Debug, Clone, Copy, Default)]
pub struct HfHubFetcher;

impl HubFetcher for HfHubFetcher {
    fn fetch(&self, repo_id: &str, revision: &str, destination: &Path) -> Result<()> {
        tracing::info!(
            "Downloading model from HuggingFace: {} @ {}",
            repo_id,
            revision
        );

        let api = Api::new().map_err(|e| {
            Error::model_load(format!("Failed to initialize HuggingFace API: {}", e))
        })?;

        let repo = api.repo(Repo::with_revision(
            repo_id.to_string(),
            RepoType::Model,
            revision.to_string(),
        ));

        std::fs::create_dir_all(destination)?;

        for file in REQUIRED_FILES {
            tracing::debug!("Downloading {}", file);
            let src = repo.get(file).map_err(|e| {
                Error::model_load(format!("Failed to download {}: {}", file, e))
            })?;
            std::fs::copy(&src, destination.join(file))?;
        }

        let mut found_weights = false;
        for file in WEIGHT_FILES {
            match repo.get(file) {
                Ok(src) => {
                    tracing::debug!("Found weight file: {}", file);
                    std::fs::copy(&src, destination.join(file))?;
                    found_weights = true;
                    break;
                }
                Err(e) => tracing::debug!("Weight file {} unavailable: {}", file, e),
            }
        }

        if !found_weights {
            return Err(Error::model_load(format!(
                "No model weights found in {} (tried {})",
                repo_id,
                WEIGHT_FILES.join(", ")
            )));
        }

        for file in OPTIONAL_FILES {
            if let Ok(src) = repo.get(file) {
                std::fs::copy(&src, destination.join(file))?;
            }
        }

        Ok(())
    }
}

/// Resolves models by name against a local resources directory
///
/// A model found under `<resources_dir>/<name>` is loaded without touching
/// the network. Otherwise it is fetched from the hub, persisted there, and
/// loaded from disk.
pub struct ModelProvider<F = HfHubFetcher, L = NliPipelineLoader> {
    resources_dir: PathBuf,
    fetcher: F,
    loader: L,
}

impl ModelProvider {
    /// Provider backed by the Hugging Face Hub and the Candle NLI pipeline
    pub fn new(resources_dir: impl Into<PathBuf>) -> Self {
        Self::with_collaborators(resources_dir, HfHubFetcher, NliPipelineLoader)
    }
}

impl<F: HubFetcher, L: PipelineLoader> ModelProvider<F, L> {
    pub fn with_collaborators(resources_dir: impl Into<PathBuf>, fetcher: F, loader: L) -> Self {
        Self {
            resources_dir: resources_dir.into(),
            fetcher,
            loader,
        }
    }

    pub fn resources_dir(&self) -> &Path {
        &self.resources_dir
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Cache location for a model name
    pub fn local_path(&self, name: &str) -> PathBuf {
        self.resources_dir.join(name)
    }

    /// Resolve and load a model by name
    pub fn get_model(
        &self,
        name: &str,
        options: &InferenceOptions,
    ) -> Result<Box<dyn ZeroShotClassifier>> {
        let model_path = self.local_path(name);

        if model_path.exists() {
            tracing::info!("Loading the model from local {}", model_path.display());
        } else {
            let repo_id = remote_repo(name, options);
            tracing::info!(
                "Model not cached at {}, fetching {} from the hub",
                model_path.display(),
                repo_id
            );
            self.fetch_into_cache(&repo_id, &options.revision, &model_path)?;
            tracing::info!("Model saved to {}", model_path.display());
        }

        self.loader.load(&model_path, name, options)
    }

    fn fetch_into_cache(&self, repo_id: &str, revision: &str, model_path: &Path) -> Result<()> {
        let staging = staging_path(model_path)?;

        if let Some(parent) = staging.parent() {
            std::fs::create_dir_all(parent)?;
        }
        if staging.exists() {
            std::fs::remove_dir_all(&staging)?;
        }

        if let Err(e) = self.fetcher.fetch(repo_id, revision, &staging) {
            std::fs::remove_dir_all(&staging).ok();
            return Err(if matches!(e, Error::ModelLoad(_)) {
                e
            } else {
                Error::model_load(format!("Failed to fetch {}: {}", repo_id, e))
            });
        }

        std::fs::rename(&staging, model_path).map_err(|e| {
            Error::model_load(format!(
                "Failed to move fetched model into {}: {}",
                model_path.display(),
                e
            ))
        })
    }
}

/// Hub repository fetched for a model name
///
/// Names shaped like `owner/model` are fetched as-is; bare names fall back
/// to the configured hub model.
pub fn remote_repo(name: &str, options: &InferenceOptions) -> String {
    if name.contains('/') {
        name.to_string()
    } else {
        options.hub_model.clone()
    }
}

fn staging_path(model_path: &Path) -> Result<PathBuf> {
    let file_name = model_path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            Error::model_load(format!("Invalid model path: {}", model_path.display()))
        })?;

    Ok(model_path.with_file_name(format!(".{}.partial", file_name)))
}
