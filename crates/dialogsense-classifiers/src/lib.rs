//! dialogsense Classifiers
//!
//! Zero-shot sentiment and intent classification on top of NLI models.
//!
//! - [`ModelProvider`] resolves a model name against the local resources
//!   directory and falls back to the Hugging Face Hub, persisting downloads
//! - [`NliZeroShotClassifier`] scores texts against arbitrary candidate labels
//! - [`InferenceDriver`] runs a classifier over a dataset in batches
//!
//! Everything runs on CPU by default.

pub mod classifier;
pub mod driver;
pub mod model_loader;
pub mod nli;

pub use classifier::ZeroShotClassifier;
pub use driver::InferenceDriver;
pub use model_loader::{
    remote_repo, DeviceType, HfHubFetcher, HubFetcher, ModelProvider, PipelineLoader,
    DEFAULT_RESOURCES_DIR,
};
pub use nli::{NliPipelineLoader, NliZeroShotClassifier};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::classifier::ZeroShotClassifier;
    pub use crate::driver::InferenceDriver;
    pub use crate::model_loader::{HubFetcher, ModelProvider, PipelineLoader};
}
