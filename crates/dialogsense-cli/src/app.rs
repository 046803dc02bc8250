//! Run orchestration: config, dataset, model, inference, results

use dialogsense_classifiers::{HubFetcher, InferenceDriver, ModelProvider, PipelineLoader};
use dialogsense_core::{load_dataset, write_results, AnalysisConfig, OutputFormat, Result};
use std::path::PathBuf;
use tracing::info;

/// Inputs of one analysis run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub config_path: PathBuf,
    pub output_path: PathBuf,
    pub data_path: Option<PathBuf>,
    pub format: OutputFormat,
}

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Number of classified records
    pub records: usize,
    /// File the results were written to
    pub output_file: PathBuf,
}

/// Classify a dataset and write the results
///
/// Nothing is written unless every record was classified.
pub fn run<F, L>(settings: &RunSettings, provider: &ModelProvider<F, L>) -> Result<RunSummary>
where
    F: HubFetcher,
    L: PipelineLoader,
{
    let mut config = AnalysisConfig::from_file(&settings.config_path)?;
    if let Some(data_path) = &settings.data_path {
        config = config.with_data_path(data_path);
    }
    let output_file = settings.output_path.join(config.output_file_name()?);

    info!("Model: {}", config.model_name);
    info!("Sentiment labels: {:?}", config.sentiment_labels);
    info!("Intent labels: {:?}", config.intent_labels);

    let dataset = load_dataset(&config.dataset_name, &config.data_path)?;
    info!(
        "Loaded {} records from {}",
        dataset.len(),
        config.data_path.display()
    );

    if !settings.output_path.exists() {
        std::fs::create_dir_all(&settings.output_path)?;
        info!("Created output directory {}", settings.output_path.display());
    }

    let classifier = provider.get_model(&config.model_name, &config.inference)?;

    let results = InferenceDriver::new(classifier.as_ref(), config.batch_size).run(
        &dataset,
        &config.sentiment_labels,
        &config.intent_labels,
    )?;

    write_results(&results, &output_file, settings.format)?;
    info!(
        "Wrote {} results to {}",
        results.len(),
        output_file.display()
    );

    Ok(RunSummary {
        records: results.len(),
        output_file,
    })
}
