//! Analysis configuration loaded from an INI file
//!
//! ```ini
//! [model]
//! model_name = bart-large-mnli
//!
//! [labels]
//! intent_labels = complaint, praise, question
//! sentiment_labels = ["positive", "negative", "neutral"]
//!
//! [dataset]
//! dataset_name = json
//! data_path = data/dialogues.json
//! batch_size = 8
//! ```
//!
//! Values can be overridden with `DIALOGSENSE_<SECTION>__<KEY>` environment
//! variables, e.g. `DIALOGSENSE_DATASET__BATCH_SIZE=16`.

use crate::error::{Error, Result};
use config::{Config, ConfigError, Environment, File, FileFormat};
use std::path::{Path, PathBuf};

/// Environment variable prefix for config overrides
pub const ENV_PREFIX: &str = "DIALOGSENSE";

/// Hypothesis used to turn a candidate label into an NLI hypothesis
pub const DEFAULT_HYPOTHESIS_TEMPLATE: &str = "This example is {}.";

/// Hub repository fetched when the model name is not a repository id
pub const DEFAULT_HUB_MODEL: &str = "MoritzLaurer/DeBERTa-v3-base-mnli-fever-anli";

/// Hub revision fetched unless `model.revision` says otherwise
pub const DEFAULT_REVISION: &str = "main";

/// Model-side knobs from the optional keys of the `[model]` section
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceOptions {
    /// Device to run on (cpu, cuda, cuda:N, metal, metal:N)
    pub device: String,

    /// Hypothesis template, `{}` is replaced by the candidate label
    pub hypothesis_template: String,

    /// Score each label independently instead of across labels
    pub multi_label: bool,

    /// Maximum tokens per premise/hypothesis pair
    pub max_length: usize,

    /// Hub repository to fetch for bare model names
    pub hub_model: String,

    /// Hub revision (branch, tag or commit) to fetch
    pub revision: String,
}

impl Default for InferenceOptions {
    fn default() -> Self {
        Self {
            device: "cpu".to_string(),
            hypothesis_template: DEFAULT_HYPOTHESIS_TEMPLATE.to_string(),
            multi_label: false,
            max_length: 512,
            hub_model: DEFAULT_HUB_MODEL.to_string(),
            revision: DEFAULT_REVISION.to_string(),
        }
    }
}

impl InferenceOptions {
    /// Render the hypothesis for a candidate label
    pub fn hypothesis(&self, label: &str) -> String {
        self.hypothesis_template.replacen("{}", label, 1)
    }
}

/// Settings for one analysis run
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Model name, also the directory name under the resources root
    pub model_name: String,

    /// Candidate labels for intent classification
    pub intent_labels: Vec<String>,

    /// Candidate labels for sentiment classification
    pub sentiment_labels: Vec<String>,

    /// Dataset format name
    pub dataset_name: String,

    /// Dataset location
    pub data_path: PathBuf,

    /// Records per inference call
    pub batch_size: usize,

    /// Optional model settings
    pub inference: InferenceOptions,
}

impl AnalysisConfig {
    /// Load configuration from an INI file, applying environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::config(format!(
                "config file not found: {}",
                path.display()
            )));
        }

        let settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Ini).required(true))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(|e| Error::config(format!("failed to read {}: {}", path.display(), e)))?;

        Self::from_settings(&settings)
    }

    /// Parse configuration from INI text (no environment overrides)
    pub fn from_ini_str(contents: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from_str(contents, FileFormat::Ini))
            .build()
            .map_err(|e| Error::config(format!("failed to parse config: {}", e)))?;

        Self::from_settings(&settings)
    }

    fn from_settings(settings: &Config) -> Result<Self> {
        let model_name = required_string(settings, "model.model_name")?;
        let intent_labels = parse_label_list(
            "labels.intent_labels",
            &required_string(settings, "labels.intent_labels")?,
        )?;
        let sentiment_labels = parse_label_list(
            "labels.sentiment_labels",
            &required_string(settings, "labels.sentiment_labels")?,
        )?;
        let dataset_name = required_string(settings, "dataset.dataset_name")?;
        let data_path = PathBuf::from(required_string(settings, "dataset.data_path")?);

        let batch_size = match settings.get_int("dataset.batch_size") {
            Ok(n) if n > 0 => n as usize,
            Ok(n) => {
                return Err(Error::config(format!(
                    "`dataset.batch_size` must be greater than 0, got {}",
                    n
                )))
            }
            Err(ConfigError::NotFound(_)) => {
                return Err(Error::config("missing required key `dataset.batch_size`"))
            }
            Err(e) => {
                return Err(Error::config(format!(
                    "invalid value for `dataset.batch_size`: {}",
                    e
                )))
            }
        };

        let inference = inference_options(settings)?;

        Ok(Self {
            model_name,
            intent_labels,
            sentiment_labels,
            dataset_name,
            data_path,
            batch_size,
            inference,
        })
    }

    /// Replace the dataset path (CLI override)
    pub fn with_data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_path = path.into();
        self
    }

    /// Output file name derived from the dataset path: `out_<file name>`
    pub fn output_file_name(&self) -> Result<String> {
        let file_name = self
            .data_path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                Error::config(format!(
                    "data path has no usable file name: {}",
                    self.data_path.display()
                ))
            })?;

        Ok(format!("out_{}", file_name))
    }
}

fn inference_options(settings: &Config) -> Result<InferenceOptions> {
    let defaults = InferenceOptions::default();

    let hypothesis_template = optional(settings.get_string("model.hypothesis_template"))?
        .unwrap_or(defaults.hypothesis_template);
    if !hypothesis_template.contains("{}") {
        return Err(Error::config(format!(
            "`model.hypothesis_template` must contain `{{}}`, got {:?}",
            hypothesis_template
        )));
    }

    let max_length = match optional(settings.get_int("model.max_length"))? {
        Some(n) if n > 0 => n as usize,
        Some(n) => {
            return Err(Error::config(format!(
                "`model.max_length` must be greater than 0, got {}",
                n
            )))
        }
        None => defaults.max_length,
    };

    Ok(InferenceOptions {
        device: optional(settings.get_string("model.device"))?.unwrap_or(defaults.device),
        hypothesis_template,
        multi_label: optional(settings.get_bool("model.multi_label"))?
            .unwrap_or(defaults.multi_label),
        max_length,
        hub_model: optional(settings.get_string("model.hub_model"))?
            .unwrap_or(defaults.hub_model),
        revision: optional(settings.get_string("model.revision"))?
            .unwrap_or(defaults.revision),
    })
}

fn required_string(settings: &Config, key: &str) -> Result<String> {
    match settings.get_string(key) {
        Ok(value) if value.trim().is_empty() => {
            Err(Error::config(format!("required key `{}` is empty", key)))
        }
        Ok(value) => Ok(value.trim().to_string()),
        Err(ConfigError::NotFound(_)) => {
            Err(Error::config(format!("missing required key `{}`", key)))
        }
        Err(e) => Err(Error::config(format!("invalid value for `{}`: {}", key, e))),
    }
}

fn optional<T>(value: std::result::Result<T, ConfigError>) -> Result<Option<T>> {
    match value {
        Ok(v) => Ok(Some(v)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(Error::config(e.to_string())),
    }
}

/// Parse a label list written either as a JSON array of strings
/// (`["positive", "negative"]`) or as comma-separated values.
///
/// Bracketed lists without double quotes (`['a', 'b']`) are split on commas.
pub fn parse_label_list(key: &str, raw: &str) -> Result<Vec<String>> {
    let trimmed = raw.trim();

    let labels: Vec<String> = match trimmed
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
    {
        Some(_) if trimmed.contains('"') => serde_json::from_str::<Vec<String>>(trimmed)
            .map_err(|e| Error::config(format!("`{}` is not a JSON array of strings: {}", key, e)))?
            .into_iter()
            .map(|label| label.trim().to_string())
            .filter(|label| !label.is_empty())
            .collect(),
        Some(inner) => split_labels(inner),
        None => split_labels(trimmed),
    };

    if labels.is_empty() {
        return Err(Error::config(format!("`{}` contains no labels", key)));
    }

    Ok(labels)
}

fn split_labels(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|label| label.trim().trim_matches('\'').trim())
        .filter(|label| !label.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
[model]
model_name = bart-large-mnli

[labels]
intent_labels = complaint, praise, question
sentiment_labels = positive,negative

[dataset]
dataset_name = json
data_path = data/dialogues.json
batch_size = 4
"#;

    #[test]
    fn test_parse_valid_config() {
        let config = AnalysisConfig::from_ini_str(VALID).unwrap();

        assert_eq!(config.model_name, "bart-large-mnli");
        assert_eq!(config.intent_labels, vec!["complaint", "praise", "question"]);
        assert_eq!(config.sentiment_labels, vec!["positive", "negative"]);
        assert_eq!(config.dataset_name, "json");
        assert_eq!(config.data_path, PathBuf::from("data/dialogues.json"));
        assert_eq!(config.batch_size, 4);
        assert_eq!(config.inference, InferenceOptions::default());
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let without_batch_size = VALID.replace("batch_size = 4", "");
        let err = AnalysisConfig::from_ini_str(&without_batch_size).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("dataset.batch_size"));

        let without_model = VALID.replace("model_name = bart-large-mnli", "");
        let err = AnalysisConfig::from_ini_str(&without_model).unwrap_err();
        assert!(err.to_string().contains("model.model_name"));
    }

    #[test]
    fn test_batch_size_must_be_positive() {
        let zero = VALID.replace("batch_size = 4", "batch_size = 0");
        assert!(matches!(
            AnalysisConfig::from_ini_str(&zero),
            Err(Error::Config(_))
        ));

        let garbage = VALID.replace("batch_size = 4", "batch_size = many");
        assert!(matches!(
            AnalysisConfig::from_ini_str(&garbage),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_optional_model_keys() {
        let ini = VALID.replace(
            "model_name = bart-large-mnli",
            "model_name = bart-large-mnli\ndevice = cuda:1\nmulti_label = true\nmax_length = 256\nhypothesis_template = The customer is {}.",
        );
        let config = AnalysisConfig::from_ini_str(&ini).unwrap();

        assert_eq!(config.inference.device, "cuda:1");
        assert!(config.inference.multi_label);
        assert_eq!(config.inference.max_length, 256);
        assert_eq!(config.inference.hypothesis("angry"), "The customer is angry.");
        assert_eq!(config.inference.revision, DEFAULT_REVISION);
    }

    #[test]
    fn test_revision_key() {
        let ini = VALID.replace(
            "model_name = bart-large-mnli",
            "model_name = bart-large-mnli\nrevision = v1.2",
        );
        let config = AnalysisConfig::from_ini_str(&ini).unwrap();
        assert_eq!(config.inference.revision, "v1.2");
    }

    #[test]
    fn test_template_without_placeholder_rejected() {
        let ini = VALID.replace(
            "model_name = bart-large-mnli",
            "model_name = bart-large-mnli\nhypothesis_template = No placeholder here.",
        );
        assert!(matches!(
            AnalysisConfig::from_ini_str(&ini),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_parse_label_list_forms() {
        assert_eq!(
            parse_label_list("k", r#"["positive", "negative"]"#).unwrap(),
            vec!["positive", "negative"]
        );
        assert_eq!(
            parse_label_list("k", "['refund request', 'praise']").unwrap(),
            vec!["refund request", "praise"]
        );
        assert_eq!(
            parse_label_list("k", " a , ,b ").unwrap(),
            vec!["a", "b"]
        );
        assert!(parse_label_list("k", "[]").is_err());
        assert!(parse_label_list("k", " , ").is_err());
        assert!(matches!(
            parse_label_list("k", r#"["unterminated, "x"]"#),
            Err(Error::Config(_))
        ));

        let ini = VALID.replace(
            "intent_labels = complaint, praise, question",
            r#"intent_labels = ["refund, please", "praise"]"#,
        );
        let config = AnalysisConfig::from_ini_str(&ini).unwrap();
        assert_eq!(config.intent_labels, vec!["refund, please", "praise"]);
    }

    #[test]
    fn test_output_file_name_uses_data_path_basename() {
        let config = AnalysisConfig::from_ini_str(VALID)
            .unwrap()
            .with_data_path("/tmp/other/chats.jsonl");

        assert_eq!(config.output_file_name().unwrap(), "out_chats.jsonl");
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analysis.ini");
        std::fs::write(&path, VALID).unwrap();

        let config = AnalysisConfig::from_file(&path).unwrap();
        assert_eq!(config.model_name, "bart-large-mnli");
    }

    #[test]
    fn test_env_overrides_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analysis.ini");
        std::fs::write(&path, VALID).unwrap();

        std::env::set_var("DIALOGSENSE_DATASET__BATCH_SIZE", "16");
        let result = AnalysisConfig::from_file(&path);
        std::env::remove_var("DIALOGSENSE_DATASET__BATCH_SIZE");

        let config = result.unwrap();
        assert_eq!(config.batch_size, 16);
        assert_eq!(config.dataset_name, "json");
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = AnalysisConfig::from_file("/definitely/not/here.ini").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
