//! Zero-shot classification with an NLI sequence-classification model
//!
//! Every (text, candidate label) pair becomes a premise/hypothesis pair,
//! e.g. `("My parcel never arrived", "This example is complaint.")`. The
//! model's entailment logit for each pair is turned into a label score.

use crate::classifier::ZeroShotClassifier;
use crate::model_loader::{DeviceType, PipelineLoader};
use candle_core::{DType, Device, IndexOp, Tensor, D};
use candle_nn::VarBuilder;
use candle_transformers::models::debertav2::{
    Config as DebertaV2Config, DebertaV2SeqClassificationModel,
};
use dialogsense_core::{ClassificationOutput, Error, InferenceOptions, Result};
use std::collections::HashMap;
use std::path::Path;
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams, TruncationStrategy};

/// Loads [`NliZeroShotClassifier`]s from model directories
#[derive(Debug, Clone, Copy, Default)]
pub struct NliPipelineLoader;

impl PipelineLoader for NliPipelineLoader {
    fn load(
        &self,
        model_dir: &Path,
        name: &str,
        options: &InferenceOptions,
    ) -> Result<Box<dyn ZeroShotClassifier>> {
        Ok(Box::new(NliZeroShotClassifier::load(model_dir, name, options)?))
    }
}

/// DeBERTa-v2/v3 NLI model used as a zero-shot classifier
pub struct NliZeroShotClassifier {
    name: String,
    tokenizer: Tokenizer,
    model: DebertaV2SeqClassificationModel,
    device: Device,
    entailment_id: usize,
    contradiction_id: Option<usize>,
    options: InferenceOptions,
}

impl NliZeroShotClassifier {
    /// Load tokenizer, config and weights from a model directory
    pub fn load(model_dir: &Path, name: &str, options: &InferenceOptions) -> Result<Self> {
        let device = options.device.parse::<DeviceType>()?.create_device()?;

        let config: DebertaV2Config = parse_json_config(&model_dir.join("config.json"))?;
        let id2label = config
            .id2label
            .clone()
            .ok_or_else(|| Error::model_load("config.json has no id2label mapping"))?;

        let entailment_id = find_label(&id2label, "entail").ok_or_else(|| {
            Error::model_load(format!(
                "Model is not an NLI model: no entailment label in {:?}",
                id2label
            ))
        })?;
        let contradiction_id = find_label(&id2label, "contradict");

        let tokenizer = load_tokenizer(model_dir, options.max_length)?;
        let vb = load_var_builder(model_dir, &device)?;
        let model = load_sequence_model(&vb, &config)?;

        tracing::info!(
            "Loaded NLI model '{}' (entailment={}, contradiction={:?}, device={:?})",
            name,
            entailment_id,
            contradiction_id,
            device
        );

        Ok(Self {
            name: name.to_string(),
            tokenizer,
            model,
            device,
            entailment_id,
            contradiction_id,
            options: options.clone(),
        })
    }

    fn logits(&self, texts: &[&str], candidate_labels: &[String]) -> Result<Tensor> {
        let hypotheses: Vec<String> = candidate_labels
            .iter()
            .map(|label| self.options.hypothesis(label))
            .collect();

        let pairs: Vec<(String, String)> = texts
            .iter()
            .flat_map(|text| {
                hypotheses
                    .iter()
                    .map(move |hypothesis| (text.to_string(), hypothesis.clone()))
            })
            .collect();

        let encodings = self
            .tokenizer
            .encode_batch(pairs, true)
            .map_err(|e| Error::inference(format!("Tokenization failed: {}", e)))?;

        let num_pairs = encodings.len();
        let seq_len = encodings.first().map(|e| e.len()).unwrap_or(0);

        let mut input_ids = Vec::with_capacity(num_pairs * seq_len);
        let mut token_type_ids = Vec::with_capacity(num_pairs * seq_len);
        let mut attention_mask = Vec::with_capacity(num_pairs * seq_len);

        for encoding in &encodings {
            if encoding.len() != seq_len {
                return Err(Error::inference(format!(
                    "Unpadded batch: expected {} tokens, got {}",
                    seq_len,
                    encoding.len()
                )));
            }
            input_ids.extend_from_slice(encoding.get_ids());
            token_type_ids.extend_from_slice(encoding.get_type_ids());
            attention_mask.extend_from_slice(encoding.get_attention_mask());
        }

        let shape = (num_pairs, seq_len);
        let input_ids = Tensor::from_vec(input_ids, shape, &self.device)
            .map_err(candle_error("Failed to create input tensor"))?;
        let token_type_ids = Tensor::from_vec(token_type_ids, shape, &self.device)
            .map_err(candle_error("Failed to create token type tensor"))?;
        let attention_mask = Tensor::from_vec(attention_mask, shape, &self.device)
            .map_err(candle_error("Failed to create attention mask"))?;

        self.model
            .forward(&input_ids, Some(token_type_ids), Some(attention_mask))
            .map_err(candle_error("Model forward pass failed"))
    }
}

impl ZeroShotClassifier for NliZeroShotClassifier {
    fn classify_batch(
        &self,
        texts: &[&str],
        candidate_labels: &[String],
    ) -> Result<Vec<ClassificationOutput>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        if candidate_labels.is_empty() {
            return Err(Error::inference("No candidate labels given"));
        }

        let logits = self.logits(texts, candidate_labels)?;
        // a lone label cannot be ranked against others
        let multi_label = self.options.multi_label || candidate_labels.len() == 1;
        let scores = label_scores(
            &logits,
            texts.len(),
            candidate_labels.len(),
            self.entailment_id,
            self.contradiction_id,
            multi_label,
        )?;

        Ok(texts
            .iter()
            .zip(scores)
            .map(|(text, row)| {
                ClassificationOutput::from_scores(
                    *text,
                    candidate_labels.iter().cloned().zip(row).collect(),
                )
            })
            .collect())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Turn pair logits `(texts * labels, nli_classes)` into per-text label scores.
///
/// Single-label: softmax of the entailment logits across a text's labels.
/// Multi-label: per pair softmax over contradiction vs. entailment (over all
/// NLI classes when the model has no contradiction label).
pub(crate) fn label_scores(
    logits: &Tensor,
    num_texts: usize,
    num_labels: usize,
    entailment_id: usize,
    contradiction_id: Option<usize>,
    multi_label: bool,
) -> Result<Vec<Vec<f32>>> {
    let probs = if multi_label {
        let per_pair = match contradiction_id {
            Some(contradiction_id) => {
                let idx = Tensor::new(
                    &[contradiction_id as u32, entailment_id as u32],
                    logits.device(),
                )
                .map_err(candle_error("Failed to build index"))?;
                let pair_logits = logits
                    .index_select(&idx, 1)
                    .map_err(candle_error("Failed to select NLI logits"))?;
                softmax(&pair_logits)?
                    .i((.., 1))
                    .map_err(candle_error("Failed to select entailment"))?
            }
            None => softmax(logits)?
                .i((.., entailment_id))
                .map_err(candle_error("Failed to select entailment"))?,
        };
        per_pair
            .reshape((num_texts, num_labels))
            .map_err(candle_error("Failed to reshape scores"))?
    } else {
        let entailment = logits
            .i((.., entailment_id))
            .map_err(candle_error("Failed to select entailment"))?
            .reshape((num_texts, num_labels))
            .map_err(candle_error("Failed to reshape logits"))?;
        softmax(&entailment)?
    };

    probs
        .to_vec2::<f32>()
        .map_err(candle_error("Failed to convert scores"))
}

fn softmax(logits: &Tensor) -> Result<Tensor> {
    candle_nn::ops::softmax(logits, D::Minus1).map_err(candle_error("Softmax failed"))
}

fn candle_error(context: &'static str) -> impl Fn(candle_core::Error) -> Error {
    move |e| Error::inference(format!("{}: {}", context, e))
}

fn find_label(id2label: &HashMap<u32, String>, prefix: &str) -> Option<usize> {
    id2label
        .iter()
        .find(|(_, label)| label.to_ascii_lowercase().starts_with(prefix))
        .map(|(id, _)| *id as usize)
}

fn parse_json_config(config_path: &Path) -> Result<DebertaV2Config> {
    let config_str = std::fs::read_to_string(config_path).map_err(|e| {
        Error::model_load(format!(
            "Failed to read config {}: {}",
            config_path.display(),
            e
        ))
    })?;

    serde_json::from_str(&config_str).map_err(|e| {
        Error::model_load(format!(
            "Failed to parse config {}: {}",
            config_path.display(),
            e
        ))
    })
}

fn load_tokenizer(model_dir: &Path, max_length: usize) -> Result<Tokenizer> {
    let path = model_dir.join("tokenizer.json");
    let mut tokenizer = Tokenizer::from_file(&path).map_err(|e| {
        Error::model_load(format!("Failed to load {}: {}", path.display(), e))
    })?;

    let pad_id = tokenizer
        .get_padding()
        .map(|p| p.pad_id)
        .or_else(|| tokenizer.token_to_id("[PAD]"))
        .or_else(|| tokenizer.token_to_id("<pad>"))
        .unwrap_or(0);
    let pad_token = tokenizer
        .id_to_token(pad_id)
        .unwrap_or_else(|| "[PAD]".to_string());

    tokenizer.with_padding(Some(PaddingParams {
        strategy: PaddingStrategy::BatchLongest,
        pad_id,
        pad_token,
        ..Default::default()
    }));

    // premise is truncated first so the hypothesis always survives
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length,
            strategy: TruncationStrategy::OnlyFirst,
            ..Default::default()
        }))
        .map_err(|e| Error::model_load(format!("Invalid truncation settings: {}", e)))?;

    Ok(tokenizer)
}

fn load_var_builder(model_dir: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[safetensors], DType::F32, device)
                .map_err(|e| Error::model_load(format!("Failed to load weights: {}", e)))?
        };
        return Ok(vb);
    }

    let pytorch = model_dir.join("pytorch_model.bin");
    if pytorch.exists() {
        return VarBuilder::from_pth(&pytorch, DType::F32, device)
            .map_err(|e| Error::model_load(format!("Failed to load PyTorch weights: {}", e)));
    }

    Err(Error::model_load(format!(
        "No model weights in {} (tried model.safetensors, pytorch_model.bin)",
        model_dir.display()
    )))
}

fn load_sequence_model(
    vb: &VarBuilder,
    config: &DebertaV2Config,
) -> Result<DebertaV2SeqClassificationModel> {
    let mut errors = Vec::new();

    for prefix in ["deberta", ""] {
        let vb_prefix = if prefix.is_empty() {
            vb.clone()
        } else {
            vb.pp(prefix)
        };

        match DebertaV2SeqClassificationModel::load(vb_prefix, config, None) {
            Ok(model) => {
                let effective_prefix = if prefix.is_empty() { "<root>" } else { prefix };
                tracing::debug!("Loaded DeBERTa backbone from '{}'", effective_prefix);
                return Ok(model);
            }
            Err(e) => {
                errors.push(format!(
                    "{}: {}",
                    if prefix.is_empty() { "<root>" } else { prefix },
                    e
                ));
            }
        }
    }

    Err(Error::model_load(format!(
        "Failed to load DeBERTa sequence model with tried prefixes [{}]",
        errors.join(" | ")
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    // NLI classes: 0 = contradiction, 1 = neutral, 2 = entailment
    fn pair_logits(rows: &[[f32; 3]]) -> Tensor {
        let flat: Vec<f32> = rows.iter().flatten().copied().collect();
        Tensor::from_vec(flat, (rows.len(), 3), &Device::Cpu).unwrap()
    }

    #[test]
    fn test_single_label_softmax_across_labels() {
        let logits = pair_logits(&[[0.0, 0.0, 2.0], [0.0, 0.0, 0.0]]);

        let scores = label_scores(&logits, 1, 2, 2, Some(0), false).unwrap();

        assert_eq!(scores.len(), 1);
        assert!((scores[0][0] - 0.8808).abs() < 1e-3);
        assert!((scores[0][1] - 0.1192).abs() < 1e-3);
    }

    #[test]
    fn test_multi_label_scores_are_independent() {
        let logits = pair_logits(&[[0.0, 5.0, 2.0], [0.0, 0.0, 0.0]]);

        let scores = label_scores(&logits, 1, 2, 2, Some(0), true).unwrap();

        // neutral logit is ignored
        assert!((scores[0][0] - 0.8808).abs() < 1e-3);
        assert!((scores[0][1] - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_scores_grouped_per_text() {
        let logits = pair_logits(&[
            [0.0, 0.0, 1.0],
            [0.0, 0.0, 1.0],
            [0.0, 0.0, 3.0],
            [0.0, 0.0, 0.0],
        ]);

        let scores = label_scores(&logits, 2, 2, 2, Some(0), false).unwrap();

        assert_eq!(scores.len(), 2);
        assert!((scores[0][0] - 0.5).abs() < 1e-3);
        assert!(scores[1][0] > 0.9);
    }

    #[test]
    fn test_multi_label_without_contradiction_uses_all_classes() {
        let logits = pair_logits(&[[0.0, 0.0, 0.0]]);

        let scores = label_scores(&logits, 1, 1, 2, None, true).unwrap();

        assert!((scores[0][0] - 1.0 / 3.0).abs() < 1e-3);
    }

    #[test]
    fn test_find_label_case_insensitive() {
        let id2label: HashMap<u32, String> = [
            (0, "CONTRADICTION".to_string()),
            (1, "neutral".to_string()),
            (2, "Entailment".to_string()),
        ]
        .into_iter()
        .collect();

        assert_eq!(find_label(&id2label, "entail"), Some(2));
        assert_eq!(find_label(&id2label, "contradict"), Some(0));
        assert_eq!(find_label(&id2label, "missing"), None);
    }

    #[test]
    fn test_load_without_config_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = NliZeroShotClassifier::load(dir.path(), "empty", &InferenceOptions::default());
        assert!(matches!(result, Err(Error::ModelLoad(_))));
    }
}
