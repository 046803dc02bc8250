//! Dialogue records and classification results

use serde::{Deserialize, Serialize};

/// One customer/agent dialogue to classify
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueRecord {
    /// Identifier carried through to the output, if the dataset has one
    pub id: Option<String>,

    /// Text presented to the model
    pub text: String,
}

impl DialogueRecord {
    /// Create a record without an identifier
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: None,
            text: text.into(),
        }
    }

    /// Attach an identifier
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Zero-shot result for one input and one candidate label set
///
/// `labels` and `scores` are parallel and sorted by descending score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationOutput {
    /// The classified input text
    pub sequence: String,

    /// Candidate labels, best first
    pub labels: Vec<String>,

    /// Score for each entry of `labels`
    pub scores: Vec<f32>,
}

impl ClassificationOutput {
    /// Build an output from unordered `(label, score)` pairs
    pub fn from_scores(sequence: impl Into<String>, mut scored: Vec<(String, f32)>) -> Self {
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        let (labels, scores) = scored.into_iter().unzip();
        Self {
            sequence: sequence.into(),
            labels,
            scores,
        }
    }

    /// Highest scoring label
    pub fn top_label(&self) -> Option<&str> {
        self.labels.first().map(String::as_str)
    }

    /// Score of the highest scoring label
    pub fn top_score(&self) -> Option<f32> {
        self.scores.first().copied()
    }
}

/// Sentiment and intent predictions for one dataset record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub sentiment: ClassificationOutput,
    pub intent: ClassificationOutput,
}
