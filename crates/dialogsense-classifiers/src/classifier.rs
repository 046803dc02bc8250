//! Zero-shot classifier trait

use dialogsense_core::{ClassificationOutput, Result};

/// A loaded zero-shot classification pipeline
///
/// Implementations must return exactly one output per input text, in input
/// order. Each output ranks every candidate label.
pub trait ZeroShotClassifier: Send + Sync {
    /// Score every text against the candidate labels
    fn classify_batch(
        &self,
        texts: &[&str],
        candidate_labels: &[String],
    ) -> Result<Vec<ClassificationOutput>>;

    /// Classify a single text
    fn classify(&self, text: &str, candidate_labels: &[String]) -> Result<ClassificationOutput> {
        self.classify_batch(&[text], candidate_labels)?
            .pop()
            .ok_or_else(|| dialogsense_core::Error::inference("classifier returned no output"))
    }

    /// Get the classifier name
    fn name(&self) -> &str;
}
