//! Batch inference over a dataset
//!
//! Each batch is classified twice, once against the sentiment labels and
//! once against the intent labels, and the two outputs are paired by index.

use crate::classifier::ZeroShotClassifier;
use dialogsense_core::{ClassificationOutput, Dataset, Error, ResultEntry, Result};
use std::time::Instant;

/// Runs a classifier over a dataset in fixed-size batches
pub struct InferenceDriver<'a> {
    classifier: &'a dyn ZeroShotClassifier,
    batch_size: usize,
}

impl<'a> InferenceDriver<'a> {
    /// Create a driver; a zero batch size is treated as one
    pub fn new(classifier: &'a dyn ZeroShotClassifier, batch_size: usize) -> Self {
        Self {
            classifier,
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Classify every record, returning one entry per record in dataset order
    pub fn run(
        &self,
        dataset: &Dataset,
        sentiment_labels: &[String],
        intent_labels: &[String],
    ) -> Result<Vec<ResultEntry>> {
        let start = Instant::now();
        let records = dataset.records();
        let mut results = Vec::with_capacity(records.len());

        for (batch_idx, batch) in records.chunks(self.batch_size).enumerate() {
            let texts: Vec<&str> = batch.iter().map(|r| r.text.as_str()).collect();

            let sentiment = self.classify_checked(&texts, sentiment_labels, "sentiment")?;
            let intent = self.classify_checked(&texts, intent_labels, "intent")?;

            for (idx, record) in batch.iter().enumerate() {
                results.push(ResultEntry {
                    id: record.id.clone(),
                    sentiment: sentiment[idx].clone(),
                    intent: intent[idx].clone(),
                });
            }

            tracing::debug!(
                batch = batch_idx,
                size = batch.len(),
                done = results.len(),
                total = records.len(),
                "Classified batch"
            );
        }

        if results.len() != records.len() {
            return Err(Error::inference(format!(
                "Produced {} results for {} records",
                results.len(),
                records.len()
            )));
        }

        tracing::info!(
            "Classified {} records from '{}' with {} in {:.2?}",
            results.len(),
            dataset.name(),
            self.classifier.name(),
            start.elapsed()
        );

        Ok(results)
    }

    fn classify_checked(
        &self,
        texts: &[&str],
        labels: &[String],
        task: &str,
    ) -> Result<Vec<ClassificationOutput>> {
        let outputs = self.classifier.classify_batch(texts, labels)?;
        if outputs.len() != texts.len() {
            return Err(Error::inference(format!(
                "{} classification returned {} outputs for a batch of {}",
                task,
                outputs.len(),
                texts.len()
            )));
        }
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dialogsense_core::DialogueRecord;

    struct EchoClassifier;

    impl ZeroShotClassifier for EchoClassifier {
        fn classify_batch(
            &self,
            texts: &[&str],
            candidate_labels: &[String],
        ) -> Result<Vec<ClassificationOutput>> {
            Ok(texts
                .iter()
                .map(|t| {
                    ClassificationOutput::from_scores(
                        *t,
                        candidate_labels.iter().map(|l| (l.clone(), 0.5)).collect(),
                    )
                })
                .collect())
        }

        fn name(&self) -> &str {
            "echo"
        }
    }

    #[test]
    fn test_zero_batch_size_is_clamped() {
        let driver = InferenceDriver::new(&EchoClassifier, 0);
        assert_eq!(driver.batch_size(), 1);
    }

    #[test]
    fn test_ids_carried_through() {
        let dataset = Dataset::new(
            "support",
            vec![
                DialogueRecord::new("hello").with_id("a"),
                DialogueRecord::new("bye"),
            ],
        );
        let labels = vec!["positive".to_string()];

        let results = InferenceDriver::new(&EchoClassifier, 8)
            .run(&dataset, &labels, &labels)
            .unwrap();

        assert_eq!(results[0].id.as_deref(), Some("a"));
        assert_eq!(results[1].id, None);
        assert_eq!(results[1].intent.sequence, "bye");
    }
}
