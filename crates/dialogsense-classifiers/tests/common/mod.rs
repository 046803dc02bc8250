//! Mock classifiers, fetchers and loaders for testing
//!
//! The mocks count their calls so tests can assert on network and load
//! behavior without touching the hub or running a model.

#![allow(dead_code)]

use dialogsense_classifiers::{HubFetcher, PipelineLoader, ZeroShotClassifier};
use dialogsense_core::{ClassificationOutput, Error, InferenceOptions, Result};
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

/// Route library logs to the test harness output
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("dialogsense=debug")
        .with_test_writer()
        .try_init();
}

/// Scores a label 0.9 when the text mentions it, spreading the rest evenly
pub struct MockClassifier {
    name: String,
    call_count: AtomicU32,
}

impl MockClassifier {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            call_count: AtomicU32::new(0),
        }
    }

    /// Number of `classify_batch` calls
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }
}

impl ZeroShotClassifier for MockClassifier {
    fn classify_batch(
        &self,
        texts: &[&str],
        candidate_labels: &[String],
    ) -> Result<Vec<ClassificationOutput>> {
        self.call_count.fetch_add(1, Ordering::Relaxed);

        Ok(texts
            .iter()
            .map(|text| {
                let lower = text.to_lowercase();
                let hits = candidate_labels
                    .iter()
                    .filter(|l| lower.contains(l.as_str()))
                    .count();
                let rest = candidate_labels.len().saturating_sub(hits).max(1) as f32;
                let scored = candidate_labels
                    .iter()
                    .map(|label| {
                        let score = if lower.contains(label.as_str()) {
                            0.9
                        } else {
                            0.1 / rest
                        };
                        (label.clone(), score)
                    })
                    .collect();
                ClassificationOutput::from_scores(*text, scored)
            })
            .collect())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Drops the last output of every batch
pub struct ShortClassifier;

impl ZeroShotClassifier for ShortClassifier {
    fn classify_batch(
        &self,
        texts: &[&str],
        candidate_labels: &[String],
    ) -> Result<Vec<ClassificationOutput>> {
        let mut outputs = MockClassifier::new("short").classify_batch(texts, candidate_labels)?;
        outputs.pop();
        Ok(outputs)
    }

    fn name(&self) -> &str {
        "short"
    }
}

/// A classifier that always fails - for testing error paths
pub struct FailingClassifier;

impl ZeroShotClassifier for FailingClassifier {
    fn classify_batch(&self, _texts: &[&str], _labels: &[String]) -> Result<Vec<ClassificationOutput>> {
        Err(Error::inference("Simulated classifier failure"))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Writes a marker model directory instead of downloading
#[derive(Default)]
pub struct MockFetcher {
    fail: bool,
    fetch_count: AtomicU32,
    revisions: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn fetch_count(&self) -> u32 {
        self.fetch_count.load(Ordering::Relaxed)
    }

    /// Revisions requested so far, in call order
    pub fn revisions(&self) -> Vec<String> {
        self.revisions.lock().unwrap().clone()
    }
}

impl HubFetcher for MockFetcher {
    fn fetch(&self, repo_id: &str, revision: &str, destination: &Path) -> Result<()> {
        self.fetch_count.fetch_add(1, Ordering::Relaxed);
        self.revisions.lock().unwrap().push(revision.to_string());

        std::fs::create_dir_all(destination)?;
        std::fs::write(destination.join("config.json"), repo_id)?;

        if self.fail {
            // leave a half-written directory behind
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset",
            )));
        }

        std::fs::write(destination.join("tokenizer.json"), "{}")?;
        Ok(())
    }
}

/// Loads a [`MockClassifier`] from any existing directory
#[derive(Default)]
pub struct MockLoader {
    load_count: AtomicU32,
}

impl MockLoader {
    pub fn load_count(&self) -> u32 {
        self.load_count.load(Ordering::Relaxed)
    }
}

impl PipelineLoader for MockLoader {
    fn load(
        &self,
        model_dir: &Path,
        name: &str,
        _options: &InferenceOptions,
    ) -> Result<Box<dyn ZeroShotClassifier>> {
        self.load_count.fetch_add(1, Ordering::Relaxed);

        if !model_dir.is_dir() {
            return Err(Error::model_load(format!(
                "{} is not a model directory",
                model_dir.display()
            )));
        }
        Ok(Box::new(MockClassifier::new(name)))
    }
}

pub fn labels(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}
