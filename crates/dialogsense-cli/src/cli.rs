//! Command-line arguments

use crate::app::RunSettings;
use clap::Parser;
use dialogsense_classifiers::DEFAULT_RESOURCES_DIR;
use dialogsense_core::OutputFormat;
use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dialogsense")]
#[command(
    about = "Zero-shot sentiment and intent analysis of customer/agent dialogues",
    long_about = None
)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, alias = "cfg")]
    pub config: PathBuf,

    /// Directory receiving the results file
    #[arg(short, long = "output_path", default_value = "outputs")]
    pub output_path: PathBuf,

    /// Dataset path, overrides `dataset.data_path` from the config file
    #[arg(short, long = "data_path")]
    pub data_path: Option<PathBuf>,

    /// Local model cache
    #[arg(
        long = "resources_dir",
        env = "DIALOGSENSE_RESOURCES_DIR",
        default_value = DEFAULT_RESOURCES_DIR
    )]
    pub resources_dir: PathBuf,

    /// Output format (jsonl or csv)
    #[arg(long, default_value = "jsonl")]
    pub format: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Parse arguments, accepting the single-dash `-cfg` spelling
    pub fn parse_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self::parse_from(normalize_legacy_flags(args))
    }

    pub fn run_settings(&self) -> RunSettings {
        RunSettings {
            config_path: self.config.clone(),
            output_path: self.output_path.clone(),
            data_path: self.data_path.clone(),
            format: self.format,
        }
    }
}

/// Rewrite `-cfg FILE` and `-cfg=FILE` to `--config`
///
/// Clap would otherwise read `-cfg` as `-c fg`.
pub fn normalize_legacy_flags<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    args.into_iter()
        .map(Into::into)
        .map(|arg| match arg.to_str() {
            Some("-cfg") => OsString::from("--config"),
            Some(s) if s.starts_with("-cfg=") => {
                OsString::from(format!("--config={}", &s["-cfg=".len()..]))
            }
            _ => arg,
        })
        .collect()
}
