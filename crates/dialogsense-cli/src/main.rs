//! dialogsense
//!
//! Zero-shot sentiment and intent classification of customer/agent
//! dialogue datasets.

use anyhow::Result;
use dialogsense_classifiers::ModelProvider;
use dialogsense_cli::{app, Cli};
use tracing::{error, info};

fn main() -> Result<()> {
    let cli = Cli::parse_args(std::env::args_os());

    // Initialize tracing
    init_tracing(cli.verbose);

    info!("Starting dialogsense");
    info!("Model cache: {}", cli.resources_dir.display());

    let provider = ModelProvider::new(&cli.resources_dir);

    match app::run(&cli.run_settings(), &provider) {
        Ok(summary) => {
            info!(
                "Analysis complete: {} records -> {}",
                summary.records,
                summary.output_file.display()
            );
            Ok(())
        }
        Err(e) => {
            error!("Analysis failed: {}", e);
            Err(e.into())
        }
    }
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("dialogsense=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("dialogsense=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
