//! OnnxAI Server - image classification over HTTP or from the command line

use anyhow::Result;
use clap::Parser;
use tracing::info;

use onnxai_server::{classify_files, logging, CliArgs, Command, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    let config = ServerConfig::load(&args)?;

    logging::init(&config.logging)?;

    info!("Starting OnnxAI Server v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Models: {}, labels: {}, workers: {}, session cache: {}",
        config.registry.models_dir.display(),
        config.registry.labels_path.display(),
        config.inference.workers,
        config.inference.session_cache
    );

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => onnxai_server::serve(config).await,
        Command::Classify {
            model,
            scores,
            images,
        } => {
            let classifier = onnxai_server::build_classifier(&config)?;
            let outcomes = classify_files(&classifier, &model, &images, scores).await;
            let failed = outcomes.iter().filter(|o| o.error.is_some()).count();

            for outcome in &outcomes {
                println!("{}", serde_json::to_string(outcome)?);
            }

            if failed > 0 {
                anyhow::bail!("{} of {} files failed", failed, outcomes.len());
            }
            Ok(())
        }
    }
}
