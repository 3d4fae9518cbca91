use std::path::{Path, PathBuf};
use std::process::ExitCode;

use face_id_bench::config::BatchConfig;
use face_id_bench::logging;
use face_id_bench::services::text_to_image::{
    self, OutputTarget, TextToImageClient, DEFAULT_BATCH_PROMPTS,
};

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();

    let config = match BatchConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Configuration error");
            return ExitCode::FAILURE;
        }
    };

    let prompts = match config.sd_prompts_file.as_deref() {
        Some(path) => match text_to_image::load_prompts(Path::new(path)) {
            Ok(prompts) => prompts,
            Err(e) => {
                tracing::error!(path, error = %e, "Failed to read prompts file");
                return ExitCode::FAILURE;
            }
        },
        None => DEFAULT_BATCH_PROMPTS.iter().map(|p| p.to_string()).collect(),
    };

    let client = match TextToImageClient::new(
        &config.huggingface_endpoint,
        &config.huggingface_api_key,
        config.request_timeout(),
    ) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize HTTP client");
            return ExitCode::FAILURE;
        }
    };

    let target = OutputTarget::Timestamped(PathBuf::from(&config.sd_output_dir));
    let summary = text_to_image::run_batch(&client, &prompts, &target).await;

    tracing::info!(
        dir = %target.location().display(),
        saved = summary.saved.len(),
        failed = summary.failures.len(),
        "Done"
    );
    ExitCode::SUCCESS
}
