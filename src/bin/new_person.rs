use std::process::ExitCode;

use face_id_bench::config::TextToImageConfig;
use face_id_bench::logging;
use face_id_bench::services::text_to_image::{self, OutputTarget, TextToImageClient};

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();

    let config = match TextToImageConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Configuration error");
            return ExitCode::FAILURE;
        }
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

    let target = OutputTarget::File(config.output_path());
    let prompts = vec![config.new_person_prompt.clone()];
    let summary = text_to_image::run_batch(&client, &prompts, &target).await;

    tracing::info!(
        path = %target.location().display(),
        saved = summary.saved.len(),
        failed = summary.failures.len(),
        "Done"
    );
    ExitCode::SUCCESS
}
