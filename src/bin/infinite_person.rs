use std::process::ExitCode;

use face_id_bench::config::InfiniteYouConfig;
use face_id_bench::logging;
use face_id_bench::services::http::RemoteError;
use face_id_bench::services::infinite_you::{GenerationOutcome, InfiniteYouClient};

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();

    tracing::info!("Starting InfiniteYou generation");

    let config = match InfiniteYouConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Configuration error");
            return ExitCode::FAILURE;
        }
    };

    let client = match InfiniteYouClient::new(&config) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize HTTP client");
            return ExitCode::FAILURE;
        }
    };

    let code = match client.generate().await {
        Ok(report) => {
            match &report.outcome {
                GenerationOutcome::Saved { path, .. } => {
                    tracing::info!(path = %path.display(), seed = report.seed, "Generation succeeded")
                }
                outcome => tracing::warn!(?outcome, job_id = ?report.job_id, "No image saved"),
            }
            ExitCode::SUCCESS
        }
        Err(e) if e.is_timeout() => {
            tracing::error!(
                timeout_secs = config.infu_request_timeout_secs,
                "Request timed out"
            );
            ExitCode::FAILURE
        }
        Err(RemoteError::InputNotFound(path)) => {
            tracing::error!(
                path = %path.display(),
                "Input image not found; set INFINITE_INPUT_FACE_IMAGE_PATH in your .env file"
            );
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!(error = %e, "Generation failed");
            ExitCode::FAILURE
        }
    };

    tracing::info!(
        identity_image = %config.infinite_input_face_image_path,
        output_image = %config.infinite_output_image_path,
        "Run complete"
    );
    code
}
