use std::path::Path;
use std::process::ExitCode;

use face_id_bench::config::CompareConfig;
use face_id_bench::logging;
use face_id_bench::services::comparison::{self, FaceComparator};
use face_id_bench::services::face::{CascadeParams, RustfaceDetector};

fn main() -> ExitCode {
    logging::init();

    // Load configuration from environment
    let config = match CompareConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Configuration error");
            return ExitCode::FAILURE;
        }
    };

    // Both images must exist before the detector model is loaded
    if let Err(e) = comparison::ensure_inputs(&config) {
        tracing::error!(error = %e, "Face comparison failed");
        return ExitCode::FAILURE;
    }

    tracing::info!(model = %config.face_model_path, "Loading face detection model");
    let detector = match RustfaceDetector::from_file(
        Path::new(&config.face_model_path),
        CascadeParams::default(),
    ) {
        Ok(detector) => detector,
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize face detector");
            return ExitCode::FAILURE;
        }
    };

    match comparison::run_comparison(&config, &FaceComparator::new(detector)) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Face comparison failed");
            ExitCode::FAILURE
        }
    }
}
