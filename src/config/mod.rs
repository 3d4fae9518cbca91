use std::path::PathBuf;
use std::time::Duration;

use garde::Validate;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Configuration for the face comparator.
#[derive(Debug, Deserialize, Validate)]
pub struct CompareConfig {
    /// Reference face image.
    #[garde(length(min = 1))]
    pub default_person_face_image: String,

    /// Generated face image compared against the reference.
    #[garde(length(min = 1))]
    pub infinite_person_face_image: String,

    /// Append-only results file.
    #[serde(default = "default_comparisons_csv")]
    #[garde(length(min = 1))]
    pub comparisons_csv: String,

    /// Cascade model used by the face detector.
    #[serde(default = "default_face_model_path")]
    #[garde(length(min = 1))]
    pub face_model_path: String,
}

/// Configuration for the InfiniteYou face-personalization client.
#[derive(Debug, Deserialize, Validate)]
pub struct InfiniteYouConfig {
    /// Job submission endpoint (e.g. "https://api.runpod.ai/v2/<endpoint>/run").
    #[garde(length(min = 1))]
    pub runpod_infu_url: String,

    /// Bearer token forwarded on every request.
    #[garde(length(min = 1))]
    pub runpod_api_key: String,

    #[garde(length(min = 1))]
    pub infinite_input_face_image_path: String,

    #[garde(length(min = 1))]
    pub infinite_output_image_path: String,

    #[garde(length(min = 1))]
    pub infinite_person_prompt: String,

    /// Overrides the status URL derived from the submission URL.
    #[serde(default)]
    #[garde(skip)]
    pub runpod_status_url: Option<String>,

    #[serde(default = "default_poll_interval_ms")]
    #[garde(skip)]
    pub infu_poll_interval_ms: u64,

    #[serde(default = "default_max_polls")]
    #[garde(range(min = 1))]
    pub infu_max_polls: u32,

    #[serde(default = "default_request_timeout_secs")]
    #[garde(range(min = 1))]
    pub infu_request_timeout_secs: u64,

    #[serde(default = "default_status_timeout_secs")]
    #[garde(range(min = 1))]
    pub infu_status_timeout_secs: u64,
}

/// Configuration for the single-prompt text-to-image client.
#[derive(Debug, Deserialize, Validate)]
pub struct TextToImageConfig {
    #[garde(length(min = 1))]
    pub huggingface_api_key: String,

    #[garde(length(min = 1))]
    pub huggingface_endpoint: String,

    #[garde(length(min = 1))]
    pub new_person_output_image_path: String,

    #[serde(default = "default_new_person_prompt")]
    #[garde(length(min = 1))]
    pub new_person_prompt: String,

    #[serde(default = "default_hf_timeout_secs")]
    #[garde(range(min = 1))]
    pub hf_request_timeout_secs: u64,
}

/// Configuration for the batch text-to-image client.
#[derive(Debug, Deserialize, Validate)]
pub struct BatchConfig {
    #[garde(length(min = 1))]
    pub huggingface_api_key: String,

    #[garde(length(min = 1))]
    pub huggingface_endpoint: String,

    #[serde(default = "default_sd_output_dir")]
    #[garde(length(min = 1))]
    pub sd_output_dir: String,

    /// File with one prompt per line. The built-in prompt list is used when unset.
    #[serde(default)]
    #[garde(skip)]
    pub sd_prompts_file: Option<String>,

    #[serde(default = "default_hf_timeout_secs")]
    #[garde(range(min = 1))]
    pub hf_request_timeout_secs: u64,
}

fn default_comparisons_csv() -> String {
    "comparisons.csv".to_string()
}

fn default_face_model_path() -> String {
    "model/seeta_fd_frontal_v1.0.bin".to_string()
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_max_polls() -> u32 {
    2000
}

fn default_request_timeout_secs() -> u64 {
    150
}

fn default_status_timeout_secs() -> u64 {
    30
}

fn default_new_person_prompt() -> String {
    "A crowd of people with three happy people and one sad person ".to_string()
}

fn default_hf_timeout_secs() -> u64 {
    120
}

fn default_sd_output_dir() -> String {
    "output_HF_images".to_string()
}

/// Deserialize and validate a configuration struct from key/value pairs.
///
/// Keys are matched case-insensitively against field names, so `RUNPOD_API_KEY`
/// populates `runpod_api_key`. Empty values are rejected as missing.
fn load<T, I>(vars: I) -> Result<T, ConfigError>
where
    T: DeserializeOwned + Validate,
    T::Context: Default,
    I: IntoIterator<Item = (String, String)>,
{
    let config: T = envy::from_iter(vars)?;
    config.validate()?;
    Ok(config)
}

fn load_from_env<T>() -> Result<T, ConfigError>
where
    T: DeserializeOwned + Validate,
    T::Context: Default,
{
    dotenvy::dotenv().ok();
    load(std::env::vars())
}

impl CompareConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        load_from_env()
    }

    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        load(vars)
    }
}

impl InfiniteYouConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        load_from_env()
    }

    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        load(vars)
    }

    /// Base URL for job status lookups; the job id is appended as a path segment.
    pub fn status_url(&self) -> String {
        match &self.runpod_status_url {
            Some(url) if !url.is_empty() => url.trim_end_matches('/').to_string(),
            _ => derive_status_url(&self.runpod_infu_url),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.infu_poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.infu_request_timeout_secs)
    }

    pub fn status_timeout(&self) -> Duration {
        Duration::from_secs(self.infu_status_timeout_secs)
    }
}

impl TextToImageConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        load_from_env()
    }

    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        load(vars)
    }

    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(&self.new_person_output_image_path)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.hf_request_timeout_secs)
    }
}

impl BatchConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        load_from_env()
    }

    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        load(vars)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.hf_request_timeout_secs)
    }
}

/// Status endpoint for a serverless run URL.
///
/// `https://host/v2/<endpoint>/run` polls `https://host/v2/<endpoint>/status`;
/// URLs without a `/v2/` segment are polled as-is.
pub fn derive_status_url(run_url: &str) -> String {
    match run_url.split_once("/v2/") {
        Some((base, rest)) => {
            let endpoint_id = rest.split('/').next().unwrap_or_default();
            format!("{base}/v2/{endpoint_id}/status")
        }
        None => run_url.trim_end_matches('/').to_string(),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<envy::Error> for ConfigError {
    fn from(err: envy::Error) -> Self {
        match err {
            envy::Error::MissingValue(field) => ConfigError::Missing(field.to_uppercase()),
            envy::Error::Custom(message) => ConfigError::Invalid(message),
        }
    }
}

impl From<garde::Report> for ConfigError {
    fn from(report: garde::Report) -> Self {
        match report.iter().next() {
            Some((path, error)) => {
                let name = path.to_string().to_uppercase();
                // `length(min = 1)` guards the required strings; anything else is a bad value.
                if error.message().starts_with("length is lower than") {
                    ConfigError::Missing(name)
                } else {
                    ConfigError::Invalid(format!("{name} {}", error.message()))
                }
            }
            None => ConfigError::Invalid(report.to_string()),
        }
    }
}
