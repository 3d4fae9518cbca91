use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Local;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;

use crate::models::inference::{InferencePayload, InferenceRequest};
use crate::services::http::{self, RemoteError};
use crate::services::image_data;

/// Prompts used by the batch tool when no prompts file is configured.
pub const DEFAULT_BATCH_PROMPTS: [&str; 10] = [
    "A street sign that says 'STOP' in bold letters",
    "A billboard displaying 'Welcome to the City' with text",
    "A book cover with title 'Machine Learning' written on it",
    "A blackboard with '2 + 2 = 4' written in chalk",
    "A menu board showing 'Coffee $3.50' in large text",
    "A license plate with 'ABC123' on it",
    "A neon sign glowing 'OPEN' in red letters",
    "A newspaper headline 'BREAKING NEWS' in bold",
    "A price tag showing '$99.99' clearly visible",
    "A street name sign 'MAIN STREET' on a pole",
];

/// Client for a synchronous text-to-image inference endpoint.
pub struct TextToImageClient {
    http: Client,
    endpoint: String,
    api_key: String,
    timeout: Duration,
}

impl TextToImageClient {
    pub fn new(endpoint: &str, api_key: &str, timeout: Duration) -> Result<Self, RemoteError> {
        Ok(Self {
            http: http::client()?,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            timeout,
        })
    }

    /// Generate one image and return its encoded bytes.
    pub async fn generate(&self, prompt: &str) -> Result<Vec<u8>, RemoteError> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&InferenceRequest { inputs: prompt })
            .timeout(self.timeout)
            .send()
            .await?;
        let response = http::ensure_success(response).await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?;

        let payload = InferencePayload::from_body(content_type.as_deref(), body.to_vec())?;
        Ok(payload.into_bytes()?)
    }
}

/// Where batch output files go.
#[derive(Debug, Clone)]
pub enum OutputTarget {
    /// Every image is written to this path; later prompts overwrite earlier ones.
    File(PathBuf),
    /// `{dir}/{%Y%m%d_%H%M%S}_{index}.png`, with a 1-based index.
    Timestamped(PathBuf),
}

impl OutputTarget {
    pub fn path_for(&self, index: usize) -> PathBuf {
        match self {
            OutputTarget::File(path) => path.clone(),
            OutputTarget::Timestamped(dir) => {
                let timestamp = Local::now().format("%Y%m%d_%H%M%S");
                dir.join(format!("{timestamp}_{index}.png"))
            }
        }
    }

    /// Location reported once the batch finishes.
    pub fn location(&self) -> &Path {
        match self {
            OutputTarget::File(path) | OutputTarget::Timestamped(path) => path,
        }
    }
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub saved: Vec<PathBuf>,
    /// 1-based prompt index and the error message.
    pub failures: Vec<(usize, String)>,
}

/// Generate an image for every prompt. A failing prompt is logged and
/// recorded; the rest of the batch still runs.
pub async fn run_batch(
    client: &TextToImageClient,
    prompts: &[String],
    target: &OutputTarget,
) -> BatchSummary {
    let total = prompts.len();
    let mut summary = BatchSummary::default();
    tracing::info!(count = total, "Generating images");

    for (i, prompt) in prompts.iter().enumerate() {
        let index = i + 1;
        tracing::info!("[{}/{}] {}", index, total, prompt);

        let result = match client.generate(prompt).await {
            Ok(bytes) => {
                let path = target.path_for(index);
                image_data::write_bytes(&bytes, &path)
                    .map(|()| path)
                    .map_err(RemoteError::Io)
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(path) => {
                tracing::info!(path = %path.display(), "Saved");
                summary.saved.push(path);
            }
            Err(e) => {
                tracing::error!(index, error = %e, "Image generation failed");
                summary.failures.push((index, e.to_string()));
            }
        }
    }

    summary
}

/// Read prompts from a file, one per non-blank line.
pub fn load_prompts(path: &Path) -> Result<Vec<String>, std::io::Error> {
    let contents = std::fs::read_to_string(path)?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
