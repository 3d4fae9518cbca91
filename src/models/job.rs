use std::fmt;

use serde::{Deserialize, Serialize};
use strum::EnumString;

/// Fixed output dimensions requested from the generation service.
pub const OUTPUT_WIDTH: u32 = 1024;
pub const OUTPUT_HEIGHT: u32 = 1024;

/// Inclusive seed range drawn for each job.
pub const SEED_RANGE: std::ops::RangeInclusive<u32> = 1..=999_999;

/// Status string reported by the serverless job API.
///
/// The service's set of statuses is open; anything unrecognised is kept
/// verbatim in `Other` and treated as "still running".
#[derive(Debug, Clone, PartialEq, Eq, EnumString, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    InQueue,
    InProgress,
    Completed,
    Failed,
    #[strum(default)]
    Other(String),
}

impl JobStatus {
    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::InQueue => "IN_QUEUE",
            JobStatus::InProgress => "IN_PROGRESS",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
            JobStatus::Other(status) => status,
        }
    }

    /// Whether the submission response describes a job still held by the service.
    pub fn is_pending(&self) -> bool {
        matches!(self, JobStatus::InQueue | JobStatus::InProgress)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for JobStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or(JobStatus::Other(value))
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        status.as_str().to_string()
    }
}

/// Envelope posted to the job submission endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct JobRequest {
    pub id: String,
    pub input: GenerationInput,
}

/// Generation parameters for one identity-preserving image.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationInput {
    /// Identity image as a `data:image/jpeg;base64,` URL.
    pub id_image: String,
    pub prompt: String,
    pub infu_source_img_token: String,
    pub model_version: String,
    pub enable_realism: bool,
    pub enable_anti_blur: bool,
    pub enable_face_realism: bool,
    pub enable_realism_one: bool,
    pub enable_realism_two: bool,
    pub realism_weight: f64,
    pub anti_blur_weight: f64,
    pub face_realism_weight: f64,
    pub realism_one_weight: f64,
    pub realism_two_weight: f64,
    pub flux_model: String,
    pub seed: u32,
    pub guidance_scale: u32,
    pub num_steps: u32,
    pub width: u32,
    pub height: u32,
}

impl JobRequest {
    /// Build the fixed-shape request used for every generation.
    pub fn new(id_image: String, prompt: String, seed: u32) -> Self {
        Self {
            id: "test-job".to_string(),
            input: GenerationInput {
                id_image,
                prompt,
                infu_source_img_token: "man".to_string(),
                model_version: "aes_stage2".to_string(),
                enable_realism: true,
                enable_anti_blur: true,
                enable_face_realism: true,
                enable_realism_one: false,
                enable_realism_two: false,
                realism_weight: 1.0,
                anti_blur_weight: 1.0,
                face_realism_weight: 1.0,
                realism_one_weight: 1.0,
                realism_two_weight: 1.0,
                flux_model: "flux-schnell".to_string(),
                seed,
                guidance_scale: 5,
                num_steps: 5,
                width: OUTPUT_WIDTH,
                height: OUTPUT_HEIGHT,
            },
        }
    }
}

/// Body returned by both the submission and the status endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<JobStatus>,
    #[serde(default)]
    pub output: Option<JobOutput>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Worker output attached to a finished job.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobOutput {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub metadata: Option<JobMetadata>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct JobMetadata {
    #[serde(default)]
    pub seed: Option<serde_json::Value>,
    #[serde(default)]
    pub model_version: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub width: Option<serde_json::Value>,
    #[serde(default)]
    pub height: Option<serde_json::Value>,
}
