use std::path::PathBuf;
use std::time::{Duration, Instant};

use rand::Rng;
use reqwest::Client;

use crate::config::InfiniteYouConfig;
use crate::models::job::{JobMetadata, JobOutput, JobRequest, JobResponse, SEED_RANGE};
use crate::services::http::{self, RemoteError};
use crate::services::image_data::{self, DecodeError};
use crate::services::polling::{FailureHint, JobPoller, PollPhase, PollPolicy, TIMEOUT_HINTS};

/// Client for the InfiniteYou identity-preserving generation endpoint.
pub struct InfiniteYouClient {
    http: Client,
    run_url: String,
    status_url: String,
    api_key: String,
    input_path: PathBuf,
    output_path: PathBuf,
    prompt: String,
    policy: PollPolicy,
    request_timeout: Duration,
    status_timeout: Duration,
}

/// How a generation run ended, short of a hard error.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    Saved {
        path: PathBuf,
        metadata: Option<JobMetadata>,
    },
    /// Job succeeded but carried no image.
    MissingImage,
    /// Job completed without an `output` object.
    MissingOutput,
    /// Poll budget ran out before a terminal status.
    TimedOut,
}

#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub job_id: Option<String>,
    pub seed: u32,
    pub polls: u32,
    pub pending_polls: u32,
    pub generation_time: Option<Duration>,
    pub outcome: GenerationOutcome,
}

impl InfiniteYouClient {
    pub fn new(config: &InfiniteYouConfig) -> Result<Self, RemoteError> {
        Ok(Self {
            http: http::client()?,
            run_url: config.runpod_infu_url.clone(),
            status_url: config.status_url(),
            api_key: config.runpod_api_key.clone(),
            input_path: PathBuf::from(&config.infinite_input_face_image_path),
            output_path: PathBuf::from(&config.infinite_output_image_path),
            prompt: config.infinite_person_prompt.clone(),
            policy: PollPolicy {
                interval: config.poll_interval(),
                max_polls: config.infu_max_polls,
            },
            request_timeout: config.request_timeout(),
            status_timeout: config.status_timeout(),
        })
    }

    /// Submit one generation job with a random seed and wait for its image.
    pub async fn generate(&self) -> Result<GenerationReport, RemoteError> {
        let seed = rand::thread_rng().gen_range(SEED_RANGE);
        self.generate_with_seed(seed).await
    }

    pub async fn generate_with_seed(&self, seed: u32) -> Result<GenerationReport, RemoteError> {
        if !self.input_path.exists() {
            return Err(RemoteError::InputNotFound(self.input_path.clone()));
        }

        tracing::info!(path = %self.input_path.display(), "Converting identity image to base64");
        let image_bytes = tokio::fs::read(&self.input_path).await?;
        let request = JobRequest::new(image_data::encode_data_url(&image_bytes), self.prompt.clone(), seed);

        tracing::info!(url = %self.run_url, prompt = %self.prompt, seed, "Sending generation request");
        let start = Instant::now();
        let response = self
            .http
            .post(&self.run_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .timeout(self.request_timeout)
            .send()
            .await?;
        tracing::info!(
            elapsed_secs = start.elapsed().as_secs_f64(),
            "Request completed"
        );

        let body: serde_json::Value = http::ensure_success(response).await?.json().await?;
        let submitted: JobResponse = serde_json::from_value(body.clone())
            .map_err(|_| DecodeError::UnexpectedShape(body.to_string()))?;

        let mut report = GenerationReport {
            job_id: submitted.id.clone(),
            seed,
            polls: 0,
            pending_polls: 0,
            generation_time: None,
            outcome: GenerationOutcome::MissingOutput,
        };

        match submitted.status {
            Some(ref status) if status.is_pending() => {
                let job_id = submitted
                    .id
                    .ok_or_else(|| DecodeError::UnexpectedShape(body.to_string()))?;
                tracing::info!(job_id = %job_id, status = %status, "Job accepted, polling for completion");
                self.poll_until_done(&job_id, &mut report).await?;
            }
            _ if submitted.output.is_some() => {
                report.outcome = self.finish(submitted.output)?;
            }
            _ => return Err(DecodeError::UnexpectedShape(body.to_string()).into()),
        }

        Ok(report)
    }

    async fn poll_until_done(
        &self,
        job_id: &str,
        report: &mut GenerationReport,
    ) -> Result<(), RemoteError> {
        let mut poller = JobPoller::new(self.policy.clone());
        let url = format!("{}/{}", self.status_url, job_id);

        while poller.begin_poll() {
            tokio::time::sleep(poller.policy().interval).await;

            let response = self
                .http
                .get(&url)
                .bearer_auth(&self.api_key)
                .timeout(self.status_timeout)
                .send()
                .await?;
            let body = match http::ensure_success(response).await {
                Ok(response) => response.bytes().await?,
                Err(e) => {
                    tracing::error!(job_id, error = %e, "Failed to check job status");
                    return Err(e);
                }
            };
            let status: JobResponse = serde_json::from_slice(&body).map_err(|_| {
                DecodeError::UnexpectedShape(String::from_utf8_lossy(&body).chars().take(200).collect())
            })?;

            let now = Instant::now();
            let was_generating = poller.generation_time(now).is_some();
            let phase = poller.observe(status.status.as_ref(), now);
            report.polls = poller.polls();
            report.pending_polls = poller.pending_polls();
            report.generation_time = poller.generation_time(now);

            match phase {
                PollPhase::Completed => {
                    match report.generation_time {
                        Some(t) => tracing::info!(
                            job_id,
                            generation_secs = t.as_secs_f64(),
                            "Job completed"
                        ),
                        None => tracing::info!(
                            job_id,
                            elapsed_secs = poller.elapsed().as_secs_f64(),
                            "Job completed, including queue time"
                        ),
                    }
                    report.outcome = self.finish(status.output)?;
                    return Ok(());
                }
                PollPhase::Failed => {
                    let message = status
                        .error
                        .or_else(|| status.output.and_then(|o| o.error))
                        .unwrap_or_else(|| "Unknown error".to_string());
                    return Err(job_failed(message, report.generation_time));
                }
                pending => {
                    let current = status
                        .status
                        .as_ref()
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "UNKNOWN".to_string());
                    match report.generation_time {
                        Some(_) if !was_generating => {
                            tracing::info!(job_id, "Generation started, tracking time");
                        }
                        Some(t) => tracing::info!(
                            job_id,
                            status = %current,
                            phase = %pending,
                            generation_secs = t.as_secs_f64(),
                            "Job running"
                        ),
                        None => tracing::info!(
                            job_id,
                            status = %current,
                            phase = %pending,
                            elapsed_secs = poller.elapsed().as_secs_f64(),
                            "Job waiting"
                        ),
                    }
                }
            }
        }

        match report.generation_time {
            Some(t) => tracing::error!(
                job_id,
                generation_secs = t.as_secs_f64(),
                "Job timed out during generation"
            ),
            None => tracing::error!(
                job_id,
                elapsed_secs = poller.elapsed().as_secs_f64(),
                "Job timed out"
            ),
        }
        for hint in TIMEOUT_HINTS {
            tracing::warn!("Possible issue: {}", hint);
        }
        report.outcome = GenerationOutcome::TimedOut;
        Ok(())
    }

    /// Handle the `output` object of a completed job.
    fn finish(&self, output: Option<JobOutput>) -> Result<GenerationOutcome, RemoteError> {
        let Some(output) = output else {
            tracing::error!("No output in completed job");
            return Ok(GenerationOutcome::MissingOutput);
        };

        if !output.success {
            let message = output.error.unwrap_or_else(|| "Unknown error".to_string());
            return Err(job_failed(message, None));
        }

        let Some(encoded) = output.image else {
            tracing::error!("No image in response");
            return Ok(GenerationOutcome::MissingImage);
        };

        let bytes = image_data::decode_base64(&encoded)?;
        image_data::save_decoded_image(&bytes, &self.output_path)?;

        if let Some(ref metadata) = output.metadata {
            log_metadata(metadata);
        }

        Ok(GenerationOutcome::Saved {
            path: self.output_path.clone(),
            metadata: output.metadata,
        })
    }
}

fn job_failed(message: String, generation_time: Option<Duration>) -> RemoteError {
    let hint = FailureHint::from_message(&message);
    match generation_time {
        Some(t) => tracing::error!(
            error = %message,
            generation_secs = t.as_secs_f64(),
            "Job failed during generation"
        ),
        None => tracing::error!(error = %message, "Job failed"),
    }
    if let Some(hint) = hint {
        tracing::warn!("Solution: {}", hint.remedy());
    }
    RemoteError::JobFailed { message, hint }
}

fn log_metadata(metadata: &JobMetadata) {
    fn or_na(value: &Option<serde_json::Value>) -> String {
        match value {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(v) => v.to_string(),
            None => "N/A".to_string(),
        }
    }

    tracing::info!(
        seed = %or_na(&metadata.seed),
        model = metadata.model_version.as_deref().unwrap_or("N/A"),
        prompt = metadata.prompt.as_deref().unwrap_or("N/A"),
        dimensions = %format!("{}x{}", or_na(&metadata.width), or_na(&metadata.height)),
        "Generation metadata"
    );
}
