//! Stub remote services for integration tests
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use image::GrayImage;
use serde_json::{json, Value};

use face_id_bench::services::face::{FaceDetector, FaceRegion};

pub const API_KEY: &str = "test-key";

/// Bind an ephemeral port and serve `app` in the background.
async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind stub server");
    let addr = listener.local_addr().expect("Stub server has no address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Stub server error");
    });
    format!("http://{}", addr)
}

fn env(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// ── Serverless job API ──────────────────────────────────────────────

#[derive(Clone)]
struct JobApiState {
    submit_status: Arc<Mutex<(StatusCode, Value)>>,
    statuses: Arc<Mutex<VecDeque<(StatusCode, Value)>>>,
    submits: Arc<AtomicUsize>,
    status_polls: Arc<AtomicUsize>,
    last_request: Arc<Mutex<Option<Value>>>,
    last_auth: Arc<Mutex<Option<String>>>,
    last_job_id: Arc<Mutex<Option<String>>>,
}

/// Scripted stand-in for the serverless job API.
///
/// Status polls are answered from the script in order; once it runs dry the
/// stub keeps answering `IN_QUEUE`.
pub struct JobApiStub {
    pub base_url: String,
    state: JobApiState,
}

impl JobApiStub {
    pub async fn start(submit: Value, statuses: Vec<Value>) -> Self {
        Self::start_with_codes(
            (StatusCode::OK, submit),
            statuses.into_iter().map(|s| (StatusCode::OK, s)).collect(),
        )
        .await
    }

    pub async fn start_with_codes(
        submit: (StatusCode, Value),
        statuses: Vec<(StatusCode, Value)>,
    ) -> Self {
        let state = JobApiState {
            submit_status: Arc::new(Mutex::new(submit)),
            statuses: Arc::new(Mutex::new(statuses.into())),
            submits: Arc::new(AtomicUsize::new(0)),
            status_polls: Arc::new(AtomicUsize::new(0)),
            last_request: Arc::new(Mutex::new(None)),
            last_auth: Arc::new(Mutex::new(None)),
            last_job_id: Arc::new(Mutex::new(None)),
        };

        let app = Router::new()
            .route("/v2/{endpoint}/run", post(submit_job))
            .route("/v2/{endpoint}/status/{job_id}", get(job_status))
            .with_state(state.clone());

        Self {
            base_url: serve(app).await,
            state,
        }
    }

    pub fn run_url(&self) -> String {
        format!("{}/v2/stub-endpoint/run", self.base_url)
    }

    pub fn submits(&self) -> usize {
        self.state.submits.load(Ordering::SeqCst)
    }

    pub fn status_polls(&self) -> usize {
        self.state.status_polls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> usize {
        self.submits() + self.status_polls()
    }

    pub fn last_request(&self) -> Option<Value> {
        self.state.last_request.lock().unwrap().clone()
    }

    pub fn last_auth(&self) -> Option<String> {
        self.state.last_auth.lock().unwrap().clone()
    }

    pub fn last_job_id(&self) -> Option<String> {
        self.state.last_job_id.lock().unwrap().clone()
    }

    /// Environment for the InfiniteYou client pointed at this stub.
    pub fn env(&self, input: &str, output: &str) -> Vec<(String, String)> {
        let run_url = self.run_url();
        env(&[
            ("RUNPOD_INFU_URL", run_url.as_str()),
            ("RUNPOD_API_KEY", API_KEY),
            ("INFINITE_INPUT_FACE_IMAGE_PATH", input),
            ("INFINITE_OUTPUT_IMAGE_PATH", output),
            ("INFINITE_PERSON_PROMPT", "a portrait of a man in a studio"),
            ("INFU_POLL_INTERVAL_MS", "1"),
            ("INFU_MAX_POLLS", "20"),
        ])
    }
}

async fn submit_job(
    State(state): State<JobApiState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.submits.fetch_add(1, Ordering::SeqCst);
    *state.last_request.lock().unwrap() = Some(body);
    *state.last_auth.lock().unwrap() = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let (code, value) = state.submit_status.lock().unwrap().clone();
    (code, Json(value))
}

async fn job_status(
    State(state): State<JobApiState>,
    Path((_endpoint, job_id)): Path<(String, String)>,
) -> (StatusCode, Json<Value>) {
    state.status_polls.fetch_add(1, Ordering::SeqCst);
    *state.last_job_id.lock().unwrap() = Some(job_id);

    let (code, value) = state
        .statuses
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or((StatusCode::OK, json!({"status": "IN_QUEUE"})));
    (code, Json(value))
}

// ── Text-to-image endpoint ──────────────────────────────────────────

#[derive(Clone)]
pub struct StubResponse {
    pub status: StatusCode,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl StubResponse {
    pub fn json(value: Value) -> Self {
        Self {
            status: StatusCode::OK,
            content_type: "application/json",
            body: serde_json::to_vec(&value).unwrap(),
        }
    }

    pub fn raw(content_type: &'static str, body: Vec<u8>) -> Self {
        Self {
            status: StatusCode::OK,
            content_type,
            body,
        }
    }

    pub fn error(status: StatusCode, message: &str) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: message.as_bytes().to_vec(),
        }
    }
}

#[derive(Clone, Default)]
struct InferenceState {
    responses: Arc<Mutex<VecDeque<StubResponse>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    hits: Arc<AtomicUsize>,
}

/// Scripted text-to-image endpoint answering `POST /infer` in order.
pub struct InferenceStub {
    pub base_url: String,
    state: InferenceState,
}

impl InferenceStub {
    pub async fn start(responses: Vec<StubResponse>) -> Self {
        let state = InferenceState {
            responses: Arc::new(Mutex::new(responses.into())),
            ..Default::default()
        };
        let app = Router::new()
            .route("/infer", post(infer))
            .with_state(state.clone());

        Self {
            base_url: serve(app).await,
            state,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/infer", self.base_url)
    }

    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.state.prompts.lock().unwrap().clone()
    }
}

async fn infer(State(state): State<InferenceState>, Json(body): Json<Value>) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    if let Some(prompt) = body.get("inputs").and_then(Value::as_str) {
        state.prompts.lock().unwrap().push(prompt.to_string());
    }

    let response = state
        .responses
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| StubResponse::error(StatusCode::SERVICE_UNAVAILABLE, "script exhausted"));

    Response::builder()
        .status(response.status)
        .header(header::CONTENT_TYPE, response.content_type)
        .body(Body::from(response.body))
        .unwrap()
}

// ── Face detection ──────────────────────────────────────────────────

/// Detector returning the same regions for every image.
pub struct FixedDetector(pub Vec<FaceRegion>);

impl FaceDetector for FixedDetector {
    fn detect(&self, _gray: &GrayImage) -> Vec<FaceRegion> {
        self.0.clone()
    }
}

/// Detector reporting the whole frame as one face, except for uniform images.
pub struct WholeFrameDetector;

impl FaceDetector for WholeFrameDetector {
    fn detect(&self, gray: &GrayImage) -> Vec<FaceRegion> {
        let first = gray.as_raw().first().copied();
        if gray.as_raw().iter().all(|&v| Some(v) == first) {
            return Vec::new();
        }
        let (width, height) = gray.dimensions();
        vec![FaceRegion { x: 0, y: 0, width, height }]
    }
}
