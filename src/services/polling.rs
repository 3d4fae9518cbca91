//! Bounded polling state machine for asynchronous generation jobs.
//!
//! The poller holds no I/O: callers ask for a poll slot with
//! [`JobPoller::begin_poll`], fetch the status themselves, and feed it to
//! [`JobPoller::observe`]. Sleeping between polls is the caller's concern.

use std::fmt;
use std::time::{Duration, Instant};

use strum::Display;

use crate::models::job::JobStatus;

/// Possible causes listed when a job runs out of polls.
pub const TIMEOUT_HINTS: [&str; 4] = [
    "Models still downloading (check RunPod logs)",
    "Insufficient storage (increase to 300GB+)",
    "Missing model access (request FLUX.1-dev access)",
    "Complex generation taking longer than expected",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum PollPhase {
    Queued,
    InProgress,
    Completed,
    Failed,
    TimedOut,
}

impl PollPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, PollPhase::Completed | PollPhase::Failed | PollPhase::TimedOut)
    }
}

/// Fixed-interval polling budget.
#[derive(Debug, Clone)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_polls: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            max_polls: 2000,
        }
    }
}

#[derive(Debug)]
pub struct JobPoller {
    policy: PollPolicy,
    phase: PollPhase,
    polls: u32,
    pending_polls: u32,
    generation_started: Option<Instant>,
}

impl JobPoller {
    pub fn new(policy: PollPolicy) -> Self {
        Self {
            policy,
            phase: PollPhase::Queued,
            polls: 0,
            pending_polls: 0,
            generation_started: None,
        }
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    pub fn phase(&self) -> PollPhase {
        self.phase
    }

    /// Status requests issued so far.
    pub fn polls(&self) -> u32 {
        self.polls
    }

    /// Polls that returned a non-terminal status.
    pub fn pending_polls(&self) -> u32 {
        self.pending_polls
    }

    /// Claim the next poll. Returns `false` once the job is terminal or the
    /// budget is spent; the latter moves the poller to `TimedOut`.
    pub fn begin_poll(&mut self) -> bool {
        if self.phase.is_terminal() {
            return false;
        }
        if self.polls >= self.policy.max_polls {
            self.phase = PollPhase::TimedOut;
            return false;
        }
        self.polls += 1;
        true
    }

    /// Apply one status observation.
    ///
    /// The first `IN_PROGRESS` starts the generation timer. Unknown or absent
    /// statuses leave the phase unchanged.
    pub fn observe(&mut self, status: Option<&JobStatus>, now: Instant) -> PollPhase {
        if self.phase.is_terminal() {
            return self.phase;
        }

        self.phase = match status {
            Some(JobStatus::Completed) => PollPhase::Completed,
            Some(JobStatus::Failed) => PollPhase::Failed,
            Some(JobStatus::InProgress) => {
                if self.generation_started.is_none() {
                    self.generation_started = Some(now);
                }
                PollPhase::InProgress
            }
            Some(JobStatus::InQueue) => PollPhase::Queued,
            Some(JobStatus::Other(_)) | None => self.phase,
        };

        if !self.phase.is_terminal() {
            self.pending_polls += 1;
        }
        self.phase
    }

    /// Time spent waiting, estimated from the poll count.
    pub fn elapsed(&self) -> Duration {
        self.policy.interval * self.polls
    }

    /// Time since the job was first seen `IN_PROGRESS`.
    pub fn generation_time(&self, now: Instant) -> Option<Duration> {
        self.generation_started
            .map(|started| now.saturating_duration_since(started))
    }
}

/// Known failure causes with a remediation the operator can act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureHint {
    StorageExhausted,
    ModelMissing,
    AccessDenied,
}

impl FailureHint {
    pub fn from_message(message: &str) -> Option<Self> {
        if message.contains("No space left on device") {
            Some(FailureHint::StorageExhausted)
        } else if message.contains("Model not found") {
            Some(FailureHint::ModelMissing)
        } else if message.contains("403") || message.to_lowercase().contains("access") {
            Some(FailureHint::AccessDenied)
        } else {
            None
        }
    }

    pub fn remedy(&self) -> &'static str {
        match self {
            FailureHint::StorageExhausted => "Increase RunPod storage to 300GB+",
            FailureHint::ModelMissing => "Ensure models are downloaded during startup",
            FailureHint::AccessDenied => "Request access to FLUX.1-dev model on HuggingFace",
        }
    }
}

impl fmt::Display for FailureHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.remedy())
    }
}
