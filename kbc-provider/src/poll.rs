//! Waiting for asynchronous Storage jobs.

use std::time::Duration;

use kbc_client::models::StorageJob;
use kbc_client::StorageApi;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{ResourceError, Result};

/// How often and for how long to poll a Storage job before giving up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobPollPolicy {
    pub interval: Duration,
    /// Maximum number of status requests. `None` means unlimited.
    pub max_attempts: Option<u32>,
    /// Upper bound on the whole wait, status requests included. `None` means unlimited.
    pub timeout: Option<Duration>,
}

impl Default for JobPollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(250),
            max_attempts: None,
            timeout: Some(Duration::from_secs(60 * 60)),
        }
    }
}

impl JobPollPolicy {
    /// Polls every `interval` with no attempt or time limit.
    pub fn unbounded(interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: None,
            timeout: None,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Polls `storage/jobs/{job_id}` until the job reports `success` or `error` and returns the last
/// status. Callers decide what a failed job means.
pub async fn wait_for_job<C: StorageApi>(
    client: &C,
    job_id: &str,
    policy: &JobPollPolicy,
    cancel: &CancellationToken,
) -> Result<StorageJob> {
    let started = Instant::now();
    let deadline = policy.timeout.map(|timeout| started + timeout);
    let timed_out = || ResourceError::PollTimedOut {
        job_id: job_id.to_string(),
        elapsed: started.elapsed(),
    };
    let mut attempts = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(ResourceError::Cancelled(job_id.to_string()));
        }

        let job = match deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, client.get_job(job_id))
                .await
                .map_err(|_| timed_out())??,
            None => client.get_job(job_id).await?,
        };
        attempts += 1;
        debug!(
            job_id,
            status = %job.status,
            created_at = ?job.created_at(),
            attempts,
            "polled storage job"
        );

        if job.status.is_terminal() {
            return Ok(job);
        }
        if policy.max_attempts.is_some_and(|max| attempts >= max) {
            return Err(ResourceError::PollAttemptsExhausted {
                job_id: job_id.to_string(),
                attempts,
            });
        }
        if deadline.is_some_and(|deadline| Instant::now() + policy.interval > deadline) {
            return Err(timed_out());
        }

        tokio::select! {
            _ = cancel.cancelled() => {
                return Err(ResourceError::Cancelled(job_id.to_string()));
            }
            _ = tokio::time::sleep(policy.interval) => {}
        }
    }
}
