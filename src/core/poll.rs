// src/core/poll.rs

//! Bounded polling of asynchronous remote jobs.
//!
//! Remote graders take tens of seconds to finish. A job moves through
//! `Submitted -> Polling -> {Finished, Failed, TimedOut}`: each poll waits one
//! interval, fetches the job status, and either settles or stays in `Polling`.
//! Errors while fetching the status count as transient. After
//! `max_attempts` fetches the job is reported as a `Timeout`.

use crate::core::error::ScanError;
use crate::core::models::ProviderResult;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Upper bound on a single wait, whatever the multiplier.
const MAX_POLL_DELAY: Duration = Duration::from_secs(60);

/// Source of delays between status fetches. Injected so tests can run poll
/// loops without waiting.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_attempts: u32,
    /// 1.0 keeps the interval fixed.
    pub backoff_multiplier: f64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 10,
            backoff_multiplier: 1.0,
        }
    }
}

impl PollConfig {
    /// The wait before status fetch number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let millis = self.interval.as_millis() as f64 * self.backoff_multiplier.max(1.0).powi(exponent);
        Duration::from_millis(millis as u64).min(MAX_POLL_DELAY)
    }
}

/// What the provider said when the job was submitted.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission<T> {
    /// The provider already had a finished result (e.g. from its own cache).
    Immediate(T),
    /// The provider queued a job that must be polled.
    Job(String),
}

/// The status of a remote job as reported by one status fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus<T> {
    /// Queued or running; carries the provider's status word for logging.
    Pending(String),
    Finished(T),
    Failed(String),
}

#[derive(Debug)]
enum PollState<T> {
    Polling { attempt: u32 },
    Finished(T),
    Failed(String),
    TimedOut { attempts: u32 },
}

/// Polls `check` until the job settles or `config.max_attempts` fetches have
/// been made.
pub async fn poll_until_complete<T, F, Fut>(
    provider: &str,
    config: &PollConfig,
    sleeper: &dyn Sleeper,
    mut check: F,
) -> ProviderResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProviderResult<JobStatus<T>>>,
{
    let mut state = PollState::Polling { attempt: 0 };

    loop {
        state = match state {
            PollState::Polling { attempt } if attempt >= config.max_attempts => {
                PollState::TimedOut { attempts: attempt }
            }
            PollState::Polling { attempt } => {
                let attempt = attempt + 1;
                sleeper.sleep(config.delay_for(attempt)).await;
                match check().await {
                    Ok(JobStatus::Finished(value)) => PollState::Finished(value),
                    Ok(JobStatus::Failed(reason)) => PollState::Failed(reason),
                    Ok(JobStatus::Pending(status)) => {
                        debug!(provider, attempt, status = %status, "Job still pending.");
                        PollState::Polling { attempt }
                    }
                    Err(e) => {
                        warn!(provider, attempt, error = %e, "Status fetch failed, retrying.");
                        PollState::Polling { attempt }
                    }
                }
            }
            PollState::Finished(value) => {
                info!(provider, "Remote job finished.");
                return Ok(value);
            }
            PollState::Failed(reason) => {
                warn!(provider, reason = %reason, "Remote job failed.");
                return Err(ScanError::provider_failed(provider, reason));
            }
            PollState::TimedOut { attempts } => {
                warn!(provider, attempts, "Remote job did not finish in time.");
                return Err(ScanError::timeout(
                    provider,
                    format!("job still running after {attempts} status checks"),
                ));
            }
        };
    }
}

/// Resolves a submission: immediate results are returned as-is, queued jobs
/// are polled.
pub async fn resolve_submission<T, F, Fut>(
    provider: &str,
    config: &PollConfig,
    sleeper: &dyn Sleeper,
    submission: Submission<T>,
    check: F,
) -> ProviderResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProviderResult<JobStatus<T>>>,
{
    match submission {
        Submission::Immediate(value) => {
            debug!(provider, "Provider returned an immediate result.");
            Ok(value)
        }
        Submission::Job(job_id) => {
            debug!(provider, job_id = %job_id, "Polling submitted job.");
            poll_until_complete(provider, config, sleeper, check).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ScanErrorKind;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct RecordingSleeper {
        waits: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.waits.lock().unwrap().push(duration);
        }
    }

    fn config(max_attempts: u32) -> PollConfig {
        PollConfig {
            interval: Duration::from_secs(5),
            max_attempts,
            backoff_multiplier: 1.0,
        }
    }

    #[tokio::test]
    async fn times_out_after_exactly_max_attempts() {
        let sleeper = RecordingSleeper::default();
        let calls = AtomicU32::new(0);

        let result: ProviderResult<()> = poll_until_complete("test", &config(4), &sleeper, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(JobStatus::Pending("running".to_string())) }
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.kind, ScanErrorKind::Timeout);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(sleeper.waits.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn status_errors_are_retried() {
        let sleeper = RecordingSleeper::default();
        let calls = AtomicU32::new(0);

        let result = poll_until_complete("test", &config(5), &sleeper, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                match n {
                    0 => Err(ScanError::network("test", "connection reset")),
                    1 => Ok(JobStatus::Pending("queued".to_string())),
                    _ => Ok(JobStatus::Finished(42)),
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn failed_job_is_terminal() {
        let sleeper = RecordingSleeper::default();
        let calls = AtomicU32::new(0);

        let result: ProviderResult<u8> = poll_until_complete("test", &config(10), &sleeper, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(JobStatus::Failed("scan aborted".to_string())) }
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.kind, ScanErrorKind::ProviderFailed);
        assert_eq!(err.message, "scan aborted");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn immediate_submission_skips_polling() {
        let sleeper = RecordingSleeper::default();
        let result = resolve_submission("test", &config(3), &sleeper, Submission::Immediate("A+"), || async {
            Ok(JobStatus::Pending("never".to_string()))
        })
        .await;

        assert_eq!(result.unwrap(), "A+");
        assert!(sleeper.waits.lock().unwrap().is_empty());
    }

    #[test]
    fn backoff_grows_and_is_capped() {
        let config = PollConfig {
            interval: Duration::from_secs(10),
            max_attempts: 10,
            backoff_multiplier: 2.0,
        };
        assert_eq!(config.delay_for(1), Duration::from_secs(10));
        assert_eq!(config.delay_for(2), Duration::from_secs(20));
        assert_eq!(config.delay_for(5), MAX_POLL_DELAY);
        assert_eq!(PollConfig::default().delay_for(7), Duration::from_secs(5));
    }
}
