//! Async (poll-until-complete) requests.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::{debug, warn};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::connection::Requester;
use crate::error::{Error, Result};
use crate::request::Request;
use crate::response::Response;

/// Default delay between polls.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Default poll attempt cap.
const DEFAULT_MAX_ATTEMPTS: u32 = 120;
/// Default overall polling budget.
const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(600);

/// Bounds on a polling loop. Both limits always apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay between consecutive polls.
    pub interval: Duration,
    /// Maximum number of poll requests.
    pub max_attempts: u32,
    /// Maximum time spent polling.
    pub timeout: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            timeout: DEFAULT_POLL_TIMEOUT,
        }
    }
}

impl PollPolicy {
    /// Set the poll interval.
    #[must_use]
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the attempt cap.
    #[must_use]
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set the overall time budget.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// A job handle built from an initial response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsyncJob {
    /// Provider job identifier.
    pub job_id: String,
    /// Path polled for status.
    pub poll_path: String,
    /// Query parameters sent with each poll.
    pub poll_params: Vec<(String, String)>,
}

impl AsyncJob {
    fn poll_request(&self) -> Request {
        self.poll_params
            .iter()
            .fold(Request::get(self.poll_path.clone()), |req, (k, v)| {
                req.param(k.clone(), v.clone())
            })
    }
}

/// Provider hooks for the polling loop.
pub trait JobPoller: Send + Sync {
    /// Build the job handle from the initial response.
    fn job_from_response(&self, response: &Response) -> Result<AsyncJob>;

    /// Whether the poll response is terminal.
    ///
    /// Returns `Err` for a terminal failure.
    fn has_completed(&self, job: &AsyncJob, response: &Response) -> Result<bool>;
}

/// `jobId` in the initial body, `GET /status/<id>?showDetails=true`, and a
/// top-level `status` of `COMPLETED` or `ERROR`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusEndpointPoller;

impl JobPoller for StatusEndpointPoller {
    fn job_from_response(&self, response: &Response) -> Result<AsyncJob> {
        let body: Value = response.json()?;
        let job_id = match body.get("jobId") {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            _ => {
                return Err(Error::MalformedResponse(
                    "Async response has no jobId".to_string(),
                ));
            }
        };
        Ok(AsyncJob {
            poll_path: format!("/status/{}", urlencoding::encode(&job_id)),
            poll_params: vec![("showDetails".to_string(), "true".to_string())],
            job_id,
        })
    }

    fn has_completed(&self, job: &AsyncJob, response: &Response) -> Result<bool> {
        let body: Value = response.json()?;
        match body.get("status").and_then(Value::as_str) {
            Some("ERROR") => {
                let message = body
                    .pointer("/error/message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error")
                    .to_string();
                Err(Error::AsyncJobFailed {
                    job_id: job.job_id.clone(),
                    message,
                })
            }
            Some("COMPLETED") => Ok(true),
            Some(_) => Ok(false),
            None => Err(Error::MalformedResponse(format!(
                "Status of job {} has no status field",
                job.job_id
            ))),
        }
    }
}

/// Wraps a [`Requester`] with poll-until-complete semantics.
///
/// Polls are issued strictly one after another through the wrapped requester,
/// so they share its authentication state.
pub struct AsyncConnection<R> {
    inner: R,
    poller: Box<dyn JobPoller>,
    policy: PollPolicy,
}

impl<R: std::fmt::Debug> std::fmt::Debug for AsyncConnection<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncConnection")
            .field("inner", &self.inner)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl<R: Requester> AsyncConnection<R> {
    /// Default poller and policy.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            poller: Box::new(StatusEndpointPoller),
            policy: PollPolicy::default(),
        }
    }

    /// Replace the poll hooks.
    #[must_use]
    pub fn with_poller(mut self, poller: impl JobPoller + 'static) -> Self {
        self.poller = Box::new(poller);
        self
    }

    /// Replace the polling bounds.
    #[must_use]
    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Polling bounds in effect.
    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// The wrapped requester.
    pub fn inner(&self) -> &R {
        &self.inner
    }

    /// Issue `request` and poll its job to completion.
    ///
    /// A non-2xx initial or poll response is returned as-is for the caller to
    /// classify.
    pub async fn async_request(&self, request: Request) -> Result<Response> {
        self.async_request_until(request, None).await
    }

    /// [`async_request`](Self::async_request) that stops with
    /// [`Error::Cancelled`] once `cancel` fires.
    pub async fn async_request_until(
        &self,
        request: Request,
        cancel: Option<&CancellationToken>,
    ) -> Result<Response> {
        let initial = self.inner.request(request).await?;
        if !initial.is_success() {
            return Ok(initial);
        }

        let job = self.poller.job_from_response(&initial)?;
        debug!("[async] Polling job {} at {}", job.job_id, job.poll_path);

        let started = Instant::now();
        let mut attempts: u32 = 0;
        loop {
            if cancel.is_some_and(CancellationToken::is_cancelled) {
                return Err(Error::Cancelled { job_id: job.job_id });
            }

            attempts += 1;
            let poll = self.inner.request(job.poll_request());
            let response = match cancel {
                Some(token) => {
                    tokio::select! {
                        () = token.cancelled() => {
                            return Err(Error::Cancelled { job_id: job.job_id });
                        }
                        result = poll => result?,
                    }
                }
                None => poll.await?,
            };
            if !response.is_success() {
                warn!(
                    "[async] Poll {attempts} of job {} returned HTTP {}",
                    job.job_id,
                    response.status()
                );
                return Ok(response);
            }
            if self.poller.has_completed(&job, &response)? {
                debug!("[async] Job {} completed after {attempts} poll(s)", job.job_id);
                return Ok(response);
            }

            let elapsed = started.elapsed();
            if attempts >= self.policy.max_attempts
                || elapsed + self.policy.interval > self.policy.timeout
            {
                warn!("[async] Giving up on job {} after {attempts} poll(s)", job.job_id);
                return Err(Error::PollTimeout {
                    job_id: job.job_id,
                    attempts,
                    elapsed,
                });
            }

            match cancel {
                Some(token) => {
                    tokio::select! {
                        () = token.cancelled() => {
                            return Err(Error::Cancelled { job_id: job.job_id });
                        }
                        () = tokio::time::sleep(self.policy.interval) => {}
                    }
                }
                None => tokio::time::sleep(self.policy.interval).await,
            }
        }
    }
}

#[async_trait]
impl<R: Requester> Requester for AsyncConnection<R> {
    async fn request(&self, request: Request) -> Result<Response> {
        self.inner.request(request).await
    }
}
