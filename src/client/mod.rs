#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// HTTP transport for `generateContent`-style multimodal endpoints
pub mod gemini;

use std::time::Duration;

use tokio::sync::OnceCell;

use crate::{
    error::{GraderError, TransportError},
    types::Submission,
};

/// One evaluation call: a prompt plus up to two inline attachments.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationRequest<'a> {
    /// Instructions for the evaluation service
    pub prompt:     &'a str,
    /// The student's answer file
    pub submission: &'a Submission,
    /// Optional answer key to compare against
    pub reference:  Option<&'a Submission>,
}

/// The black-box evaluation operation: send a prompt and files, get text back.
pub trait Transport: Send + Sync {
    /// Performs a single evaluation call with no retries.
    fn evaluate(
        &self,
        request: EvaluationRequest<'_>,
    ) -> impl Future<Output = Result<String, TransportError>> + Send;
}

/// Bounded exponential backoff for rate-limited calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt
    pub max_retries:   u32,
    /// Delay before the first retry; doubles for each following one
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries:   3,
            initial_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Delay to wait before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.initial_delay
            .saturating_mul(2u32.saturating_pow(retry.saturating_sub(1)))
    }
}

/// Builds the transport the first time it is needed.
type Connector<T> = Box<dyn Fn() -> Result<T, GraderError> + Send + Sync>;

/// Evaluation client that owns a lazily built transport and retries
/// rate-limited calls.
pub struct GradingClient<T> {
    /// Transport, built on first use and reused afterwards
    transport: OnceCell<T>,
    /// Builds the transport; fails when configuration is missing
    connect:   Connector<T>,
    /// Backoff policy for rate-limit failures
    policy:    RetryPolicy,
}

impl<T: Transport> GradingClient<T> {
    /// Creates a client whose transport is built by `connect` on first use.
    pub fn new<F>(connect: F) -> Self
    where
        F: Fn() -> Result<T, GraderError> + Send + Sync + 'static,
    {
        Self {
            transport: OnceCell::new(),
            connect:   Box::new(connect),
            policy:    RetryPolicy::default(),
        }
    }

    /// Creates a client around a transport that is already built.
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport: OnceCell::new_with(Some(transport)),
            connect:   Box::new(|| {
                Err(GraderError::Configuration(
                    "transport was provided up front and cannot be rebuilt".to_string(),
                ))
            }),
            policy:    RetryPolicy::default(),
        }
    }

    /// Replaces the retry policy.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns the retry policy in use.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Builds the transport if it does not exist yet and returns it.
    ///
    /// Concurrent first calls wait on the same initialization, so the
    /// transport is only ever built once.
    pub async fn connect(&self) -> Result<&T, GraderError> {
        self.transport
            .get_or_try_init(|| async {
                tracing::debug!("Building evaluation transport");
                (self.connect)()
            })
            .await
    }

    /// Evaluates a submission, retrying rate-limited calls with exponential
    /// backoff.
    ///
    /// Any other transport failure is returned on the first occurrence. When
    /// every retry is rate limited, the result is
    /// [`TransportError::RetriesExhausted`].
    pub async fn evaluate(
        &self,
        submission: &Submission,
        prompt: &str,
        reference: Option<&Submission>,
    ) -> Result<String, GraderError> {
        let transport = self.connect().await?;
        let request = EvaluationRequest {
            prompt,
            submission,
            reference,
        };

        let mut retries = 0;
        loop {
            match transport.evaluate(request).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_rate_limit() && retries < self.policy.max_retries => {
                    retries += 1;
                    let backoff = self.policy.delay_for(retries);
                    tracing::warn!(
                        error = %e,
                        file = submission.name(),
                        retry = retries,
                        max_retries = self.policy.max_retries,
                        backoff_ms = backoff.as_millis() as u64,
                        "Rate limit hit, retrying evaluation"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) if e.is_rate_limit() => {
                    return Err(TransportError::RetriesExhausted {
                        attempts: retries + 1,
                        last:     Box::new(e),
                    }
                    .into());
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
