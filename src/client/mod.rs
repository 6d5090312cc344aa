//! Resilient request client: multi-part payloads, bounded retries, linear
//! backoff, and failure classification.
//!
//! ```text
//! text ──▶ payload ──▶ transport ──▶ classify ──▶ answer | RequestFailure
//!          (images,     (one HTTP      (success /
//!           sizes)       call)          transient / terminal)
//! ```
//!
//! 1. [`payload`]:   find `![](path)` references, inline image bytes,
//!    splice pixel sizes into the text
//! 2. [`encode`]:    MIME type, header-only dimensions, base64 data URLs
//! 3. [`transport`]: wire format and the single-shot [`Transport`] seam
//! 4. [`retry`]:     [`RetryPolicy`] and the per-call state machine
//!
//! | Outcome                         | Class     |
//! |---------------------------------|-----------|
//! | 2xx with answer content         | success   |
//! | 2xx without answer content      | terminal  |
//! | timeout / connect / TLS / body  | transient |
//! | 5xx                             | transient |
//! | 4xx                             | terminal  |
//!
//! Transient failures are retried until the policy's attempt budget is spent;
//! the final failure then carries the last underlying error.

pub mod encode;
pub mod payload;
pub mod retry;
pub mod transport;

pub use payload::{InlineImage, RequestPayload, SkippedImage};
pub use retry::{Jitter, NoJitter, RandomJitter, RetryPolicy, RetryState, Sleeper, TokioSleeper};
pub use transport::{ChatRequest, HttpTransport, Transport, TransportResponse};

use crate::config::ClientConfig;
use crate::error::{MdSliceError, RequestFailure};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use transport::ChatResponse;

/// Response bodies quoted in failures are cut to this many characters.
const MAX_BODY_EXCERPT: usize = 500;

/// How one attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success(String),
    Transient(RequestFailure),
    Terminal(RequestFailure),
}

/// Classify one transport result.
pub fn classify(result: Result<TransportResponse, crate::error::TransportError>) -> AttemptOutcome {
    let failure = match result {
        Ok(response) => match failure_for(response) {
            Ok(answer) => return AttemptOutcome::Success(answer),
            Err(failure) => failure,
        },
        Err(e) => RequestFailure::Transport(e),
    };
    if failure.is_retryable() {
        AttemptOutcome::Transient(failure)
    } else {
        AttemptOutcome::Terminal(failure)
    }
}

/// Pull the answer out of a response, or name what is wrong with it.
fn failure_for(response: TransportResponse) -> Result<String, RequestFailure> {
    let status = response.status;
    let body = excerpt(&response.body);
    match status {
        200..=299 => match serde_json::from_str::<ChatResponse>(&response.body) {
            Ok(parsed) => parsed
                .answer()
                .map(str::to_string)
                .ok_or(RequestFailure::MalformedResponse { body }),
            Err(e) => Err(RequestFailure::MalformedResponse {
                body: format!("{e}; body: {body}"),
            }),
        },
        400..=499 => Err(RequestFailure::ClientError { status, body }),
        500..=599 => Err(RequestFailure::ServerError { status, body }),
        _ => Err(RequestFailure::UnexpectedStatus { status, body }),
    }
}

fn excerpt(body: &str) -> String {
    let body = body.trim();
    match body.char_indices().nth(MAX_BODY_EXCERPT) {
        Some((cut, _)) => format!("{}\u{2026}", &body[..cut]),
        None => body.to_string(),
    }
}

/// Chat-completion client with bounded retries.
///
/// Holds no per-call state; one instance can serve many payloads, including
/// concurrently.
#[derive(Clone)]
pub struct RequestClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    sleeper: Arc<dyn Sleeper>,
    jitter: Arc<dyn Jitter>,
}

impl fmt::Debug for RequestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestClient")
            .field("config", &self.config)
            .field("transport", &"<dyn Transport>")
            .finish()
    }
}

impl RequestClient {
    /// A client that talks HTTP to `config.base_url`.
    pub fn new(config: ClientConfig) -> Result<Self, MdSliceError> {
        let transport = HttpTransport::new(&config)
            .map_err(|e| MdSliceError::InvalidConfig(format!("HTTP client: {e}")))?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// A client over a caller-supplied transport, sleeping in real time.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            transport,
            sleeper: Arc::new(TokioSleeper),
            jitter: Arc::new(RandomJitter),
        }
    }

    /// Replace the sleeper used between attempts.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Replace the jitter source.
    pub fn with_jitter(mut self, jitter: Arc<dyn Jitter>) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send `payload` with the configured retry policy.
    pub async fn send(&self, payload: &RequestPayload) -> Result<String, RequestFailure> {
        self.send_with_policy(payload, &self.config.retry_policy()).await
    }

    /// Send `payload` with an explicit attempt budget and base backoff.
    pub async fn send_with(
        &self,
        payload: &RequestPayload,
        max_retries: u32,
        base_backoff: Duration,
    ) -> Result<String, RequestFailure> {
        let policy = RetryPolicy {
            max_attempts: max_retries,
            base_backoff,
            max_jitter: self.config.max_jitter,
        };
        self.send_with_policy(payload, &policy).await
    }

    /// Assemble `text` (inlining its images) and send it.
    pub async fn send_text_with_images(
        &self,
        text: &str,
        base_dir: Option<&Path>,
    ) -> Result<String, RequestFailure> {
        let payload = RequestPayload::assemble(text, base_dir).await;
        if !payload.skipped.is_empty() {
            warn!("{} image reference(s) skipped", payload.skipped.len());
        }
        self.send(&payload).await
    }

    /// Like [`send`](Self::send), but a failure comes back as prefixed text
    /// (see [`crate::error::FAILURE_PREFIX`]) so batch drivers can treat it
    /// as data.
    pub async fn send_text(&self, payload: &RequestPayload) -> String {
        match self.send(payload).await {
            Ok(answer) => answer,
            Err(failure) => failure.to_failure_text(),
        }
    }

    /// Synchronous wrapper around [`send`](Self::send).
    ///
    /// Creates a temporary Tokio runtime; do not call from inside one.
    pub fn send_blocking(&self, payload: &RequestPayload) -> Result<String, RequestFailure> {
        let runtime = tokio::runtime::Runtime::new().map_err(|e| {
            RequestFailure::Transport(crate::error::TransportError::Protocol(format!(
                "Failed to create tokio runtime: {e}"
            )))
        })?;
        runtime.block_on(self.send(payload))
    }

    async fn send_with_policy(
        &self,
        payload: &RequestPayload,
        policy: &RetryPolicy,
    ) -> Result<String, RequestFailure> {
        let request = ChatRequest::from_payload(payload, &self.config);
        let attempts = policy.attempts();
        info!(
            "Sending request to '{}' ({} chars, {} image(s))",
            self.config.model,
            payload.text.len(),
            payload.images.len()
        );

        let mut state = RetryState::Idle;
        loop {
            state = match state {
                RetryState::Idle => RetryState::Dispatched { attempt: 1 },

                RetryState::Dispatched { attempt } => {
                    match classify(self.transport.dispatch(&request).await) {
                        AttemptOutcome::Success(answer) => {
                            debug!("Attempt {}/{} succeeded", attempt, attempts);
                            return Ok(answer);
                        }
                        AttemptOutcome::Terminal(failure) => {
                            warn!("Attempt {}/{} failed, not retrying: {}", attempt, attempts, failure);
                            return Err(failure);
                        }
                        AttemptOutcome::Transient(failure) => {
                            warn!("Attempt {}/{} failed: {}", attempt, attempts, failure);
                            match RetryState::after_transient(attempt, policy, self.jitter.as_ref()) {
                                Some(next) => next,
                                None => {
                                    return Err(RequestFailure::Exhausted {
                                        attempts: attempt,
                                        last: Box::new(failure),
                                    })
                                }
                            }
                        }
                    }
                }

                RetryState::BackoffWait { attempt, delay } => {
                    warn!("Retrying in {:.1}s", delay.as_secs_f64());
                    self.sleeper.sleep(delay).await;
                    RetryState::Dispatched {
                        attempt: attempt + 1,
                    }
                }
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;

    fn ok(body: &str) -> Result<TransportResponse, TransportError> {
        Ok(TransportResponse {
            status: 200,
            body: body.to_string(),
        })
    }

    fn status(code: u16) -> Result<TransportResponse, TransportError> {
        Ok(TransportResponse {
            status: code,
            body: format!("status {code}"),
        })
    }

    #[test]
    fn classify_success() {
        let outcome = classify(ok(r#"{"choices":[{"message":{"content":"answer"}}]}"#));
        assert_eq!(outcome, AttemptOutcome::Success("answer".into()));
    }

    #[test]
    fn classify_malformed_success_is_terminal() {
        assert!(matches!(
            classify(ok(r#"{"choices":[]}"#)),
            AttemptOutcome::Terminal(RequestFailure::MalformedResponse { .. })
        ));
        assert!(matches!(
            classify(ok("<html>proxy page</html>")),
            AttemptOutcome::Terminal(RequestFailure::MalformedResponse { .. })
        ));
    }

    #[test]
    fn classify_statuses() {
        assert!(matches!(
            classify(status(503)),
            AttemptOutcome::Transient(RequestFailure::ServerError { status: 503, .. })
        ));
        assert!(matches!(
            classify(status(401)),
            AttemptOutcome::Terminal(RequestFailure::ClientError { status: 401, .. })
        ));
        assert!(matches!(
            classify(status(302)),
            AttemptOutcome::Terminal(RequestFailure::UnexpectedStatus { status: 302, .. })
        ));
    }

    #[test]
    fn classify_transport_fault_is_transient() {
        assert!(matches!(
            classify(Err(TransportError::Connection("refused".into()))),
            AttemptOutcome::Transient(RequestFailure::Transport(_))
        ));
    }

    #[test]
    fn outcome_follows_failure_retryability() {
        for code in [100, 302, 400, 404, 429, 500, 502, 599, 600] {
            match classify(status(code)) {
                AttemptOutcome::Transient(f) => assert!(f.is_retryable(), "status {code}"),
                AttemptOutcome::Terminal(f) => assert!(!f.is_retryable(), "status {code}"),
                AttemptOutcome::Success(_) => panic!("status {code} succeeded"),
            }
        }
    }

    #[test]
    fn long_bodies_are_cut() {
        let long = "x".repeat(MAX_BODY_EXCERPT + 10);
        let cut = excerpt(&long);
        assert_eq!(cut.chars().count(), MAX_BODY_EXCERPT + 1);
        assert!(cut.ends_with('\u{2026}'));
        assert_eq!(excerpt(" short "), "short");
    }
}
