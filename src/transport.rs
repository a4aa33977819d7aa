//! Narrow seam over the SQS service API with retry and attempt logging.
//!
//! [`SqsApi`] exposes the five primitive queue operations with explicit
//! request/response types. Implementations perform single attempts only;
//! transient-fault retry belongs to [`RetryingSqsApi`] so that every
//! attempt can be logged with its request parameters and outcome.

use crate::error::SqsError;
use crate::message::ReceivedMessage;
use async_trait::async_trait;
use rand::Rng;
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::trace;

pub mod aws;

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;

/// Largest batch a single receive call may request from SQS.
pub const MAX_RECEIVE_BATCH_SIZE: u32 = 10;

/// Check whether a service status code indicates success.
pub fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

// ============================================================================
// Fault Types
// ============================================================================

/// Faults raised by the underlying SQS transport.
#[derive(Debug, Clone, Error)]
pub enum TransportFault {
    #[error("network error: {message}")]
    Network { message: String },

    #[error("request timed out: {message}")]
    Timeout { message: String },

    #[error("service error ({status}): {code}: {message}")]
    Service {
        status: u16,
        code: String,
        message: String,
    },

    #[error("invalid request: {message}")]
    InvalidRequest { message: String },
}

impl TransportFault {
    /// Check if the fault is transient and should be retried
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network { .. } => true,
            Self::Timeout { .. } => true,
            Self::Service { status, .. } => *status >= 500,
            Self::InvalidRequest { .. } => false,
        }
    }

    /// Service status code carried by the fault, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Service { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Map the fault into the client-facing error type.
    pub fn into_sqs_error(self, operation: &'static str, queue_name: &str) -> SqsError {
        let status = self.status();
        SqsError::Transport {
            operation,
            queue_name: queue_name.to_string(),
            message: self.to_string(),
            status,
        }
    }
}

// ============================================================================
// Request and Response Types
// ============================================================================

/// Parameters for the `SendMessage` operation.
#[derive(Debug, Clone, Serialize)]
pub struct SendMessageRequest {
    pub queue_url: String,
    pub message_body: String,
    pub message_attributes: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct SendMessageResponse {
    pub status: u16,
    pub message_id: String,
}

/// Parameters for the `ReceiveMessage` operation.
#[derive(Debug, Clone, Serialize)]
pub struct ReceiveMessageRequest {
    pub queue_url: String,
    pub wait_time_seconds: u64,
    pub max_messages: u32,
}

#[derive(Debug, Clone)]
pub struct ReceiveMessageResponse {
    pub status: u16,
    pub messages: Vec<ReceivedMessage>,
}

/// Parameters for the `DeleteMessage` operation.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteMessageRequest {
    pub queue_url: String,
    pub receipt_handle: String,
}

#[derive(Debug, Clone)]
pub struct DeleteMessageResponse {
    pub status: u16,
}

/// Parameters for the `GetQueueUrl` operation.
#[derive(Debug, Clone, Serialize)]
pub struct GetQueueUrlRequest {
    pub queue_name: String,
}

#[derive(Debug, Clone)]
pub struct GetQueueUrlResponse {
    pub status: u16,
    pub queue_url: String,
}

/// Parameters for the `GetQueueAttributes` operation.
#[derive(Debug, Clone, Serialize)]
pub struct GetQueueAttributesRequest {
    pub queue_url: String,
    pub attribute_names: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct GetQueueAttributesResponse {
    pub status: u16,
    pub attributes: HashMap<String, String>,
}

// ============================================================================
// Transport Trait
// ============================================================================

/// The five primitive operations executed against the SQS service.
#[async_trait]
pub trait SqsApi: Send + Sync {
    /// Send a single message.
    async fn send_message(
        &self,
        request: SendMessageRequest,
    ) -> Result<SendMessageResponse, TransportFault>;

    /// Receive up to a batch of messages, long-polling for the requested wait.
    async fn receive_message(
        &self,
        request: ReceiveMessageRequest,
    ) -> Result<ReceiveMessageResponse, TransportFault>;

    /// Delete a specific delivery by its receipt handle.
    async fn delete_message(
        &self,
        request: DeleteMessageRequest,
    ) -> Result<DeleteMessageResponse, TransportFault>;

    /// Look up the queue URL for a queue name.
    async fn get_queue_url(
        &self,
        request: GetQueueUrlRequest,
    ) -> Result<GetQueueUrlResponse, TransportFault>;

    /// Read named queue attributes.
    async fn get_queue_attributes(
        &self,
        request: GetQueueAttributesRequest,
    ) -> Result<GetQueueAttributesResponse, TransportFault>;

    /// Region the transport is connected to.
    fn region(&self) -> &str;
}

// ============================================================================
// Retry Policy
// ============================================================================

/// Exponential backoff policy for transient transport faults.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retries after the initial attempt.
    pub max_retries: u32,

    /// Delay before the first retry.
    pub initial_delay: Duration,

    /// Cap on the delay between retries.
    pub max_delay: Duration,

    /// Exponential growth factor.
    pub backoff_multiplier: f64,

    /// Whether to add jitter to delays.
    pub use_jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(16),
            backoff_multiplier: 2.0,
            use_jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Default policy with a caller-supplied retry budget.
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Check if another retry is allowed for this attempt number (0-based).
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    /// Delay before the given retry attempt (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(attempt as i32);
        let capped = base.min(self.max_delay.as_secs_f64());

        let delay = if self.use_jitter {
            add_jitter(capped)
        } else {
            capped
        };

        Duration::from_secs_f64(delay)
    }
}

/// Apply ±25% random variation to a delay.
fn add_jitter(delay_secs: f64) -> f64 {
    let mut rng = rand::thread_rng();
    let jitter_range = delay_secs * 0.25;
    let jitter = rng.gen_range(-jitter_range..=jitter_range);

    (delay_secs + jitter).max(0.0)
}

// ============================================================================
// Retrying Transport
// ============================================================================

/// Decorator adding transient-fault retry and per-attempt trace logging to
/// any [`SqsApi`].
///
/// Each retry emits a trace event with the request name, attempt count,
/// retry budget, serialized request parameters, and the observed fault.
/// Non-transient faults, and transient faults that outlive the budget,
/// return the last fault to the caller.
pub struct RetryingSqsApi<T> {
    inner: T,
    policy: RetryPolicy,
}

impl<T: SqsApi> RetryingSqsApi<T> {
    pub fn new(inner: T, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    async fn execute<Req, Resp, F, Fut>(
        &self,
        request_name: &'static str,
        request: &Req,
        operation: F,
    ) -> Result<Resp, TransportFault>
    where
        Req: Serialize,
        F: Fn() -> Fut,
        Fut: Future<Output = Result<Resp, TransportFault>>,
    {
        let mut attempt = 0u32;

        loop {
            match operation().await {
                Ok(response) => return Ok(response),
                Err(fault) if fault.is_transient() && self.policy.should_retry(attempt) => {
                    let request_parameters = serde_json::to_string(request)
                        .unwrap_or_else(|_| String::from("<unserializable>"));

                    trace!(
                        request_name,
                        attempt = attempt + 1,
                        max_retries = self.policy.max_retries,
                        request_parameters = %request_parameters,
                        response_status = fault.status(),
                        error = %fault,
                        "retrying transient transport fault"
                    );

                    tokio::time::sleep(self.policy.delay_for(attempt)).await;
                    attempt += 1;
                }
                Err(fault) => return Err(fault),
            }
        }
    }
}

#[async_trait]
impl<T: SqsApi> SqsApi for RetryingSqsApi<T> {
    async fn send_message(
        &self,
        request: SendMessageRequest,
    ) -> Result<SendMessageResponse, TransportFault> {
        self.execute("SendMessage", &request, || {
            self.inner.send_message(request.clone())
        })
        .await
    }

    async fn receive_message(
        &self,
        request: ReceiveMessageRequest,
    ) -> Result<ReceiveMessageResponse, TransportFault> {
        self.execute("ReceiveMessage", &request, || {
            self.inner.receive_message(request.clone())
        })
        .await
    }

    async fn delete_message(
        &self,
        request: DeleteMessageRequest,
    ) -> Result<DeleteMessageResponse, TransportFault> {
        self.execute("DeleteMessage", &request, || {
            self.inner.delete_message(request.clone())
        })
        .await
    }

    async fn get_queue_url(
        &self,
        request: GetQueueUrlRequest,
    ) -> Result<GetQueueUrlResponse, TransportFault> {
        self.execute("GetQueueUrl", &request, || {
            self.inner.get_queue_url(request.clone())
        })
        .await
    }

    async fn get_queue_attributes(
        &self,
        request: GetQueueAttributesRequest,
    ) -> Result<GetQueueAttributesResponse, TransportFault> {
        self.execute("GetQueueAttributes", &request, || {
            self.inner.get_queue_attributes(request.clone())
        })
        .await
    }

    fn region(&self) -> &str {
        self.inner.region()
    }
}
