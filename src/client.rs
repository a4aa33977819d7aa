//! Queue client operations composing the resolver and the transport.

use crate::error::SqsError;
use crate::message::{QueueStatus, ReceivedMessage};
use crate::resolver::QueueUrlResolver;
use crate::transport::{
    self, DeleteMessageRequest, GetQueueAttributesRequest, ReceiveMessageRequest,
    SendMessageRequest, SqsApi, MAX_RECEIVE_BATCH_SIZE,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;

const APPROXIMATE_NUMBER_OF_MESSAGES: &str = "ApproximateNumberOfMessages";
const APPROXIMATE_NUMBER_OF_MESSAGES_NOT_VISIBLE: &str = "ApproximateNumberOfMessagesNotVisible";
const LAST_MODIFIED_TIMESTAMP: &str = "LastModifiedTimestamp";

/// Public queue operations used by producers and the consumer loop.
#[async_trait]
pub trait SqsClient: Send + Sync {
    /// Write a message to the queue, best-effort.
    ///
    /// Transport failures after the adapter's retries are exhausted are
    /// logged and swallowed; callers must not treat `Ok` as delivery
    /// confirmation. Resolution failures and an empty body still error.
    async fn write(
        &self,
        queue_name: &str,
        message_body: &str,
        message_attributes: HashMap<String, String>,
    ) -> Result<(), SqsError>;

    /// Receive a batch of messages, long-polling up to `long_poll_seconds`.
    ///
    /// Cancellation observed while waiting yields an empty batch rather
    /// than an error, so callers treat "no messages" and "cancelled"
    /// uniformly.
    async fn receive_messages(
        &self,
        queue_name: &str,
        long_poll_seconds: u64,
        cancel: &CancellationToken,
    ) -> Result<Vec<ReceivedMessage>, SqsError>;

    /// Delete a specific delivery by its receipt handle.
    async fn delete_message(
        &self,
        queue_name: &str,
        receipt_handle: &str,
        cancel: &CancellationToken,
    ) -> Result<(), SqsError>;

    /// Produce a point-in-time status snapshot for the queue.
    async fn queue_status(&self, queue_name: &str) -> Result<QueueStatus, SqsError>;
}

/// Standard client over an [`SqsApi`] transport with cached URL resolution.
pub struct StandardSqsClient {
    api: Arc<dyn SqsApi>,
    resolver: QueueUrlResolver,
}

impl StandardSqsClient {
    pub fn new(api: Arc<dyn SqsApi>) -> Self {
        Self {
            api,
            resolver: QueueUrlResolver::new(),
        }
    }
}

#[async_trait]
impl SqsClient for StandardSqsClient {
    async fn write(
        &self,
        queue_name: &str,
        message_body: &str,
        message_attributes: HashMap<String, String>,
    ) -> Result<(), SqsError> {
        let queue_url = self.resolver.resolve(self.api.as_ref(), queue_name).await?;

        if message_body.is_empty() {
            return Err(SqsError::InvalidArgument {
                argument: "message_body",
            });
        }

        info!(queue_url = %queue_url, message_body, "sending message");

        let started = Instant::now();
        let request = SendMessageRequest {
            queue_url: queue_url.clone(),
            message_body: message_body.to_string(),
            message_attributes,
        };

        match self.api.send_message(request).await {
            Ok(response) if transport::is_success(response.status) => {
                info!(
                    status = response.status,
                    message_id = %response.message_id,
                    duration_ms = started.elapsed().as_millis() as u64,
                    "message sent"
                );
            }
            Ok(response) => {
                error!(
                    queue_url = %queue_url,
                    status = response.status,
                    duration_ms = started.elapsed().as_millis() as u64,
                    "failed to send message"
                );
            }
            Err(fault) => {
                // a fault here means the adapter has exhausted its retries
                error!(
                    queue_url = %queue_url,
                    duration_ms = started.elapsed().as_millis() as u64,
                    error = %fault,
                    "failed to send message"
                );
            }
        }

        Ok(())
    }

    async fn receive_messages(
        &self,
        queue_name: &str,
        long_poll_seconds: u64,
        cancel: &CancellationToken,
    ) -> Result<Vec<ReceivedMessage>, SqsError> {
        let queue_url = self.resolver.resolve(self.api.as_ref(), queue_name).await?;

        let request = ReceiveMessageRequest {
            queue_url,
            wait_time_seconds: long_poll_seconds,
            max_messages: MAX_RECEIVE_BATCH_SIZE,
        };

        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                warn!(queue_name, "receive cancelled while waiting for messages");
                Ok(Vec::new())
            }
            result = self.api.receive_message(request) => match result {
                Ok(response) if transport::is_success(response.status) => Ok(response.messages),
                Ok(response) => Err(SqsError::Transport {
                    operation: "ReceiveMessage",
                    queue_name: queue_name.to_string(),
                    message: format!("receive returned status {}", response.status),
                    status: Some(response.status),
                }),
                Err(fault) => {
                    error!(queue_name, error = %fault, "failed to receive messages");
                    Err(fault.into_sqs_error("ReceiveMessage", queue_name))
                }
            },
        }
    }

    async fn delete_message(
        &self,
        queue_name: &str,
        receipt_handle: &str,
        cancel: &CancellationToken,
    ) -> Result<(), SqsError> {
        let queue_url = self.resolver.resolve(self.api.as_ref(), queue_name).await?;

        let request = DeleteMessageRequest {
            queue_url,
            receipt_handle: receipt_handle.to_string(),
        };

        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                warn!(queue_name, receipt_handle, "delete cancelled");
                Err(SqsError::Cancelled {
                    operation: "DeleteMessage",
                    queue_name: queue_name.to_string(),
                })
            }
            result = self.api.delete_message(request) => match result {
                Ok(response) if transport::is_success(response.status) => Ok(()),
                Ok(response) => {
                    error!(queue_name, receipt_handle, status = response.status, "failed to delete message");
                    Err(SqsError::Transport {
                        operation: "DeleteMessage",
                        queue_name: queue_name.to_string(),
                        message: format!("delete returned status {}", response.status),
                        status: Some(response.status),
                    })
                }
                Err(fault) => {
                    error!(queue_name, receipt_handle, error = %fault, "failed to delete message");
                    Err(fault.into_sqs_error("DeleteMessage", queue_name))
                }
            },
        }
    }

    async fn queue_status(&self, queue_name: &str) -> Result<QueueStatus, SqsError> {
        let queue_url = self.resolver.resolve(self.api.as_ref(), queue_name).await?;

        let request = GetQueueAttributesRequest {
            queue_url: queue_url.clone(),
            attribute_names: vec![
                APPROXIMATE_NUMBER_OF_MESSAGES.to_string(),
                APPROXIMATE_NUMBER_OF_MESSAGES_NOT_VISIBLE.to_string(),
                LAST_MODIFIED_TIMESTAMP.to_string(),
            ],
        };

        let response = match self.api.get_queue_attributes(request).await {
            Ok(response) => response,
            Err(fault) => {
                error!(queue_name, error = %fault, "failed to read queue attributes");
                return Err(fault.into_sqs_error("GetQueueAttributes", queue_name));
            }
        };

        Ok(QueueStatus {
            is_healthy: transport::is_success(response.status),
            region: self.api.region().to_string(),
            queue_name: queue_name.to_string(),
            queue_url: mask_account_number(&queue_url),
            approximate_number_of_messages: read_count(
                &response.attributes,
                APPROXIMATE_NUMBER_OF_MESSAGES,
            ),
            approximate_number_of_messages_not_visible: read_count(
                &response.attributes,
                APPROXIMATE_NUMBER_OF_MESSAGES_NOT_VISIBLE,
            ),
            last_modified_timestamp: read_timestamp(&response.attributes, LAST_MODIFIED_TIMESTAMP),
        })
    }
}

fn read_count(attributes: &HashMap<String, String>, name: &str) -> u64 {
    attributes
        .get(name)
        .and_then(|value| value.parse().ok())
        .unwrap_or(0)
}

fn read_timestamp(attributes: &HashMap<String, String>, name: &str) -> Option<DateTime<Utc>> {
    let seconds = attributes.get(name)?.parse().ok()?;
    DateTime::from_timestamp(seconds, 0)
}

/// Replace the account-scoping path segment of a queue URL with same-width
/// `x` filler so the URL can appear in logs and telemetry.
fn mask_account_number(queue_url: &str) -> String {
    let Some(index) = queue_url.find("com/") else {
        return queue_url.to_string();
    };
    let start = index + 4;

    let Some(length) = queue_url[start..].find('/') else {
        return queue_url.to_string();
    };
    if length == 0 {
        return queue_url.to_string();
    }

    let account_number = &queue_url[start..start + length];
    queue_url.replace(account_number, &"x".repeat(length))
}
