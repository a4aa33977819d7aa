//! The long-running consumer loop: poll, route, process, delete.

use crate::client::SqsClient;
use crate::config::SubscriptionConfig;
use crate::error::{RouteError, SqsError};
use crate::message::ReceivedMessage;
use crate::router::{MessageProcessor, MessageRouter};
use futures::future::join_all;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[cfg(test)]
#[path = "consumer_tests.rs"]
mod tests;

/// Faults contained at the single-message boundary.
///
/// None of these abort the batch or the loop; the affected message is left
/// undeleted so the queue's own redelivery policy applies.
#[derive(Debug, Error)]
enum ProcessingError {
    #[error("message has no 'MessageType' attribute")]
    Unroutable,

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error("processor failed: {0}")]
    Processor(#[source] anyhow::Error),

    #[error(transparent)]
    Queue(#[from] SqsError),
}

/// Long-running queue consumer.
///
/// Each iteration receives a batch, processes every message in the batch
/// concurrently, and waits for the whole batch before the next receive.
/// Cancellation is observed at iteration boundaries and inside the receive
/// wait; in-flight message processing always runs to completion.
pub struct SqsConsumer {
    client: Arc<dyn SqsClient>,
    router: MessageRouter,
    config: SubscriptionConfig,
}

impl SqsConsumer {
    pub fn new(
        client: Arc<dyn SqsClient>,
        processors: Vec<Arc<dyn MessageProcessor>>,
        config: SubscriptionConfig,
    ) -> Self {
        Self {
            client,
            router: MessageRouter::new(processors),
            config,
        }
    }

    /// Run the polling loop until `shutdown` is cancelled.
    ///
    /// Receive failures are logged and the loop continues; only the
    /// cancellation check at the top of each iteration terminates it.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!(
            queue_name = %self.config.queue_name,
            long_poll_seconds = self.config.queue_long_poll_time_seconds,
            "starting queue consumer"
        );

        while !shutdown.is_cancelled() {
            match self
                .client
                .receive_messages(
                    &self.config.queue_name,
                    self.config.queue_long_poll_time_seconds,
                    &shutdown,
                )
                .await
            {
                Ok(messages) => {
                    join_all(
                        messages
                            .into_iter()
                            .map(|message| self.process_message(message, &shutdown)),
                    )
                    .await;
                }
                Err(err) => {
                    warn!(
                        queue_name = %self.config.queue_name,
                        error = %err,
                        "queue receive failed"
                    );
                }
            }
        }

        info!(queue_name = %self.config.queue_name, "queue consumer stopped");
    }

    async fn process_message(&self, message: ReceivedMessage, cancel: &CancellationToken) {
        if let Err(err) = self.try_process(&message, cancel).await {
            error!(
                message_id = %message.message_id,
                receipt_handle = %message.receipt_handle,
                message_body = %message.body,
                queue_name = %self.config.queue_name,
                error = %err,
                "cannot process message"
            );
        }
    }

    async fn try_process(
        &self,
        message: &ReceivedMessage,
        cancel: &CancellationToken,
    ) -> Result<(), ProcessingError> {
        let message_type = message.message_type().ok_or(ProcessingError::Unroutable)?;
        let processor = self.router.select(message_type)?;

        processor
            .process(message)
            .await
            .map_err(ProcessingError::Processor)?;

        self.client
            .delete_message(&self.config.queue_name, &message.receipt_handle, cancel)
            .await?;

        Ok(())
    }
}
