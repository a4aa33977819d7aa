//! Type-tag routing of received messages to registered processors.

use crate::error::RouteError;
use crate::message::ReceivedMessage;
use async_trait::async_trait;
use std::sync::Arc;

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;

/// A handler capable of processing messages of particular types.
///
/// Processors form an open set registered with the consumer; exactly one
/// processor is expected to claim any given message type. That expectation
/// is a registration invariant, not enforced structurally — the router
/// surfaces violations per message.
#[async_trait]
pub trait MessageProcessor: Send + Sync {
    /// Check whether this processor handles `message_type`.
    fn can_process(&self, message_type: &str) -> bool;

    /// Process a received message.
    async fn process(&self, message: &ReceivedMessage) -> anyhow::Result<()>;
}

/// Routes message types to the single registered processor claiming them.
pub struct MessageRouter {
    processors: Vec<Arc<dyn MessageProcessor>>,
}

impl MessageRouter {
    pub fn new(processors: Vec<Arc<dyn MessageProcessor>>) -> Self {
        Self { processors }
    }

    /// Select the processor for `message_type` by linear scan.
    ///
    /// Zero claimants is [`RouteError::HandlerNotFound`]. More than one is
    /// a registration fault surfaced as [`RouteError::AmbiguousHandler`]
    /// instead of silently picking a winner.
    pub fn select(&self, message_type: &str) -> Result<&Arc<dyn MessageProcessor>, RouteError> {
        let mut claimants = self
            .processors
            .iter()
            .filter(|processor| processor.can_process(message_type));

        match (claimants.next(), claimants.next()) {
            (Some(processor), None) => Ok(processor),
            (Some(_), Some(_)) => Err(RouteError::AmbiguousHandler {
                message_type: message_type.to_string(),
            }),
            (None, _) => Err(RouteError::HandlerNotFound {
                message_type: message_type.to_string(),
            }),
        }
    }
}
