//! Message types for queue operations.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// Name of the message attribute carrying the routing type tag.
pub const MESSAGE_TYPE_ATTRIBUTE: &str = "MessageType";

/// A message received from an SQS queue with its processing metadata.
///
/// Instances are transient: created by a receive call and dropped after a
/// successful delete, or abandoned to the queue's visibility timeout when
/// processing fails.
#[derive(Debug, Clone)]
pub struct ReceivedMessage {
    /// Queue-assigned unique identifier for the message.
    pub message_id: String,

    /// Message payload.
    pub body: String,

    /// Single-use token required to delete this specific delivery.
    pub receipt_handle: String,

    /// Named string attributes attached to the message.
    pub attributes: HashMap<String, String>,

    /// Approximate number of times the message has been delivered.
    pub receive_count: u32,
}

impl ReceivedMessage {
    /// Routing type tag from the `MessageType` attribute, if present.
    ///
    /// The attribute key match is case-sensitive. A message without the
    /// attribute is unroutable.
    pub fn message_type(&self) -> Option<&str> {
        self.attributes
            .get(MESSAGE_TYPE_ATTRIBUTE)
            .map(String::as_str)
    }
}

/// Point-in-time snapshot of a queue's health and depth.
///
/// Produced on demand by a status query, never cached. The queue URL is
/// masked before it lands here so account identifiers do not leak into
/// logs or telemetry.
#[derive(Debug, Clone, Serialize)]
pub struct QueueStatus {
    /// True iff the describe call returned a success status.
    pub is_healthy: bool,

    /// Region the queue is hosted in.
    pub region: String,

    /// Human-assigned queue name.
    pub queue_name: String,

    /// Queue URL with the account-scoping segment replaced by filler.
    pub queue_url: String,

    /// Approximate number of messages available for retrieval.
    pub approximate_number_of_messages: u64,

    /// Approximate number of messages currently in flight.
    pub approximate_number_of_messages_not_visible: u64,

    /// When the queue was last modified, if the service reported it.
    pub last_modified_timestamp: Option<DateTime<Utc>>,
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
