//! # SQS Subscription
//!
//! Long-poll consumer subsystem for Amazon SQS: a background polling loop
//! that routes each received message to a registered processor by its
//! `MessageType` attribute and deletes the message only after the
//! processor succeeds.
//!
//! This library provides:
//! - A queue client with cached queue-URL resolution and best-effort sends
//! - Type-tag routing over an open set of message processors
//! - A resilient consumer loop with per-message failure isolation
//! - A transport seam with transient-fault retry and per-attempt logging
//!
//! ## Module Organization
//!
//! - [config] - Subscription and transport configuration
//! - [error] - Error types for all queue operations
//! - [message] - Received-message envelope and queue status snapshot
//! - [resolver] - Queue-URL resolution cache
//! - [transport] - SQS API seam, retry wrapper, AWS SDK transport
//! - [client] - Queue client operations
//! - [router] - Message-type routing
//! - [consumer] - The polling/dispatch loop
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use sqs_subscription::{
//!     AwsSqsApi, MessageProcessor, ReceivedMessage, RetryPolicy, RetryingSqsApi,
//!     SqsClientConfig, SqsConsumer, StandardSqsClient, SubscriptionConfig,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! struct OrderProcessor;
//!
//! #[async_trait::async_trait]
//! impl MessageProcessor for OrderProcessor {
//!     fn can_process(&self, message_type: &str) -> bool {
//!         message_type == "order_created"
//!     }
//!
//!     async fn process(&self, message: &ReceivedMessage) -> anyhow::Result<()> {
//!         println!("processing {}", message.body);
//!         Ok(())
//!     }
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client_config = SqsClientConfig {
//!     region: "us-east-1".to_string(),
//!     connect_timeout_seconds: 10,
//!     operation_timeout_seconds: 30,
//!     max_retries: 3,
//! };
//!
//! let api = RetryingSqsApi::new(
//!     AwsSqsApi::new(&client_config).await?,
//!     RetryPolicy::with_max_retries(client_config.max_retries),
//! );
//! let client = Arc::new(StandardSqsClient::new(Arc::new(api)));
//!
//! let consumer = SqsConsumer::new(
//!     client,
//!     vec![Arc::new(OrderProcessor) as Arc<dyn MessageProcessor>],
//!     SubscriptionConfig {
//!         queue_name: "orders".to_string(),
//!         queue_long_poll_time_seconds: 20,
//!     },
//! );
//!
//! let shutdown = CancellationToken::new();
//! consumer.run(shutdown).await;
//! # Ok(())
//! # }
//! ```

// Module declarations
pub mod client;
pub mod config;
pub mod consumer;
pub mod error;
pub mod message;
pub mod resolver;
pub mod router;
pub mod transport;

// Re-export commonly used types at crate root for convenience
pub use client::{SqsClient, StandardSqsClient};
pub use config::{SqsClientConfig, SubscriptionConfig, DEFAULT_CLIENT_CONFIG_SECTION};
pub use consumer::SqsConsumer;
pub use error::{ConfigurationError, RouteError, SqsError};
pub use message::{QueueStatus, ReceivedMessage, MESSAGE_TYPE_ATTRIBUTE};
pub use resolver::QueueUrlResolver;
pub use router::{MessageProcessor, MessageRouter};
pub use transport::aws::AwsSqsApi;
pub use transport::{RetryPolicy, RetryingSqsApi, SqsApi, TransportFault};
