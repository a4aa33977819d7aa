//! Subscription and transport configuration.

use crate::error::ConfigurationError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Conventional configuration section for [`SqsClientConfig`].
pub const DEFAULT_CLIENT_CONFIG_SECTION: &str = "AmazonSqs";

/// Configuration for subscribing to a single queue.
///
/// Immutable after construction; drives the consumer loop's receive calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionConfig {
    /// Name of the queue to subscribe to.
    pub queue_name: String,

    /// Seconds a receive call waits for a message before returning.
    pub queue_long_poll_time_seconds: u64,
}

impl SubscriptionConfig {
    /// Load the subscription configuration from the named section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Missing`] when the section is absent,
    /// [`ConfigurationError::Invalid`] when the section deserializes but
    /// carries an empty queue name.
    pub fn from_config(
        config: &config::Config,
        section: &str,
    ) -> Result<Self, ConfigurationError> {
        if section.is_empty() {
            return Err(ConfigurationError::Invalid {
                message: "configuration section name must not be empty".to_string(),
            });
        }

        let subscription: Self = get_section(config, section)?;

        if subscription.queue_name.is_empty() {
            return Err(ConfigurationError::Invalid {
                message: format!("queue_name in section '{}' must not be empty", section),
            });
        }

        Ok(subscription)
    }
}

/// Connection settings for the SQS transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqsClientConfig {
    /// Region the queues are hosted in.
    pub region: String,

    /// Seconds allowed for establishing a connection.
    #[serde(default = "default_connect_timeout_seconds")]
    pub connect_timeout_seconds: u64,

    /// Seconds allowed for a complete operation attempt.
    #[serde(default = "default_operation_timeout_seconds")]
    pub operation_timeout_seconds: u64,

    /// Maximum number of retries for a transient transport fault.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl SqsClientConfig {
    /// Load the transport configuration from the named section.
    pub fn from_config(
        config: &config::Config,
        section: &str,
    ) -> Result<Self, ConfigurationError> {
        if section.is_empty() {
            return Err(ConfigurationError::Invalid {
                message: "configuration section name must not be empty".to_string(),
            });
        }

        let client: Self = get_section(config, section)?;

        if client.region.is_empty() {
            return Err(ConfigurationError::Invalid {
                message: format!("region in section '{}' must not be empty", section),
            });
        }

        Ok(client)
    }
}

fn default_connect_timeout_seconds() -> u64 {
    10
}

fn default_operation_timeout_seconds() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn get_section<T: DeserializeOwned>(
    config: &config::Config,
    section: &str,
) -> Result<T, ConfigurationError> {
    config.get::<T>(section).map_err(|error| match error {
        config::ConfigError::NotFound(_) => ConfigurationError::Missing {
            section: section.to_string(),
        },
        other => ConfigurationError::Parsing {
            message: other.to_string(),
        },
    })
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
