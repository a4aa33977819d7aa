//! Queue-name to queue-URL resolution with process-lifetime caching.

use crate::error::SqsError;
use crate::transport::{self, GetQueueUrlRequest, SqsApi};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;

/// Resolves human-assigned queue names to their service-assigned queue URLs.
///
/// Resolved URLs are cached for the life of the process; the external
/// mapping is assumed stable, so nothing here invalidates an entry when a
/// queue is recreated externally.
pub struct QueueUrlResolver {
    cache: RwLock<HashMap<String, String>>,
}

impl QueueUrlResolver {
    pub fn new() -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve `queue_name` to its queue URL, consulting the cache first.
    ///
    /// Concurrent misses for the same name may each perform a lookup; the
    /// first writer wins and later resolvers adopt the cached value.
    ///
    /// # Errors
    ///
    /// Returns [`SqsError::InvalidArgument`] for an empty queue name and
    /// [`SqsError::Transport`] when the lookup fails or returns a
    /// non-success status.
    pub async fn resolve(&self, api: &dyn SqsApi, queue_name: &str) -> Result<String, SqsError> {
        if queue_name.is_empty() {
            return Err(SqsError::InvalidArgument {
                argument: "queue_name",
            });
        }

        {
            let cache = self.cache.read().await;
            if let Some(queue_url) = cache.get(queue_name) {
                return Ok(queue_url.clone());
            }
        }

        info!(queue_name, "resolving queue url");

        let response = api
            .get_queue_url(GetQueueUrlRequest {
                queue_name: queue_name.to_string(),
            })
            .await
            .map_err(|fault| fault.into_sqs_error("GetQueueUrl", queue_name))?;

        if !transport::is_success(response.status) {
            return Err(SqsError::Transport {
                operation: "GetQueueUrl",
                queue_name: queue_name.to_string(),
                message: format!("queue url lookup returned status {}", response.status),
                status: Some(response.status),
            });
        }

        let mut cache = self.cache.write().await;
        let queue_url = cache
            .entry(queue_name.to_string())
            .or_insert(response.queue_url)
            .clone();

        Ok(queue_url)
    }
}

impl Default for QueueUrlResolver {
    fn default() -> Self {
        Self::new()
    }
}
