//! Tests for the queue-URL resolution cache.

use super::*;
use crate::transport::{
    DeleteMessageRequest, DeleteMessageResponse, GetQueueAttributesRequest,
    GetQueueAttributesResponse, GetQueueUrlResponse, ReceiveMessageRequest,
    ReceiveMessageResponse, SendMessageRequest, SendMessageResponse, TransportFault,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

// ============================================================================
// Test Helpers
// ============================================================================

/// Transport double that counts queue-URL lookups.
struct CountingApi {
    queue_url: String,
    lookup_status: u16,
    lookup_fault: Option<TransportFault>,
    lookups: AtomicU32,
}

impl CountingApi {
    fn new() -> Self {
        Self {
            queue_url: "https://sqs.us-east-1.amazonaws.com/123456789012/orders".to_string(),
            lookup_status: 200,
            lookup_fault: None,
            lookups: AtomicU32::new(0),
        }
    }

    fn with_status(status: u16) -> Self {
        Self {
            lookup_status: status,
            ..Self::new()
        }
    }

    fn with_fault(fault: TransportFault) -> Self {
        Self {
            lookup_fault: Some(fault),
            ..Self::new()
        }
    }

    fn lookups(&self) -> u32 {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SqsApi for CountingApi {
    async fn send_message(
        &self,
        _request: SendMessageRequest,
    ) -> Result<SendMessageResponse, TransportFault> {
        unimplemented!("not exercised by resolver tests")
    }

    async fn receive_message(
        &self,
        _request: ReceiveMessageRequest,
    ) -> Result<ReceiveMessageResponse, TransportFault> {
        unimplemented!("not exercised by resolver tests")
    }

    async fn delete_message(
        &self,
        _request: DeleteMessageRequest,
    ) -> Result<DeleteMessageResponse, TransportFault> {
        unimplemented!("not exercised by resolver tests")
    }

    async fn get_queue_url(
        &self,
        request: GetQueueUrlRequest,
    ) -> Result<GetQueueUrlResponse, TransportFault> {
        self.lookups.fetch_add(1, Ordering::SeqCst);

        if let Some(fault) = self.lookup_fault.clone() {
            return Err(fault);
        }

        assert!(!request.queue_name.is_empty());
        Ok(GetQueueUrlResponse {
            status: self.lookup_status,
            queue_url: self.queue_url.clone(),
        })
    }

    async fn get_queue_attributes(
        &self,
        _request: GetQueueAttributesRequest,
    ) -> Result<GetQueueAttributesResponse, TransportFault> {
        unimplemented!("not exercised by resolver tests")
    }

    fn region(&self) -> &str {
        "us-east-1"
    }
}

// ============================================================================
// Resolution Tests
// ============================================================================

#[tokio::test]
async fn test_second_resolve_is_served_from_cache() {
    let api = CountingApi::new();
    let resolver = QueueUrlResolver::new();

    let first = resolver.resolve(&api, "orders").await.unwrap();
    let second = resolver.resolve(&api, "orders").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(api.lookups(), 1, "cache hit must not issue a lookup");
}

#[tokio::test]
async fn test_distinct_queue_names_are_resolved_separately() {
    let api = CountingApi::new();
    let resolver = QueueUrlResolver::new();

    resolver.resolve(&api, "orders").await.unwrap();
    resolver.resolve(&api, "invoices").await.unwrap();

    assert_eq!(api.lookups(), 2);
}

#[tokio::test]
async fn test_empty_queue_name_is_rejected_without_transport_call() {
    let api = CountingApi::new();
    let resolver = QueueUrlResolver::new();

    let result = resolver.resolve(&api, "").await;

    assert!(matches!(
        result,
        Err(SqsError::InvalidArgument {
            argument: "queue_name"
        })
    ));
    assert_eq!(api.lookups(), 0);
}

#[tokio::test]
async fn test_non_success_lookup_status_is_a_transport_error() {
    let api = CountingApi::with_status(500);
    let resolver = QueueUrlResolver::new();

    let result = resolver.resolve(&api, "orders").await;

    match result {
        Err(SqsError::Transport { status, .. }) => assert_eq!(status, Some(500)),
        other => panic!("expected transport error, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_lookup_fault_propagates_and_is_not_cached() {
    let api = CountingApi::with_fault(TransportFault::Network {
        message: "connection reset".to_string(),
    });
    let resolver = QueueUrlResolver::new();

    assert!(resolver.resolve(&api, "orders").await.is_err());
    assert!(resolver.resolve(&api, "orders").await.is_err());

    assert_eq!(api.lookups(), 2, "failed lookups must not populate the cache");
}

#[tokio::test]
async fn test_concurrent_resolves_settle_on_one_cached_value() {
    let api = Arc::new(CountingApi::new());
    let resolver = Arc::new(QueueUrlResolver::new());

    let mut handles = Vec::new();
    for _ in 0..8 {
        let api = Arc::clone(&api);
        let resolver = Arc::clone(&resolver);
        handles.push(tokio::spawn(async move {
            resolver.resolve(api.as_ref(), "orders").await
        }));
    }

    for handle in handles {
        let url = handle.await.unwrap().unwrap();
        assert_eq!(
            url,
            "https://sqs.us-east-1.amazonaws.com/123456789012/orders"
        );
    }

    // Racing misses may each look up; once settled the cache answers.
    let settled = api.lookups();
    resolver.resolve(api.as_ref(), "orders").await.unwrap();
    assert_eq!(api.lookups(), settled);
}
