//! Production SQS transport backed by the AWS SDK.

use crate::config::SqsClientConfig;
use crate::error::ConfigurationError;
use crate::message::ReceivedMessage;
use crate::transport::{
    DeleteMessageRequest, DeleteMessageResponse, GetQueueAttributesRequest,
    GetQueueAttributesResponse, GetQueueUrlRequest, GetQueueUrlResponse, ReceiveMessageRequest,
    ReceiveMessageResponse, SendMessageRequest, SendMessageResponse, SqsApi, TransportFault,
    MAX_RECEIVE_BATCH_SIZE,
};
use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_sqs::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_sqs::types::{MessageAttributeValue, MessageSystemAttributeName, QueueAttributeName};
use std::collections::HashMap;
use std::time::Duration;

#[cfg(test)]
#[path = "aws_tests.rs"]
mod tests;

const HTTP_OK: u16 = 200;

/// SQS wait times are capped by the service at 20 seconds.
const MAX_WAIT_TIME_SECONDS: u64 = 20;

/// SQS transport implemented with `aws-sdk-sqs`.
///
/// SDK-level retries are disabled; retry behavior is owned by
/// [`RetryingSqsApi`](crate::transport::RetryingSqsApi) so each attempt can
/// be logged. Credentials come from the standard AWS credential chain.
pub struct AwsSqsApi {
    client: aws_sdk_sqs::Client,
    region: String,
}

impl AwsSqsApi {
    /// Create the transport from connection settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Invalid`] when the region is empty.
    pub async fn new(config: &SqsClientConfig) -> Result<Self, ConfigurationError> {
        if config.region.is_empty() {
            return Err(ConfigurationError::Invalid {
                message: "region must not be empty".to_string(),
            });
        }

        let timeouts = TimeoutConfig::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .operation_timeout(Duration::from_secs(config.operation_timeout_seconds))
            .build();

        let shared_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .retry_config(RetryConfig::disabled())
            .timeout_config(timeouts)
            .load()
            .await;

        Ok(Self {
            client: aws_sdk_sqs::Client::new(&shared_config),
            region: config.region.clone(),
        })
    }
}

#[async_trait]
impl SqsApi for AwsSqsApi {
    async fn send_message(
        &self,
        request: SendMessageRequest,
    ) -> Result<SendMessageResponse, TransportFault> {
        let mut attributes = HashMap::new();
        for (name, value) in &request.message_attributes {
            let attribute = MessageAttributeValue::builder()
                .data_type("String")
                .string_value(value)
                .build()
                .map_err(|error| TransportFault::InvalidRequest {
                    message: format!("invalid message attribute '{}': {}", name, error),
                })?;
            attributes.insert(name.clone(), attribute);
        }

        let output = self
            .client
            .send_message()
            .queue_url(&request.queue_url)
            .message_body(&request.message_body)
            .set_message_attributes(if attributes.is_empty() {
                None
            } else {
                Some(attributes)
            })
            .send()
            .await
            .map_err(map_sdk_error)?;

        Ok(SendMessageResponse {
            status: HTTP_OK,
            message_id: output.message_id.unwrap_or_default(),
        })
    }

    async fn receive_message(
        &self,
        request: ReceiveMessageRequest,
    ) -> Result<ReceiveMessageResponse, TransportFault> {
        let output = self
            .client
            .receive_message()
            .queue_url(&request.queue_url)
            .wait_time_seconds(request.wait_time_seconds.min(MAX_WAIT_TIME_SECONDS) as i32)
            .max_number_of_messages(request.max_messages.min(MAX_RECEIVE_BATCH_SIZE) as i32)
            .message_system_attribute_names(MessageSystemAttributeName::ApproximateReceiveCount)
            .message_attribute_names("All")
            .send()
            .await
            .map_err(map_sdk_error)?;

        let messages = output
            .messages
            .unwrap_or_default()
            .into_iter()
            .map(convert_message)
            .collect();

        Ok(ReceiveMessageResponse {
            status: HTTP_OK,
            messages,
        })
    }

    async fn delete_message(
        &self,
        request: DeleteMessageRequest,
    ) -> Result<DeleteMessageResponse, TransportFault> {
        self.client
            .delete_message()
            .queue_url(&request.queue_url)
            .receipt_handle(&request.receipt_handle)
            .send()
            .await
            .map_err(map_sdk_error)?;

        Ok(DeleteMessageResponse { status: HTTP_OK })
    }

    async fn get_queue_url(
        &self,
        request: GetQueueUrlRequest,
    ) -> Result<GetQueueUrlResponse, TransportFault> {
        let output = self
            .client
            .get_queue_url()
            .queue_name(&request.queue_name)
            .send()
            .await
            .map_err(map_sdk_error)?;

        Ok(GetQueueUrlResponse {
            status: HTTP_OK,
            queue_url: output.queue_url.unwrap_or_default(),
        })
    }

    async fn get_queue_attributes(
        &self,
        request: GetQueueAttributesRequest,
    ) -> Result<GetQueueAttributesResponse, TransportFault> {
        let attribute_names = request
            .attribute_names
            .iter()
            .map(|name| QueueAttributeName::from(name.as_str()))
            .collect();

        let output = self
            .client
            .get_queue_attributes()
            .queue_url(&request.queue_url)
            .set_attribute_names(Some(attribute_names))
            .send()
            .await
            .map_err(map_sdk_error)?;

        let attributes = output
            .attributes
            .unwrap_or_default()
            .into_iter()
            .map(|(name, value)| (name.as_str().to_string(), value))
            .collect();

        Ok(GetQueueAttributesResponse {
            status: HTTP_OK,
            attributes,
        })
    }

    fn region(&self) -> &str {
        &self.region
    }
}

/// Convert an SDK message into the crate's received-message envelope.
fn convert_message(message: aws_sdk_sqs::types::Message) -> ReceivedMessage {
    let receive_count = message
        .attributes
        .as_ref()
        .and_then(|attributes| attributes.get(&MessageSystemAttributeName::ApproximateReceiveCount))
        .and_then(|count| count.parse().ok())
        .unwrap_or(1);

    let attributes = message
        .message_attributes
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(name, value)| value.string_value.map(|string_value| (name, string_value)))
        .collect();

    ReceivedMessage {
        message_id: message.message_id.unwrap_or_default(),
        body: message.body.unwrap_or_default(),
        receipt_handle: message.receipt_handle.unwrap_or_default(),
        attributes,
        receive_count,
    }
}

/// Map an SDK error into a transport fault, carrying the service status
/// through for service errors.
fn map_sdk_error<E>(err: SdkError<E>) -> TransportFault
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    match &err {
        SdkError::TimeoutError(_) => TransportFault::Timeout {
            message: error_chain(&err),
        },
        SdkError::DispatchFailure(failure) if failure.is_timeout() => TransportFault::Timeout {
            message: error_chain(&err),
        },
        SdkError::DispatchFailure(_) => TransportFault::Network {
            message: error_chain(&err),
        },
        SdkError::ResponseError(_) => TransportFault::Network {
            message: error_chain(&err),
        },
        SdkError::ServiceError(service_error) => TransportFault::Service {
            status: service_error.raw().status().as_u16(),
            code: err.code().unwrap_or("Unknown").to_string(),
            message: err.message().unwrap_or("unknown service error").to_string(),
        },
        SdkError::ConstructionFailure(_) => TransportFault::InvalidRequest {
            message: error_chain(&err),
        },
        _ => TransportFault::Network {
            message: error_chain(&err),
        },
    }
}

/// Render an error and its source chain as a single message.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();

    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }

    message
}
