//! Tests for message types.

use super::*;

fn message_with_attributes(attributes: HashMap<String, String>) -> ReceivedMessage {
    ReceivedMessage {
        message_id: "message-1".to_string(),
        body: "{}".to_string(),
        receipt_handle: "receipt-1".to_string(),
        attributes,
        receive_count: 1,
    }
}

#[test]
fn test_message_type_returns_attribute_value() {
    let mut attributes = HashMap::new();
    attributes.insert(
        MESSAGE_TYPE_ATTRIBUTE.to_string(),
        "order_created".to_string(),
    );

    let message = message_with_attributes(attributes);

    assert_eq!(message.message_type(), Some("order_created"));
}

#[test]
fn test_message_type_absent_when_attribute_missing() {
    let message = message_with_attributes(HashMap::new());

    assert_eq!(message.message_type(), None);
}

#[test]
fn test_message_type_key_match_is_case_sensitive() {
    let mut attributes = HashMap::new();
    attributes.insert("messagetype".to_string(), "order_created".to_string());

    let message = message_with_attributes(attributes);

    assert_eq!(message.message_type(), None);
}

#[test]
fn test_message_type_ignores_other_attributes() {
    let mut attributes = HashMap::new();
    attributes.insert("TraceId".to_string(), "abc-123".to_string());
    attributes.insert(
        MESSAGE_TYPE_ATTRIBUTE.to_string(),
        "order_created".to_string(),
    );

    let message = message_with_attributes(attributes);

    assert_eq!(message.message_type(), Some("order_created"));
}
