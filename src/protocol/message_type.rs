//! Classification of messages by their standard `:`-prefixed headers.

use super::message::Message;
use crate::error::{EventStreamError, Result};

/// `:message-type` header name.
pub const MESSAGE_TYPE_HEADER: &str = ":message-type";
/// `:event-type` header name.
pub const EVENT_TYPE_HEADER: &str = ":event-type";
/// `:exception-type` header name.
pub const EXCEPTION_TYPE_HEADER: &str = ":exception-type";
/// `:content-type` header name.
pub const CONTENT_TYPE_HEADER: &str = ":content-type";
/// `:error-code` header name.
pub const ERROR_CODE_HEADER: &str = ":error-code";
/// `:error-message` header name.
pub const ERROR_MESSAGE_HEADER: &str = ":error-message";

/// What kind of message a frame carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageType {
    /// A modeled event.
    Event {
        event_type: String,
        content_type: Option<String>,
    },
    /// A modeled exception.
    Exception {
        exception_type: String,
        content_type: Option<String>,
    },
    /// An unmodeled service error.
    Error {
        error_code: String,
        message: Option<String>,
    },
    /// A `:message-type` this crate does not know.
    Unknown { message_type: String },
}

impl Message {
    /// Classify this message from its headers.
    ///
    /// # Errors
    ///
    /// - `MissingHeader` if `:message-type` is absent
    /// - `InvalidMessage` if the type-specific header is absent
    /// - `HeaderType` if a header is present but not a string
    pub fn message_type(&self) -> Result<MessageType> {
        let message_type = self
            .string_header(MESSAGE_TYPE_HEADER)?
            .ok_or_else(|| EventStreamError::MissingHeader(MESSAGE_TYPE_HEADER.to_string()))?;

        match message_type {
            "event" => Ok(MessageType::Event {
                event_type: self.required_string_header("event", EVENT_TYPE_HEADER)?,
                content_type: self.string_header(CONTENT_TYPE_HEADER)?.map(str::to_owned),
            }),
            "exception" => Ok(MessageType::Exception {
                exception_type: self.required_string_header("exception", EXCEPTION_TYPE_HEADER)?,
                content_type: self.string_header(CONTENT_TYPE_HEADER)?.map(str::to_owned),
            }),
            "error" => Ok(MessageType::Error {
                error_code: self.required_string_header("error", ERROR_CODE_HEADER)?,
                message: self.string_header(ERROR_MESSAGE_HEADER)?.map(str::to_owned),
            }),
            other => Ok(MessageType::Unknown {
                message_type: other.to_owned(),
            }),
        }
    }

    fn string_header(&self, name: &str) -> Result<Option<&str>> {
        self.header(name)
            .map(|v| v.expect_string().map_err(|e| e.for_header(name)))
            .transpose()
    }

    fn required_string_header(&self, kind: &str, name: &str) -> Result<String> {
        self.string_header(name)?.map(str::to_owned).ok_or_else(|| {
            EventStreamError::InvalidMessage(format!(
                "Invalid `{}` message: `{}` header is missing",
                kind, name
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(headers: &[(&str, &str)]) -> Message {
        headers
            .iter()
            .fold(Message::builder().payload(&b"test"[..]), |b, (k, v)| {
                b.header(*k, *v)
            })
            .build()
            .unwrap()
    }

    #[test]
    fn test_event() {
        let actual = message(&[
            (":message-type", "event"),
            (":event-type", "Foo"),
            (":content-type", "application/json"),
        ])
        .message_type()
        .unwrap();

        assert_eq!(
            actual,
            MessageType::Event {
                event_type: "Foo".to_string(),
                content_type: Some("application/json".to_string()),
            }
        );
    }

    #[test]
    fn test_exception() {
        let actual = message(&[
            (":message-type", "exception"),
            (":exception-type", "BadRequestException"),
            (":content-type", "application/json"),
        ])
        .message_type()
        .unwrap();

        assert_eq!(
            actual,
            MessageType::Exception {
                exception_type: "BadRequestException".to_string(),
                content_type: Some("application/json".to_string()),
            }
        );
    }

    #[test]
    fn test_missing_exception_type() {
        let err = message(&[
            (":message-type", "exception"),
            (":content-type", "application/json"),
        ])
        .message_type()
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Invalid `exception` message: `:exception-type` header is missing"
        );
    }

    #[test]
    fn test_missing_event_type() {
        let err = message(&[(":message-type", "event")])
            .message_type()
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Invalid `event` message: `:event-type` header is missing"
        );
    }

    #[test]
    fn test_missing_message_type() {
        let err = message(&[(":event-type", "Foo")]).message_type().unwrap_err();
        assert!(matches!(err, EventStreamError::MissingHeader(_)));
    }

    #[test]
    fn test_missing_content_type() {
        let actual = message(&[(":message-type", "event"), (":event-type", "Foo")])
            .message_type()
            .unwrap();

        assert_eq!(
            actual,
            MessageType::Event {
                event_type: "Foo".to_string(),
                content_type: None,
            }
        );
    }

    #[test]
    fn test_error() {
        let actual = message(&[
            (":message-type", "error"),
            (":error-code", "InternalError"),
            (":error-message", "An internal server error occurred"),
        ])
        .message_type()
        .unwrap();

        assert_eq!(
            actual,
            MessageType::Error {
                error_code: "InternalError".to_string(),
                message: Some("An internal server error occurred".to_string()),
            }
        );
    }

    #[test]
    fn test_unknown() {
        let actual = message(&[(":message-type", "foo")]).message_type().unwrap();
        assert_eq!(
            actual,
            MessageType::Unknown {
                message_type: "foo".to_string()
            }
        );
    }

    #[test]
    fn test_non_string_message_type() {
        let message = Message::builder()
            .header(":message-type", 1i32)
            .build()
            .unwrap();
        let err = message.message_type().unwrap_err();
        assert!(matches!(
            &err,
            EventStreamError::HeaderType { name: Some(name), .. } if name == ":message-type"
        ));
        assert_eq!(
            err.to_string(),
            "expected HeaderValue::String, found: Int32 (header `:message-type`)"
        );
    }
}
