//! Ordered message stream emitted by tool invocations.
//!
//! Each invocation pushes messages to a single consumer in emission order:
//! human-readable text, the raw JSON envelope, and (for video downloads)
//! binary blobs. Ordering is part of the contract.

use serde_json::Value;

/// One message in the invocation's output stream.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolMessage {
    Text(String),
    Json(Value),
    Blob {
        mime_type: String,
        filename: String,
        bytes: Vec<u8>,
    },
}

/// Push-style consumer of a tool's message stream.
pub trait MessageSink: Send {
    fn emit(&mut self, message: ToolMessage);
}

impl dyn MessageSink + '_ {
    pub fn text(&mut self, message: impl Into<String>) {
        self.emit(ToolMessage::Text(message.into()));
    }

    pub fn json(&mut self, value: Value) {
        self.emit(ToolMessage::Json(value));
    }

    pub fn blob(&mut self, mime_type: impl Into<String>, filename: impl Into<String>, bytes: Vec<u8>) {
        self.emit(ToolMessage::Blob {
            mime_type: mime_type.into(),
            filename: filename.into(),
            bytes,
        });
    }
}

impl MessageSink for Vec<ToolMessage> {
    fn emit(&mut self, message: ToolMessage) {
        self.push(message);
    }
}

/// Text content of every `Text` message, in order.
#[must_use]
pub fn text_lines(messages: &[ToolMessage]) -> Vec<&str> {
    messages
        .iter()
        .filter_map(|m| match m {
            ToolMessage::Text(s) => Some(s.as_str()),
            _ => None,
        })
        .collect()
}
