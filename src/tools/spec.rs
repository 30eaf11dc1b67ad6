//! Tool trait and invocation context for the Kling tool suite.

use async_trait::async_trait;
use serde_json::Value;

use crate::config::{Credentials, DEFAULT_BASE_URL};
use crate::emit::MessageSink;

/// Per-invocation context supplied by the host: credentials and the vendor
/// endpoint. Nothing here outlives or is shared across invocations.
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub credentials: Credentials,
    pub base_url: String,
}

impl ToolContext {
    #[must_use]
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Override the vendor endpoint (tests point this at a mock server).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// The trait every Kling tool implements.
///
/// `invoke` never fails at the call boundary: every error is converted into
/// messages on the sink and the invocation simply ends.
#[async_trait]
pub trait ToolSpec: Send + Sync {
    /// Unique tool name used by the host to select a tool.
    fn name(&self) -> &'static str;

    /// Human-readable description of what this tool does.
    fn description(&self) -> &'static str;

    /// JSON Schema for the tool's parameters.
    fn input_schema(&self) -> Value;

    /// Run the tool, streaming messages to the sink in order.
    async fn invoke(&self, context: &ToolContext, params: &Value, sink: &mut dyn MessageSink);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_defaults_to_the_vendor_endpoint() {
        let ctx = ToolContext::new(Credentials::new("ak", "sk"));
        assert_eq!(ctx.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn base_url_override_is_kept() {
        let ctx = ToolContext::new(Credentials::new("ak", "sk"))
            .with_base_url("http://127.0.0.1:9");
        assert_eq!(ctx.base_url, "http://127.0.0.1:9");
    }
}
