//! Deterministic offline caller.

use async_trait::async_trait;
use std::time::Duration;

use super::{CallError, ModelCaller};

/// Latency reported for every stub call.
pub const STUB_LATENCY: Duration = Duration::from_millis(100);

/// Fixed response returned by the stub.
const STUB_RESPONSE: &str = r#"{"summary":"Customer requests billing help for recent charges.","category":"Billing","priority":"Medium","queue":"Billing Ops","confidence":0.92,"needs_human_review":false}"#;

/// Caller used when no usable credential is configured.
///
/// Always returns the same billing classification and never touches the
/// network.
#[derive(Debug, Clone, Default)]
pub struct StubCaller;

impl StubCaller {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ModelCaller for StubCaller {
    async fn invoke(
        &self,
        _prompt: &str,
        _system_prompt: &str,
        _timeout: Duration,
    ) -> Result<String, CallError> {
        Ok(STUB_RESPONSE.to_string())
    }

    fn name(&self) -> &str {
        "stub"
    }

    fn simulated_latency(&self) -> Option<Duration> {
        Some(STUB_LATENCY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stub_is_deterministic() {
        let stub = StubCaller::new();
        let a = stub.invoke("ticket one", "sys", Duration::from_secs(1)).await.unwrap();
        let b = stub.invoke("ticket two", "sys", Duration::from_secs(1)).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_stub_payload_is_billing() {
        let raw = StubCaller::new()
            .invoke("help", "sys", Duration::from_secs(1))
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["category"], "Billing");
        assert_eq!(value["queue"], "Billing Ops");
        assert_eq!(value["confidence"], 0.92);
        assert_eq!(value["needs_human_review"], false);
    }
}
