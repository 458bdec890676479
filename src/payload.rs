use serde::Serialize;
use serde_json::Value;

pub const PROBE_METHOD: &str = "chain_getBlock";
pub const PROBE_REQUEST_ID: u64 = 1;
pub const JSONRPC_VERSION: &str = "2.0";

/// Read-only JSON-RPC call sent identically over both transports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeRequest {
    pub method: String,
    pub params: Vec<Value>,
    pub id: u64,
    pub jsonrpc: String,
}

impl Default for ProbeRequest {
    fn default() -> Self {
        Self {
            method: PROBE_METHOD.to_string(),
            params: Vec::new(),
            id: PROBE_REQUEST_ID,
            jsonrpc: JSONRPC_VERSION.to_string(),
        }
    }
}

impl ProbeRequest {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// True when `message` is JSON carrying this request's `id` as a number,
    /// in any numeric spelling (`1` and `1.0` both match). Malformed input is
    /// simply not a match.
    pub fn is_response(&self, message: &[u8]) -> bool {
        serde_json::from_slice::<Value>(message)
            .ok()
            .and_then(|value| value.get("id").and_then(Value::as_f64))
            == Some(self.id as f64)
    }
}

/// A decoded body counts as data only if it has something to look into: a
/// non-empty object, array or string. Bare numbers and booleans do not.
pub fn has_data(body: &Value) -> bool {
    match body {
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::String(s) => !s.is_empty(),
        Value::Null | Value::Bool(_) | Value::Number(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_payload_shape() {
        let encoded = ProbeRequest::default().encode().expect("encode");
        let value: Value = serde_json::from_str(&encoded).expect("decode");
        assert_eq!(
            value,
            json!({"method": "chain_getBlock", "params": [], "id": 1, "jsonrpc": "2.0"})
        );
    }

    #[test]
    fn test_response_matching() {
        let request = ProbeRequest::default();
        assert!(request.is_response(br#"{"jsonrpc":"2.0","id":1,"result":{}}"#));
        assert!(request.is_response(br#"{"jsonrpc":"2.0","id":1.0,"result":{}}"#));
        assert!(!request.is_response(br#"{"jsonrpc":"2.0","id":1.5,"result":{}}"#));
        assert!(!request.is_response(br#"{"jsonrpc":"2.0","id":2,"result":{}}"#));
        assert!(!request.is_response(br#"{"jsonrpc":"2.0","id":"1"}"#));
        assert!(!request.is_response(br#"{"method":"chain_newHead","params":{}}"#));
        assert!(!request.is_response(b"not json at all"));
        assert!(!request.is_response(b""));
    }

    #[test]
    fn test_has_data() {
        assert!(has_data(&json!({"result": null})));
        assert!(has_data(&json!([1])));
        assert!(!has_data(&json!({})));
        assert!(!has_data(&json!([])));
        assert!(!has_data(&Value::Null));
        assert!(has_data(&json!("0x00")));
        assert!(!has_data(&json!("")));
        assert!(!has_data(&json!(42)));
        assert!(!has_data(&json!(0)));
        assert!(!has_data(&json!(true)));
        assert!(!has_data(&json!(false)));
    }
}
