//! Request DTOs for the cache frame
//!
//! Defines the document a pipeline stage hands to [`run_frame`](crate::frame::run_frame).

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::policy::DEFAULT_OPERATION;

/// What a frame request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameAction {
    Get,
    Set,
    Cleanup,
    Invalidate,
    /// Anything else: statistics plus the most recently used entries
    Overview,
}

/// Request document for one frame run.
///
/// ```json
/// { "operation": "set",
///   "parameters": { "operation": "file_analysis", "params": {"root": "/repo"} },
///   "data": {"files": 12} }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FrameRequest {
    /// One of `get`, `set`, `cleanup`, `invalidate`; anything else is an overview
    #[serde(default)]
    pub operation: String,
    #[serde(default)]
    pub parameters: FrameParameters,
    /// Value to cache for `set`
    #[serde(default)]
    pub data: Option<Value>,
}

/// Which cached operation a frame request targets.
#[derive(Debug, Clone, Deserialize)]
pub struct FrameParameters {
    /// Cached operation name
    #[serde(default)]
    pub operation: Option<String>,
    /// Parameter bag the key is derived from
    #[serde(default = "empty_params")]
    pub params: Value,
}

impl Default for FrameParameters {
    fn default() -> Self {
        Self {
            operation: None,
            params: empty_params(),
        }
    }
}

impl FrameParameters {
    /// Targeted operation, `"default"` when unspecified.
    pub fn target_operation(&self) -> &str {
        self.operation.as_deref().unwrap_or(DEFAULT_OPERATION)
    }
}

impl FrameRequest {
    pub fn action(&self) -> FrameAction {
        match self.operation.as_str() {
            "get" => FrameAction::Get,
            "set" => FrameAction::Set,
            "cleanup" => FrameAction::Cleanup,
            "invalidate" => FrameAction::Invalidate,
            _ => FrameAction::Overview,
        }
    }
}

fn empty_params() -> Value {
    Value::Object(Map::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_frame_request_deserialize() {
        let raw = r#"{
            "operation": "set",
            "parameters": {"operation": "file_analysis", "params": {"root": "/repo"}},
            "data": {"files": 12}
        }"#;
        let req: FrameRequest = serde_json::from_str(raw).unwrap();

        assert_eq!(req.action(), FrameAction::Set);
        assert_eq!(req.parameters.target_operation(), "file_analysis");
        assert_eq!(req.parameters.params, json!({"root": "/repo"}));
        assert_eq!(req.data, Some(json!({"files": 12})));
    }

    #[test]
    fn test_frame_request_defaults() {
        let req: FrameRequest = serde_json::from_str("{}").unwrap();

        assert_eq!(req.action(), FrameAction::Overview);
        assert_eq!(req.parameters.target_operation(), "default");
        assert!(req.parameters.operation.is_none());
        assert_eq!(req.parameters.params, json!({}));
        assert!(req.data.is_none());
    }

    #[test]
    fn test_unknown_action_is_overview() {
        let req: FrameRequest = serde_json::from_str(r#"{"operation": "stats"}"#).unwrap();
        assert_eq!(req.action(), FrameAction::Overview);
    }
}
