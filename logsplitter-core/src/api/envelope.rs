//! The `{success, data, error, code}` envelope every endpoint speaks

use serde::{Deserialize, Serialize};

/// Code attached to transport failures and non-2xx responses
pub const API_ERROR: &str = "API_ERROR";
/// Code attached to bodies that are not JSON or do not match the expected shape
pub const INVALID_JSON: &str = "INVALID_JSON";

pub const INVALID_JSON_MESSAGE: &str = "Invalid JSON response";

/// Normalized outcome of one API call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default = "none")]
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

// `#[serde(default)]` on `Option<T>` would require `T: Default`.
fn none<T>() -> Option<T> {
    None
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            code: None,
            message: None,
        }
    }

    pub fn failure(error: impl Into<String>, code: &str) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            code: Some(code.to_string()),
            message: None,
        }
    }

    pub fn invalid_json() -> Self {
        Self::failure(INVALID_JSON_MESSAGE, INVALID_JSON)
    }

    /// Successful response that actually carries a payload
    pub fn into_data(self) -> Option<T> {
        if self.success {
            self.data
        } else {
            None
        }
    }

    /// Server-provided error, or `fallback` when the server gave none
    pub fn error_or(&self, fallback: &str) -> String {
        self.error
            .clone()
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| fallback.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Thing {
        n: u32,
    }

    #[test]
    fn test_deserialize_success_envelope() {
        let res: ApiResponse<Thing> =
            serde_json::from_str(r#"{"success":true,"data":{"n":3}}"#).unwrap();
        assert_eq!(res.into_data(), Some(Thing { n: 3 }));
    }

    #[test]
    fn test_deserialize_failure_envelope_without_data() {
        let res: ApiResponse<Thing> =
            serde_json::from_str(r#"{"success":false,"error":"nope","code":"FORBIDDEN"}"#).unwrap();
        assert!(!res.success);
        assert_eq!(res.error_or("fallback"), "nope");
        assert_eq!(res.code.as_deref(), Some("FORBIDDEN"));
    }

    #[test]
    fn test_error_or_uses_fallback() {
        let res: ApiResponse<Thing> = ApiResponse {
            success: false,
            data: None,
            error: Some(String::new()),
            code: None,
            message: None,
        };
        assert_eq!(res.error_or("Failed to fetch"), "Failed to fetch");
    }
}
