//! HTTP client wrapper for the LogSplitter REST API
//!
//! Performs exactly one request and folds every outcome (transport failure,
//! non-2xx status, empty or malformed body) into an [`ApiResponse`]. Nothing
//! here returns `Err` to the caller, retries, or caches.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::config::ApiConfig;
use crate::error::{Error, Result};

use super::envelope::{ApiResponse, API_ERROR, INVALID_JSON, INVALID_JSON_MESSAGE};

/// A file attached as one multipart form field
#[derive(Debug, Clone)]
pub struct MultipartFile {
    pub field: String,
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
enum Body {
    Json(Value),
    Multipart(MultipartFile),
    /// Body serialization failed; reported when the request is sent
    Invalid(String),
}

/// Description of a single API request
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    endpoint: String,
    body: Option<Body>,
    headers: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            body: None,
            headers: Vec::new(),
        }
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(Method::GET, endpoint)
    }

    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(Method::POST, endpoint)
    }

    pub fn put(endpoint: impl Into<String>) -> Self {
        Self::new(Method::PUT, endpoint)
    }

    pub fn delete(endpoint: impl Into<String>) -> Self {
        Self::new(Method::DELETE, endpoint)
    }

    /// Attach a JSON body
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Self {
        self.body = Some(match serde_json::to_value(body) {
            Ok(value) => Body::Json(value),
            Err(e) => Body::Invalid(e.to_string()),
        });
        self
    }

    /// Attach a multipart form with a single file field
    pub fn multipart(mut self, file: MultipartFile) -> Self {
        self.body = Some(Body::Multipart(file));
        self
    }

    /// Add a request header. A caller-supplied `Content-Type` wins over the
    /// JSON default.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn has_content_type(&self) -> bool {
        self.headers
            .iter()
            .any(|(k, _)| k.eq_ignore_ascii_case(CONTENT_TYPE.as_str()))
    }
}

/// Low-level HTTP client
#[derive(Debug, Clone)]
pub struct HttpClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpClient {
    /// Create a new client from configuration
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http_client = builder
            .build()
            .map_err(|e| Error::Http(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve a relative endpoint against the base URL; absolute URLs pass through
    pub fn resolve(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else if endpoint.starts_with('/') {
            format!("{}{}", self.base_url, endpoint)
        } else {
            format!("{}/{}", self.base_url, endpoint)
        }
    }

    /// Perform one request, optionally with a bearer token.
    pub async fn send<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
        token: Option<&str>,
    ) -> ApiResponse<T> {
        let url = self.resolve(&request.endpoint);
        let method = request.method.clone();

        let builder = match self.build(request, &url, token) {
            Ok(builder) => builder,
            Err(e) => {
                tracing::warn!(method = %method, url = %url, error = %e, "Failed to build request");
                return ApiResponse::failure(e.to_string(), API_ERROR);
            }
        };

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(method = %method, url = %url, error = %e, "HTTP request failed");
                return ApiResponse::failure(e.to_string(), API_ERROR);
            }
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(method = %method, url = %url, error = %e, "Failed to read response body");
                return ApiResponse::failure(e.to_string(), API_ERROR);
            }
        };

        tracing::debug!(method = %method, url = %url, status = status.as_u16(), "API call completed");
        normalize(status.as_u16(), status.is_success(), &text)
    }

    fn build(
        &self,
        request: ApiRequest,
        url: &str,
        token: Option<&str>,
    ) -> Result<reqwest::RequestBuilder> {
        let mut headers = HeaderMap::new();
        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::Http(format!("invalid header name {}: {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::Http(format!("invalid header value: {}", e)))?;
            headers.insert(name, value);
        }

        let json_default = matches!(request.body, Some(Body::Json(_))) && !request.has_content_type();
        if json_default {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        if let Some(token) = token.filter(|t| !t.is_empty()) {
            let auth_value = format!("Bearer {}", token);
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&auth_value)
                    .map_err(|_| Error::Http("invalid bearer token".to_string()))?,
            );
        }

        let mut builder = self
            .http_client
            .request(request.method, url)
            .headers(headers);

        builder = match request.body {
            None => builder,
            Some(Body::Json(value)) => builder.body(value.to_string()),
            Some(Body::Multipart(file)) => {
                let part = reqwest::multipart::Part::bytes(file.bytes).file_name(file.filename);
                builder.multipart(reqwest::multipart::Form::new().part(file.field, part))
            }
            Some(Body::Invalid(msg)) => {
                return Err(Error::Http(format!("failed to serialize request body: {}", msg)))
            }
        };

        Ok(builder)
    }
}

/// Fold a status and raw body into the envelope.
fn normalize<T: DeserializeOwned>(status: u16, is_success: bool, text: &str) -> ApiResponse<T> {
    let data: Option<Value> = if text.is_empty() {
        None
    } else {
        Some(serde_json::from_str(text).unwrap_or_else(|_| {
            serde_json::json!({
                "success": false,
                "error": INVALID_JSON_MESSAGE,
                "code": INVALID_JSON,
            })
        }))
    };

    if !is_success {
        let message = data
            .as_ref()
            .and_then(|d| d.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("Request failed ({})", status));
        return ApiResponse::failure(message, API_ERROR);
    }

    match data {
        Some(value) if value.is_object() && value.get("success").is_some() => {
            serde_json::from_value(value).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Response envelope did not match expected shape");
                ApiResponse::invalid_json()
            })
        }
        Some(value) => match serde_json::from_value::<Option<T>>(value) {
            Ok(data) => ApiResponse {
                success: true,
                data,
                error: None,
                code: None,
                message: None,
            },
            Err(e) => {
                tracing::warn!(error = %e, "Unwrapped response did not match expected shape");
                ApiResponse::invalid_json()
            }
        },
        None => ApiResponse {
            success: true,
            data: None,
            error: None,
            code: None,
            message: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: String,
    }

    fn client() -> HttpClient {
        HttpClient::new(&ApiConfig {
            base_url: "https://api.example.com/".to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_client_requires_valid_config() {
        let config = ApiConfig {
            base_url: "mailto:ops@example.com".to_string(),
            ..Default::default()
        };
        assert!(HttpClient::new(&config).is_err());
    }

    #[test]
    fn test_resolve_relative_and_absolute() {
        let client = client();
        assert_eq!(client.resolve("/api/uploads"), "https://api.example.com/api/uploads");
        assert_eq!(client.resolve("api/uploads"), "https://api.example.com/api/uploads");
        assert_eq!(client.resolve("https://other.test/x"), "https://other.test/x");
    }

    #[test]
    fn test_normalize_passes_envelope_through() {
        let res: ApiResponse<Item> =
            normalize(200, true, r#"{"success":true,"data":{"id":"a"}}"#);
        assert_eq!(res.into_data(), Some(Item { id: "a".to_string() }));

        // A 2xx body that reports failure is trusted as-is
        let res: ApiResponse<Item> =
            normalize(200, true, r#"{"success":false,"error":"quota","code":"LIMIT"}"#);
        assert!(!res.success);
        assert_eq!(res.code.as_deref(), Some("LIMIT"));
    }

    #[test]
    fn test_normalize_wraps_raw_payload() {
        let res: ApiResponse<Item> = normalize(200, true, r#"{"id":"raw"}"#);
        assert!(res.success);
        assert_eq!(res.data, Some(Item { id: "raw".to_string() }));
    }

    #[test]
    fn test_normalize_empty_body_is_null_data() {
        let res: ApiResponse<Item> = normalize(204, true, "");
        assert!(res.success);
        assert!(res.data.is_none());
    }

    #[test]
    fn test_normalize_error_status() {
        let res: ApiResponse<Item> = normalize(403, false, r#"{"success":false,"error":"Forbidden plan"}"#);
        assert_eq!(res.error.as_deref(), Some("Forbidden plan"));
        assert_eq!(res.code.as_deref(), Some(API_ERROR));

        let res: ApiResponse<Item> = normalize(502, false, "");
        assert_eq!(res.error.as_deref(), Some("Request failed (502)"));
        assert_eq!(res.code.as_deref(), Some(API_ERROR));
    }

    #[test]
    fn test_normalize_invalid_json() {
        let res: ApiResponse<Item> = normalize(200, true, "<html>oops</html>");
        assert!(!res.success);
        assert_eq!(res.error.as_deref(), Some(INVALID_JSON_MESSAGE));
        assert_eq!(res.code.as_deref(), Some(INVALID_JSON));
    }

    #[test]
    fn test_normalize_unexpected_shape() {
        let res: ApiResponse<Item> = normalize(200, true, r#"{"success":true,"data":{"id":7}}"#);
        assert_eq!(res.code.as_deref(), Some(INVALID_JSON));
    }

    #[test]
    fn test_request_content_type_detection() {
        let req = ApiRequest::post("/x").header("content-type", "text/plain");
        assert!(req.has_content_type());
        assert!(!ApiRequest::get("/x").has_content_type());
    }
}
