//! Result object returned by every store action

/// `{success, data?, error?}` handed back to the view layer.
///
/// Expected failures (server errors, validation, entitlement, cancellation)
/// are reported here instead of through `Err`, so callers can render an
/// inline message and stay interactive.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T = ()> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

pub const CANCELLED_MESSAGE: &str = "Request cancelled";

impl<T> Outcome<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    pub fn cancelled() -> Self {
        Self::failed(CANCELLED_MESSAGE)
    }

    pub fn is_cancelled(&self) -> bool {
        !self.success && self.error.as_deref() == Some(CANCELLED_MESSAGE)
    }

    /// Convert into a `Result`, for callers that prefer `?`
    pub fn into_result(self) -> Result<Option<T>, String> {
        if self.success {
            Ok(self.data)
        } else {
            Err(self.error.unwrap_or_else(|| "Unknown error".to_string()))
        }
    }
}

impl Outcome<()> {
    pub fn done() -> Self {
        Self::ok(())
    }
}

impl<T> From<crate::error::Error> for Outcome<T> {
    fn from(err: crate::error::Error) -> Self {
        Self::failed(err.to_string())
    }
}
