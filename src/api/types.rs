//! Shared API response shapes

use serde::{Deserialize, Serialize};

use super::errors::ApiResult;

/// Uniform response envelope
///
/// The client itself returns `Result`s; this envelope is for consumers that
/// want a single resolved shape, such as the CLI's raw JSON output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            message: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            data: None,
            error: Some(error.into()),
            message: None,
        }
    }

    pub fn from_result(result: ApiResult<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::failed(e.to_string()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Body of a successful `/auth/token` call
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;

    #[test]
    fn test_envelope_from_error() {
        let response: ApiResponse<u32> = ApiResponse::from_result(Err(ApiError::Status {
            status: 400,
            message: "Email already registered".to_string(),
        }));
        assert!(!response.is_ok());
        assert_eq!(response.error.as_deref(), Some("Email already registered"));

        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"error":"Email already registered"}"#);
    }

    #[test]
    fn test_envelope_from_data() {
        let response = ApiResponse::from_result(Ok(vec![1, 2]));
        assert!(response.is_ok());
        assert_eq!(serde_json::to_string(&response).unwrap(), r#"{"data":[1,2]}"#);
    }
}
