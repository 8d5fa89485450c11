//! API client error types

use thiserror::Error;

/// Coarse classification of an [`ApiError`], for callers that need to branch
/// on what went wrong without matching message strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The server could not be reached or the connection failed mid-request
    Transport,
    /// The server answered with a non-2xx status
    Http,
    /// A 2xx body did not decode into the expected shape
    Decode,
    /// The request payload could not be built
    Payload,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{message}")]
    Status {
        status: u16,
        message: String,
    },

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid request payload: {0}")]
    Payload(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Transport(_) => ErrorKind::Transport,
            ApiError::Status { .. } => ErrorKind::Http,
            ApiError::Decode(_) => ErrorKind::Decode,
            ApiError::Payload(_) | ApiError::Io(_) => ErrorKind::Payload,
        }
    }

    /// HTTP status code, when the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_displays_server_message() {
        let err = ApiError::Status {
            status: 404,
            message: "User not found".to_string(),
        };
        assert_eq!(err.to_string(), "User not found");
        assert_eq!(err.kind(), ErrorKind::Http);
        assert_eq!(err.status(), Some(404));
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn test_unauthorized_detection() {
        let err = ApiError::Status {
            status: 401,
            message: "Not authenticated".to_string(),
        };
        assert!(err.is_unauthorized());
    }

    #[test]
    fn test_decode_error_kind() {
        let err: ApiError = serde_json::from_str::<u32>("\"x\"").unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert_eq!(err.status(), None);
    }
}
