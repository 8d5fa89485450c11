//! REST API access
//!
//! One client, one error type, one payload type. The client follows a single
//! discipline: any transport failure or non-2xx status is an `Err`.

pub mod client;
pub mod errors;
pub mod payload;
pub mod token;
pub mod types;

pub use client::{ApiClient, LOGIN_ENDPOINT};
pub use errors::{ApiError, ApiResult, ErrorKind};
pub use payload::{MultipartBody, MultipartPart, Payload};
pub use token::{FileTokenStore, MemoryTokenStore, TokenStore, ACCESS_TOKEN_KEY};
pub use types::{ApiResponse, TokenResponse};
