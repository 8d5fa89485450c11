//! HTTP client for the marketplace REST API

use std::sync::Arc;

use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::errors::{ApiError, ApiResult};
use super::payload::Payload;
use super::token::TokenStore;
use super::types::TokenResponse;
use crate::config::Config;

/// Endpoint that exchanges credentials for a bearer token
pub const LOGIN_ENDPOINT: &str = "/auth/token";

/// Thin wrapper over `reqwest` that attaches the stored bearer token and
/// turns every non-2xx answer into an [`ApiError`]
///
/// There are no retries, no cancellation and no caching here. Callers that
/// need de-duplication or stale-response protection layer it on top
/// (see [`crate::query::RequestSequencer`]).
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
}

impl ApiClient {
    /// Create a client from application configuration
    pub fn new(config: &Config, tokens: Arc<dyn TokenStore>) -> ApiResult<Self> {
        let mut builder = Client::builder().user_agent(&config.http.user_agent);
        if let Some(timeout) = config.http_timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    /// Create a client with default HTTP settings
    pub fn with_base_url(base_url: &str, tokens: Arc<dyn TokenStore>) -> ApiResult<Self> {
        Ok(Self {
            client: Client::builder().build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for an endpoint path
    pub fn url(&self, endpoint: &str) -> String {
        if endpoint.starts_with('/') {
            format!("{}{}", self.base_url, endpoint)
        } else {
            format!("{}/{}", self.base_url, endpoint)
        }
    }

    /// Build the request without sending it
    pub fn build_request(
        &self,
        method: Method,
        endpoint: &str,
        payload: Payload,
    ) -> ApiResult<reqwest::Request> {
        let mut builder = self.client.request(method, self.url(endpoint));

        if let Some(token) = self.tokens.load()? {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        Ok(payload.apply(builder)?.build()?)
    }

    /// Send a request and decode the JSON answer
    pub async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        payload: Payload,
    ) -> ApiResult<T> {
        let request = self.build_request(method.clone(), endpoint, payload)?;
        debug!("{} {}", method, endpoint);

        let response = match self.client.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!("{} {} failed: {}", method, endpoint, e);
                return Err(ApiError::Transport(e));
            }
        };

        let result = handle_response(response).await;
        if let Err(ref e) = result {
            warn!("{} {} -> {}", method, endpoint, e);
        }
        result
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> ApiResult<T> {
        self.send(Method::GET, endpoint, Payload::Empty).await
    }

    pub async fn post<T: DeserializeOwned>(&self, endpoint: &str, payload: Payload) -> ApiResult<T> {
        self.send(Method::POST, endpoint, payload).await
    }

    pub async fn put<T: DeserializeOwned>(&self, endpoint: &str, payload: Payload) -> ApiResult<T> {
        self.send(Method::PUT, endpoint, payload).await
    }

    pub async fn patch<T: DeserializeOwned>(&self, endpoint: &str, payload: Payload) -> ApiResult<T> {
        self.send(Method::PATCH, endpoint, payload).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> ApiResult<T> {
        self.send(Method::DELETE, endpoint, Payload::Empty).await
    }

    /// Exchange credentials for a token and persist it
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<TokenResponse> {
        let payload = Payload::form([("username", username), ("password", password)]);
        let token: TokenResponse = self.post(LOGIN_ENDPOINT, payload).await?;
        self.tokens.save(&token.access_token)?;
        info!("Logged in as {}", username);
        Ok(token)
    }

    /// Forget the stored token. The server keeps no session to end.
    pub fn logout(&self) -> ApiResult<()> {
        self.tokens.clear()?;
        info!("Logged out");
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.tokens.load(), Ok(Some(_)))
    }
}

/// Turn a response into a decoded body or a status error
async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ApiResult<T> {
    let status = response.status();
    let bytes = response.bytes().await?;

    if !status.is_success() {
        return Err(ApiError::Status {
            status: status.as_u16(),
            message: error_message(status, &bytes),
        });
    }

    decode_body(status, &bytes)
}

/// Decode a 2xx body; an empty body or 204 becomes `{}` (or `null` when the
/// target type does not accept a map)
pub(crate) fn decode_body<T: DeserializeOwned>(status: StatusCode, bytes: &[u8]) -> ApiResult<T> {
    let is_blank = bytes.iter().all(|b| b.is_ascii_whitespace());
    if status == StatusCode::NO_CONTENT || is_blank {
        return serde_json::from_value(Value::Object(serde_json::Map::new()))
            .or_else(|_| serde_json::from_value(Value::Null))
            .map_err(ApiError::from);
    }
    Ok(serde_json::from_slice(bytes)?)
}

/// Best-effort server message: `detail`, then `message`, then a generic line
pub(crate) fn error_message(status: StatusCode, bytes: &[u8]) -> String {
    let generic = || {
        format!(
            "Request failed with status {} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("")
        )
        .trim_end()
        .to_string()
    };

    let Ok(body) = serde_json::from_slice::<Value>(bytes) else {
        return generic();
    };

    match body.get("detail") {
        Some(Value::String(detail)) if !detail.is_empty() => return detail.clone(),
        // FastAPI validation errors: [{"loc": [...], "msg": "...", "type": "..."}]
        Some(Value::Array(items)) if !items.is_empty() => {
            let messages: Vec<String> = items
                .iter()
                .map(|item| match item.get("msg").and_then(Value::as_str) {
                    Some(msg) => {
                        let field = item
                            .get("loc")
                            .and_then(Value::as_array)
                            .and_then(|loc| loc.last())
                            .and_then(Value::as_str);
                        match field {
                            Some(field) => format!("{}: {}", field, msg),
                            None => msg.to_string(),
                        }
                    }
                    None => item.to_string(),
                })
                .collect();
            return messages.join("; ");
        }
        Some(detail @ Value::Object(_)) => return detail.to_string(),
        _ => {}
    }

    match body.get("message").and_then(Value::as_str) {
        Some(message) if !message.is_empty() => message.to_string(),
        _ => generic(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::errors::ErrorKind;
    use crate::api::payload::MultipartBody;
    use crate::api::token::MemoryTokenStore;
    use reqwest::header::CONTENT_TYPE;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn client_with(store: MemoryTokenStore, base_url: &str) -> ApiClient {
        ApiClient::with_base_url(base_url, Arc::new(store)).unwrap()
    }

    /// Accept one connection, answer with the given status line and body, and
    /// hand back the raw request text
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|line| {
                            let lower = line.to_ascii_lowercase();
                            lower
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                        })
                        .unwrap_or(0);
                    if request.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).to_string()
        });

        (format!("http://{}", addr), handle)
    }

    #[test]
    fn test_json_payload_without_token() {
        let client = client_with(MemoryTokenStore::new(), "http://localhost:8000");
        let request = client
            .build_request(Method::POST, "/admin/users", Payload::Json(json!({"a": 1})))
            .unwrap();

        assert_eq!(request.url().as_str(), "http://localhost:8000/admin/users");
        assert!(request.headers().get(AUTHORIZATION).is_none());
        assert_eq!(request.headers().get(CONTENT_TYPE).unwrap(), "application/json");
        let body = request.body().and_then(|b| b.as_bytes()).unwrap();
        assert_eq!(body, br#"{"a":1}"#);
    }

    #[test]
    fn test_bearer_token_attached() {
        let client = client_with(MemoryTokenStore::with_token("tok-1"), "http://api.test/");
        let request = client.build_request(Method::GET, "/mechanics", Payload::Empty).unwrap();

        assert_eq!(request.url().as_str(), "http://api.test/mechanics");
        assert_eq!(request.headers().get(AUTHORIZATION).unwrap(), "Bearer tok-1");
        assert!(request.headers().get(CONTENT_TYPE).is_none());
        assert!(request.body().is_none());
    }

    #[test]
    fn test_url_encoded_payload() {
        let client = client_with(MemoryTokenStore::new(), "http://api.test");
        let payload = Payload::form([("username", "admin"), ("password", "secret")]);
        let request = client.build_request(Method::POST, LOGIN_ENDPOINT, payload).unwrap();

        assert_eq!(
            request.headers().get(CONTENT_TYPE).unwrap(),
            "application/x-www-form-urlencoded"
        );
        let body = request.body().and_then(|b| b.as_bytes()).unwrap();
        assert_eq!(body, b"username=admin&password=secret");
    }

    #[test]
    fn test_multipart_content_type_left_to_transport() {
        let client = client_with(MemoryTokenStore::new(), "http://api.test");
        let body = MultipartBody::new().text("first_name", "Sam");
        let request = client
            .build_request(Method::POST, "/mechanics/register", Payload::Multipart(body))
            .unwrap();

        let content_type = request
            .headers()
            .get(CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(content_type.starts_with("multipart/form-data; boundary="));
    }

    #[test]
    fn test_error_message_precedence() {
        let status = StatusCode::BAD_REQUEST;
        assert_eq!(error_message(status, br#"{"detail":"Bad email"}"#), "Bad email");
        assert_eq!(error_message(status, br#"{"message":"Nope"}"#), "Nope");
        assert_eq!(
            error_message(status, b"<html>oops</html>"),
            "Request failed with status 400 Bad Request"
        );
        assert_eq!(
            error_message(
                StatusCode::UNPROCESSABLE_ENTITY,
                br#"{"detail":[{"loc":["body","email"],"msg":"field required","type":"missing"}]}"#
            ),
            "email: field required"
        );
    }

    #[test]
    fn test_blank_body_decodes() {
        let value: Value = decode_body(StatusCode::NO_CONTENT, b"").unwrap();
        assert_eq!(value, json!({}));
        let unit: () = decode_body(StatusCode::OK, b"  ").unwrap();
        assert_eq!(unit, ());
    }

    #[tokio::test]
    async fn test_status_error_uses_server_detail() {
        let (base_url, server) = serve_once("404 Not Found", r#"{"detail":"User not found"}"#).await;
        let client = client_with(MemoryTokenStore::new(), &base_url);

        let err = client.get::<Value>("/auth/users/id/42").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Http);
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.to_string(), "User not found");

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /auth/users/id/42 HTTP/1.1"));
    }

    #[tokio::test]
    async fn test_post_sends_json_and_token() {
        let (base_url, server) = serve_once("201 Created", r#"{"id":"u1"}"#).await;
        let client = client_with(MemoryTokenStore::with_token("secret-token"), &base_url);

        let created: Value = client
            .post("/admin/users", Payload::Json(json!({"a": 1})))
            .await
            .unwrap();
        assert_eq!(created, json!({"id": "u1"}));

        let request = server.await.unwrap();
        let lower = request.to_ascii_lowercase();
        assert!(lower.contains("authorization: bearer secret-token"));
        assert!(lower.contains("content-type: application/json"));
        assert!(request.ends_with(r#"{"a":1}"#));
    }

    #[tokio::test]
    async fn test_login_persists_token() {
        let (base_url, server) =
            serve_once("200 OK", r#"{"access_token":"fresh","token_type":"bearer"}"#).await;
        let client = client_with(MemoryTokenStore::new(), &base_url);

        let token = client.login("admin", "pw").await.unwrap();
        assert_eq!(token.access_token, "fresh");
        assert!(client.is_authenticated());

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /auth/token HTTP/1.1"));
        assert!(request.ends_with("username=admin&password=pw"));

        client.logout().unwrap();
        assert!(!client.is_authenticated());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client_with(MemoryTokenStore::new(), &format!("http://{}", addr));
        let err = client.get::<Value>("/mechanics").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
    }
}
