//! Authenticated request gateway for the stockroom REST API.
//!
//! Every call goes through `ApiClient::request`, which attaches the stored
//! bearer token and turns a 401 into a forced logout before the error is
//! handed back to the caller.

use std::time::Duration;

use reqwest::{header, Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::auth::{AuthError, TokenStore};
use crate::models::User;
use crate::navigation::{LogoutReason, Navigator};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Path of the credential exchange endpoint
const LOGIN_PATH: &str = "auth/login";

/// Shown when a failed login carries no message of its own
const GENERIC_LOGIN_FAILURE: &str = "Failed to sign in.";

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: Option<String>,
    user: Option<User>,
}

#[derive(Debug, Deserialize)]
struct LoginErrorBody {
    message: Option<String>,
}

/// A successful credential exchange
#[derive(Debug, Clone)]
pub struct SignIn {
    pub token: String,
    pub user: User,
}

/// Method, extra headers and body of a gateway call.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: header::HeaderMap,
    pub body: Option<String>,
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            headers: header::HeaderMap::new(),
            body: None,
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    pub fn post<B: Serialize>(body: &B) -> Result<Self, ApiError> {
        Self::new(Method::POST).json(body)
    }

    pub fn put<B: Serialize>(body: &B) -> Result<Self, ApiError> {
        Self::new(Method::PUT).json(body)
    }

    pub fn json<B: Serialize>(mut self, body: &B) -> Result<Self, ApiError> {
        let encoded = serde_json::to_string(body)
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to encode request body: {}", e)))?;
        self.body = Some(encoded);
        Ok(self)
    }

    pub fn header(mut self, name: header::HeaderName, value: &str) -> Result<Self, ApiError> {
        self.headers.insert(name, header::HeaderValue::from_str(value)?);
        Ok(self)
    }
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::get()
    }
}

/// API client for the stockroom service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    tokens: TokenStore,
    navigator: Navigator,
}

impl ApiClient {
    /// Create a new API client rooted at `base_url`
    pub fn new(base_url: &str, tokens: TokenStore, navigator: Navigator) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
            navigator,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Exchange credentials for a token.
    ///
    /// This bypasses the gateway: a 401 here means bad credentials, not an
    /// expired session, so nothing is cleared and no redirect is raised.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SignIn, AuthError> {
        let url = self.endpoint(LOGIN_PATH);
        debug!(url = %url, "Sending login request");

        let response = self
            .client
            .post(&url)
            .json(&LoginRequest { email, password })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<LoginErrorBody>(&body)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_else(|| GENERIC_LOGIN_FAILURE.to_string());
            warn!(status = status.as_u16(), "Login rejected");
            return Err(AuthError::Authentication(message));
        }

        let parsed: LoginResponse = serde_json::from_str(&body)
            .map_err(|_| AuthError::Authentication("Malformed login response.".to_string()))?;

        let token = parsed.token.filter(|t| !t.is_empty()).ok_or_else(|| {
            AuthError::Authentication("Authentication token missing from response.".to_string())
        })?;
        let user = parsed.user.ok_or_else(|| {
            AuthError::Authentication("User missing from login response.".to_string())
        })?;

        Ok(SignIn { token, user })
    }

    /// Default headers, then the caller's, then the bearer token.
    fn request_headers(&self, overrides: header::HeaderMap) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        for (name, value) in overrides.iter() {
            headers.insert(name.clone(), value.clone());
        }
        if let Some(token) = self.tokens.read()? {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }
        Ok(headers)
    }

    /// Forced logout after the server rejected the token
    fn handle_unauthorized(&self) {
        warn!("Request unauthorized, clearing session");
        if let Err(e) = self.tokens.clear() {
            warn!(error = %e, "Failed to clear stored session");
        }
        self.navigator.redirect_to_login(LogoutReason::Unauthorized);
    }

    /// Send a request to `path` (relative to the base URL) and decode the
    /// JSON response into `T`.
    ///
    /// A 204 resolves to `T` built from an empty JSON object. The payload is
    /// trusted to match `T`; serde's decoding is the only check.
    pub async fn request<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path);
        let headers = self.request_headers(options.headers)?;

        debug!(method = %options.method, url = %url, "Sending request");
        let mut builder = self.client.request(options.method, &url).headers(headers);
        if let Some(body) = options.body {
            builder = builder.body(body);
        }
        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            if status == StatusCode::UNAUTHORIZED {
                self.handle_unauthorized();
            }
            let body = response.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), body = %ApiError::truncate_body(&body), "Request failed");
            return Err(ApiError::from_status(status, &body));
        }

        if status == StatusCode::NO_CONTENT {
            return serde_json::from_value(Value::Object(Map::new()))
                .map_err(|e| ApiError::InvalidResponse(format!("Empty response from {}: {}", url, e)));
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!(
                "Failed to parse response from {}: {} ({})",
                url,
                e,
                ApiError::truncate_body(&text)
            ))
        })
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(path, RequestOptions::get()).await
    }

    pub(crate) async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.request(path, RequestOptions::post(body)?).await
    }

    pub(crate) async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.request(path, RequestOptions::put(body)?).await
    }

    pub(crate) async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(path, RequestOptions::delete()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(base, TokenStore::in_memory(), Navigator::new()).unwrap()
    }

    #[test]
    fn test_endpoint_joins_with_single_slash() {
        assert_eq!(client("http://api.local/").endpoint("users"), "http://api.local/users");
        assert_eq!(client("http://api.local").endpoint("/users/1"), "http://api.local/users/1");
    }

    #[test]
    fn test_headers_without_token() {
        let api = client("http://api.local");
        let headers = api.request_headers(header::HeaderMap::new()).unwrap();
        assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "application/json");
        assert!(headers.get(header::AUTHORIZATION).is_none());
    }

    #[test]
    fn test_caller_headers_override_content_type() {
        let api = client("http://api.local");
        api.tokens().save("a.b.c").unwrap();

        let options = RequestOptions::get()
            .header(header::CONTENT_TYPE, "text/plain")
            .unwrap()
            .header(header::AUTHORIZATION, "Bearer other")
            .unwrap();
        let headers = api.request_headers(options.headers).unwrap();

        assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "text/plain");
        // The stored token wins over a caller-supplied Authorization
        assert_eq!(headers.get(header::AUTHORIZATION).unwrap(), "Bearer a.b.c");
    }

    #[test]
    fn test_unencodable_body_is_invalid_request() {
        // JSON object keys must be strings
        let body: std::collections::BTreeMap<(i32, i32), &str> = [((1, 2), "x")].into_iter().collect();
        let err = RequestOptions::post(&body).unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
    }

    #[test]
    fn test_request_options_body() {
        let options = RequestOptions::post(&serde_json::json!({"name": "Sal"})).unwrap();
        assert_eq!(options.method, Method::POST);
        assert_eq!(options.body.as_deref(), Some(r#"{"name":"Sal"}"#));
    }
}
