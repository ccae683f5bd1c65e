//! Storefront backend API client.
//!
//! Every call goes through [`ApiClient::request`], which attaches the stored
//! bearer credential, and on a 401 renews the session once and retries. The
//! endpoint wrappers live in the submodules, grouped by resource.

mod auth;
mod cart;
mod catalog;
mod renewal;
mod reviews;

use std::sync::Arc;

use futures::FutureExt;
use reqwest::Method;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::Value;
use storefront_core::Storage;
use tracing::{debug, instrument, warn};

use self::renewal::{RenewalSlot, refresh_session};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::session::{SessionStore, User};

/// A single backend call: method, extra headers, and optional JSON body.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// HTTP method.
    pub method: Method,
    /// Extra headers. They override the default `Content-Type` but never the
    /// bearer credential.
    pub headers: HeaderMap,
    /// JSON body.
    pub body: Option<Value>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::get()
    }
}

impl RequestOptions {
    /// A bodiless GET.
    #[must_use]
    pub fn get() -> Self {
        Self {
            method: Method::GET,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// A POST with a JSON body.
    #[must_use]
    pub fn post(body: Value) -> Self {
        Self::get().method(Method::POST).body(body)
    }

    /// A PATCH with a JSON body.
    #[must_use]
    pub fn patch(body: Value) -> Self {
        Self::get().method(Method::PATCH).body(body)
    }

    /// A bodiless DELETE.
    #[must_use]
    pub fn delete() -> Self {
        Self::get().method(Method::DELETE)
    }

    /// Replace the HTTP method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Attach a JSON body.
    #[must_use]
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Add a header, replacing any earlier value for `name`.
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// Storefront backend API client.
///
/// Cheap to clone; clones share the HTTP connection pool, the session, and
/// the pending-renewal slot.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    /// Backend origin without a trailing slash.
    origin: String,
    session: SessionStore,
    renewal: RenewalSlot,
}

impl ApiClient {
    /// Create a client for the configured backend, keeping session state in
    /// `storage`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Transport` if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig, storage: Arc<dyn Storage>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        let client = builder.build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                origin: config.origin(),
                session: SessionStore::new(storage),
                renewal: RenewalSlot::default(),
            }),
        })
    }

    /// Session slots backing this client.
    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    /// Whether an access credential is stored.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.session.is_authenticated()
    }

    /// The cached signed-in user.
    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.inner.session.current_user()
    }

    /// Perform a backend call.
    ///
    /// Returns the decoded JSON body, or `None` for 204 and empty bodies. A 401
    /// with `allow_retry` renews the session (joining any renewal already in
    /// flight) and retries exactly once.
    ///
    /// # Errors
    ///
    /// - `ClientError::AuthExpired` if renewal fails or the retried request is
    ///   rejected again; stored credentials are cleared first.
    /// - `ClientError::Http` for any other non-success status.
    /// - `ClientError::Transport` / `ClientError::Decode` for transport and
    ///   body failures.
    #[instrument(skip(self, options), fields(method = %options.method))]
    pub async fn request(
        &self,
        path: &str,
        options: &RequestOptions,
        allow_retry: bool,
    ) -> Result<Option<Value>> {
        let token = self.inner.session.access_token();
        let response = self.send(path, options, token.as_ref()).await?;

        if response.status() != StatusCode::UNAUTHORIZED || !allow_retry {
            return read_body(response).await;
        }

        debug!("Access token rejected, renewing session");
        let token = match self.renew_session().await {
            Ok(token) => token,
            Err(e) => {
                debug!(error = %e, "Renewal failed");
                return Err(ClientError::AuthExpired);
            }
        };

        let retried = self.send(path, options, Some(&token)).await?;
        if retried.status() == StatusCode::UNAUTHORIZED {
            warn!("Renewed access token was rejected, clearing session");
            self.inner.session.clear();
            return Err(ClientError::AuthExpired);
        }

        read_body(retried).await
    }

    async fn send(
        &self,
        path: &str,
        options: &RequestOptions,
        token: Option<&SecretString>,
    ) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.inner.origin, path);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (name, value) in &options.headers {
            headers.insert(name.clone(), value.clone());
        }
        if let Some(token) = token {
            // Opaque credential; skip the header rather than fail if it is
            // not a legal header value.
            match HeaderValue::from_str(&format!("Bearer {}", token.expose_secret())) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => warn!("Stored access token is not a valid header value"),
            }
        }

        let mut request = self
            .inner
            .client
            .request(options.method.clone(), &url)
            .headers(headers);
        if let Some(body) = &options.body {
            request = request.body(serde_json::to_vec(body)?);
        }

        Ok(request.send().await?)
    }

    async fn renew_session(&self) -> renewal::RenewalResult {
        let renewal = self
            .inner
            .renewal
            .get_or_start(|| {
                refresh_session(
                    self.inner.client.clone(),
                    format!("{}/auth/refresh", self.inner.origin),
                    self.inner.session.clone(),
                )
                .boxed()
            })
            .await;

        renewal.await
    }

    async fn get(&self, path: &str) -> Result<Option<Value>> {
        self.request(path, &RequestOptions::get(), true).await
    }
}

/// Turn a response into its JSON body, or an error for non-success statuses.
async fn read_body(response: reqwest::Response) -> Result<Option<Value>> {
    let status = response.status();
    if status == StatusCode::NO_CONTENT {
        return Ok(None);
    }

    let bytes = response.bytes().await?;

    if !status.is_success() {
        let body = serde_json::from_slice::<Value>(&bytes).ok();
        return Err(ClientError::Http {
            status: status.as_u16(),
            message: error_message(status, body.as_ref()),
        });
    }

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    Ok(Some(serde_json::from_slice(&bytes)?))
}

/// `error`, then `message`, from the body; otherwise a generic fallback.
fn error_message(status: StatusCode, body: Option<&Value>) -> String {
    body.and_then(|body| {
        ["error", "message"]
            .iter()
            .filter_map(|key| body.get(*key))
            .find_map(|value| match value {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                Value::Null | Value::String(_) => None,
                other => Some(other.to_string()),
            })
    })
    .unwrap_or_else(|| format!("error {}", status.as_u16()))
}

/// Append URL-encoded query parameters to a path.
pub(crate) fn with_query(path: &str, params: &[(&str, &str)]) -> String {
    if params.is_empty() {
        return path.to_string();
    }

    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish();
    format!("{path}?{query}")
}

/// Decode an optional body into a list; absent and `null` bodies are empty.
pub(crate) fn list_from<T: DeserializeOwned>(data: Option<Value>) -> Result<Vec<T>> {
    match data {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => Ok(serde_json::from_value(value)?),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_with_query() {
        assert_eq!(with_query("/products", &[]), "/products");
        assert_eq!(
            with_query("/products", &[("q", "blue shirt"), ("page", "2")]),
            "/products?q=blue+shirt&page=2"
        );
        assert_eq!(with_query("/cart/p1", &[("size", "L&XL")]), "/cart/p1?size=L%26XL");
    }

    #[test]
    fn test_error_message_prefers_error_field() {
        let body = json!({"error": "Out of stock", "message": "ignored"});
        assert_eq!(
            error_message(StatusCode::CONFLICT, Some(&body)),
            "Out of stock"
        );

        let body = json!({"message": "Invalid credentials"});
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, Some(&body)),
            "Invalid credentials"
        );
    }

    #[test]
    fn test_error_message_fallback() {
        assert_eq!(
            error_message(StatusCode::INTERNAL_SERVER_ERROR, None),
            "error 500"
        );
        let body = json!({"error": null});
        assert_eq!(
            error_message(StatusCode::NOT_FOUND, Some(&body)),
            "error 404"
        );
    }

    #[test]
    fn test_request_options_headers_override_defaults() {
        let options = RequestOptions::post(json!({"a": 1})).header(
            CONTENT_TYPE,
            HeaderValue::from_static("application/merge-patch+json"),
        );
        assert_eq!(options.method, Method::POST);
        assert_eq!(
            options.headers.get(CONTENT_TYPE).unwrap(),
            "application/merge-patch+json"
        );
        assert!(RequestOptions::delete().body.is_none());
    }

    #[test]
    fn test_list_from_null_is_empty() {
        let items: Vec<Value> = list_from(None).unwrap();
        assert!(items.is_empty());
        let items: Vec<Value> = list_from(Some(Value::Null)).unwrap();
        assert!(items.is_empty());
        let items: Vec<u32> = list_from(Some(json!([1, 2]))).unwrap();
        assert_eq!(items, vec![1, 2]);
    }
}
